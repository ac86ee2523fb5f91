//! HZERO Helper CLI - Main entry point
//!
//! 터미널에서 호스트 역할을 한다. `serve`는 stdin/stdout NDJSON으로 백엔드
//! 라우터를 돌리고, `query`는 자식 `serve` 프로세스에 요청 하나를 보낸다.

mod env;
mod host;
mod oauth;
mod query;
mod scan;
mod serve;

use clap::{Parser, Subcommand};
use hzero_core::{BackendContext, HostServices, PanelKind};
use hzero_foundation::{EventBus, HelperConfig, JsonConfigStore, JsonStore, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// HZERO Helper - permission scanner and environment manager
#[derive(Parser, Debug)]
#[command(name = "hzero")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Override the global config directory (~/.config/hzero-helper)
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a folder for permissionList declarations
    Scan {
        dir: PathBuf,

        /// Print the raw result set as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the message router over stdin/stdout (NDJSON)
    Serve {
        /// Scan this folder before reading messages
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Open a panel and route panel posts to stdout
        #[arg(long, value_name = "KIND")]
        panel: Option<PanelKind>,
    },
    /// Send one request to a child `hzero serve` and print the reply
    Query {
        /// Message type, e.g. GET_ENV_LIST
        #[arg(value_name = "TYPE")]
        msg_type: String,

        /// Request payload as JSON
        #[arg(long)]
        payload: Option<String>,

        /// Reply deadline in milliseconds (0 disables)
        #[arg(long, value_name = "N")]
        timeout_ms: Option<u64>,
    },
    /// Manage environments
    Env {
        #[command(subcommand)]
        action: env::EnvAction,
    },
    /// Consume an OAuth redirect URI and store its token
    OauthCallback { uri: String },
}

/// 명령 공통 준비물
pub(crate) struct Runtime {
    pub config_dir: Option<PathBuf>,
    pub debug: bool,
}

impl Runtime {
    fn global_store(&self) -> anyhow::Result<JsonStore> {
        Ok(match &self.config_dir {
            Some(dir) => JsonStore::new(dir),
            None => JsonStore::global()?,
        })
    }

    /// 글로벌(또는 --config-dir) + 프로젝트 config.json 병합
    pub fn config(&self) -> anyhow::Result<HelperConfig> {
        let global = self.global_store()?;
        let project = JsonStore::current_project().ok();
        Ok(HelperConfig::load_from(Some(&global), project.as_ref())?)
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let store = JsonConfigStore::new(self.global_store()?);
        Ok(Settings::new(Arc::new(store)))
    }

    /// 이벤트 로그 리스너가 붙은 백엔드 컨텍스트
    pub async fn context(&self, host: Arc<dyn HostServices>) -> anyhow::Result<BackendContext> {
        let events = Arc::new(EventBus::new());
        events.subscribe(Arc::new(host::LogListener)).await;
        Ok(BackendContext::new(self.config()?, self.settings()?, host)?.with_events(events))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout은 serve 모드의 메시지 채널이므로 로그는 stderr로
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let runtime = Runtime {
        config_dir: args.config_dir,
        debug: args.debug,
    };

    match args.command {
        Command::Scan { dir, json } => scan::run(&runtime, dir, json).await,
        Command::Serve { root, panel } => serve::run(&runtime, root, panel).await,
        Command::Query {
            msg_type,
            payload,
            timeout_ms,
        } => query::run(&runtime, &msg_type, payload.as_deref(), timeout_ms).await,
        Command::Env { action } => env::run(&runtime, action).await,
        Command::OauthCallback { uri } => oauth::run(&runtime, &uri).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_panel() {
        let args = Args::parse_from(["hzero", "serve", "--root", "src", "--panel", "oauth"]);
        match args.command {
            Command::Serve { root, panel } => {
                assert_eq!(root, Some(PathBuf::from("src")));
                assert_eq!(panel, Some(PanelKind::OAuth));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["hzero", "env", "list", "--config-dir", "/tmp/h", "-d"]);
        assert!(args.debug);
        assert_eq!(args.config_dir, Some(PathBuf::from("/tmp/h")));
    }

    #[test]
    fn test_parse_query() {
        let args = Args::parse_from([
            "hzero",
            "query",
            "GET_CONFIGURATION",
            "--payload",
            r#"{"key":"env"}"#,
            "--timeout-ms",
            "500",
        ]);
        match args.command {
            Command::Query {
                msg_type,
                payload,
                timeout_ms,
            } => {
                assert_eq!(msg_type, "GET_CONFIGURATION");
                assert_eq!(payload.as_deref(), Some(r#"{"key":"env"}"#));
                assert_eq!(timeout_ms, Some(500));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_runtime_uses_config_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let runtime = Runtime {
            config_dir: Some(temp.path().to_path_buf()),
            debug: false,
        };
        let settings = runtime.settings().unwrap();
        settings.set_current_environment("dev").await.unwrap();
        assert!(temp.path().join(hzero_foundation::SETTINGS_FILE).exists());
    }
}

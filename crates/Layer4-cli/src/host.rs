//! CLI 호스트 - 터미널에서 HostServices 제공
//!
//! `serve` 모드에서는 stdin/stdout이 메시지 채널이므로 대화형 기능이 모두
//! 취소(None/false)로 응답하고 알림은 stderr 로그로만 남긴다.

use async_trait::async_trait;
use hzero_core::{HostServices, InputRequest, MessageLevel, PanelKind, QuickPickItem};
use hzero_foundation::{Error, EventListener, EventSeverity, HelperEvent, Result};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

// ============================================================================
// CliHost
// ============================================================================

pub struct CliHost {
    /// 대화형이면 stdin에서 한 줄씩 읽는다
    input: Option<Mutex<Lines<BufReader<Stdin>>>>,
    /// 덮어쓰기 확인을 묻지 않고 승인
    assume_yes: bool,
}

impl CliHost {
    /// stdin을 메시지 채널로 쓰는 모드용
    pub fn non_interactive() -> Self {
        Self {
            input: None,
            assume_yes: false,
        }
    }

    pub fn interactive(assume_yes: bool) -> Self {
        Self {
            input: Some(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
            assume_yes,
        }
    }

    /// 프롬프트 출력 후 한 줄 읽기 (EOF면 None)
    async fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        let Some(input) = &self.input else {
            return Ok(None);
        };

        eprint!("{} ", prompt);
        std::io::stderr().flush()?;

        let mut lines = input.lock().await;
        Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
    }
}

#[async_trait]
impl HostServices for CliHost {
    async fn pick_folder(&self) -> Result<Option<PathBuf>> {
        Ok(self
            .read_line("Folder to scan:")
            .await?
            .filter(|line| !line.is_empty())
            .map(PathBuf::from))
    }

    async fn show_message(&self, level: MessageLevel, text: &str) -> Result<()> {
        match level {
            MessageLevel::Info => info!("{}", text),
            MessageLevel::Warning => warn!("{}", text),
            MessageLevel::Error => error!("{}", text),
        }
        Ok(())
    }

    async fn show_quick_pick(
        &self,
        items: Vec<QuickPickItem>,
        placeholder: Option<&str>,
    ) -> Result<Option<QuickPickItem>> {
        if self.input.is_none() || items.is_empty() {
            return Ok(None);
        }

        if let Some(placeholder) = placeholder {
            eprintln!("{}", placeholder);
        }
        for (i, item) in items.iter().enumerate() {
            eprintln!("  {:>2}. {}", i + 1, item.label);
        }

        let Some(answer) = self.read_line("Number:").await? else {
            return Ok(None);
        };
        Ok(answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| items.into_iter().nth(i)))
    }

    async fn prompt_input(&self, request: InputRequest) -> Result<Option<String>> {
        let prompt = match &request.placeholder {
            Some(placeholder) => format!("{} ({}):", request.prompt, placeholder),
            None => format!("{}:", request.prompt),
        };

        // 검증을 통과할 때까지 다시 묻는다. 빈 줄이나 EOF는 취소.
        loop {
            let Some(answer) = self.read_line(&prompt).await? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(None);
            }
            match request.validation.check(&answer) {
                Some(problem) => eprintln!("{}", problem),
                None => return Ok(Some(answer)),
            }
        }
    }

    async fn confirm(&self, message: &str) -> Result<bool> {
        if self.assume_yes {
            debug!(message, "Confirmed by --yes");
            return Ok(true);
        }
        let answer = self.read_line(&format!("{} [y/N]", message)).await?;
        Ok(matches!(
            answer.as_deref().map(str::to_lowercase).as_deref(),
            Some("y" | "yes")
        ))
    }

    async fn open_external(&self, url: &url::Url) -> Result<()> {
        // 브라우저를 직접 띄우지 않고 주소만 안내한다
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::InvalidInput(format!("Refusing to open {}", url)));
        }
        info!("Open in your browser: {}", url);
        Ok(())
    }

    async fn reveal_panel(&self, kind: PanelKind, created: bool) -> Result<()> {
        debug!(panel = %kind, created, "Panel revealed");
        Ok(())
    }
}

// ============================================================================
// LogListener
// ============================================================================

/// 도메인 이벤트를 tracing 로그로 남기는 리스너
pub struct LogListener;

#[async_trait]
impl EventListener for LogListener {
    fn name(&self) -> &str {
        "cli-log"
    }

    async fn on_event(&self, event: &HelperEvent) {
        match event.severity {
            EventSeverity::Debug => debug!(event = %event.event_type, data = %event.data),
            EventSeverity::Info => info!(event = %event.event_type, data = %event.data),
            EventSeverity::Warning => warn!(event = %event.event_type, data = %event.data),
            EventSeverity::Error => error!(event = %event.event_type, data = %event.data),
        }
    }
}

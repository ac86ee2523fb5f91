//! Dispatch Router - 백엔드 측 메시지 처리
//!
//! 수신 메시지 하나마다 `Operation`을 찾아 핸들러를 실행하고, 요청이
//! `expectsReply`였다면 결과(또는 에러)를 담은 응답을 정확히 한 번 보낸다.

use super::operation::Operation;
use crate::env::{CreateEnvRequest, EnvironmentService};
use crate::host::{HostServices, MessageLevel, QuickPickItem};
use crate::message::{Message, MessageSink};
use crate::oauth::{self, OAuthCallbackHandler};
use crate::panel::{PanelKind, PanelRegistry};
use crate::scanner::DirectoryScanner;
use crate::store::ResultStore;
use hzero_foundation::event::{panel as panel_events, scan as scan_events};
use hzero_foundation::{Error, EventBus, HelperConfig, Result, Settings};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 빠른 선택 기본 안내 문구
const DEFAULT_QUICKPICK_PLACEHOLDER: &str = "Select a file to import";

// ============================================================================
// BackendContext
// ============================================================================

/// 백엔드 공유 상태
#[derive(Clone)]
pub struct BackendContext {
    pub config: HelperConfig,
    pub store: Arc<ResultStore>,
    pub scanner: DirectoryScanner,
    pub settings: Settings,
    pub host: Arc<dyn HostServices>,
    pub panels: Arc<PanelRegistry>,
    pub events: Arc<EventBus>,
}

impl BackendContext {
    pub fn new(config: HelperConfig, settings: Settings, host: Arc<dyn HostServices>) -> Result<Self> {
        let scanner = DirectoryScanner::new(&config.scanner)?;
        Ok(Self {
            config,
            store: Arc::new(ResultStore::new()),
            scanner,
            settings,
            host,
            panels: Arc::new(PanelRegistry::new()),
            events: Arc::new(EventBus::new()),
        })
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn environments(&self) -> EnvironmentService {
        EnvironmentService::new(
            self.settings.clone(),
            Arc::clone(&self.host),
            Arc::clone(&self.events),
        )
    }

    pub fn oauth_handler(&self) -> OAuthCallbackHandler {
        OAuthCallbackHandler::new(
            self.settings.clone(),
            Arc::clone(&self.panels),
            Arc::clone(&self.events),
            self.config.oauth.clone(),
        )
    }
}

impl std::fmt::Debug for BackendContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendContext")
            .field("store", &self.store)
            .field("scanner", &self.scanner)
            .field("panels", &self.panels)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// DispatchRouter
// ============================================================================

/// 백엔드 메시지 라우터
pub struct DispatchRouter {
    ctx: BackendContext,
    environments: EnvironmentService,
    sink: Arc<dyn MessageSink>,
}

impl DispatchRouter {
    pub fn new(ctx: BackendContext, sink: Arc<dyn MessageSink>) -> Self {
        let environments = ctx.environments();
        Self {
            ctx,
            environments,
            sink,
        }
    }

    pub fn context(&self) -> &BackendContext {
        &self.ctx
    }

    /// 메시지 하나 처리 (핸들러 완료 후 필요하면 응답)
    pub async fn handle(&self, message: Message) {
        let op = match message.msg_type.parse::<Operation>() {
            Ok(op) => op,
            Err(e) => {
                warn!(msg_type = %message.msg_type, "Unhandled message type");
                if message.expects_reply {
                    self.reply(&message, Err(e));
                }
                return;
            }
        };

        debug!(operation = %op, request_id = ?message.request_id, "Dispatching");
        let result = self.dispatch(op, &message).await;
        if let Err(e) = &result {
            error!(operation = %op, error = %e, "Dispatch failed");
        }

        if message.expects_reply {
            self.reply(&message, result);
        }
    }

    fn reply(&self, request: &Message, result: Result<Value>) {
        let reply = request.reply(&self.ctx.config.messaging.reply_suffix, result);
        if let Err(e) = self.sink.post(reply) {
            error!(msg_type = %request.msg_type, error = %e, "Failed to send reply");
        }
    }

    /// 연산 실행
    pub async fn dispatch(&self, op: Operation, message: &Message) -> Result<Value> {
        match op {
            Operation::Scan => {
                let root = message.payload_str("root").map(PathBuf::from);
                Ok(match self.scan(root).await? {
                    Some(files) => json!({ "files": files }),
                    None => Value::Null,
                })
            }
            Operation::OpenOAuth => {
                let created = self.open_panel(PanelKind::OAuth).await?;
                Ok(json!({ "created": created }))
            }
            Operation::CloseWebview => {
                if self.ctx.panels.dispose(PanelKind::OAuth) {
                    self.ctx
                        .events
                        .publish(panel_events::disposed(PanelKind::OAuth.as_str()))
                        .await;
                }
                self.open_panel(PanelKind::PermissionManage).await?;
                Ok(Value::Null)
            }
            Operation::CreateEnv => self.create_env(message).await,
            Operation::GetEnvList => {
                let envs = self.environments.list().await?;
                Ok(json!({ "env": envs }))
            }
            Operation::GetCurrentEnv => {
                let current = self.environments.current().await?;
                Ok(serde_json::to_value(current)?)
            }
            Operation::UpdateCurrentEnv => {
                let name = message.payload_str("env").ok_or_else(|| {
                    Error::InvalidInput("UPDATE_CURRENT_ENV requires payload.env".to_string())
                })?;
                let record = self.environments.select(name).await?;
                Ok(json!({ "currentEnv": record.name }))
            }
            Operation::CheckPermissions => Ok(Value::Bool(self.ctx.store.has_data())),
            Operation::GetPermissionFiles => {
                Ok(serde_json::to_value(self.ctx.store.list_for_export())?)
            }
            Operation::ShowQuickPick => self.show_quick_pick(message).await,
            Operation::GetConfiguration => {
                let key = message.payload_str("key").ok_or_else(|| {
                    Error::InvalidInput("GET_CONFIGURATION requires payload.key".to_string())
                })?;
                Ok(self.ctx.settings.get_value(key).await?.unwrap_or(Value::Null))
            }
            Operation::ShowMessage => {
                let level = match message.payload_str("level") {
                    Some(level) => level.parse::<MessageLevel>()?,
                    None => MessageLevel::Info,
                };
                let text = message.payload_str("message").ok_or_else(|| {
                    Error::InvalidInput("SHOW_MESSAGE requires payload.message".to_string())
                })?;
                self.ctx.host.show_message(level, text).await?;
                Ok(Value::Null)
            }
            Operation::Login => {
                let env = self.environments.current().await?.ok_or_else(|| {
                    Error::NotFound("No current environment selected".to_string())
                })?;
                let url = oauth::authorize_url(&env, &self.ctx.config.oauth)?;
                self.ctx.host.open_external(&url).await?;
                Ok(json!({ "url": url.as_str() }))
            }
        }
    }

    /// 스캔 실행 (폴더 선택 취소 시 None)
    ///
    /// 결과가 비어있으면 저장소를 교체하지 않는다. 실패 시에도 이전 결과가 유지된다.
    pub async fn scan(&self, root: Option<PathBuf>) -> Result<Option<usize>> {
        let root = match root {
            Some(root) => root,
            None => match self.ctx.host.pick_folder().await? {
                Some(root) => root,
                None => {
                    self.notify_user(MessageLevel::Error, "No folder selected")
                        .await;
                    return Ok(None);
                }
            },
        };
        let root_label = root.display().to_string();

        let results = match self.ctx.scanner.scan(&root).await {
            Ok(results) => results,
            Err(e) => {
                self.ctx
                    .events
                    .publish(scan_events::failed(&root_label, &e.to_string()))
                    .await;
                self.notify_user(MessageLevel::Error, &format!("Error: {}", e))
                    .await;
                return Err(e);
            }
        };

        let files = results.len();
        let permissions = results.permission_count();

        if results.is_empty() {
            self.notify_user(MessageLevel::Info, "No permissions found")
                .await;
        } else {
            self.ctx.store.replace(results);
            self.notify_user(
                MessageLevel::Info,
                &format!("Found permissions in {} files", files),
            )
            .await;
        }

        info!(root = %root_label, files, permissions, "Scan completed");
        self.ctx
            .events
            .publish(scan_events::completed(&root_label, files, permissions))
            .await;
        Ok(Some(files))
    }

    /// 작업 결과 알림 (표시 실패는 작업 결과를 바꾸지 않는다)
    async fn notify_user(&self, level: MessageLevel, text: &str) {
        if let Err(e) = self.ctx.host.show_message(level, text).await {
            warn!(error = %e, text, "Failed to show notification");
        }
    }

    async fn open_panel(&self, kind: PanelKind) -> Result<bool> {
        let (_, created) = self.ctx.panels.create_or_reveal(kind);
        self.ctx.host.reveal_panel(kind, created).await?;
        self.ctx
            .events
            .publish(panel_events::opened(kind.as_str(), created))
            .await;
        Ok(created)
    }

    async fn create_env(&self, message: &Message) -> Result<Value> {
        let request = CreateEnvRequest {
            name: message.payload_str("name").map(str::to_string),
            host: message.payload_str("host").map(str::to_string),
        };

        let outcome = match self.environments.create(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.notify_user(MessageLevel::Error, &e.to_string()).await;
                return Err(e);
            }
        };

        let envs = self.environments.list().await?;
        Ok(json!({
            "env": envs,
            "message": outcome.message(),
            "committed": outcome.is_committed(),
        }))
    }

    async fn show_quick_pick(&self, message: &Message) -> Result<Value> {
        let items: Vec<QuickPickItem> = match message.payload_field("items") {
            Some(items) => serde_json::from_value(items.clone())?,
            None => {
                return Err(Error::InvalidInput(
                    "SHOW_QUICKPICK requires payload.items".to_string(),
                ))
            }
        };
        let placeholder = message
            .payload_str("placeHolder")
            .unwrap_or(DEFAULT_QUICKPICK_PLACEHOLDER);

        let selected = self.ctx.host.show_quick_pick(items, Some(placeholder)).await?;
        Ok(selected.map(|item| item.value).unwrap_or(Value::Null))
    }
}

impl std::fmt::Debug for DispatchRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchRouter")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::ScriptedHost;
    use crate::message::ChannelSink;
    use hzero_foundation::EnvironmentRecord;
    use std::fs;
    use tempfile::TempDir;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        router: DispatchRouter,
        host: Arc<ScriptedHost>,
        outbound: UnboundedReceiver<Message>,
    }

    fn fixture() -> Fixture {
        let host = Arc::new(ScriptedHost::default());
        let ctx =
            BackendContext::new(HelperConfig::default(), Settings::in_memory(), host.clone())
                .unwrap();
        let (sink, outbound) = ChannelSink::new();
        Fixture {
            router: DispatchRouter::new(ctx, Arc::new(sink)),
            host,
            outbound,
        }
    }

    async fn call(fx: &mut Fixture, msg_type: &str, payload: Option<Value>) -> Message {
        fx.router
            .handle(Message::request(msg_type, payload, 1))
            .await;
        fx.outbound.try_recv().unwrap()
    }

    fn write_fixture(dir: &TempDir) {
        fs::write(
            dir.path().join("fixture.tsx"),
            "permissionList={[{code: 'hzero.demo.create', type: 'button', meaning: 'Create'}]}",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_scan_replaces_store_and_notifies() {
        let mut fx = fixture();
        let temp = TempDir::new().unwrap();
        write_fixture(&temp);

        let reply = call(
            &mut fx,
            "SCAN",
            Some(json!({ "root": temp.path().to_str().unwrap() })),
        )
        .await;
        assert_eq!(reply.msg_type, "SCAN_Response");
        assert_eq!(reply.into_result().unwrap(), json!({"files": 1}));

        let check = call(&mut fx, "CHECK_PERMISSIONS", None).await;
        assert_eq!(check.into_result().unwrap(), json!(true));

        let files = call(&mut fx, "GET_PERMISSION_FILES", None).await;
        let files = files.into_result().unwrap();
        assert_eq!(files[0]["code"], "fixture");
        assert_eq!(files[0]["children"][0]["code"], "hzero.demo.create");

        let messages = fx.host.messages.lock().clone();
        assert_eq!(
            messages,
            vec![(MessageLevel::Info, "Found permissions in 1 files".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_scan_keeps_previous_results() {
        let mut fx = fixture();
        let full = TempDir::new().unwrap();
        write_fixture(&full);
        let empty = TempDir::new().unwrap();

        fx.router.scan(Some(full.path().to_path_buf())).await.unwrap();
        let files = fx.router.scan(Some(empty.path().to_path_buf())).await.unwrap();

        assert_eq!(files, Some(0));
        assert!(fx.router.context().store.has_data());
        assert_eq!(
            fx.host.messages.lock().last().unwrap().1,
            "No permissions found"
        );
    }

    #[tokio::test]
    async fn test_scan_failure_replies_error() {
        let mut fx = fixture();
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");

        let reply = call(&mut fx, "SCAN", Some(json!({ "root": missing.to_str().unwrap() }))).await;
        let err = reply.into_result().unwrap_err();
        assert!(matches!(err, Error::Remote { ref kind, .. } if kind == "scan"));

        let (level, text) = fx.host.messages.lock()[0].clone();
        assert_eq!(level, MessageLevel::Error);
        assert!(text.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_scan_result_survives_notification_failure() {
        let mut fx = fixture();
        *fx.host.messages_fail.lock() = true;
        let temp = TempDir::new().unwrap();
        write_fixture(&temp);

        let reply = call(
            &mut fx,
            "SCAN",
            Some(json!({ "root": temp.path().to_str().unwrap() })),
        )
        .await;
        assert_eq!(reply.into_result().unwrap(), json!({"files": 1}));
        assert!(fx.router.context().store.has_data());

        // 실패 시에도 호스트 에러가 아니라 스캔 에러가 전달된다
        let missing = temp.path().join("missing");
        let reply = call(&mut fx, "SCAN", Some(json!({ "root": missing.to_str().unwrap() }))).await;
        let err = reply.into_result().unwrap_err();
        assert!(matches!(err, Error::Remote { ref kind, .. } if kind == "scan"));
    }

    #[tokio::test]
    async fn test_scan_cancelled_folder_pick() {
        let mut fx = fixture();
        let reply = call(&mut fx, "SCAN", None).await;
        assert_eq!(reply.into_result().unwrap(), Value::Null);
        assert!(!fx.router.context().store.has_data());
    }

    #[tokio::test]
    async fn test_environment_operations() {
        let mut fx = fixture();

        let created = call(
            &mut fx,
            "CREATE_ENV",
            Some(json!({"name": "dev", "host": "https://dev.hzero.com"})),
        )
        .await
        .into_result()
        .unwrap();
        assert_eq!(created["env"][0]["name"], "dev");
        assert_eq!(created["message"], "Environment created successfully");

        let list = call(&mut fx, "GET_ENV_LIST", None).await.into_result().unwrap();
        assert_eq!(list["env"].as_array().unwrap().len(), 1);

        let none = call(&mut fx, "GET_CURRENT_ENV", None).await.into_result().unwrap();
        assert_eq!(none, Value::Null);

        let unknown = call(&mut fx, "UPDATE_CURRENT_ENV", Some(json!({"env": "prod"}))).await;
        assert!(unknown.into_result().is_err());

        let updated = call(&mut fx, "UPDATE_CURRENT_ENV", Some(json!({"env": "dev"})))
            .await
            .into_result()
            .unwrap();
        assert_eq!(updated, json!({"currentEnv": "dev"}));

        let current = call(&mut fx, "GET_CURRENT_ENV", None).await.into_result().unwrap();
        let record: EnvironmentRecord = serde_json::from_value(current).unwrap();
        assert_eq!(record.host, "https://dev.hzero.com");

        let raw = call(&mut fx, "GET_CONFIGURATION", Some(json!({"key": "currentEnv"})))
            .await
            .into_result()
            .unwrap();
        assert_eq!(raw, json!("dev"));
    }

    #[tokio::test]
    async fn test_create_env_validation_error() {
        let mut fx = fixture();
        let reply = call(
            &mut fx,
            "CREATE_ENV",
            Some(json!({"name": "dev", "host": "not a url"})),
        )
        .await;
        let err = reply.into_result().unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(fx.host.messages.lock()[0].0, MessageLevel::Error);
    }

    #[tokio::test]
    async fn test_panels_and_login() {
        let mut fx = fixture();

        let first = call(&mut fx, "OPEN_OAUTH", None).await.into_result().unwrap();
        assert_eq!(first, json!({"created": true}));
        let second = call(&mut fx, "OPEN_OAUTH", None).await.into_result().unwrap();
        assert_eq!(second, json!({"created": false}));

        call(&mut fx, "CLOSE_WEBVIEW", None).await;
        let panels = &fx.router.context().panels;
        assert!(!panels.is_open(PanelKind::OAuth));
        assert!(panels.is_open(PanelKind::PermissionManage));

        let no_env = call(&mut fx, "LOGIN", None).await.into_result().unwrap_err();
        assert_eq!(no_env.kind(), "not_found");

        let settings = fx.router.context().settings.clone();
        settings
            .save_environments(&[EnvironmentRecord::new("dev", "https://dev.hzero.com")])
            .await
            .unwrap();
        settings.set_current_environment("dev").await.unwrap();

        // OAuth 패널은 소문자 type을 보낸다
        fx.router.handle(Message::request("login", None, 9)).await;
        let reply = fx.outbound.try_recv().unwrap();
        assert_eq!(reply.msg_type, "login_Response");
        let url = reply.into_result().unwrap()["url"].as_str().unwrap().to_string();
        assert!(url.starts_with("https://dev.hzero.com/oauth/oauth/authorize?response_type=token"));
        assert_eq!(fx.host.opened.lock().clone(), vec![url]);
    }

    #[tokio::test]
    async fn test_quick_pick_and_message() {
        let mut fx = fixture();
        *fx.host.pick_index.lock() = Some(1);

        let picked = call(
            &mut fx,
            "SHOW_QUICKPICK",
            Some(json!({"items": [
                {"label": "a.tsx", "value": "a"},
                {"label": "b.tsx", "value": "b"}
            ]})),
        )
        .await
        .into_result()
        .unwrap();
        assert_eq!(picked, json!("b"));

        fx.router
            .handle(Message::notification(
                "SHOW_MESSAGE",
                Some(json!({"level": "warning", "message": "careful"})),
            ))
            .await;
        assert!(fx.outbound.try_recv().is_err());
        assert_eq!(
            fx.host.messages.lock().clone(),
            vec![(MessageLevel::Warning, "careful".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let mut fx = fixture();

        fx.router.handle(Message::new("REFRESH")).await;
        assert!(fx.outbound.try_recv().is_err());

        let reply = call(&mut fx, "REFRESH", None).await;
        assert_eq!(reply.msg_type, "REFRESH_Response");
        assert_eq!(reply.into_result().unwrap_err().kind(), "unknown_operation");
    }
}

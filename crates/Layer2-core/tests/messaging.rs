//! 프런트엔드(Messenger) ↔ 백엔드(DispatchRouter) 상관 테스트

use async_trait::async_trait;
use hzero_core::message::spawn_writer;
use hzero_core::{
    serve, BackendContext, ChannelSink, DispatchRouter, HostServices, InputRequest, MessageLevel,
    MessageReader, Messenger, PanelKind, QuickPickItem, TOKEN_UPDATE,
};
use hzero_foundation::{EnvironmentRecord, HelperConfig, MessagingConfig, Result, Settings};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// 모든 프롬프트를 취소하는 호스트
struct QuietHost;

#[async_trait]
impl HostServices for QuietHost {
    async fn pick_folder(&self) -> Result<Option<PathBuf>> {
        Ok(None)
    }

    async fn show_message(&self, _level: MessageLevel, _text: &str) -> Result<()> {
        Ok(())
    }

    async fn show_quick_pick(
        &self,
        _items: Vec<QuickPickItem>,
        _placeholder: Option<&str>,
    ) -> Result<Option<QuickPickItem>> {
        Ok(None)
    }

    async fn prompt_input(&self, _request: InputRequest) -> Result<Option<String>> {
        Ok(None)
    }

    async fn confirm(&self, _message: &str) -> Result<bool> {
        Ok(false)
    }

    async fn open_external(&self, _url: &url::Url) -> Result<()> {
        Ok(())
    }
}

fn context() -> BackendContext {
    BackendContext::new(
        HelperConfig::default(),
        Settings::in_memory(),
        Arc::new(QuietHost),
    )
    .unwrap()
}

/// 메모리 채널로 양쪽을 연결하고 펌프 태스크를 띄운다
fn connect(ctx: BackendContext) -> (Arc<Messenger>, Arc<DispatchRouter>, ChannelSink) {
    let (front_sink, mut to_back) = ChannelSink::new();
    let (back_sink, mut to_front) = ChannelSink::new();

    let messenger = Arc::new(Messenger::new(
        Arc::new(front_sink),
        &MessagingConfig::default(),
    ));
    let router = Arc::new(DispatchRouter::new(ctx, Arc::new(back_sink.clone())));

    let backend = Arc::clone(&router);
    tokio::spawn(async move {
        while let Some(message) = to_back.recv().await {
            backend.handle(message).await;
        }
    });

    let frontend = Arc::clone(&messenger);
    tokio::spawn(async move {
        while let Some(message) = to_front.recv().await {
            frontend.receive(message);
        }
    });

    (messenger, router, back_sink)
}

#[tokio::test]
async fn test_request_resolves_with_backend_reply() {
    let ctx = context();
    ctx.settings
        .save_environments(&[EnvironmentRecord::new("dev", "https://dev.hzero.com")])
        .await
        .unwrap();
    let (messenger, _router, _) = connect(ctx);

    let reply = messenger.request("GET_ENV_LIST", None).await.unwrap();
    assert_eq!(reply["env"][0]["name"], "dev");
    assert_eq!(messenger.pending_count(), 0);

    let has_data = messenger.request("CHECK_PERMISSIONS", None).await.unwrap();
    assert_eq!(has_data, json!(false));
}

#[tokio::test]
async fn test_concurrent_requests_of_same_type() {
    let (messenger, _router, _) = connect(context());

    let (a, b) = tokio::join!(
        messenger.request("GET_CONFIGURATION", Some(json!({"key": "env"}))),
        messenger.request("GET_CONFIGURATION", Some(json!({"key": "currentEnv"}))),
    );
    assert_eq!(a.unwrap(), Value::Null);
    assert_eq!(b.unwrap(), Value::Null);
    assert_eq!(messenger.pending_count(), 0);
}

#[tokio::test]
async fn test_scan_through_messages() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("fixture.tsx"),
        "permissionList={[{code: 'hzero.demo.create', type: 'button', meaning: 'Create'}]}",
    )
    .unwrap();
    let (messenger, _router, _) = connect(context());

    let scanned = messenger
        .request("SCAN", Some(json!({"root": temp.path()})))
        .await
        .unwrap();
    assert_eq!(scanned, json!({"files": 1}));

    let files = messenger.request("GET_PERMISSION_FILES", None).await.unwrap();
    assert_eq!(files[0]["children"][0]["meaning"], "Create");
}

#[tokio::test]
async fn test_unknown_type_does_not_hang() {
    let (messenger, _router, _) = connect(context());
    let err = messenger
        .request_with_timeout("NOT_A_THING", None, Some(Duration::from_secs(5)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unknown_operation");
}

#[tokio::test]
async fn test_token_update_subscription() {
    let ctx = context();
    ctx.settings
        .save_environments(&[EnvironmentRecord::new("dev", "https://dev.hzero.com")])
        .await
        .unwrap();
    ctx.settings.set_current_environment("dev").await.unwrap();
    let (messenger, router, back_sink) = connect(ctx);

    let tokens = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = Arc::clone(&tokens);
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let subscription = messenger.subscribe(TOKEN_UPDATE, move |payload| {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = payload.as_str() {
            seen.lock().push(token.to_string());
        }
    });

    let opened = messenger.request("OPEN_OAUTH", None).await.unwrap();
    assert_eq!(opened, json!({"created": true}));
    let ctx = router.context();
    ctx.panels
        .attach_sink(PanelKind::OAuth, Arc::new(back_sink))
        .unwrap();

    let handler = ctx.oauth_handler();
    for token in ["first", "second"] {
        let uri = format!(
            "vscode://mahoo12138.vscode-hzero-helper/oauth/callback#access_token={}",
            token
        );
        handler.handle_callback(&uri).await.unwrap();
    }

    // 펌프 태스크가 전달할 시간을 준다
    messenger.request("CHECK_PERMISSIONS", None).await.unwrap();
    assert_eq!(*tokens.lock(), vec!["first".to_string(), "second".to_string()]);

    assert!(subscription.dispose());
    handler
        .handle_callback(
            "vscode://mahoo12138.vscode-hzero-helper/oauth/callback#access_token=third",
        )
        .await
        .unwrap();
    messenger.request("CHECK_PERMISSIONS", None).await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 2);

    let current = ctx.settings.current_environment().await.unwrap().unwrap();
    assert_eq!(current.token.as_deref(), Some("third"));
}

#[tokio::test]
async fn test_ndjson_serve_loop() {
    let (front_out, back_in) = tokio::io::duplex(4096);
    let (back_out, front_in) = tokio::io::duplex(4096);

    // 프런트엔드: Messenger → NDJSON writer / NDJSON reader → Messenger
    let (front_sink, front_rx) = ChannelSink::new();
    let messenger = Arc::new(Messenger::new(
        Arc::new(front_sink),
        &MessagingConfig::default(),
    ));
    let front_writer = spawn_writer(front_out, front_rx);
    let inbound = Arc::clone(&messenger);
    tokio::spawn(async move {
        let mut reader = MessageReader::new(front_in);
        while let Ok(Some(message)) = reader.next_message().await {
            inbound.receive(message);
        }
        inbound.close();
    });

    // 백엔드: NDJSON → router.serve → NDJSON
    let (back_sink, back_rx) = ChannelSink::new();
    let back_writer = spawn_writer(back_out, back_rx);
    let router = DispatchRouter::new(context(), Arc::new(back_sink));
    let backend = tokio::spawn(async move { serve(&router, back_in).await });

    let reply = messenger.request("CHECK_PERMISSIONS", None).await.unwrap();
    assert_eq!(reply, json!(false));
    messenger
        .notify("SHOW_MESSAGE", Some(json!({"message": "hello"})))
        .unwrap();
    // 백엔드는 순서대로 처리하므로 이 응답이 오면 알림도 처리된 상태다
    let reply = messenger.request("GET_CURRENT_ENV", None).await.unwrap();
    assert_eq!(reply, Value::Null);

    // writer 태스크가 소유한 스트림을 닫아 백엔드 입력을 EOF로 만든다
    front_writer.abort();
    let _ = front_writer.await;

    let handled = backend.await.unwrap().unwrap();
    assert_eq!(handled, 3);
    back_writer.abort();
}

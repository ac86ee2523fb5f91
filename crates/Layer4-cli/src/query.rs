//! `hzero query` - 자식 백엔드에 요청 하나 보내기

use crate::Runtime;
use anyhow::Context;
use hzero_core::StdioPeer;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// 자식 프로세스 종료 대기 시간
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub async fn run(
    runtime: &Runtime,
    msg_type: &str,
    payload: Option<&str>,
    timeout_ms: Option<u64>,
) -> anyhow::Result<()> {
    let payload = payload
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--payload is not valid JSON")?;

    let config = runtime.config()?;
    let program = std::env::current_exe().context("Cannot locate the hzero executable")?;
    let peer = StdioPeer::spawn(&program, &serve_args(runtime), &config.messaging)?;
    let messenger = peer.messenger();

    debug!(msg_type, "Sending request");
    let result = match timeout_ms {
        Some(ms) => {
            messenger
                .request_with_timeout(msg_type, payload, deadline(ms))
                .await
        }
        None => messenger.request(msg_type, payload).await,
    };

    peer.shutdown(SHUTDOWN_GRACE).await?;

    let reply = result?;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

/// 자식 `serve`에 전달할 인자 (전역 플래그 유지)
fn serve_args(runtime: &Runtime) -> Vec<String> {
    let mut args = vec!["serve".to_string()];
    if let Some(dir) = &runtime.config_dir {
        args.push("--config-dir".to_string());
        args.push(dir.display().to_string());
    }
    if runtime.debug {
        args.push("--debug".to_string());
    }
    args
}

/// 0은 무제한
fn deadline(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

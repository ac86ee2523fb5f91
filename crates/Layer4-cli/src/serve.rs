//! `hzero serve` - stdin/stdout NDJSON 백엔드

use crate::host::CliHost;
use crate::Runtime;
use hzero_core::message::spawn_writer;
use hzero_core::{serve, ChannelSink, DispatchRouter, PanelKind};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(
    runtime: &Runtime,
    root: Option<PathBuf>,
    panel: Option<PanelKind>,
) -> anyhow::Result<()> {
    let ctx = runtime.context(Arc::new(CliHost::non_interactive())).await?;

    let (sink, rx) = ChannelSink::new();
    let writer = spawn_writer(tokio::io::stdout(), rx);
    let sink = Arc::new(sink);

    // 패널이 보내는 메시지(TOKEN_UPDATE 등)도 같은 stdout으로
    if let Some(kind) = panel {
        ctx.panels.create_or_reveal(kind);
        ctx.panels.attach_sink(kind, sink.clone())?;
    }

    let router = DispatchRouter::new(ctx, sink);

    if let Some(root) = root {
        // 초기 스캔 실패는 알림으로 끝내고 메시지 처리는 계속한다
        if let Err(e) = router.scan(Some(root)).await {
            warn!("Initial scan failed: {}", e);
        }
    }

    info!("Serving messages on stdin/stdout");
    tokio::select! {
        result = serve(&router, tokio::io::stdin()) => {
            let handled = result?;
            info!(handled, "Input closed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    // 모든 sink가 사라져야 writer가 남은 메시지를 쓰고 끝난다
    drop(router);
    writer.await?;
    Ok(())
}

//! Dispatch Router
//!
//! - `operation`: 인식하는 메시지 type
//! - `dispatch`: BackendContext + DispatchRouter
//! - `serve`: NDJSON 스트림을 끝까지 읽으며 메시지를 하나씩 처리

mod dispatch;
mod operation;

pub use dispatch::{BackendContext, DispatchRouter};
pub use operation::Operation;

use crate::message::MessageReader;
use hzero_foundation::Result;
use tokio::io::AsyncRead;
use tracing::debug;

/// 입력 스트림이 끝날 때까지 메시지 처리 (도착 순서대로 한 번에 하나씩)
///
/// 처리한 메시지 수를 반환한다.
pub async fn serve<R: AsyncRead + Unpin>(router: &DispatchRouter, input: R) -> Result<usize> {
    let mut reader = MessageReader::new(input);
    let mut handled = 0;

    while let Some(message) = reader.next_message().await? {
        router.handle(message).await;
        handled += 1;
    }

    debug!(handled, "Input closed, router stopping");
    Ok(handled)
}

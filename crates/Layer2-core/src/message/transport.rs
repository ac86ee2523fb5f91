//! Message Transport - 메시지 전송 계층
//!
//! - `MessageSink`: 메시지 한 건을 상대편으로 보내는 추상화
//! - `ChannelSink`: 프로세스 내부 mpsc 채널
//! - `MessageReader` / `spawn_writer`: NDJSON 스트림 읽기/쓰기
//! - `StdioPeer`: 자식 프로세스(`hzero serve`)와 stdin/stdout 통신

use super::correlator::Messenger;
use super::protocol::{decode_line, encode_line, Message};
use hzero_foundation::{Error, MessagingConfig, Result};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

/// 메시지 송신 추상화
pub trait MessageSink: Send + Sync {
    fn post(&self, message: Message) -> Result<()>;
}

// ============================================================================
// ChannelSink
// ============================================================================

/// mpsc 채널 기반 sink
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageSink for ChannelSink {
    fn post(&self, message: Message) -> Result<()> {
        self.tx.send(message).map_err(|e| {
            Error::ChannelClosed(format!("Receiver dropped for '{}'", e.0.msg_type))
        })
    }
}

// ============================================================================
// NDJSON stream
// ============================================================================

/// 줄 단위 메시지 리더
pub struct MessageReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// 다음 메시지 (EOF면 None)
    ///
    /// 빈 줄과 디코딩할 수 없는 줄은 경고 후 건너뛴다.
    pub async fn next_message(&mut self) -> Result<Option<Message>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Dropping non UTF-8 message line");
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match decode_line(line) {
                Ok(message) => {
                    trace!(msg_type = %message.msg_type, "Message received");
                    return Ok(Some(message));
                }
                Err(e) => warn!(error = %e, "Dropping malformed message line"),
            }
        }
    }
}

/// 채널의 메시지를 NDJSON으로 기록하는 태스크 시작
pub fn spawn_writer<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Message>) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let line = match encode_line(&message) {
                Ok(line) => line,
                Err(e) => {
                    error!(msg_type = %message.msg_type, error = %e, "Failed to encode message");
                    continue;
                }
            };
            if let Err(e) = writer.write_all(format!("{}\n", line).as_bytes()).await {
                error!("Failed to write message: {}", e);
                break;
            }
            if let Err(e) = writer.flush().await {
                error!("Failed to flush message stream: {}", e);
                break;
            }
        }
        debug!("Message writer finished");
    })
}

// ============================================================================
// StdioPeer
// ============================================================================

/// 자식 프로세스 백엔드와 연결된 프런트엔드
pub struct StdioPeer {
    child: Child,
    messenger: Arc<Messenger>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl StdioPeer {
    /// 백엔드 프로세스 실행 후 stdin/stdout 연결
    pub fn spawn(program: &Path, args: &[String], config: &MessagingConfig) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Internal(format!("Failed to spawn {}: {}", program.display(), e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Internal("Child stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Internal("Child stdout not captured".to_string()))?;

        let (sink, rx) = ChannelSink::new();
        let messenger = Arc::new(Messenger::new(Arc::new(sink), config));
        let writer = spawn_writer(stdin, rx);

        let inbound = Arc::clone(&messenger);
        let reader = tokio::spawn(async move {
            let mut reader = MessageReader::new(stdout);
            loop {
                match reader.next_message().await {
                    Ok(Some(message)) => inbound.receive(message),
                    Ok(None) => {
                        debug!("Backend stdout closed");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read from backend: {}", e);
                        break;
                    }
                }
            }
            inbound.close();
        });

        debug!(program = %program.display(), "Backend process started");
        Ok(Self {
            child,
            messenger,
            writer,
            reader,
        })
    }

    pub fn messenger(&self) -> Arc<Messenger> {
        Arc::clone(&self.messenger)
    }

    /// stdin을 닫고 종료를 기다린다 (시간 초과 시 kill)
    pub async fn shutdown(mut self, grace: Duration) -> Result<()> {
        // writer 태스크가 stdin을 소유하므로 중단하면 EOF가 전달된다
        self.writer.abort();
        self.messenger.close();

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(?status, "Backend process exited");
            }
            Err(_) => {
                warn!("Backend did not exit in time, killing");
                self.child.kill().await?;
            }
        }
        self.reader.abort();
        Ok(())
    }
}

impl std::fmt::Debug for StdioPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioPeer")
            .field("pid", &self.child.id())
            .field("messenger", &self.messenger)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_channel_sink_closed() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        assert!(matches!(
            sink.post(Message::new("SCAN")),
            Err(Error::ChannelClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_writer_and_reader_over_duplex() {
        let (client, server) = tokio::io::duplex(1024);
        let (sink, rx) = ChannelSink::new();
        let writer = spawn_writer(client, rx);

        sink.post(Message::request("GET_ENV_LIST", None, 1)).unwrap();
        sink.post(Message::notification("SHOW_MESSAGE", Some(json!({"message": "hi"}))))
            .unwrap();
        drop(sink);
        writer.await.unwrap();

        let mut reader = MessageReader::new(server);
        let first = reader.next_message().await.unwrap().unwrap();
        assert_eq!(first.request_id, Some(1));
        let second = reader.next_message().await.unwrap().unwrap();
        assert_eq!(second.payload_str("message"), Some("hi"));
        assert!(!second.expects_reply);
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reader_skips_garbage() {
        let input: &[u8] = b"\n{oops\n{\"type\":\"TOKEN_UPDATE\",\"payload\":\"t\"}\n";
        let mut reader = MessageReader::new(input);
        let message = reader.next_message().await.unwrap().unwrap();
        assert_eq!(message.msg_type, "TOKEN_UPDATE");
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reader_skips_invalid_utf8() {
        let input: &[u8] = b"{\"type\":\"A\"}\n\xff\xfe garbage\n{\"type\":\"B\"}";
        let mut reader = MessageReader::new(input);
        assert_eq!(reader.next_message().await.unwrap().unwrap().msg_type, "A");
        assert_eq!(reader.next_message().await.unwrap().unwrap().msg_type, "B");
        assert!(reader.next_message().await.unwrap().is_none());
    }
}

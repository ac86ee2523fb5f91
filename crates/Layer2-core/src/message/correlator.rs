//! Message Correlator - 프런트엔드 측 요청/응답/구독
//!
//! - `request`: requestId를 붙여 보내고 해당 응답 하나를 기다린다 (one-shot)
//! - `notify`: 응답 없이 전송
//! - `subscribe`: 특정 type의 모든 수신 메시지마다 콜백 호출 (명시적 해제 전까지)
//!
//! 수신 메시지는 one-shot 테이블과 구독 테이블을 모두 확인한다. 두 테이블은
//! 독립적이어서 같은 메시지에 둘 다 반응할 수 있다.

use super::protocol::{reply_marker, Message};
use super::transport::MessageSink;
use hzero_foundation::{Error, MessagingConfig, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

type Callback = Arc<dyn Fn(Value) + Send + Sync>;
type SubscriptionTable = Mutex<HashMap<String, Vec<(u64, Callback)>>>;

/// 응답 대기 중인 요청
struct PendingRequest {
    /// 기대하는 응답 type
    marker: String,
    sender: oneshot::Sender<Result<Value>>,
}

/// 요청 future가 끝나거나 drop될 때 대기 항목 제거
struct PendingGuard<'a> {
    pending: &'a Mutex<HashMap<u64, PendingRequest>>,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.pending.lock().remove(&self.id).is_some() {
            trace!(request_id = self.id, "Pending request discarded");
        }
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// 구독 해제 핸들
///
/// drop해도 구독은 유지된다. `dispose()`를 호출해야 제거된다.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    msg_type: String,
    table: Weak<SubscriptionTable>,
}

impl Subscription {
    pub fn msg_type(&self) -> &str {
        &self.msg_type
    }

    /// 이 콜백만 제거 (같은 type의 다른 구독은 유지)
    pub fn dispose(&self) -> bool {
        let Some(table) = self.table.upgrade() else {
            return false;
        };
        let mut table = table.lock();
        let Some(callbacks) = table.get_mut(&self.msg_type) else {
            return false;
        };
        let before = callbacks.len();
        callbacks.retain(|(id, _)| *id != self.id);
        let removed = callbacks.len() != before;
        if callbacks.is_empty() {
            table.remove(&self.msg_type);
        }
        removed
    }
}

// ============================================================================
// Messenger
// ============================================================================

/// 프런트엔드 메시지 상관기
pub struct Messenger {
    sink: Arc<dyn MessageSink>,
    reply_suffix: String,
    default_timeout: Option<Duration>,

    request_counter: AtomicU64,
    pending: Mutex<HashMap<u64, PendingRequest>>,

    subscription_counter: AtomicU64,
    subscriptions: Arc<SubscriptionTable>,

    closed: AtomicBool,
}

impl Messenger {
    pub fn new(sink: Arc<dyn MessageSink>, config: &MessagingConfig) -> Self {
        Self {
            sink,
            reply_suffix: config.reply_suffix.clone(),
            default_timeout: config.request_timeout(),
            request_counter: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            subscription_counter: AtomicU64::new(0),
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            closed: AtomicBool::new(false),
        }
    }

    fn next_request_id(&self) -> u64 {
        self.request_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// 요청 전송 후 응답 대기 (설정된 기본 타임아웃 적용)
    pub async fn request(&self, msg_type: &str, payload: Option<Value>) -> Result<Value> {
        self.request_with_timeout(msg_type, payload, self.default_timeout)
            .await
    }

    /// 요청 전송 후 응답 대기
    ///
    /// `timeout`이 `None`이면 응답이 올 때까지 기다린다. 만료되면 대기 항목을
    /// 제거하고 `Error::Timeout`을 반환한다.
    pub async fn request_with_timeout(
        &self,
        msg_type: &str,
        payload: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let id = self.next_request_id();
        let (tx, rx) = oneshot::channel();
        {
            // close()와 경합하지 않도록 잠금 안에서 다시 확인
            let mut pending = self.pending.lock();
            if self.is_closed() {
                return Err(Error::ChannelClosed(format!(
                    "Cannot send '{}': messenger closed",
                    msg_type
                )));
            }
            pending.insert(
                id,
                PendingRequest {
                    marker: reply_marker(msg_type, &self.reply_suffix),
                    sender: tx,
                },
            );
        }
        // 응답, 타임아웃, 호출자 취소 어느 경우든 대기 항목을 남기지 않는다
        let _guard = PendingGuard {
            pending: &self.pending,
            id,
        };

        self.sink.post(Message::request(msg_type, payload, id))?;
        trace!(request_id = id, msg_type, "Request sent");

        let outcome = match timeout {
            Some(deadline) => match tokio::time::timeout(deadline, rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(request_id = id, msg_type, "Request timed out");
                    return Err(Error::Timeout(format!(
                        "No response to '{}' within {} ms",
                        msg_type,
                        deadline.as_millis()
                    )));
                }
            },
            None => rx.await,
        };

        outcome.unwrap_or_else(|_| {
            Err(Error::ChannelClosed(format!(
                "Response channel for '{}' dropped",
                msg_type
            )))
        })
    }

    /// 단방향 전송
    pub fn notify(&self, msg_type: &str, payload: Option<Value>) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ChannelClosed(format!(
                "Cannot send '{}': messenger closed",
                msg_type
            )));
        }
        self.sink.post(Message::notification(msg_type, payload))
    }

    /// 지속 구독 등록
    pub fn subscribe(
        &self,
        msg_type: &str,
        callback: impl Fn(Value) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.subscription_counter.fetch_add(1, Ordering::SeqCst);
        self.subscriptions
            .lock()
            .entry(msg_type.to_string())
            .or_default()
            .push((id, Arc::new(callback)));

        debug!(msg_type, subscription = id, "Subscribed");
        Subscription {
            id,
            msg_type: msg_type.to_string(),
            table: Arc::downgrade(&self.subscriptions),
        }
    }

    /// 수신 메시지 처리
    pub fn receive(&self, message: Message) {
        let payload = message.payload.clone().unwrap_or(Value::Null);

        if let Some(pending) = self.take_pending(&message) {
            let result = match message.error.clone() {
                Some(err) => Err(Error::from(err)),
                None => Ok(payload.clone()),
            };
            // 요청 쪽이 이미 포기했으면 무시
            let _ = pending.sender.send(result);
        }

        // 콜백 안에서 subscribe/dispose가 가능하도록 잠금 밖에서 호출
        let callbacks: Vec<Callback> = self
            .subscriptions
            .lock()
            .get(&message.msg_type)
            .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();

        for callback in callbacks {
            callback(payload.clone());
        }
    }

    /// 응답 메시지에 해당하는 대기 항목 제거
    ///
    /// requestId가 있으면 ID로, 없으면 marker가 같은 가장 오래된 요청을 찾는다.
    fn take_pending(&self, message: &Message) -> Option<PendingRequest> {
        let mut pending = self.pending.lock();

        let id = match message.request_id {
            Some(id) => {
                let matches = pending
                    .get(&id)
                    .map(|p| p.marker == message.msg_type)
                    .unwrap_or(false);
                if !matches {
                    return None;
                }
                id
            }
            None => pending
                .iter()
                .filter(|(_, p)| p.marker == message.msg_type)
                .map(|(id, _)| *id)
                .min()?,
        };

        trace!(request_id = id, msg_type = %message.msg_type, "Response matched");
        pending.remove(&id)
    }

    /// 모든 대기 요청을 `ChannelClosed`로 실패시키고 이후 전송을 막는다
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let drained: Vec<(u64, PendingRequest)> = self.pending.lock().drain().collect();
        if !drained.is_empty() {
            debug!(count = drained.len(), "Failing pending requests on close");
        }
        for (id, pending) in drained {
            let _ = pending.sender.send(Err(Error::ChannelClosed(format!(
                "Peer closed before responding (request {})",
                id
            ))));
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn subscription_count(&self, msg_type: &str) -> usize {
        self.subscriptions
            .lock()
            .get(msg_type)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn reply_suffix(&self) -> &str {
        &self.reply_suffix
    }
}

impl std::fmt::Debug for Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("reply_suffix", &self.reply_suffix)
            .field("pending", &self.pending_count())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

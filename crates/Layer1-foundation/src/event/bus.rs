//! Event Bus - 리스너 등록과 이벤트 전달, 최근 이력 보관

use super::types::{EventCategory, HelperEvent};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

// ============================================================================
// EventListener Trait
// ============================================================================

/// 이벤트 리스너 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// 이벤트 리스너 trait
#[async_trait]
pub trait EventListener: Send + Sync {
    /// 리스너 이름 (디버깅용)
    fn name(&self) -> &str;

    /// 관심 있는 이벤트 카테고리 (None이면 모든 이벤트)
    fn categories(&self) -> Option<Vec<EventCategory>> {
        None
    }

    async fn on_event(&self, event: &HelperEvent);
}

// ============================================================================
// EventBus
// ============================================================================

/// 보관할 최근 이벤트 수
const HISTORY_SIZE: usize = 100;

/// 이벤트 버스
///
/// ```ignore
/// let bus = EventBus::new();
/// let id = bus.subscribe(Arc::new(MyListener)).await;
/// bus.publish(scan::completed("/src", 3, 12)).await;
/// bus.unsubscribe(id).await;
/// ```
pub struct EventBus {
    listeners: RwLock<HashMap<ListenerId, Arc<dyn EventListener>>>,
    listener_counter: AtomicU64,
    history: RwLock<VecDeque<HelperEvent>>,
    history_size: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_history_size(HISTORY_SIZE)
    }

    fn with_history_size(history_size: usize) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            listener_counter: AtomicU64::new(0),
            history: RwLock::new(VecDeque::new()),
            history_size,
        }
    }

    /// 리스너 등록
    pub async fn subscribe(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        let id = ListenerId(self.listener_counter.fetch_add(1, Ordering::SeqCst));
        debug!(
            listener_name = listener.name(),
            listener_id = %id,
            "Registering event listener"
        );
        self.listeners.write().await.insert(id, listener);
        id
    }

    /// 리스너 해제
    pub async fn unsubscribe(&self, id: ListenerId) -> bool {
        let removed = self.listeners.write().await.remove(&id).is_some();
        if removed {
            debug!(listener_id = %id, "Unregistered event listener");
        }
        removed
    }

    /// 이벤트 발행 (관심 카테고리가 맞는 리스너에게 순서대로 전달)
    pub async fn publish(&self, event: HelperEvent) {
        trace!(
            event_id = %event.id,
            event_type = %event.event_type,
            category = event.category.as_str(),
            "Publishing event"
        );

        {
            let mut history = self.history.write().await;
            history.push_back(event.clone());
            while history.len() > self.history_size {
                history.pop_front();
            }
        }

        let listeners = self.listeners.read().await;
        for listener in listeners.values() {
            let wanted = listener
                .categories()
                .map_or(true, |cats| cats.contains(&event.category));
            if wanted {
                listener.on_event(&event).await;
            }
        }
    }

    /// 최근 이벤트 히스토리 (최신순)
    pub async fn history(&self, limit: Option<usize>) -> Vec<HelperEvent> {
        let history = self.history.read().await;
        let limit = limit.unwrap_or(history.len());
        history.iter().rev().take(limit).cloned().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

//! Event System - 도메인 이벤트 발행/구독
//!
//! ```text
//! DispatchRouter / OAuth callback
//!         │ publish(event)
//!         ▼
//!     EventBus ──► Listener 1 (log) ──► Listener N
//! ```
//!
//! 결과 저장소(ResultStore)의 변경 알림은 동기식 observer로 따로 처리되며
//! 이 버스를 거치지 않는다.

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventListener, ListenerId};

pub use types::{
    auth, env, panel, scan, EventCategory, EventId, EventSeverity, HelperEvent,
};

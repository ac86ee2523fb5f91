//! Event Types - 도메인 이벤트 타입 정의
//!
//! 스캔, 환경 설정, 인증, 패널 수명주기에서 발생하는 이벤트

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Event ID
// ============================================================================

/// 이벤트 고유 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event Category
// ============================================================================

/// 이벤트 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// 권한 스캔
    Scan,
    /// 환경(env/currentEnv) 변경
    Environment,
    /// OAuth 토큰
    Auth,
    /// 패널 생성/해제
    Panel,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Environment => "environment",
            Self::Auth => "auth",
            Self::Panel => "panel",
        }
    }
}

// ============================================================================
// Event Severity
// ============================================================================

/// 이벤트 심각도
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

// ============================================================================
// HelperEvent
// ============================================================================

/// 도메인 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelperEvent {
    pub id: EventId,

    /// 이벤트 타입 (예: "scan.completed", "env.selected")
    pub event_type: String,

    pub category: EventCategory,

    pub severity: EventSeverity,

    pub timestamp: DateTime<Utc>,

    pub data: Value,
}

impl HelperEvent {
    pub fn new(event_type: impl Into<String>, category: EventCategory) -> Self {
        Self {
            id: EventId::new(),
            event_type: event_type.into(),
            category,
            severity: EventSeverity::Info,
            timestamp: Utc::now(),
            data: Value::Null,
        }
    }

    pub fn with_severity(mut self, severity: EventSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

// ============================================================================
// 사전 정의된 이벤트 타입들
// ============================================================================

/// 스캔 이벤트
pub mod scan {
    use super::*;

    pub fn completed(root: &str, files: usize, permissions: usize) -> HelperEvent {
        HelperEvent::new("scan.completed", EventCategory::Scan).with_data(serde_json::json!({
            "root": root,
            "files": files,
            "permissions": permissions,
        }))
    }

    pub fn failed(root: &str, error: &str) -> HelperEvent {
        HelperEvent::new("scan.failed", EventCategory::Scan)
            .with_severity(EventSeverity::Error)
            .with_data(serde_json::json!({
                "root": root,
                "error": error,
            }))
    }
}

/// 환경 이벤트
pub mod env {
    use super::*;

    pub fn created(name: &str, host: &str, overwritten: bool) -> HelperEvent {
        HelperEvent::new("env.created", EventCategory::Environment).with_data(serde_json::json!({
            "name": name,
            "host": host,
            "overwritten": overwritten,
        }))
    }

    pub fn selected(name: &str) -> HelperEvent {
        HelperEvent::new("env.selected", EventCategory::Environment)
            .with_data(serde_json::json!({ "name": name }))
    }
}

/// 인증 이벤트
pub mod auth {
    use super::*;

    /// 토큰 값 자체는 싣지 않는다
    pub fn token_updated(env_name: &str) -> HelperEvent {
        HelperEvent::new("auth.token_updated", EventCategory::Auth)
            .with_data(serde_json::json!({ "env": env_name }))
    }
}

/// 패널 이벤트
pub mod panel {
    use super::*;

    pub fn opened(kind: &str, created: bool) -> HelperEvent {
        HelperEvent::new("panel.opened", EventCategory::Panel).with_data(serde_json::json!({
            "kind": kind,
            "created": created,
        }))
    }

    pub fn disposed(kind: &str) -> HelperEvent {
        HelperEvent::new("panel.disposed", EventCategory::Panel)
            .with_data(serde_json::json!({ "kind": kind }))
    }
}

//! # hzero-foundation
//!
//! Foundation layer for HZERO Helper:
//! - Error: 공통 에러 타입
//! - Permission: 권한 레코드 / 스캔 결과 데이터 모델
//! - Config: 통합 설정 (HelperConfig) + 호스트 설정 저장소 (env, currentEnv)
//! - Storage: JsonStore (범용 JSON 파일)
//! - Event: 도메인 이벤트 버스
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  hzero-cli (host)                                        │
//! │                     │                                   │
//! │                     ▼                                   │
//! │  hzero-core: Scanner → ResultStore ← DispatchRouter     │
//! │                                  ▲         │            │
//! │                       Messenger ─┘ (NDJSON messages)    │
//! │                     │                                   │
//! │                     ▼                                   │
//! │  hzero-foundation: model · config · storage · events    │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod permission;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Permission (데이터 모델)
// ============================================================================
pub use permission::{FileScanResult, PermissionRecord, ScanResultSet};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    ConfigStore, EnvironmentRecord, HelperConfig, JsonConfigStore, MemoryConfigStore,
    MessagingConfig, OAuthConfig, ScanFailurePolicy, ScannerConfig, Settings, HELPER_CONFIG_FILE,
    KEY_CURRENT_ENV, KEY_ENV, SETTINGS_FILE,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::JsonStore;

// ============================================================================
// Event (이벤트 시스템)
// ============================================================================
pub use event::{
    EventBus, EventCategory, EventId, EventListener, EventSeverity, HelperEvent, ListenerId,
};

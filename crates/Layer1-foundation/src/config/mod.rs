//! Config - 통합 설정 관리
//!
//! - `helper.rs` - HelperConfig (스캐너/메시징/OAuth 설정, config.json)
//! - `settings.rs` - 호스트 설정 저장소 (env/currentEnv, settings.json)

mod helper;
mod settings;

pub use helper::{
    HelperConfig, MessagingConfig, OAuthConfig, ScanFailurePolicy, ScannerConfig,
    HELPER_CONFIG_FILE,
};
pub use settings::{
    ConfigStore, EnvironmentRecord, JsonConfigStore, MemoryConfigStore, Settings, KEY_CURRENT_ENV,
    KEY_ENV, SETTINGS_FILE,
};

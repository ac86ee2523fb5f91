//! Helper Config - 통합 설정
//!
//! 스캐너, 메시지 상관(correlation), OAuth 관련 설정을 한 파일로 관리

use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 설정 파일명
pub const HELPER_CONFIG_FILE: &str = "config.json";

// ============================================================================
// Helper Config (통합)
// ============================================================================

/// HZERO Helper 통합 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelperConfig {
    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub messaging: MessagingConfig,

    #[serde(default)]
    pub oauth: OAuthConfig,
}

impl HelperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let global = JsonStore::global().ok();
        let project = JsonStore::current_project().ok();
        Self::load_from(global.as_ref(), project.as_ref())
    }

    /// 지정한 저장소들에서 병합 로드 (뒤쪽이 우선)
    pub fn load_from(global: Option<&JsonStore>, project: Option<&JsonStore>) -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Some(store) = global {
            if let Some(global_config) = store.load_optional::<HelperConfig>(HELPER_CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        if let Some(store) = project {
            if let Some(project_config) = store.load_optional::<HelperConfig>(HELPER_CONFIG_FILE)? {
                config.merge(project_config);
            }
        }

        Ok(config)
    }

    pub fn save(&self, store: &JsonStore) -> Result<()> {
        store.save(HELPER_CONFIG_FILE, self)
    }

    /// 다른 설정 병합 (기본값이 아닌 값만 덮어씀)
    pub fn merge(&mut self, other: HelperConfig) {
        self.scanner.merge(other.scanner);
        self.messaging.merge(other.messaging);
        self.oauth.merge(other.oauth);
    }
}

// ============================================================================
// Scanner Config
// ============================================================================

/// 파일 하나를 읽지 못했을 때의 처리 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanFailurePolicy {
    /// 스캔 전체 중단 (진행 중인 결과 폐기)
    #[default]
    Abort,
    /// 경고 로그 후 해당 파일/디렉토리만 건너뜀
    Skip,
}

/// 스캐너 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerConfig {
    /// 대상 파일 확장자 (점 제외)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// 배열 리터럴 바로 앞에 오는 선언 앵커
    #[serde(default = "default_anchor")]
    pub anchor: String,

    #[serde(default)]
    pub failure_policy: ScanFailurePolicy,
}

fn default_extension() -> String {
    "tsx".to_string()
}

fn default_anchor() -> String {
    "permissionList=".to_string()
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            anchor: default_anchor(),
            failure_policy: ScanFailurePolicy::default(),
        }
    }
}

impl ScannerConfig {
    fn merge(&mut self, other: ScannerConfig) {
        if other.extension != default_extension() {
            self.extension = other.extension;
        }
        if other.anchor != default_anchor() {
            self.anchor = other.anchor;
        }
        if other.failure_policy != ScanFailurePolicy::default() {
            self.failure_policy = other.failure_policy;
        }
    }
}

// ============================================================================
// Messaging Config
// ============================================================================

/// 메시지 상관 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingConfig {
    /// 단발성 요청의 응답 대기 시간 (밀리초, 0이면 무제한)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// 응답 메시지 타입에 붙는 접미사
    #[serde(default = "default_reply_suffix")]
    pub reply_suffix: String,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_reply_suffix() -> String {
    "_Response".to_string()
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            reply_suffix: default_reply_suffix(),
        }
    }
}

impl MessagingConfig {
    /// 요청 타임아웃 (None이면 무제한 대기)
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.request_timeout_ms))
        }
    }

    fn merge(&mut self, other: MessagingConfig) {
        if other.request_timeout_ms != default_request_timeout_ms() {
            self.request_timeout_ms = other.request_timeout_ms;
        }
        if other.reply_suffix != default_reply_suffix() {
            self.reply_suffix = other.reply_suffix;
        }
    }
}

// ============================================================================
// OAuth Config
// ============================================================================

/// OAuth implicit flow 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    #[serde(default = "default_authorize_path")]
    pub authorize_path: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// 리다이렉트 URI에서 받아들일 경로
    #[serde(default = "default_callback_path")]
    pub callback_path: String,
}

fn default_authorize_path() -> String {
    "/oauth/oauth/authorize".to_string()
}

fn default_client_id() -> String {
    "localhost".to_string()
}

fn default_redirect_uri() -> String {
    "vscode://mahoo12138.vscode-hzero-helper/oauth/callback".to_string()
}

fn default_callback_path() -> String {
    "/oauth/callback".to_string()
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorize_path: default_authorize_path(),
            client_id: default_client_id(),
            redirect_uri: default_redirect_uri(),
            callback_path: default_callback_path(),
        }
    }
}

impl OAuthConfig {
    fn merge(&mut self, other: OAuthConfig) {
        if other.authorize_path != default_authorize_path() {
            self.authorize_path = other.authorize_path;
        }
        if other.client_id != default_client_id() {
            self.client_id = other.client_id;
        }
        if other.redirect_uri != default_redirect_uri() {
            self.redirect_uri = other.redirect_uri;
        }
        if other.callback_path != default_callback_path() {
            self.callback_path = other.callback_path;
        }
    }
}

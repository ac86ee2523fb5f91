//! Error types for HZERO Helper
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// HZERO Helper 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // ========================================================================
    // 스캔 관련
    // ========================================================================
    #[error("Scan error: {0}")]
    Scan(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // ========================================================================
    // 메시지 관련
    // ========================================================================
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// 상대편(back-end)이 에러 응답을 보낸 경우
    #[error("Remote error ({kind}): {message}")]
    Remote { kind: String, message: String },

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 응답 payload에 실리는 에러 종류 태그
    pub fn kind(&self) -> &str {
        match self {
            Error::Config(_) => "config",
            Error::Validation(_) => "validation",
            Error::Scan(_) => "scan",
            Error::Parse(_) => "parse",
            Error::Timeout(_) => "timeout",
            Error::ChannelClosed(_) => "channel_closed",
            Error::UnknownOperation(_) => "unknown_operation",
            Error::Remote { kind, .. } => kind,
            Error::NotFound(_) => "not_found",
            Error::InvalidInput(_) => "invalid_input",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Url(_) => "url",
            Error::Internal(_) => "internal",
        }
    }

    /// 사용자에게 그대로 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotFound(_) | Error::InvalidInput(_) | Error::Scan(_)
        )
    }

    /// Remote 에러 생성 헬퍼
    pub fn remote(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Remote {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

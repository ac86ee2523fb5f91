//! Host Services - 호스트(에디터/CLI)가 제공하는 UI 기본 기능
//!
//! 라우터와 환경 서비스는 이 trait만 호출한다. 폴더 선택, 입력 프롬프트,
//! 확인 대화상자, 알림, 외부 URL 열기가 여기에 해당한다.

use crate::panel::PanelKind;
use async_trait::async_trait;
use hzero_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;

/// 알림 수준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    #[default]
    Info,
    Warning,
    Error,
}

impl FromStr for MessageLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "info" | "information" => Ok(MessageLevel::Info),
            "warn" | "warning" => Ok(MessageLevel::Warning),
            "error" => Ok(MessageLevel::Error),
            other => Err(Error::InvalidInput(format!("Unknown message level: {}", other))),
        }
    }
}

/// 빠른 선택 항목
///
/// `label`/`value` 외의 필드는 그대로 보존된다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickPickItem {
    pub label: String,

    #[serde(default)]
    pub value: Value,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl QuickPickItem {
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        Self {
            label: label.into(),
            value,
            extra: serde_json::Map::new(),
        }
    }
}

/// 입력값 검증 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputValidation {
    /// 공백 제외 후 비어있으면 안 됨
    NonEmpty,
    /// http/https 절대 URL
    Url,
}

impl InputValidation {
    /// 검증 실패 시 사용자에게 보여줄 메시지
    pub fn check(&self, input: &str) -> Option<String> {
        match self {
            InputValidation::NonEmpty if input.trim().is_empty() => {
                Some("Value must not be empty".to_string())
            }
            InputValidation::NonEmpty => None,
            InputValidation::Url => hzero_foundation::EnvironmentRecord::validate_host(input)
                .err()
                .map(|_| "Please enter a valid URL".to_string()),
        }
    }
}

/// 입력 프롬프트 요청
#[derive(Debug, Clone)]
pub struct InputRequest {
    pub prompt: String,
    pub placeholder: Option<String>,
    pub validation: InputValidation,
}

impl InputRequest {
    pub fn new(prompt: impl Into<String>, validation: InputValidation) -> Self {
        Self {
            prompt: prompt.into(),
            placeholder: None,
            validation,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// 호스트 UI 기능
///
/// 사용자가 취소한 경우는 에러가 아니라 `None`/`false`로 표현한다.
#[async_trait]
pub trait HostServices: Send + Sync {
    /// 스캔할 폴더 선택
    async fn pick_folder(&self) -> Result<Option<PathBuf>>;

    async fn show_message(&self, level: MessageLevel, text: &str) -> Result<()>;

    async fn show_quick_pick(
        &self,
        items: Vec<QuickPickItem>,
        placeholder: Option<&str>,
    ) -> Result<Option<QuickPickItem>>;

    /// 입력 프롬프트 (검증을 통과한 값만 반환)
    async fn prompt_input(&self, request: InputRequest) -> Result<Option<String>>;

    async fn confirm(&self, message: &str) -> Result<bool>;

    async fn open_external(&self, url: &url::Url) -> Result<()>;

    /// 패널 표시 요청 (`created`면 새로 만든 패널)
    async fn reveal_panel(&self, kind: PanelKind, created: bool) -> Result<()> {
        let _ = (kind, created);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! 테스트용 스크립트 호스트

    use super::{HostServices, InputRequest, MessageLevel, QuickPickItem};
    use crate::panel::PanelKind;
    use async_trait::async_trait;
    use hzero_foundation::Result;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::path::PathBuf;

    #[derive(Default)]
    pub struct ScriptedHost {
        pub folder: Mutex<Option<PathBuf>>,
        pub inputs: Mutex<VecDeque<Option<String>>>,
        pub confirm_answer: Mutex<bool>,
        pub pick_index: Mutex<Option<usize>>,
        pub messages: Mutex<Vec<(MessageLevel, String)>>,
        pub opened: Mutex<Vec<String>>,
        pub revealed: Mutex<Vec<(PanelKind, bool)>>,
        /// 알림 표시가 실패하는 호스트 흉내
        pub messages_fail: Mutex<bool>,
    }

    impl ScriptedHost {
        pub fn with_inputs(inputs: &[Option<&str>]) -> Self {
            let host = Self::default();
            *host.inputs.lock() = inputs.iter().map(|i| i.map(str::to_string)).collect();
            host
        }
    }

    #[async_trait]
    impl HostServices for ScriptedHost {
        async fn pick_folder(&self) -> Result<Option<PathBuf>> {
            Ok(self.folder.lock().clone())
        }

        async fn show_message(&self, level: MessageLevel, text: &str) -> Result<()> {
            if *self.messages_fail.lock() {
                return Err(hzero_foundation::Error::Internal(
                    "notification surface unavailable".to_string(),
                ));
            }
            self.messages.lock().push((level, text.to_string()));
            Ok(())
        }

        async fn show_quick_pick(
            &self,
            items: Vec<QuickPickItem>,
            _placeholder: Option<&str>,
        ) -> Result<Option<QuickPickItem>> {
            Ok(self.pick_index.lock().and_then(|i| items.get(i).cloned()))
        }

        async fn prompt_input(&self, _request: InputRequest) -> Result<Option<String>> {
            Ok(self.inputs.lock().pop_front().flatten())
        }

        async fn confirm(&self, _message: &str) -> Result<bool> {
            Ok(*self.confirm_answer.lock())
        }

        async fn open_external(&self, url: &url::Url) -> Result<()> {
            self.opened.lock().push(url.to_string());
            Ok(())
        }

        async fn reveal_panel(&self, kind: PanelKind, created: bool) -> Result<()> {
            self.revealed.lock().push((kind, created));
            Ok(())
        }
    }
}

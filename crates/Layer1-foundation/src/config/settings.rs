//! Host Settings - 호스트가 관리하는 설정 저장소
//!
//! 고정 키(`env`, `currentEnv`)에 대해 값 전체를 읽고/쓰는 방식으로 동작한다.
//! 부분 필드 갱신은 없다.

use crate::storage::JsonStore;
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// 설정 파일명
pub const SETTINGS_FILE: &str = "settings.json";

/// 환경 목록 키
pub const KEY_ENV: &str = "env";

/// 현재 선택된 환경 이름 키
pub const KEY_CURRENT_ENV: &str = "currentEnv";

// ============================================================================
// EnvironmentRecord
// ============================================================================

/// 접속 환경 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    pub name: String,

    pub host: String,

    /// OAuth 콜백으로 받은 access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl EnvironmentRecord {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            token: None,
        }
    }

    /// 환경 이름 검증 (공백 제외 후 비어있으면 안 됨)
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::Validation(
                "Environment name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// 호스트 URL 검증 (http/https 절대 URL)
    pub fn validate_host(host: &str) -> Result<url::Url> {
        let parsed = url::Url::parse(host.trim())
            .map_err(|e| Error::Validation(format!("Invalid host URL '{}': {}", host, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(Error::Validation(format!(
                "Unsupported URL scheme '{}' for host '{}'",
                other, host
            ))),
        }
    }
}

// ============================================================================
// ConfigStore trait
// ============================================================================

/// 호스트 설정 저장소
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// 키의 값 전체 조회
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// 키의 값 전체 갱신 (None이면 삭제)
    async fn update(&self, key: &str, value: Option<Value>) -> Result<()>;
}

/// 메모리 설정 저장소 (테스트, 임시 세션용)
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn update(&self, key: &str, value: Option<Value>) -> Result<()> {
        let mut values = self.values.lock();
        match value {
            Some(v) => {
                values.insert(key.to_string(), v);
            }
            None => {
                values.remove(key);
            }
        }
        Ok(())
    }
}

/// JSON 파일 설정 저장소 (settings.json)
#[derive(Debug)]
pub struct JsonConfigStore {
    store: JsonStore,
    // read-modify-write 직렬화
    write_lock: Mutex<()>,
}

impl JsonConfigStore {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// 글로벌 설정 디렉토리 사용
    pub fn global() -> Result<Self> {
        Ok(Self::new(JsonStore::global()?))
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        Ok(self
            .store
            .load_optional::<Map<String, Value>>(SETTINGS_FILE)?
            .unwrap_or_default())
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    async fn update(&self, key: &str, value: Option<Value>) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut values = self.read_all()?;
        match value {
            Some(v) => {
                values.insert(key.to_string(), v);
            }
            None => {
                values.remove(key);
            }
        }
        debug!(key, file = %self.store.file_path(SETTINGS_FILE).display(), "Updating setting");
        self.store.save(SETTINGS_FILE, &values)
    }
}

// ============================================================================
// Settings (타입 접근자)
// ============================================================================

/// `ConfigStore` 위의 타입 안전 접근자
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn ConfigStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// 메모리 저장소 기반 (테스트용)
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryConfigStore::new()))
    }

    /// 원시 값 조회
    pub async fn get_value(&self, key: &str) -> Result<Option<Value>> {
        self.store.get(key).await
    }

    /// 원시 값 갱신
    pub async fn set_value(&self, key: &str, value: Option<Value>) -> Result<()> {
        self.store.update(key, value).await
    }

    /// 환경 목록
    pub async fn environments(&self) -> Result<Vec<EnvironmentRecord>> {
        match self.store.get(KEY_ENV).await? {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    /// 환경 목록 전체 저장
    pub async fn save_environments(&self, envs: &[EnvironmentRecord]) -> Result<()> {
        self.store
            .update(KEY_ENV, Some(serde_json::to_value(envs)?))
            .await
    }

    /// 현재 선택된 환경 이름
    pub async fn current_environment_name(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(KEY_CURRENT_ENV)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty()))
    }

    /// 현재 환경 선택
    pub async fn set_current_environment(&self, name: &str) -> Result<()> {
        self.store
            .update(KEY_CURRENT_ENV, Some(Value::String(name.to_string())))
            .await
    }

    /// 현재 선택된 환경 레코드
    pub async fn current_environment(&self) -> Result<Option<EnvironmentRecord>> {
        let Some(name) = self.current_environment_name().await? else {
            return Ok(None);
        };
        Ok(self
            .environments()
            .await?
            .into_iter()
            .find(|e| e.name == name))
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings").finish_non_exhaustive()
    }
}

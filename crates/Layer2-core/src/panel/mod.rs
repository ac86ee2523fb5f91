//! Panel Registry - 패널 종류별 0개 또는 1개 인스턴스 관리
//!
//! 패널 종류마다 전역 "현재 인스턴스"를 두는 대신 레지스트리 객체가
//! 생성/표시/해제를 담당한다. 라우터와 OAuth 콜백 처리는 같은 레지스트리를
//! 공유한다.

use crate::message::{Message, MessageSink};
use hzero_foundation::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// 패널 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    /// 환경 설정 사이드 뷰
    ConfigView,
    /// 권한 관리 메인 패널
    PermissionManage,
    /// OAuth 로그인 패널
    #[serde(rename = "oauth")]
    OAuth,
}

impl PanelKind {
    pub const ALL: [PanelKind; 3] = [
        PanelKind::ConfigView,
        PanelKind::PermissionManage,
        PanelKind::OAuth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PanelKind::ConfigView => "config_view",
            PanelKind::PermissionManage => "permission_manage",
            PanelKind::OAuth => "oauth",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PanelKind::ConfigView => "HZERO Config",
            PanelKind::PermissionManage => "HZERO Permission",
            PanelKind::OAuth => "Hzero OAuth",
        }
    }
}

impl std::fmt::Display for PanelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "config_view" | "config" => Ok(PanelKind::ConfigView),
            "permission_manage" | "permission" | "hzero" => Ok(PanelKind::PermissionManage),
            "oauth" => Ok(PanelKind::OAuth),
            other => Err(Error::InvalidInput(format!("Unknown panel kind: {}", other))),
        }
    }
}

// ============================================================================
// PanelHandle
// ============================================================================

/// 열린 패널 하나
#[derive(Clone)]
pub struct PanelHandle {
    pub kind: PanelKind,

    /// 인스턴스 ID (같은 종류를 다시 열면 바뀜)
    pub instance: u64,

    /// 패널의 메시지 채널 (연결 전이면 None)
    sink: Option<Arc<dyn MessageSink>>,
}

impl PanelHandle {
    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }
}

impl std::fmt::Debug for PanelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelHandle")
            .field("kind", &self.kind)
            .field("instance", &self.instance)
            .field("has_sink", &self.has_sink())
            .finish()
    }
}

// ============================================================================
// PanelRegistry
// ============================================================================

/// 패널 레지스트리
#[derive(Default)]
pub struct PanelRegistry {
    panels: Mutex<HashMap<PanelKind, PanelHandle>>,
    instance_counter: AtomicU64,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이미 열려 있으면 그대로 반환, 없으면 생성 (`created` 여부 함께 반환)
    pub fn create_or_reveal(&self, kind: PanelKind) -> (PanelHandle, bool) {
        let mut panels = self.panels.lock();
        if let Some(handle) = panels.get(&kind) {
            trace!(panel = %kind, "Revealing existing panel");
            return (handle.clone(), false);
        }

        let handle = PanelHandle {
            kind,
            instance: self.instance_counter.fetch_add(1, Ordering::SeqCst),
            sink: None,
        };
        panels.insert(kind, handle.clone());
        debug!(panel = %kind, instance = handle.instance, "Panel created");
        (handle, true)
    }

    /// 열린 패널에 메시지 채널 연결
    pub fn attach_sink(&self, kind: PanelKind, sink: Arc<dyn MessageSink>) -> Result<()> {
        let mut panels = self.panels.lock();
        let handle = panels
            .get_mut(&kind)
            .ok_or_else(|| Error::NotFound(format!("Panel '{}' is not open", kind)))?;
        handle.sink = Some(sink);
        Ok(())
    }

    pub fn get(&self, kind: PanelKind) -> Option<PanelHandle> {
        self.panels.lock().get(&kind).cloned()
    }

    pub fn is_open(&self, kind: PanelKind) -> bool {
        self.panels.lock().contains_key(&kind)
    }

    /// 패널 해제 (열려 있었으면 true)
    pub fn dispose(&self, kind: PanelKind) -> bool {
        let removed = self.panels.lock().remove(&kind).is_some();
        if removed {
            debug!(panel = %kind, "Panel disposed");
        }
        removed
    }

    /// 패널로 메시지 전송
    ///
    /// 패널이 닫혀 있거나 채널이 연결되지 않았으면 `Ok(false)`.
    pub fn post_to(&self, kind: PanelKind, message: Message) -> Result<bool> {
        let sink = self.panels.lock().get(&kind).and_then(|h| h.sink.clone());
        match sink {
            Some(sink) => {
                sink.post(message)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn open_panels(&self) -> Vec<PanelKind> {
        PanelKind::ALL
            .into_iter()
            .filter(|kind| self.is_open(*kind))
            .collect()
    }
}

impl std::fmt::Debug for PanelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelRegistry")
            .field("open", &self.open_panels())
            .finish()
    }
}

//! Result Store - 최신 스캔 결과 보관 및 트리 뷰 제공
//!
//! 결과 집합은 `Arc`로 통째로 교체(copy-on-replace)되므로 읽는 쪽은 항상
//! 이전 집합 전체 또는 새 집합 전체만 본다. 교체가 끝난 뒤 observer들에게
//! 정확히 한 번씩 알린다.

mod tree;

pub use tree::{ExportFile, ExportPermission, TreeNode};

use hzero_foundation::ScanResultSet;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// observer 등록 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Arc<dyn Fn() + Send + Sync>;

/// 스캔 결과 저장소
pub struct ResultStore {
    current: RwLock<Arc<ScanResultSet>>,
    observers: Mutex<Vec<(ObserverId, Observer)>>,
    observer_counter: AtomicU64,
}

impl ResultStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(ScanResultSet::new())),
            observers: Mutex::new(Vec::new()),
            observer_counter: AtomicU64::new(0),
        }
    }

    /// 결과 집합 교체 후 모든 observer에게 알림
    pub fn replace(&self, results: ScanResultSet) {
        let files = results.len();
        *self.current.write() = Arc::new(results);

        // 알림 중 등록/해제가 가능하도록 복사본으로 순회
        let observers: Vec<Observer> = self
            .observers
            .lock()
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();

        debug!(files, observers = observers.len(), "Result store replaced");
        for observer in observers {
            observer();
        }
    }

    /// 변경 알림 등록
    pub fn observe(&self, observer: impl Fn() + Send + Sync + 'static) -> ObserverId {
        let id = ObserverId(self.observer_counter.fetch_add(1, Ordering::SeqCst));
        self.observers.lock().push((id, Arc::new(observer)));
        id
    }

    pub fn unobserve(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    /// 현재 결과 집합 스냅샷
    pub fn snapshot(&self) -> Arc<ScanResultSet> {
        Arc::clone(&self.current.read())
    }

    pub fn has_data(&self) -> bool {
        !self.current.read().is_empty()
    }

    /// 계층 접근자
    ///
    /// - `None`: 파일 노드 목록
    /// - `File`: 해당 파일의 권한 노드 목록
    /// - `Permission`: Type / Meaning 상세 노드 두 개
    /// - `Detail`: 빈 목록
    pub fn children(&self, parent: Option<&TreeNode>) -> Vec<TreeNode> {
        match parent {
            None => self.snapshot().files().iter().map(TreeNode::file).collect(),
            Some(TreeNode::File { path, .. }) => {
                let snapshot = self.snapshot();
                match snapshot.find(path) {
                    Some(file) => file
                        .permissions
                        .iter()
                        .map(|p| TreeNode::Permission {
                            path: file.path.clone(),
                            permission: p.clone(),
                        })
                        .collect(),
                    None => Vec::new(),
                }
            }
            Some(TreeNode::Permission { path, permission }) => TreeNode::details(path, permission),
            Some(TreeNode::Detail { .. }) => Vec::new(),
        }
    }

    /// 전체 파일/권한을 평탄화한 목록 (lazy 확장 없이 한 번에)
    pub fn list_for_export(&self) -> Vec<ExportFile> {
        self.snapshot().files().iter().map(ExportFile::from).collect()
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("files", &self.current.read().len())
            .field("observers", &self.observers.lock().len())
            .finish()
    }
}

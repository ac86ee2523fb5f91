//! 권한 레코드 / 스캔 결과 타입 정의

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// PermissionRecord
// ============================================================================

/// 소스 리터럴 하나에서 추출한 권한 정보
///
/// 세 필드 중 하나 이상이 비어있지 않아야 결과에 포함된다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    /// 권한 코드 (예: "hzero.demo.create")
    pub code: String,

    /// 권한 분류 (소스의 `type:` 필드, 예: "button")
    #[serde(rename = "type")]
    pub kind: String,

    /// 설명
    pub meaning: String,
}

impl PermissionRecord {
    pub fn new(
        code: impl Into<String>,
        kind: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            kind: kind.into(),
            meaning: meaning.into(),
        }
    }

    /// 세 필드가 모두 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.kind.is_empty() && self.meaning.is_empty()
    }
}

// ============================================================================
// FileScanResult
// ============================================================================

/// 파일 하나에서 추출된 권한 목록 (소스 등장 순서 유지)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileScanResult {
    /// 파일 절대 경로 (결과 집합 내 고유 키)
    #[serde(rename = "filePath")]
    pub path: PathBuf,

    pub permissions: Vec<PermissionRecord>,
}

impl FileScanResult {
    pub fn new(path: impl Into<PathBuf>, permissions: Vec<PermissionRecord>) -> Self {
        Self {
            path: path.into(),
            permissions,
        }
    }

    /// 파일 이름 (트리 라벨용)
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    /// 확장자를 뺀 파일 이름
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name())
    }
}

// ============================================================================
// ScanResultSet
// ============================================================================

/// 한 번의 스캔 결과 전체
///
/// 권한이 하나 이상 나온 파일만 포함한다. 다음 스캔이 통째로 대체한다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanResultSet {
    files: Vec<FileScanResult>,
}

impl ScanResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 파일 결과 추가 (권한이 없는 파일은 무시)
    pub fn push(&mut self, result: FileScanResult) {
        if !result.permissions.is_empty() {
            self.files.push(result);
        }
    }

    pub fn files(&self) -> &[FileScanResult] {
        &self.files
    }

    pub fn find(&self, path: &Path) -> Option<&FileScanResult> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// 전체 권한 레코드 수
    pub fn permission_count(&self) -> usize {
        self.files.iter().map(|f| f.permissions.len()).sum()
    }
}

impl From<Vec<FileScanResult>> for ScanResultSet {
    fn from(files: Vec<FileScanResult>) -> Self {
        let mut set = Self::new();
        for file in files {
            set.push(file);
        }
        set
    }
}

impl IntoIterator for ScanResultSet {
    type Item = FileScanResult;
    type IntoIter = std::vec::IntoIter<FileScanResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

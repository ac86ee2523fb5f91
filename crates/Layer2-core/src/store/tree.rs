//! Tree Model - 파일 → 권한 → 상세 3단계 트리 노드

use hzero_foundation::{FileScanResult, PermissionRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 트리 노드 (변형마다 필요한 필드만 가진다)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TreeNode {
    /// 루트 아래 파일 노드
    File { label: String, path: PathBuf },

    /// 파일 아래 권한 노드 (라벨은 code)
    Permission {
        path: PathBuf,
        permission: PermissionRecord,
    },

    /// 권한 아래 상세 라인 (Type / Meaning)
    Detail { label: String, path: PathBuf },
}

impl TreeNode {
    pub(crate) fn file(result: &FileScanResult) -> Self {
        TreeNode::File {
            label: result.file_name(),
            path: result.path.clone(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TreeNode::File { label, .. } | TreeNode::Detail { label, .. } => label,
            TreeNode::Permission { permission, .. } => &permission.code,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            TreeNode::File { path, .. }
            | TreeNode::Permission { path, .. }
            | TreeNode::Detail { path, .. } => path,
        }
    }

    /// 펼칠 수 있는 노드인지 (상세 노드만 leaf)
    pub fn is_expandable(&self) -> bool {
        !matches!(self, TreeNode::Detail { .. })
    }

    /// 권한 노드의 상세 라인 두 개
    pub(crate) fn details(path: &Path, permission: &PermissionRecord) -> Vec<TreeNode> {
        vec![
            TreeNode::Detail {
                label: format!("Type: {}", permission.kind),
                path: path.to_path_buf(),
            },
            TreeNode::Detail {
                label: format!("Meaning: {}", permission.meaning),
                path: path.to_path_buf(),
            },
        ]
    }
}

// ============================================================================
// Export (평탄화된 전체 목록)
// ============================================================================

/// 내보내기용 파일 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    /// 파일 이름
    pub label: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub item_type: String,
    /// 확장자 없는 파일 이름
    pub code: String,
    pub children: Vec<ExportPermission>,
}

/// 내보내기용 권한 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPermission {
    pub label: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub code: String,
    pub meaning: String,
    pub permission_type: String,
}

impl From<&FileScanResult> for ExportFile {
    fn from(result: &FileScanResult) -> Self {
        Self {
            label: result.file_name(),
            path: result.path.clone(),
            item_type: "file".to_string(),
            code: result.file_stem(),
            children: result
                .permissions
                .iter()
                .map(|p| ExportPermission {
                    label: p.code.clone(),
                    item_type: "permission".to_string(),
                    code: p.code.clone(),
                    meaning: p.meaning.clone(),
                    permission_type: p.kind.clone(),
                })
                .collect(),
        }
    }
}

//! Directory Scanner - 디렉토리 재귀 스캔
//!
//! 루트 디렉토리를 재귀적으로 돌며 대상 확장자 파일을 읽고, 선언 앵커
//! (`permissionList={[...]}`)마다 LiteralParser를 적용해 결과를 모은다.
//! 파일은 하나씩 순차 처리한다.

use super::literal::{LiteralParser, RegexLiteralParser};
use futures::future::BoxFuture;
use hzero_foundation::{
    Error, FileScanResult, PermissionRecord, Result, ScanFailurePolicy, ScanResultSet,
    ScannerConfig,
};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 디렉토리 스캐너
#[derive(Clone)]
pub struct DirectoryScanner {
    parser: Arc<dyn LiteralParser>,

    /// 파일 이름 접미사 (예: ".tsx")
    suffix: String,

    /// 앵커 + 배열 리터럴 패턴
    declaration_re: Regex,

    failure_policy: ScanFailurePolicy,
}

impl DirectoryScanner {
    /// 설정으로 스캐너 생성 (기본 정규식 파서 사용)
    pub fn new(config: &ScannerConfig) -> Result<Self> {
        let pattern = format!(r"{}\{{(\[[^\]]+\])\}}", regex::escape(&config.anchor));
        let declaration_re = Regex::new(&pattern)
            .map_err(|e| Error::Config(format!("Invalid scanner anchor '{}': {}", config.anchor, e)))?;

        let extension = config.extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(Error::Config("Scanner extension must not be empty".to_string()));
        }

        Ok(Self {
            parser: Arc::new(RegexLiteralParser::new()),
            suffix: format!(".{}", extension),
            declaration_re,
            failure_policy: config.failure_policy,
        })
    }

    /// 파서 교체
    pub fn with_parser(mut self, parser: Arc<dyn LiteralParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_failure_policy(mut self, policy: ScanFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// 루트 디렉토리 스캔
    ///
    /// `Abort` 정책에서는 첫 I/O 에러에서 중단하고 모은 결과를 버린다.
    pub async fn scan(&self, root: &Path) -> Result<ScanResultSet> {
        debug!(root = %root.display(), suffix = %self.suffix, "Scanning directory");

        let mut results = ScanResultSet::new();
        self.walk(root, true, &mut results).await?;

        info!(
            root = %root.display(),
            files = results.len(),
            permissions = results.permission_count(),
            "Scan finished"
        );
        Ok(results)
    }

    /// 텍스트 하나에서 모든 선언을 찾아 레코드로 변환 (등장 순서 유지)
    pub fn extract(&self, path: &Path, content: &str) -> Vec<PermissionRecord> {
        let mut permissions = Vec::new();

        for captures in self.declaration_re.captures_iter(content) {
            let Some(fragment) = captures.get(1) else {
                continue;
            };
            match self.parser.parse(fragment.as_str()) {
                Ok(records) => permissions.extend(records),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Error parsing permission list");
                }
            }
        }

        permissions
    }

    fn walk<'a>(
        &'a self,
        dir: &'a Path,
        is_root: bool,
        results: &'a mut ScanResultSet,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut entries = match tokio::fs::read_dir(dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    let err = Error::Scan(format!("Failed to read directory {}: {}", dir.display(), e));
                    return self.tolerate(err, is_root);
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        let err = Error::Scan(format!("Failed to list {}: {}", dir.display(), e));
                        self.tolerate(err, is_root)?;
                        break;
                    }
                };

                let path = entry.path();

                // 심볼릭 링크는 따라간다
                let metadata = match tokio::fs::metadata(&path).await {
                    Ok(m) => m,
                    Err(e) => {
                        let err = Error::Scan(format!("Failed to stat {}: {}", path.display(), e));
                        self.tolerate(err, false)?;
                        continue;
                    }
                };

                if metadata.is_dir() {
                    self.walk(&path, false, results).await?;
                    continue;
                }

                let matches_suffix = entry
                    .file_name()
                    .to_str()
                    .map(|name| name.ends_with(&self.suffix))
                    .unwrap_or(false);
                if !matches_suffix {
                    continue;
                }

                let bytes = match tokio::fs::read(&path).await {
                    Ok(b) => b,
                    Err(e) => {
                        let err = Error::Scan(format!("Failed to read {}: {}", path.display(), e));
                        self.tolerate(err, false)?;
                        continue;
                    }
                };
                let content = String::from_utf8_lossy(&bytes);

                let permissions = self.extract(&path, &content);
                if !permissions.is_empty() {
                    debug!(path = %path.display(), count = permissions.len(), "Found permissions");
                    results.push(FileScanResult::new(path, permissions));
                }
            }

            Ok(())
        })
    }

    /// 실패 정책 적용: Skip이면 경고 후 계속, 아니면 에러 전파
    ///
    /// 루트 디렉토리 자체를 읽지 못하는 경우는 정책과 무관하게 실패다.
    fn tolerate(&self, err: Error, is_root: bool) -> Result<()> {
        if is_root || self.failure_policy == ScanFailurePolicy::Abort {
            return Err(err);
        }
        warn!(error = %err, "Skipping unreadable entry");
        Ok(())
    }
}

impl std::fmt::Debug for DirectoryScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryScanner")
            .field("suffix", &self.suffix)
            .field("failure_policy", &self.failure_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scanner() -> DirectoryScanner {
        DirectoryScanner::new(&ScannerConfig::default()).unwrap()
    }

    struct FailingParser;

    impl LiteralParser for FailingParser {
        fn parse(&self, _fragment: &str) -> Result<Vec<PermissionRecord>> {
            Err(Error::Parse("unbalanced literal".to_string()))
        }
    }

    #[test]
    fn test_extract_multiple_declarations_in_order() {
        let content = r#"
            <ButtonPermission permissionList={[{code: 'a.create', type: 'button', meaning: 'Create'}]} />
            <ButtonPermission
              permissionList={[
                {code: 'a.edit', type: 'button', meaning: 'Edit'},
                {code: 'a.delete', type: 'button', meaning: 'Delete'}
              ]}
            />
        "#;
        let records = scanner().extract(Path::new("List.tsx"), content);
        let codes: Vec<&str> = records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["a.create", "a.edit", "a.delete"]);
    }

    #[test]
    fn test_custom_anchor() {
        let config = ScannerConfig {
            anchor: "perms=".to_string(),
            ..Default::default()
        };
        let scanner = DirectoryScanner::new(&config).unwrap();
        let records = scanner.extract(
            Path::new("x.tsx"),
            "perms={[{code: 'x.view'}]} permissionList={[{code: 'y.view'}]}",
        );
        assert_eq!(records, vec![PermissionRecord::new("x.view", "", "")]);
    }

    #[test]
    fn test_parser_failure_degrades_to_no_records() {
        let scanner = scanner().with_parser(Arc::new(FailingParser));
        let records = scanner.extract(
            Path::new("x.tsx"),
            "permissionList={[{code: 'a.create'}]}",
        );
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_scan_recurses_and_filters_by_extension() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("pages").join("order");
        fs::create_dir_all(&nested).unwrap();

        fs::write(
            nested.join("Order.tsx"),
            "permissionList={[{code: 'order.create', type: 'button', meaning: 'Create'}]}",
        )
        .unwrap();
        fs::write(
            temp.path().join("notes.ts"),
            "permissionList={[{code: 'ignored', type: 'button', meaning: 'x'}]}",
        )
        .unwrap();

        let results = scanner().scan(temp.path()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.files()[0].path, nested.join("Order.tsx"));
    }

    #[tokio::test]
    async fn test_missing_root_fails() {
        let temp = TempDir::new().unwrap();
        let err = scanner()
            .with_failure_policy(ScanFailurePolicy::Skip)
            .scan(&temp.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Scan(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_policy_for_broken_entry() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Good.tsx"),
            "permissionList={[{code: 'good.view'}]}",
        )
        .unwrap();
        std::os::unix::fs::symlink(temp.path().join("nowhere"), temp.path().join("Broken.tsx"))
            .unwrap();

        assert!(scanner().scan(temp.path()).await.is_err());

        let results = scanner()
            .with_failure_policy(ScanFailurePolicy::Skip)
            .scan(temp.path())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.files()[0].permissions[0].code, "good.view");
    }
}

//! Permission Literal Parser - 권한 배열 리터럴 추출
//!
//! `[{ code: ..., type: ..., meaning: ... }, ...]` 형태의 텍스트 조각에서
//! 권한 레코드를 뽑아낸다. 언어 파서가 아니라 정규식 기반의 관대한(best-effort)
//! 추출이며, 문법 오류나 따옴표 스타일 혼용을 허용한다.

use hzero_foundation::{PermissionRecord, Result};
use regex::Regex;

lazy_static::lazy_static! {
    /// 첫 번째 `[ ... ]` 구간 (내부 줄바꿈 허용)
    static ref ARRAY_RE: Regex = Regex::new(r"(?s)\[\s*(.*?)\s*\]").expect("static pattern");

    /// 인접한 객체 리터럴 경계: `}` 공백 `,` 공백 `{`
    static ref OBJECT_BOUNDARY_RE: Regex = Regex::new(r"\}\s*,?\s*\{").expect("static pattern");

    static ref CODE_RE: Regex =
        Regex::new(r#"code:\s*[`'"]([^`'"]+)[`'"]"#).expect("static pattern");

    /// `${prefix}suffix` 형태의 템플릿 치환 뒤 리터럴 부분
    static ref TEMPLATE_SUFFIX_RE: Regex =
        Regex::new(r"\$\{[^}]+\}(.*)").expect("static pattern");

    static ref TYPE_RE: Regex =
        Regex::new(r#"type:\s*['"]([^'"]+)['"]"#).expect("static pattern");

    /// `intl.get(...).d('...')` 또는 `'...'`
    static ref MEANING_RE: Regex = Regex::new(
        r#"meaning:\s*(?:intl\.get\([^)]*\)\.d\(['"]([^'"]+)['"]\)|['"]([^'"]+)['"])"#
    )
    .expect("static pattern");
}

// ============================================================================
// LiteralParser trait
// ============================================================================

/// 권한 선언 텍스트 → 레코드 변환기
///
/// 스캐너는 이 trait만 알고 있으므로, 구조적 파서로 교체해도 스캐너와
/// 저장소는 바뀌지 않는다. 에러를 반환하면 스캐너가 로그를 남기고
/// 해당 조각을 "레코드 없음"으로 취급한다.
pub trait LiteralParser: Send + Sync {
    fn parse(&self, fragment: &str) -> Result<Vec<PermissionRecord>>;
}

/// 정규식 기반 기본 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexLiteralParser;

impl RegexLiteralParser {
    pub fn new() -> Self {
        Self
    }

    /// 객체 리터럴 본문 하나에서 레코드 추출
    fn parse_object(body: &str) -> PermissionRecord {
        let code = CODE_RE
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| {
                let raw = m.as_str();
                match TEMPLATE_SUFFIX_RE.captures(raw).and_then(|t| t.get(1)) {
                    Some(suffix) => suffix.as_str().to_string(),
                    None => raw.to_string(),
                }
            })
            .unwrap_or_default();

        let kind = TYPE_RE
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        // 두 가지 형태 중 매치된 쪽의 그룹 사용
        let meaning = MEANING_RE
            .captures(body)
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        PermissionRecord::new(code, kind, meaning)
    }
}

impl LiteralParser for RegexLiteralParser {
    fn parse(&self, fragment: &str) -> Result<Vec<PermissionRecord>> {
        let Some(interior) = ARRAY_RE.captures(fragment).and_then(|c| c.get(1)) else {
            return Ok(Vec::new());
        };

        let records = OBJECT_BOUNDARY_RE
            .split(interior.as_str())
            .map(str::trim)
            .map(|s| s.strip_prefix('{').unwrap_or(s))
            .map(|s| s.strip_suffix('}').unwrap_or(s))
            .filter(|s| !s.is_empty())
            .map(Self::parse_object)
            .filter(|record| !record.is_empty())
            .collect();

        Ok(records)
    }
}

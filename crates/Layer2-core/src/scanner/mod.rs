//! Permission Scanner
//!
//! - `literal`: 배열 리터럴 조각 → `PermissionRecord` (교체 가능한 trait)
//! - `directory`: 디렉토리 재귀 순회 + 선언 앵커 탐색

mod directory;
mod literal;

pub use directory::DirectoryScanner;
pub use literal::{LiteralParser, RegexLiteralParser};

//! Permission data model
//!
//! 소스 코드에서 추출한 권한 선언(permission declaration)을 표현하는 타입들.
//! 스캐너가 생성하고, 결과 저장소가 소유하며, 메시지로 front-end에 전달된다.

mod types;

pub use types::{FileScanResult, PermissionRecord, ScanResultSet};

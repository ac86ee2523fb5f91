//! 라우터가 인식하는 메시지 type 목록

use hzero_foundation::Error;
use std::str::FromStr;

/// 백엔드 연산
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// 폴더 스캔 후 결과 저장소 교체
    Scan,
    OpenOAuth,
    CloseWebview,
    CreateEnv,
    GetEnvList,
    GetCurrentEnv,
    UpdateCurrentEnv,
    /// 결과 저장소에 데이터가 있는지
    CheckPermissions,
    GetPermissionFiles,
    ShowQuickPick,
    GetConfiguration,
    ShowMessage,
    /// 현재 환경의 로그인 페이지 열기
    Login,
}

impl Operation {
    pub const ALL: [Operation; 13] = [
        Operation::Scan,
        Operation::OpenOAuth,
        Operation::CloseWebview,
        Operation::CreateEnv,
        Operation::GetEnvList,
        Operation::GetCurrentEnv,
        Operation::UpdateCurrentEnv,
        Operation::CheckPermissions,
        Operation::GetPermissionFiles,
        Operation::ShowQuickPick,
        Operation::GetConfiguration,
        Operation::ShowMessage,
        Operation::Login,
    ];

    /// 메시지 type 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Scan => "SCAN",
            Operation::OpenOAuth => "OPEN_OAUTH",
            Operation::CloseWebview => "CLOSE_WEBVIEW",
            Operation::CreateEnv => "CREATE_ENV",
            Operation::GetEnvList => "GET_ENV_LIST",
            Operation::GetCurrentEnv => "GET_CURRENT_ENV",
            Operation::UpdateCurrentEnv => "UPDATE_CURRENT_ENV",
            Operation::CheckPermissions => "CHECK_PERMISSIONS",
            Operation::GetPermissionFiles => "GET_PERMISSION_FILES",
            Operation::ShowQuickPick => "SHOW_QUICKPICK",
            Operation::GetConfiguration => "GET_CONFIGURATION",
            Operation::ShowMessage => "SHOW_MESSAGE",
            Operation::Login => "LOGIN",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // OAuth 패널은 소문자 "login"을 보낸다
        if s == "login" {
            return Ok(Operation::Login);
        }
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::UnknownOperation(s.to_string()))
    }
}

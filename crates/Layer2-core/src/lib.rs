//! hzero-core: Core Runtime for HZERO Helper
//!
//! Layer2 - 권한 추출 엔진과 메시지 계층
//!
//! # 주요 모듈
//!
//! - `scanner`: 권한 선언 리터럴 파서 + 디렉토리 스캐너
//! - `store`: 최신 스캔 결과 보관, 파일 → 권한 → 상세 트리
//! - `message`: 메시지 형식, Messenger(요청/응답/구독), NDJSON 전송
//! - `router`: 백엔드 DispatchRouter
//! - `host`: 호스트 UI 기능 trait
//! - `panel`: 패널 레지스트리
//! - `env`: 접속 환경 서비스
//! - `oauth`: 로그인 URL / 리다이렉트 콜백
//!
//! # 사용 예시
//!
//! ```ignore
//! use hzero_core::{BackendContext, ChannelSink, DispatchRouter, Messenger};
//!
//! let ctx = BackendContext::new(config, settings, host)?;
//! let (sink, outbound) = ChannelSink::new();
//! let router = DispatchRouter::new(ctx, Arc::new(sink));
//!
//! // 스캔
//! router.scan(Some(PathBuf::from("src"))).await?;
//!
//! // 프런트엔드 요청
//! let files = messenger.request("GET_PERMISSION_FILES", None).await?;
//! ```

pub mod env;
pub mod host;
pub mod message;
pub mod oauth;
pub mod panel;
pub mod router;
pub mod scanner;
pub mod store;

// Re-exports: Scanner
pub use scanner::{DirectoryScanner, LiteralParser, RegexLiteralParser};

// Re-exports: Store
pub use store::{ExportFile, ExportPermission, ObserverId, ResultStore, TreeNode};

// Re-exports: Message
pub use message::{
    reply_marker, ChannelSink, Message, MessageReader, MessageSink, Messenger, ReplyError,
    StdioPeer, Subscription, DEFAULT_REPLY_SUFFIX,
};

// Re-exports: Router
pub use router::{serve, BackendContext, DispatchRouter, Operation};

// Re-exports: Host
pub use host::{HostServices, InputRequest, InputValidation, MessageLevel, QuickPickItem};

// Re-exports: Panel
pub use panel::{PanelHandle, PanelKind, PanelRegistry};

// Re-exports: Environment
pub use env::{CreateEnvRequest, CreateOutcome, EnvironmentService};

// Re-exports: OAuth
pub use oauth::{authorize_url, extract_token, OAuthCallbackHandler, TOKEN_UPDATE};

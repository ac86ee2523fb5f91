//! OAuth - implicit flow 로그인 URL 생성 / 리다이렉트 콜백 처리
//!
//! 토큰 발급 자체는 외부 브라우저에서 이루어지고, 여기서는 리다이렉트 URI의
//! fragment(`#access_token=...`)에서 토큰을 꺼내 현재 환경에 기록한다.

use crate::message::Message;
use crate::panel::{PanelKind, PanelRegistry};
use hzero_foundation::event::auth as auth_events;
use hzero_foundation::{EnvironmentRecord, Error, EventBus, OAuthConfig, Result, Settings};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// 토큰 갱신 알림 메시지 type
pub const TOKEN_UPDATE: &str = "TOKEN_UPDATE";

/// 로그인 페이지 URL 생성
///
/// `{host}{authorizePath}?response_type=token&client_id=..&redirect_uri=..`
pub fn authorize_url(env: &EnvironmentRecord, config: &OAuthConfig) -> Result<Url> {
    EnvironmentRecord::validate_host(&env.host)?;
    let mut url = Url::parse(&format!(
        "{}{}",
        env.host.trim().trim_end_matches('/'),
        config.authorize_path
    ))?;
    url.query_pairs_mut()
        .clear()
        .append_pair("response_type", "token")
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri);
    Ok(url)
}

/// 리다이렉트 URI에서 access token 추출
pub fn extract_token(uri: &str, config: &OAuthConfig) -> Result<String> {
    let parsed = Url::parse(uri)?;
    if parsed.path() != config.callback_path {
        return Err(Error::InvalidInput(format!(
            "Unexpected callback path '{}'",
            parsed.path()
        )));
    }

    let fragment = parsed.fragment().unwrap_or_default();
    url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, _)| key == "access_token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::InvalidInput("Callback carries no access_token".to_string()))
}

/// OAuth 콜백 처리기
#[derive(Clone)]
pub struct OAuthCallbackHandler {
    settings: Settings,
    panels: Arc<PanelRegistry>,
    events: Arc<EventBus>,
    config: OAuthConfig,
}

impl OAuthCallbackHandler {
    pub fn new(
        settings: Settings,
        panels: Arc<PanelRegistry>,
        events: Arc<EventBus>,
        config: OAuthConfig,
    ) -> Self {
        Self {
            settings,
            panels,
            events,
            config,
        }
    }

    /// 콜백 URI 처리 → 토큰이 기록된 환경 레코드 반환
    pub async fn handle_callback(&self, uri: &str) -> Result<EnvironmentRecord> {
        let token = extract_token(uri, &self.config)?;

        let current = self
            .settings
            .current_environment_name()
            .await?
            .ok_or_else(|| Error::NotFound("No current environment selected".to_string()))?;

        let mut envs = self.settings.environments().await?;
        let record = envs
            .iter_mut()
            .find(|e| e.name == current)
            .ok_or_else(|| {
                Error::NotFound(format!("Current environment '{}' does not exist", current))
            })?;
        record.token = Some(token.clone());
        let updated = record.clone();
        self.settings.save_environments(&envs).await?;

        let delivered = self.panels.post_to(
            PanelKind::OAuth,
            Message::notification(TOKEN_UPDATE, Some(Value::String(token))),
        )?;
        debug!(delivered, "Token update posted to OAuth panel");

        self.events.publish(auth_events::token_updated(&current)).await;
        info!(env = %current, "Login successfully");
        Ok(updated)
    }
}

impl std::fmt::Debug for OAuthCallbackHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCallbackHandler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

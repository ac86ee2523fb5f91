//! Environment Service - 접속 환경 생성/조회/선택
//!
//! 환경 목록(`env`)과 현재 환경(`currentEnv`)은 호스트 설정 저장소에
//! 값 전체 단위로 기록된다.

use crate::host::{HostServices, InputRequest, InputValidation};
use hzero_foundation::event::env as env_events;
use hzero_foundation::{EnvironmentRecord, Error, EventBus, Result, Settings};
use std::sync::Arc;
use tracing::{debug, info};

/// 환경 생성 입력 (비어있는 값은 호스트 프롬프트로 묻는다)
#[derive(Debug, Clone, Default)]
pub struct CreateEnvRequest {
    pub name: Option<String>,
    pub host: Option<String>,
}

/// 환경 생성 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(EnvironmentRecord),
    /// 같은 이름의 기존 레코드를 교체 (토큰 유지)
    Overwritten(EnvironmentRecord),
    /// 덮어쓰기 확인을 거절
    Declined,
    /// 프롬프트 취소
    Cancelled,
}

impl CreateOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CreateOutcome::Created(_) | CreateOutcome::Overwritten(_))
    }

    /// 사용자에게 보여줄 한 줄 요약
    pub fn message(&self) -> &'static str {
        match self {
            CreateOutcome::Created(_) => "Environment created successfully",
            CreateOutcome::Overwritten(_) => "Environment updated successfully",
            CreateOutcome::Declined => "Environment not saved: overwrite declined",
            CreateOutcome::Cancelled => "Environment creation cancelled",
        }
    }
}

/// 환경 서비스
#[derive(Clone)]
pub struct EnvironmentService {
    settings: Settings,
    host: Arc<dyn HostServices>,
    events: Arc<EventBus>,
}

impl EnvironmentService {
    pub fn new(settings: Settings, host: Arc<dyn HostServices>, events: Arc<EventBus>) -> Self {
        Self {
            settings,
            host,
            events,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn list(&self) -> Result<Vec<EnvironmentRecord>> {
        self.settings.environments().await
    }

    pub async fn current(&self) -> Result<Option<EnvironmentRecord>> {
        self.settings.current_environment().await
    }

    /// 환경 생성
    ///
    /// 검증 실패는 `Validation` 에러이며 아무것도 기록하지 않는다.
    pub async fn create(&self, request: CreateEnvRequest) -> Result<CreateOutcome> {
        let name = match request.name {
            Some(name) => name,
            None => {
                let prompt = InputRequest::new("Environment name", InputValidation::NonEmpty)
                    .with_placeholder("dev");
                match self.host.prompt_input(prompt).await? {
                    Some(name) => name,
                    None => return Ok(CreateOutcome::Cancelled),
                }
            }
        };
        EnvironmentRecord::validate_name(&name)?;
        let name = name.trim().to_string();

        let host = match request.host {
            Some(host) => host,
            None => {
                let prompt = InputRequest::new("Environment host URL", InputValidation::Url)
                    .with_placeholder("https://hzero.example.com");
                match self.host.prompt_input(prompt).await? {
                    Some(host) => host,
                    None => return Ok(CreateOutcome::Cancelled),
                }
            }
        };
        let url = EnvironmentRecord::validate_host(host.trim())?;
        // 경로 결합을 위해 끝 '/' 제거
        let host = url.as_str().trim_end_matches('/').to_string();

        let mut envs = self.settings.environments().await?;
        let outcome = match envs.iter_mut().find(|e| e.name == name) {
            Some(existing) => {
                let question = format!("Environment '{}' already exists. Overwrite?", name);
                if !self.host.confirm(&question).await? {
                    debug!(env = %name, "Overwrite declined");
                    return Ok(CreateOutcome::Declined);
                }
                existing.host = host.clone();
                CreateOutcome::Overwritten(existing.clone())
            }
            None => {
                let record = EnvironmentRecord::new(name.clone(), host.clone());
                envs.push(record.clone());
                CreateOutcome::Created(record)
            }
        };

        self.settings.save_environments(&envs).await?;
        info!(env = %name, host = %host, "Environment saved");

        let overwritten = matches!(outcome, CreateOutcome::Overwritten(_));
        self.events
            .publish(env_events::created(&name, &host, overwritten))
            .await;

        Ok(outcome)
    }

    /// 현재 환경 선택 (등록된 이름만 허용)
    pub async fn select(&self, name: &str) -> Result<EnvironmentRecord> {
        let record = self
            .list()
            .await?
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::NotFound(format!("Environment '{}' does not exist", name)))?;

        self.settings.set_current_environment(name).await?;
        self.events.publish(env_events::selected(name)).await;
        Ok(record)
    }
}

impl std::fmt::Debug for EnvironmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentService").finish_non_exhaustive()
    }
}

//! `hzero env` - 환경 목록/추가/선택

use crate::host::CliHost;
use crate::Runtime;
use clap::Subcommand;
use hzero_core::CreateEnvRequest;
use hzero_foundation::EnvironmentRecord;
use std::io::Write;
use std::sync::Arc;

#[derive(Subcommand, Debug)]
pub enum EnvAction {
    /// List saved environments (* marks the current one)
    List,
    /// Add or overwrite an environment (prompts for missing values)
    Add {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        host: Option<String>,

        /// Overwrite an existing environment without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Select the current environment
    Use { name: String },
}

pub async fn run(runtime: &Runtime, action: EnvAction) -> anyhow::Result<()> {
    let assume_yes = matches!(action, EnvAction::Add { yes: true, .. });
    let ctx = runtime
        .context(Arc::new(CliHost::interactive(assume_yes)))
        .await?;
    let service = ctx.environments();

    match action {
        EnvAction::List => {
            let envs = service.list().await?;
            let current = ctx.settings.current_environment_name().await?;
            let stdout = std::io::stdout();
            write_list(&mut stdout.lock(), &envs, current.as_deref())?;
        }
        EnvAction::Add { name, host, .. } => {
            let outcome = service.create(CreateEnvRequest { name, host }).await?;
            println!("{}", outcome.message());
            if !outcome.is_committed() {
                anyhow::bail!("environment was not saved");
            }
        }
        EnvAction::Use { name } => {
            let record = service.select(&name).await?;
            println!("Current environment: {} ({})", record.name, record.host);
        }
    }
    Ok(())
}

fn write_list(
    out: &mut impl Write,
    envs: &[EnvironmentRecord],
    current: Option<&str>,
) -> std::io::Result<()> {
    if envs.is_empty() {
        writeln!(out, "No environments configured. Use 'hzero env add'.")?;
        return Ok(());
    }

    let width = envs.iter().map(|e| e.name.len()).max().unwrap_or(0);
    for env in envs {
        let marker = if current == Some(env.name.as_str()) { "*" } else { " " };
        let login = if env.token.is_some() { "  [logged in]" } else { "" };
        writeln!(
            out,
            "{} {:<width$}  {}{}",
            marker,
            env.name,
            env.host,
            login,
            width = width
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_list_marks_current() {
        let mut prod = EnvironmentRecord::new("prod", "https://prod.hzero.com");
        prod.token = Some("secret".to_string());
        let envs = vec![EnvironmentRecord::new("dev", "https://dev.hzero.com"), prod];

        let mut out = Vec::new();
        write_list(&mut out, &envs, Some("prod")).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "  dev   https://dev.hzero.com\n* prod  https://prod.hzero.com  [logged in]\n"
        );
        assert!(!text.contains("secret"));
    }

    #[test]
    fn test_write_list_empty() {
        let mut out = Vec::new();
        write_list(&mut out, &[], None).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("No environments"));
    }
}

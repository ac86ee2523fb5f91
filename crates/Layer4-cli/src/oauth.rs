//! `hzero oauth-callback` - 리다이렉트 URI에서 토큰 저장

use crate::host::CliHost;
use crate::Runtime;
use std::sync::Arc;

pub async fn run(runtime: &Runtime, uri: &str) -> anyhow::Result<()> {
    let ctx = runtime.context(Arc::new(CliHost::non_interactive())).await?;
    let env = ctx.oauth_handler().handle_callback(uri).await?;
    println!("Login successfully! ({})", env.name);
    Ok(())
}

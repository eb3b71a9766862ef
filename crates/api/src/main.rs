use anyhow::Context;
use inkpost_infra::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    inkpost_observability::init();

    let settings = Settings::from_env().context("invalid configuration")?;

    let mut server = inkpost_api::start(&settings).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    server.stop().await
}

use anyhow::Context;

use ebm_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    ebm_observability::init(config.log_format);

    let registry = ebm_api::app::services::build_registry(&config).await?;
    let app = ebm_api::app::build_app(&config, registry);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

use anyhow::Context;
use hearth_core::MicroserviceRuntime;
use lamp_service::{config::SERVICE_NAME, LampServer, LampServiceConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = hearth_telemetry::init(SERVICE_NAME) {
        eprintln!("{}", e);
    }

    let config = LampServiceConfig::from_env().context("loading lamp service configuration")?;
    let server = Arc::new(LampServer::new(config).context("building lamp service")?);
    MicroserviceRuntime::run(server).await.context("running lamp service")?;
    Ok(())
}

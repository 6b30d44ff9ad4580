type Result<T> = color_eyre::eyre::Result<T>;

mod cli;

use clap::Parser;
use eyre::WrapErr;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use virt_dbus_harness::{Connection, ServiceContext};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Cli::parse().into_config();
    info!(
        "probing {} {:?}",
        config.executable.display(),
        config.args
    );

    let context = ServiceContext::start(config)
        .await
        .wrap_err("service did not come up on the session bus")?;

    let probed = report(context.connection()).await;
    let teardown = context.teardown().await;

    probed?;
    teardown.wrap_err("service did not shut down cleanly")?;

    info!("probe finished");
    Ok(())
}

/// Logs what the test driver exposes
async fn report(connection: &Connection) -> Result<()> {
    let root = connection.root();

    match root.hostname().await {
        Ok(hostname) => info!("hostname: {}", hostname),
        Err(e) => warn!("hostname unavailable: {}", e),
    }

    let listings = [
        ("domains", root.list_domains(0).await),
        ("networks", root.list_networks(0).await),
        ("storage pools", root.list_storage_pools(0).await),
        ("node devices", root.list_node_devices(0).await),
        ("interfaces", root.list_interfaces(0).await),
    ];

    for (what, listing) in listings {
        let paths = listing.wrap_err_with(|| format!("listing {what} failed"))?;
        info!("{} {}", paths.len(), what);
        for path in paths {
            info!("  {}", path.as_str());
        }
    }

    Ok(())
}

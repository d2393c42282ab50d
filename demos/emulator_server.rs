use anyhow::Result;
use stagemu::{
    controller::{config::ControllerConfig, Controller},
    socket_server::{config::SocketServerConfig, SocketServer},
};
use std::{sync::Arc, time::Duration};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting stagemu - stage controller emulator");

    // Optional first argument: path to a JSON controller config.
    let config = match std::env::args().nth(1) {
        Some(path) => ControllerConfig::load(&path)?,
        None => ControllerConfig::default(),
    };
    let controller = Arc::new(Controller::new(config)?);

    controller.request("E:").await;
    controller.request("HA:").await;
    info!("All axes enabled and homed");

    controller.set_trace(true);
    controller.request("MR:2:10856.3:").await;
    tokio::time::sleep(Duration::from_millis(2500)).await;
    controller.request("S:2:").await;
    info!("Axis 2 stopped at: {}", controller.request("?R:2:").await);

    controller.request("V:5:650:A:5:1.5:MA:5:-5000:").await;
    while controller.request("?M:5:").await == "1" {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    info!("Axis 5 arrived: {}", controller.request("?R:5:").await);
    controller.set_trace(false);

    controller.request("SYNCR:100:0:40.5:0:0:1000.6:6:0.5:").await;
    while controller.request("?M:1:").await == "1" {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    info!("Full report:\n{}", controller.request("?RA:").await);

    let socket_config = SocketServerConfig::default();
    let socket_path = socket_config.socket_path.clone();
    let mut socket_server = SocketServer::new(socket_config, controller.clone());
    socket_server.start().await?;

    info!("Socket server started at {}", socket_path);
    info!("Try it with socat:");
    info!("  echo '?RA:' | socat - UNIX-CONNECT:{}", socket_path);
    info!("Each reply ends with an ETX byte (0x03)");

    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    socket_server.shutdown().await?;
    controller.shutdown().await;
    info!("stagemu shutdown complete");

    Ok(())
}

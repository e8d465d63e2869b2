//! TSPTW Optimizer API - Axum Server

use clap::Parser;
use tracing_subscriber::EnvFilter;

use optimizer_api::config::{ConfigArgs, OptimizerConfig};
use optimizer_api::console;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("optimizer_api=info".parse()?))
        .init();

    let args = ConfigArgs::parse();
    let addr = args.listen;
    let config = OptimizerConfig::from(args);

    console::print_banner();
    console::print_config(
        &config.executables.vroom.to_string_lossy(),
        &config.executables.or_tools.to_string_lossy(),
        &config.executables.jsprit.to_string_lossy(),
        &config.tmp_dir.to_string_lossy(),
    );

    let app = optimizer_api::api::create_router(config);
    println!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

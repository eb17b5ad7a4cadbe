use axum::serve;
use compute_appserver::config::AppConfig;
use compute_appserver::{build_app, scan_definitions};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Default to Info, keep the HTTP stack quiet unless RUST_LOG says otherwise
    use env_logger::{Builder, Env};
    use log::LevelFilter;

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("hyper", LevelFilter::Warn)
        .filter_module("reqwest", LevelFilter::Warn)
        .init();

    println!("Compute AppServer");

    // Load configuration
    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: server={}:{}, compute={}",
        config.server.host, config.server.port, config.compute.url
    );

    let count = scan_definitions(&config).await?;
    println!(
        "Found {} definition(s) in {}",
        count,
        config.definitions.dir.display()
    );
    if config.server.production {
        log::info!("Production mode: error details are hidden from responses");
    }

    run_server(config).await?;

    Ok(())
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let app = build_app(config)?;
    let listener = TcpListener::bind(&bind_address).await?;
    println!("AppServer running on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}

use anyhow::Context;
use pdf_swap_api::{app, logging, AppState, Cli, LoggerConfig, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_or_exit();

    let logger = match cli.logger.as_deref().map(LoggerConfig::from_file).transpose() {
        Ok(logger) => logger,
        Err(error) => {
            eprintln!("pdf-swap: cannot read logger configuration: {error}");
            std::process::exit(1);
        }
    };
    logging::init(cli.debug, logger.as_ref())?;

    let mut config = ServerConfig::load().context("invalid server configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("cannot bind {address}"))?;

    info!(
        work_dir = %config.work_dir.display(),
        max_upload_bytes = config.max_upload_bytes,
        "pdf-swap listening on http://{address}"
    );

    axum::serve(listener, app(AppState::from(&config))).await?;

    Ok(())
}

use super::config::{resolve_config_path, SimpleSignConfig};
use simplesign::logging;
use simplesign::modules::{load_module, SequenceModule};
use simplesign::queue;
use simplesign::runner::SignRunner;
use simplesign::server::{self, AppState};
use simplesign::sign::{guess_device, MockSign, SerialSign, SignDevice};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Run the sign service
///
/// Starts the web server and the sign loop, then waits for Ctrl-C or SIGTERM.
///
/// ## Configuration Loading
///
/// 1. `--config` flag if provided
/// 2. Default config at `~/.local/share/simplesign/config.toml`
///
/// If the config file doesn't exist, a default one is generated. `-d`, `-p`,
/// `-v` and `--log-file` override the file.
pub async fn execute(
    module: String,
    device: Option<String>,
    port: Option<u16>,
    verbose: bool,
    config_path: Option<String>,
    log_file: Option<String>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(config_path);
    let config = SimpleSignConfig::load_or_create(&config_path)?;

    let log_file = log_file.map(PathBuf::from).or_else(|| config.logging.file.clone());
    logging::init(&config.logging.level, verbose, log_file.as_deref())?;
    info!("Config: {}", config_path.display());

    let module = load_module(&module, &config.modules.dir).map_err(|e| {
        error!("{}", e);
        e
    })?;
    info!("Using module '{}'", module.name());

    if dry_run {
        info!("Dry run: sign writes are logged, no serial device is opened");
        return serve(MockSign::logging(), module, &config, port).await;
    }

    let path = pick_device(device, config.sign.device.clone(), guess_device)
        .ok_or("No sign device found; pass -d/--device or set [sign] device")?;
    let path = path.to_string_lossy().to_string();
    let sign = SerialSign::open(&path, config.sign.baud_rate)?;

    serve(sign, module, &config, port).await
}

/// Device from `-d`, then the config file, then the guessed default
fn pick_device(
    flag: Option<String>,
    configured: Option<PathBuf>,
    guess: impl FnOnce() -> Option<PathBuf>,
) -> Option<PathBuf> {
    flag.map(PathBuf::from).or(configured).or_else(guess)
}

async fn serve<D: SignDevice + 'static>(
    sign: D,
    module: Box<dyn SequenceModule>,
    config: &SimpleSignConfig,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (handle, sequences, messages) = queue::channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut runner = SignRunner::new(sign, module, sequences, messages, config.sign.text_files)?;

    let frontend = server::load_frontend(config.server.frontend.as_deref()).map_err(|e| {
        format!(
            "Failed to read front page '{}': {}",
            config
                .server
                .frontend
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            e
        )
    })?;
    let port = port.unwrap_or(config.server.port);
    let listener = TcpListener::bind((config.server.bind.as_str(), port))
        .await
        .map_err(|e| format!("Failed to bind {}:{}: {}", config.server.bind, port, e))?;

    let server_task = tokio::spawn(server::serve(
        listener,
        AppState::new(handle, frontend),
        shutdown_rx.clone(),
    ));
    let mut runner_task = tokio::spawn(async move { runner.run(shutdown_rx).await });

    let runner_result = tokio::select! {
        _ = wait_for_shutdown_signal() => None,
        result = &mut runner_task => Some(result),
    };

    let _ = shutdown_tx.send(true);

    let runner_result = match runner_result {
        Some(result) => result,
        None => runner_task.await,
    };

    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Web server error: {}", e),
        Err(e) => warn!("Web server task failed: {}", e),
    }

    runner_result??;
    info!("Shut down cleanly");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

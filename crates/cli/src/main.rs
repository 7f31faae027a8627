mod args;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediaswap_core::{
    drop_entries, load_config_or_default, validate_config, BatchPhase, BatchState, BatchStatus,
    Classifier, ConversionEngine, FfmpegImageCodec, FfmpegVideoCodec, FsStorage, Session,
};

use args::{Cli, Command};

type FsSession = Session<FfmpegImageCodec, FfmpegVideoCodec, FsStorage>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    match &cli.config {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("No configuration file given, using defaults"),
    }
    let config = load_config_or_default(cli.config.as_deref()).with_context(|| {
        format!("Failed to load config from {:?}", cli.config)
    })?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let engine = ConversionEngine::new(
        Classifier::from_config(&config.formats),
        FfmpegImageCodec::new(config.converter.clone(), &config.image),
        FfmpegVideoCodec::new(config.converter.clone()),
        FsStorage::new(config.storage.clone()),
    );
    let mut session: FsSession = Session::new(engine);

    let loaded = match &cli.command {
        Command::Folder { dir } => session.load_folder(dir).await,
        Command::Files { files } => session.load_files(files).await,
        Command::Drop { paths } => session.load_dropped(paths).await,
        Command::Scan { paths } => {
            return scan(session.engine().classifier(), paths, cli.json).await
        }
    };
    if let Err(e) = loaded {
        // The status line says what the user needs to know
        println!("{}", session.status());
        return Err(e).context("Failed to load selection");
    }
    info!("{}", session.status());

    let progress = tokio::spawn(log_progress(session.engine().subscribe()));

    let Some(report) = session.convert().await else {
        progress.abort();
        println!("{}", session.status());
        return Ok(());
    };
    let _ = progress.await;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
        println!("{}", json);
    } else {
        println!("{}", session.status());
    }

    if report.failed > 0 {
        warn!("{} file(s) could not be converted", report.failed);
    }
    Ok(())
}

/// Logs a line per finished task until the batch completes.
async fn log_progress(mut rx: watch::Receiver<BatchState>) {
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        match state.phase {
            BatchPhase::Converting if state.processed() > 0 => {
                info!("converted {}/{}", state.processed(), state.total_tasks)
            }
            BatchPhase::Completed => break,
            _ => {}
        }
    }
}

/// Prints the classification of every file a drop of `paths` would load.
async fn scan(classifier: &Classifier, paths: &[PathBuf], json: bool) -> Result<()> {
    let tasks = drop_entries(paths)
        .await
        .context("Failed to scan selection")?;

    let entries: Vec<_> = tasks
        .iter()
        .map(|task| (task.relative_path.as_str(), classifier.classify(&task.file_name())))
        .collect();

    if json {
        let listing: Vec<_> = entries
            .iter()
            .map(|(path, class)| serde_json::json!({ "path": path, "class": class }))
            .collect();
        let out = serde_json::to_string_pretty(&listing).context("Failed to encode listing")?;
        println!("{}", out);
    } else {
        for (path, class) in &entries {
            let label = match class.output_extension() {
                Some(ext) => format!("-> {}", ext),
                None => "skip".to_string(),
            };
            println!("{:<8} {}", label, path);
        }
        let status = BatchStatus::Loaded {
            files: entries.len(),
            convertible: entries.iter().filter(|(_, c)| c.is_convertible()).count(),
        };
        println!("{}", status);
    }
    Ok(())
}

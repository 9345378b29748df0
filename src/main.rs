// src/main.rs - pdfbatch command-line front end
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use pdfbatch::batch::{BatchController, BatchEvent};
use pdfbatch::config;
use pdfbatch::dispatch::{self, SystemDispatcher};
use pdfbatch::platform::Platform;
use pdfbatch::scanner;

#[derive(Parser)]
#[command(name = "pdfbatch", version, about = "Batch-print the PDF files of a folder")]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(long, global = true, default_value = "pdfbatch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every PDF in the folder through the platform print system.
    Print {
        folder: PathBuf,
        /// Override the inter-file delay in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// List the PDFs a print run would cover, in print order.
    List { folder: PathBuf },
    /// Report print-system readiness and the default printer.
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = config::load_or_default(&cli.config).map_err(|e| {
        tracing::error!("failed to load config from '{}': {}", cli.config.display(), e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    match cli.command {
        Commands::Print { folder, delay_ms } => run_print(config, folder, delay_ms).await?,
        Commands::List { folder } => run_list(folder).await?,
        Commands::Check => run_check().await,
    }

    Ok(())
}

async fn run_print(
    config: config::Config,
    folder: PathBuf,
    delay_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let files = scanner::collect_pdfs(&folder).await?;
    if files.is_empty() {
        println!("No PDF files found in {}", folder.display());
        return Ok(());
    }

    let status = dispatch::print_system_status().await;
    if !status.ready {
        tracing::warn!("print system not ready: {}", status.detail);
    }

    let delay = delay_ms
        .map(std::time::Duration::from_millis)
        .unwrap_or_else(|| config.inter_file_delay());
    let dispatcher = Arc::new(SystemDispatcher::with_timeouts(config.strategy_timeouts()));
    let controller = BatchController::with_delay(dispatcher, delay);

    println!("Printing {} PDF file(s) from {}", files.len(), folder.display());
    let total = files.len();
    let mut handle = controller.start(files);

    // Ctrl-C requests cooperative cancellation; the file being printed still
    // completes before the batch halts.
    let canceller = handle.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("cancellation requested, stopping after the current file");
            canceller.cancel();
        }
    });

    while let Some(event) = handle.next_event().await {
        match event {
            BatchEvent::FileStarted { index, filename } => {
                println!("[{}/{}] printing {filename}", index + 1, total);
            }
            BatchEvent::Progress { .. } => {}
            BatchEvent::FileCompleted { filename, .. } => {
                println!("        done: {filename}");
            }
            BatchEvent::FileError { filename, message, .. } => {
                eprintln!("        FAILED: {filename}: {message}");
            }
            BatchEvent::Finished {
                success_count,
                error_count,
            } => {
                println!("Finished: {success_count} printed, {error_count} failed");
            }
        }
    }

    let summary = handle.wait().await;
    if summary.cancelled {
        println!(
            "Cancelled after {} file(s)",
            summary.success_count + summary.error_count
        );
    }
    if summary.error_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_list(folder: PathBuf) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let files = scanner::collect_pdfs(&folder).await?;
    if files.is_empty() {
        println!("No PDF files found in {}", folder.display());
        return Ok(());
    }
    for (index, file) in files.iter().enumerate() {
        println!("{:3}  {}", index + 1, file.display());
    }
    println!("{} file(s)", files.len());
    Ok(())
}

async fn run_check() {
    println!("Platform: {}", Platform::current());
    let status = dispatch::print_system_status().await;
    println!(
        "Print system: {} ({})",
        if status.ready { "ready" } else { "not ready" },
        status.detail
    );
    match dispatch::default_printer().await {
        Some(printer) => println!("Default printer: {printer}"),
        None => println!("Default printer: unknown"),
    }
}

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use obsoletes_audit::config::{AuditConfig, log_path};

#[derive(Parser)]
#[command(name = "obsoletes-audit")]
#[command(
    version,
    about = "Report removed packages that are missing Obsoletes declarations"
)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First release of the window
    #[arg(long)]
    first: Option<u32>,

    /// Current development release
    #[arg(long)]
    current: Option<u32>,

    /// dnf metadata cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Also write JSON logs to a file (default location when no path is given)
    #[arg(long, num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<AuditConfig> {
        let mut config = match &self.config {
            Some(path) => AuditConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => AuditConfig::default(),
        };

        if let Some(first) = self.first {
            config.releases.first = first;
        }
        if let Some(current) = self.current {
            config.releases.current = current;
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.repository.cache_dir = Some(cache_dir.clone());
        }
        Ok(config)
    }
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;
            std::fs::create_dir_all(dir)?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .map(|path| path.unwrap_or_else(log_path));
    let _guard = init_tracing(log_file.as_deref())?;

    let config = cli.load_config()?;

    let report = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(obsoletes_audit::audit::run(&config))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(report.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

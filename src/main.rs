use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agpulse::status::run_status;
use agpulse::ui::App;
use agpulse_core::config::{Config, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging (TUI mode writes to a file so the screen stays clean)
    setup_logging(cli.debug, !cli.is_status_mode());

    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_cli(&cli);
    settings.validate();

    if cli.is_status_mode() {
        let ok = run_status(&settings, cli.wants_detail()).await;
        if !ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Run the application
    let mut app = App::new(settings);
    app.run().await
}

fn setup_logging(debug: bool, to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("agpulse=debug,agpulse_core=debug")
        } else {
            EnvFilter::new("agpulse=info,agpulse_core=info")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);

    if to_file {
        if let Some(file) = log_file_path().and_then(|path| open_log_file(&path)) {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
            return;
        }
        // No writable log location: stay silent rather than draw over the UI
        registry.init();
        return;
    }

    registry
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// `<cache_dir>/agpulse/agpulse.log`
fn log_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("agpulse/agpulse.log"))
}

fn open_log_file(path: &Path) -> Option<std::fs::File> {
    std::fs::create_dir_all(path.parent()?).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()
}

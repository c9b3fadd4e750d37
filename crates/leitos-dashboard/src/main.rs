use std::env;
use std::sync::Arc;

use anyhow::Context;
use leitos_dashboard::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use leitos_dashboard::seed::seed_from_file;
use leitos_dashboard::{Dashboard, LogNotifier, observability};
use leitos_db_memory::{StoreConfig, create_store};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From LEITOS_CONFIG environment variable
    EnvironmentVariable,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (LEITOS_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    observability::init_tracing();

    let (config_path, source) = resolve_config_path();
    let cfg = load_config(Some(&config_path))
        .with_context(|| format!("loading configuration from {config_path}"))?;
    tracing::info!(path = %config_path, source = %source, "Configuration loaded");
    observability::apply_logging_level(&cfg.logging.level);

    let store = create_store(&StoreConfig::default());

    if let Some(seed_path) = &cfg.seed.path {
        let report = seed_from_file(store.as_ref(), seed_path)
            .await
            .with_context(|| format!("seeding store from {seed_path}"))?;
        for (collection, count) in &report {
            tracing::info!(collection = %collection, count, "Seeded collection");
        }
    }

    let dashboard = Dashboard::start(store, &cfg, Arc::new(LogNotifier))
        .await
        .context("starting dashboard")?;

    let violations = dashboard
        .occupancy_report()
        .await
        .context("checking bed occupancy")?;
    if violations.is_empty() {
        tracing::info!("Bed occupancy is consistent");
    }
    for violation in &violations {
        tracing::warn!(%violation, "Occupancy violation");
    }

    let mut pcp = dashboard.pcp.subscribe();
    let mut board = dashboard.icu_board.subscribe();
    log_pcp(&pcp.borrow());

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("waiting for Ctrl-C")?;
                tracing::info!("Shutdown signal received");
                break;
            }
            changed = pcp.changed() => {
                if changed.is_err() {
                    break;
                }
                log_pcp(&pcp.borrow_and_update());
            }
            changed = board.changed() => {
                if changed.is_err() {
                    break;
                }
                let entries = board.borrow_and_update();
                tracing::info!(
                    waiting = entries.len(),
                    longest = entries.first().map_or("-", |e| e.wait_label.as_str()),
                    "ICU wait board updated"
                );
            }
        }
    }

    dashboard.stop();
    Ok(())
}

fn log_pcp(status: &leitos_dashboard::PcpStatus) {
    tracing::info!(
        level = status.level_name(),
        total = status.headline_total,
        blocked_surgical = status.blocked_surgical_beds,
        "PCP status"
    );
}

fn resolve_config_path() -> (String, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config"
            && let Some(path) = args.next()
        {
            return (path, ConfigSource::CliArgument);
        }
    }

    if let Ok(path) = env::var("LEITOS_CONFIG")
        && !path.is_empty()
    {
        return (path, ConfigSource::EnvironmentVariable);
    }

    (DEFAULT_CONFIG_PATH.to_string(), ConfigSource::Default)
}

mod config;
mod fetch;
mod model;
mod parser;
mod refresh;
#[cfg(feature = "serve")]
mod serve;
mod snapshot;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Real-time dashboard service for Sofia AI: fetch the upstream metrics
/// feed on a fixed interval, parse it into a typed record, and expose the
/// latest snapshot over a local JSON API.
#[derive(Parser, Debug)]
#[command(name = "sofia-dashboard", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "sofia-dashboard.toml")]
    config: PathBuf,

    /// Upstream metrics endpoint (overrides config)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Refresh interval in seconds (overrides config)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Fetch and parse once, print the record as JSON, exit
    #[arg(long)]
    once: bool,

    /// Validate config and print resolved settings, don't run
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (fetch timings, per-cycle details)
    #[arg(short, long)]
    verbose: bool,

    /// Suppress routine logging, only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "sofia_dashboard=debug"
    } else if cli.quiet {
        "sofia_dashboard=warn"
    } else {
        "sofia_dashboard=info"
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.parse().unwrap()),
        )
        .init();

    let mut cfg = config::load_config(&cli.config);
    if let Some(endpoint) = cli.endpoint {
        cfg.upstream.endpoint = endpoint;
    }
    if let Some(interval) = cli.interval {
        cfg.refresh.interval_secs = interval;
    }

    if cli.dry_run {
        println!("sofia-dashboard v{}", env!("CARGO_PKG_VERSION"));
        println!("Config file: {}", cli.config.display());
        println!("Upstream endpoint: {}", cfg.upstream.endpoint);
        println!("Fetch timeout: {}s", cfg.upstream.timeout_secs);
        println!("Refresh interval: {}s", cfg.refresh.interval_secs);
        #[cfg(feature = "serve")]
        println!("API bind: {}:{}", cfg.serve.bind, cfg.serve.port);
        return;
    }

    let client = match fetch::MetricsClient::new(
        &cfg.upstream.endpoint,
        Duration::from_secs(cfg.upstream.timeout_secs),
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to build metrics client");
            std::process::exit(1);
        }
    };

    if cli.once {
        match refresh::refresh_once(&client).await {
            Ok(record) => match serde_json::to_string_pretty(&record) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize record");
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let snapshot = snapshot::shared();
    let interval = Duration::from_secs(cfg.refresh.interval_secs);

    #[cfg(feature = "serve")]
    {
        refresh::spawn_refresh_loop(client.clone(), snapshot.clone(), interval);
        if let Err(e) = serve::run(&cfg.serve, client, snapshot).await {
            tracing::error!(error = %e, "dashboard API server failed");
            std::process::exit(1);
        }
    }

    #[cfg(not(feature = "serve"))]
    {
        let handle = refresh::spawn_refresh_loop(client, snapshot, interval);
        let _ = handle.await;
    }
}

//! Fakebook-Crawler main entry point
//!
//! This is the command-line interface: parse credentials, establish the
//! TLS connection, bootstrap the session, crawl, and report flags.

use anyhow::Context;
use clap::Parser;
use fakebook_crawler::auth::{authenticate, Credentials};
use fakebook_crawler::config::{load_config, validate_config, Config};
use fakebook_crawler::crawler::Crawler;
use fakebook_crawler::http::{CookieJar, TlsConnection};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Fakebook-Crawler: an authenticated flag-hunting web crawler
///
/// Logs into Fakebook over a raw TLS socket and breadth-first crawls
/// the site until the configured number of secret flags is found.
/// Flags are printed to stdout, one per line.
#[derive(Parser, Debug)]
#[command(name = "fakebook-crawler")]
#[command(version = "1.0.0")]
#[command(about = "An authenticated flag-hunting web crawler", long_about = None)]
struct Cli {
    /// Account username
    #[arg(value_name = "USERNAME")]
    username: String,

    /// Account password
    #[arg(value_name = "PASSWORD")]
    password: String,

    /// Path to an optional TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the target host
    #[arg(long)]
    host: Option<String>,

    /// Override the TLS port
    #[arg(long)]
    port: Option<u16>,

    /// Override the flag quota
    #[arg(long)]
    quota: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fakebook_crawler=info,warn"),
            1 => EnvFilter::new("fakebook_crawler=debug,info"),
            2 => EnvFilter::new("fakebook_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Assembles configuration, bootstraps the session, and runs the crawl
fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    // CLI flags override file/default values
    if let Some(host) = cli.host {
        config.site.host = host;
    }
    if let Some(port) = cli.port {
        config.site.port = port;
    }
    if let Some(quota) = cli.quota {
        config.crawler.flag_quota = quota;
    }
    validate_config(&config)?;

    let credentials = Credentials {
        username: cli.username,
        password: cli.password,
    };

    let read_timeout = match config.crawler.read_timeout_ms {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    };

    tracing::info!("Connecting to {}:{}", config.site.host, config.site.port);
    let mut conn = TlsConnection::connect(&config.site, read_timeout)
        .context("could not establish the TLS connection")?;

    let mut jar = CookieJar::new();
    let landing = authenticate(&mut conn, &config, &mut jar, &credentials)
        .context("session bootstrap failed")?;

    tracing::info!(
        "Crawling {} for {} flags",
        config.site.scope_prefix,
        config.crawler.flag_quota
    );
    let mut crawler = Crawler::new(conn, jar, config);
    let report = crawler.run(&landing)?;

    for flag in &report.flags {
        println!("{}", flag);
    }
    if !report.complete {
        println!("Could not find all flags.");
    }

    Ok(())
}

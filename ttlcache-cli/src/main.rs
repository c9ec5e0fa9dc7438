//! ttlcache CLI
//!
//! Demonstrates and benchmarks the TTL store from the command line.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ttlcache_core::{Cache, CacheConfig};
use ttlcache_store::TtlStore;

/// ttlcache - in-memory key-value cache with per-entry TTL
#[derive(Parser)]
#[command(name = "ttlcache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Entry TTL in milliseconds (overrides the configuration file)
    #[arg(long, global = true, env = "TTLCACHE_TTL_MS")]
    ttl_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a store, expire one key by hand and watch the rest expire
    Demo {
        /// Number of keys to insert
        #[arg(short, long, default_value = "5")]
        keys: usize,
    },

    /// Measure set/get throughput
    Bench {
        /// Number of distinct keys
        #[arg(short, long, default_value = "100000")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "ttlcache=debug,info"
    } else {
        "ttlcache=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(cli.config.as_deref(), cli.ttl_ms)?;
    info!(ttl_ms = config.ttl_ms, "Configuration loaded");

    match cli.command {
        Commands::Demo { keys } => cmd_demo(&config, keys).await,
        Commands::Bench { count } => cmd_bench(&config, count).await,
    }
}

/// Resolves the effective configuration: file first, then the `--ttl-ms` override.
fn load_config(path: Option<&Path>, ttl_ms: Option<u64>) -> Result<CacheConfig> {
    let mut config = match path {
        Some(path) => CacheConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => CacheConfig::default(),
    };
    if let Some(ttl_ms) = ttl_ms {
        config.ttl_ms = ttl_ms;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Walk through the store's lifecycle
async fn cmd_demo(config: &CacheConfig, keys: usize) -> Result<()> {
    println!("{} {:?}", "⏱  TTL store with ttl".cyan().bold(), config.ttl());

    let store: TtlStore<String, String> = TtlStore::with_config(config)?;
    let cache: Arc<dyn Cache<String, String>> = Arc::new(store.clone());

    println!("\n{}", "1. Inserting sessions...".dimmed());
    for i in 0..keys {
        cache.set(format!("session:{i}"), format!("token-{i:04}"));
    }
    println!("   ✓ {} live entries, {} watchers", store.len(), store.active_watchers());

    if keys > 0 {
        println!("\n{}", "2. Expiring session:0 by hand...".dimmed());
        let first = "session:0".to_string();
        cache.expire(&first);
        println!("   ✓ get(session:0) = {:?}", cache.get(&first));
    }

    println!("\n{}", "3. Waiting for the TTL to elapse...".dimmed());
    tokio::time::sleep(config.ttl() + Duration::from_millis(50)).await;

    let remaining = (0..keys)
        .filter(|i| cache.get(&format!("session:{i}")).is_some())
        .count();
    if remaining == 0 {
        println!("   {} All entries expired", "✅".green());
    } else {
        println!("   {} {} entries still live", "❌".red(), remaining);
    }

    println!("\n{}", "📈 Stats:".green().bold());
    println!("{}", serde_json::to_string_pretty(&store.stats())?);

    Ok(())
}

/// Benchmark store operations
async fn cmd_bench(config: &CacheConfig, count: usize) -> Result<()> {
    println!("{} {} keys", "📊 Benchmarking with".cyan().bold(), count);

    let store: TtlStore<usize, &'static str> = TtlStore::with_config(config)?;

    println!("\n{}", "1. Inserting new keys...".dimmed());
    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );
    let start = Instant::now();
    for key in 0..count {
        store.set(key, "value");
        pb.inc(1);
    }
    pb.finish();
    report("set (new)", count, start.elapsed());

    println!("\n{}", "2. Refreshing existing keys...".dimmed());
    let start = Instant::now();
    for key in 0..count {
        store.set(key, "value");
    }
    report("set (existing)", count, start.elapsed());

    println!("\n{}", "3. Reading existing keys...".dimmed());
    let start = Instant::now();
    let hits = (0..count).filter(|key| store.get(key).is_some()).count();
    report("get (existing)", count, start.elapsed());

    println!("\n{}", "4. Reading missing keys...".dimmed());
    let start = Instant::now();
    let misses = (count..count * 2).filter(|key| store.get(key).is_none()).count();
    report("get (missing)", count, start.elapsed());

    store.expire_all();

    println!("\n{}", "📈 Results:".green().bold());
    if hits == count && misses == count {
        println!("   {} {} hits, {} misses", "✅".green(), hits, misses);
    } else {
        println!("   {} Expected {} hits and misses, got {} / {}", "❌".red(), count, hits, misses);
    }

    Ok(())
}

fn report(label: &str, count: usize, elapsed: Duration) {
    let rate = count as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    println!("   ✓ {label}: {elapsed:?} ({rate:.0} ops/sec)");
}

//! profile_bench - Profile Storage Benchmark
//!
//! Drives the overwrite, event sourcing and hybrid storage modes through the
//! same generated session stream and reports write latency, restore latency
//! and size on disk.
//!
//! Run with: cargo run --release -- --sessions 10000 --snapshot-every 100

use profile_store::workload::{report, BenchRunner};
use profile_store::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profile_store=info,profile_bench=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?.with_args(std::env::args().skip(1))?;

    tracing::info!(
        "Starting benchmark: {} sessions, {} warmup, snapshot every {}, seed {}",
        config.sessions,
        config.warmup,
        config.snapshot_every,
        config.seed
    );

    let runner = BenchRunner::new(config);
    let results = runner.run().await?;

    let written = report::write_reports(&results, &runner.config().out_dir).await?;
    for path in &written {
        tracing::info!("Report written: {}", path.display());
    }

    println!("\n=== Profile Storage Results ===");
    print!("{}", report::summary_csv(&results));

    for outcome in &results.modes {
        if outcome.restore_consistent == Some(false) {
            anyhow::bail!("{} restored a state that differs from replay", outcome.mode);
        }
    }

    Ok(())
}

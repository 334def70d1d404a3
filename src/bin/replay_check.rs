//! Replay Check
//!
//! Writes one generated stream into the event sourcing and hybrid modes and
//! checks that both restore the same state at every sequence number.
//!
//! Run with: cargo run --bin replay_check --release -- --events 1000 --snapshot-every 50

use std::time::Instant;

use profile_store::workload::{SessionGenerator, SnapshotPolicy};
use profile_store::{Aggregate, ModeKind, ProfileDb, ProfileState, StorageMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profile_store=warn".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let arg = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .and_then(|s| s.parse::<u64>().ok())
    };
    let event_count = arg("--events").unwrap_or(1000);
    let snapshot_every = arg("--snapshot-every").unwrap_or(50);
    let seed = arg("--seed").unwrap_or(54321) as i64;

    let dir = std::env::temp_dir().join(format!("replay_check_{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await?;

    println!(
        "Replay Check - {} events, snapshot every {}",
        event_count, snapshot_every
    );

    let mut event_mode =
        StorageMode::open(ModeKind::EventSourcing, ProfileDb::open(dir.join("events.db"), 1).await?);
    let mut hybrid_mode =
        StorageMode::open(ModeKind::Hybrid, ProfileDb::open(dir.join("hybrid.db"), 1).await?);

    let outcome = check(&mut event_mode, &mut hybrid_mode, event_count, snapshot_every, seed).await;

    event_mode.close().await;
    hybrid_mode.close().await;
    tokio::fs::remove_dir_all(&dir).await.ok();

    let mismatches = outcome?;
    if mismatches > 0 {
        anyhow::bail!("{} sequence numbers restored differently", mismatches);
    }

    println!("All {} restore points match", event_count + 1);
    Ok(())
}

async fn check(
    event_mode: &mut StorageMode,
    hybrid_mode: &mut StorageMode,
    event_count: u64,
    snapshot_every: u64,
    seed: i64,
) -> anyhow::Result<u64> {
    event_mode.initialize().await?;
    hybrid_mode.initialize().await?;

    let generator = SessionGenerator::new(seed);
    let policy = SnapshotPolicy::every(snapshot_every);
    let mut profile = ProfileState::create_default();

    let start = Instant::now();
    for event in generator.sessions(event_count) {
        profile = profile.apply(&event);
        let boundary = policy.is_boundary(event.seq);
        event_mode.persist(&event, &profile, boundary).await?;
        hybrid_mode.persist(&event, &profile, boundary).await?;
    }
    println!("Persisted in {:.2}s", start.elapsed().as_secs_f64());

    let start = Instant::now();
    let mut mismatches = 0u64;
    for upto_seq in 0..=event_count as i64 {
        let replayed = event_mode.restore(upto_seq).await?;
        let hybrid = hybrid_mode.restore(upto_seq).await?;
        if replayed != hybrid {
            eprintln!("Mismatch at seq {}", upto_seq);
            mismatches += 1;
        }
    }
    println!("Compared in {:.2}s", start.elapsed().as_secs_f64());

    Ok(mismatches)
}

// src/bin/levelq.rs
//
// levelq: operate a Redis-backed multi-level priority queue from the shell.
//
// Example:
//   levelq --redis redis://127.0.0.1:6379 --base-key jobs --levels 3 push --level 2 --value '{"n":1}'
//   levelq --base-key jobs rank 3fZk0aQ1pB
//   levelq --base-key jobs watch

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use levelq::{Element, PriorityQueue, QueueConfig, QueueError, RedisStore};

#[derive(Parser, Debug)]
#[command(name = "levelq", version, about = "Multi-level priority queue on Redis")]
struct Args {
    /// Redis connection URL (also supports env LEVELQ_REDIS_URL / REDIS_URL)
    #[arg(long, env = "LEVELQ_REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis: String,

    /// Namespace of the queue keys
    #[arg(long, env = "LEVELQ_BASE_KEY", default_value = "levelq")]
    base_key: String,

    /// Number of priority levels (1 = highest)
    #[arg(long, env = "LEVELQ_LEVELS", default_value_t = 3)]
    levels: i64,

    /// Snapshot refresh interval in milliseconds
    #[arg(long, default_value_t = 5_000)]
    regular_ms: u64,

    /// Drift poll interval in milliseconds
    #[arg(long, default_value_t = 500)]
    poll_ms: u64,

    /// Refresh early once |pushes - pops| exceeds this
    #[arg(long, default_value_t = 100)]
    threshold: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enqueue a JSON value
    Push {
        #[arg(long)]
        level: i64,
        /// Element id; generated when omitted
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        value: String,
    },
    /// Dequeue the next live element
    Pop,
    /// Lazily remove an element
    Pull { id: String },
    /// Estimate how many elements are ahead of `id`
    Rank { id: String },
    /// Physical length of every level, keyed by list name
    Lengths,
    /// Keep the refresh scheduler running and print each snapshot as JSON
    Watch,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  .env not loaded: {e}");
    }

    // Tracing (respects RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Support REDIS_URL if LEVELQ_REDIS_URL is not set explicitly.
    let redis_url = std::env::var("LEVELQ_REDIS_URL")
        .or_else(|_| std::env::var("REDIS_URL"))
        .unwrap_or_else(|_| args.redis.clone());

    let config = QueueConfig::new(args.base_key.clone(), args.levels)
        .with_regular_interval(Duration::from_millis(args.regular_ms))
        .with_poll_interval(Duration::from_millis(args.poll_ms))
        .with_threshold_count(args.threshold);

    let store = RedisStore::connect(&redis_url, &config.base_key, config.max_level)
        .await
        .with_context(|| format!("connecting to {redis_url}"))?;
    let queue = PriorityQueue::new(config, store)?;

    let outcome = run(&queue, args.command).await;
    queue.stop();

    if let Err(e) = &outcome {
        if e.downcast_ref::<QueueError>().is_some_and(QueueError::is_store) {
            warn!(redis = %redis_url, "store call failed; is Redis reachable?");
        }
    }
    outcome
}

async fn run(queue: &PriorityQueue<RedisStore>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Push { level, id, value } => {
            let value: Value = serde_json::from_str(&value).context("--value must be JSON")?;
            let id = id.unwrap_or_else(|| nanoid::nanoid!(10));
            queue.push(level, &Element::new(id.clone(), value)).await?;
            println!("{id}");
        }
        Command::Pop => match queue.pop::<Value>().await? {
            Some(element) => println!("{}", serde_json::to_string(&element)?),
            None => info!("queue is empty"),
        },
        Command::Pull { id } => {
            queue.pull(&id).await?;
        }
        Command::Rank { id } => {
            queue.refresh().await?;
            println!("{}", queue.count_before(&id).await?);
        }
        Command::Lengths => {
            let lengths = queue.lengths().await?;
            let report: Vec<Value> = queue
                .store()
                .keys()
                .levels()
                .iter()
                .zip(lengths)
                .map(|(key, len)| json!({ "key": key, "len": len }))
                .collect();
            println!("{}", serde_json::to_string(&report)?);
        }
        Command::Watch => watch(queue).await?,
    }
    Ok(())
}

async fn watch(queue: &PriorityQueue<RedisStore>) -> anyhow::Result<()> {
    let mut snapshots = queue.subscribe();
    info!(base_key = %queue.config().base_key, "watching snapshots. Press Ctrl+C to stop.");

    let shutdown = async {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
                return;
            }
        }
        let _ = tokio::signal::ctrl_c().await;
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("snapshot channel closed");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                info!(generation = snapshot.generation, total = snapshot.total(), "snapshot");
                // one JSON line per snapshot on stdout
                let line = json!({ "snapshot": &*snapshot, "activity": queue.activity() });
                println!("{line}");
            }
        }
    }
    Ok(())
}

//! trackctl - inspect and edit a JSON data file through a tracking cache

mod record;
mod store;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;
use trackcache::{CacheConfig, DeletedPolicy, KeyExtractor, TrackingCache};

use crate::record::Record;
use crate::store::JsonFileStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data file (JSON array of records)
    #[arg(short, long, default_value = "./data.json")]
    data: PathBuf,

    /// Record field used as the cache key
    #[arg(short, long, default_value = "id")]
    key: String,

    /// Cache configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache name used in log output
    #[arg(long)]
    name: Option<String>,

    /// Drop deleted records from the cache once they are saved
    #[arg(long)]
    evict_deleted: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one record
    Get { key: String },
    /// Print every record
    List,
    /// Apply a change file and save it to the data file
    Apply { changes: PathBuf },
}

/// Contents of a change file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChangeFile {
    add: Vec<Record>,
    update: Vec<Record>,
    delete: Vec<String>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let cache = open_cache(&args, config)?;

    match &args.command {
        Command::Get { key } => match cache.fetch(key)? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("not found"),
        },
        Command::List => {
            let mut records = cache.fetch_all()?;
            records.sort_by_key(|r| r.id);
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Apply { changes } => apply(&cache, changes)?,
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<CacheConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => CacheConfig::default().with_name("trackctl"),
    };

    if let Some(name) = &args.name {
        config.name = name.clone();
    }
    if args.evict_deleted {
        config.deleted_policy = DeletedPolicy::Evict;
    }
    Ok(config)
}

fn open_cache(args: &Args, config: CacheConfig) -> Result<TrackingCache<String, Record>> {
    // Resolve the key field before touching the data file
    let keys = KeyExtractor::<String, Record>::from_property(&args.key)?;
    let store = JsonFileStore::new(&args.data, keys.clone());

    info!(data = %args.data.display(), key = %args.key, cache = %config.name, "opening cache");
    Ok(TrackingCache::builder().keys(keys).config(config).build(store)?)
}

fn apply(cache: &TrackingCache<String, Record>, path: &Path) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading change file {}", path.display()))?;
    let changes: ChangeFile = serde_json::from_str(&raw)
        .with_context(|| format!("parsing change file {}", path.display()))?;

    // Updates need their targets cached
    cache.fetch_all()?;

    for record in changes.add {
        cache.add(record)?;
    }
    cache.update_many(changes.update)?;
    for key in &changes.delete {
        if !cache.delete(key) {
            info!(key = %key, "delete skipped, no such record");
        }
    }

    let pending = cache.pending();
    cache.save()?;

    println!(
        "added: {}, modified: {}, deleted: {}",
        pending.added.len(),
        pending.modified.len(),
        pending.deleted.len()
    );
    Ok(())
}

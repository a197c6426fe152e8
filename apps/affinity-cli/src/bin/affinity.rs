use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use affinity_core::config::{expand_path, Config, Settings};
use affinity_core::ingest::SurveySchema;
use affinity_core::Profile;
use affinity_match::{BatchMatcher, JsonFileMatchStore};
use affinity_score::CompatibilityEngine;
use affinity_semantic::EmbeddingService;

const USAGE: &str = "Usage: affinity <command> [options]

Commands:
  score <id-a> <id-b>       Final compatibility score of a pair
  breakdown <id-a> <id-b>   Score with per-factor breakdown (JSON)
  batch                     Rank the cohort and store each user's top matches
  health                    Load the embedding model and report its health

Options:
  --profiles <dir>   Profile directory (default: data.profiles_dir)
  --matches <file>   Match store file for batch (default: data.matches_file)
  --event <id>       Event id for batch (default: default)
  -k <n>             Matches per user for batch (default: batch.top_k)";

#[derive(Debug, Default)]
struct Args {
    command: String,
    positional: Vec<String>,
    profiles: Option<PathBuf>,
    matches: Option<PathBuf>,
    event: Option<String>,
    k: Option<usize>,
}

fn parse_args() -> Result<Args> {
    let mut raw = env::args().skip(1);
    let mut args = Args { command: raw.next().ok_or_else(|| anyhow!(USAGE))?, ..Default::default() };
    while let Some(arg) = raw.next() {
        let mut value = |flag: &str| raw.next().ok_or_else(|| anyhow!("{flag} requires a value"));
        match arg.as_str() {
            "--profiles" => args.profiles = Some(PathBuf::from(value("--profiles")?)),
            "--matches" => args.matches = Some(PathBuf::from(value("--matches")?)),
            "--event" => args.event = Some(value("--event")?),
            "-k" | "--top-k" => args.k = Some(value("-k")?.parse().context("-k expects a number")?),
            "-h" | "--help" => bail!(USAGE),
            flag if flag.starts_with('-') => bail!("unknown option {flag}\n\n{USAGE}"),
            _ => args.positional.push(arg),
        }
    }
    Ok(args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn load_profiles(settings: &Settings, args: &Args) -> Result<Vec<Profile>> {
    let dir = args.profiles.clone().unwrap_or_else(|| expand_path(&settings.data.profiles_dir));
    let schema = SurveySchema::from_settings(&settings.survey)?;
    let pb = spinner(&format!("Loading profiles from {}", dir.display()))?;
    let profiles = schema.load_dir(&dir)?;
    pb.finish_with_message(format!("Loaded {} profiles", profiles.len()));
    Ok(profiles)
}

fn find_pair<'a>(profiles: &'a [Profile], args: &Args) -> Result<(&'a Profile, &'a Profile)> {
    let [a, b] = args.positional.as_slice() else {
        bail!("{} expects two profile ids", args.command);
    };
    let find = |id: &str| profiles.iter().find(|p| p.id == id).ok_or_else(|| anyhow!("no profile with id {id:?}"));
    Ok((find(a.as_str())?, find(b.as_str())?))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = parse_args()?;
    let config = Config::load().context("loading configuration")?;
    let settings = config.settings()?;

    let service = Arc::new(EmbeddingService::from_settings(&settings.embedding));
    let engine = Arc::new(CompatibilityEngine::new(service.clone(), &settings.embedding));

    match args.command.as_str() {
        "score" => {
            let profiles = load_profiles(&settings, &args)?;
            let (a, b) = find_pair(&profiles, &args)?;
            let score = engine.calculate_compatibility(a, b).await?;
            println!("{score:.4}");
        }
        "breakdown" => {
            let profiles = load_profiles(&settings, &args)?;
            let (a, b) = find_pair(&profiles, &args)?;
            let result = engine.compatibility_breakdown(a, b).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "batch" => {
            let profiles = load_profiles(&settings, &args)?;
            let k = args.k.unwrap_or(settings.batch.top_k);
            let event = args.event.clone().unwrap_or_else(|| "default".to_string());
            let path = args.matches.clone().unwrap_or_else(|| expand_path(&settings.data.matches_file));
            let store = Arc::new(JsonFileMatchStore::new(&path));
            let matcher = BatchMatcher::new(engine, store, &settings.batch);

            let pb = spinner(&format!("Matching {} profiles (top {k})", profiles.len()))?;
            let report = matcher.run(&profiles, k, &event).await?;
            pb.finish_with_message("✅ Batch matching completed");

            println!("📊 {} matches ranked for event {event}", report.matches.len());
            println!("   created: {}  already stored: {}", report.created, report.skipped_existing);
            println!("   blocked pairs: {}  failed pairs: {}", report.blocked_pairs, report.failed_pairs);
            println!("💾 Store: {}", path.display());
        }
        "health" => {
            let pb = spinner("Loading embedding model")?;
            let state = service.warm_up().await;
            pb.finish_and_clear();
            info!(?state, "embedding service warm-up finished");
            println!("{}", serde_json::to_string_pretty(&service.health_check())?);
        }
        other => bail!("unknown command {other:?}\n\n{USAGE}"),
    }

    service.shutdown();
    Ok(())
}

use anyhow::{Context, Result};
use cinecluster::{init_tracing, AppState, Config, RecommendationRequest};
use clap::Parser;
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Recommend movies for profiles read from a JSON file", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// A single request object or an array of requests
    #[arg(short, long)]
    input: String,

    /// Overrides the limit of every request
    #[arg(long)]
    limit: Option<usize>,

    /// Worker threads for batch input
    #[arg(short, long, default_value_t = num_cpus::get())]
    threads: usize,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Batch(Vec<RecommendationRequest>),
    Single(RecommendationRequest),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input))?;
    let (mut requests, single) = match serde_json::from_str::<Input>(&raw)
        .with_context(|| format!("Failed to parse {}", args.input))?
    {
        Input::Batch(requests) => (requests, false),
        Input::Single(request) => (vec![request], true),
    };
    if let Some(limit) = args.limit {
        requests.iter_mut().for_each(|r| r.limit = Some(limit));
    }

    let state = AppState::new(config).await?;
    let service = state.recommendation_service.clone();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.max(1))
        .build()?;
    let results: Vec<serde_json::Value> = pool.install(|| {
        requests
            .par_iter()
            .map(|request| match service.recommend(request) {
                Ok(response) => json!({ "success": true, "data": response }),
                Err(e) => {
                    warn!("Request failed: {}", e);
                    json!({ "success": false, "message": e.to_string() })
                }
            })
            .collect()
    });

    let failed = results.iter().filter(|r| r["success"] == false).count();
    info!("Processed {} requests ({} failed)", results.len(), failed);

    let output = if single {
        results.into_iter().next().unwrap_or_default()
    } else {
        serde_json::Value::Array(results)
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

//! tunelog - streaming-history enrichment CLI
//!
//! Reads a listening-history export, enriches every distinct track with
//! catalog metadata and analyzed preview features, and writes the joined
//! dataset as JSON.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use tunelog_common::config::{default_config_path, resolve_api_token, CatalogAuth, TomlConfig};
use tunelog_fx::PreviewFetcher;
use tunelog_ingest::catalog::{CatalogClient, DEFAULT_BASE_URL};
use tunelog_ingest::dataset;
use tunelog_ingest::history::{attach_track_keys, compile_streaming_history, unique_tracks};
use tunelog_ingest::record::TrackEnricher;

#[derive(Parser, Debug)]
#[command(name = "tunelog", about = "Enrich a streaming-history export with audio features")]
struct Args {
    /// Directory containing the StreamingHistory*.json export
    #[arg(long)]
    history_dir: Option<PathBuf>,

    /// Output path for the joined dataset
    #[arg(long, default_value = "enriched_dataset.json")]
    output: PathBuf,

    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog API bearer token (overrides TUNELOG_API_TOKEN and config)
    #[arg(long)]
    api_token: Option<String>,

    /// Catalog API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Enrich at most this many distinct tracks
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting tunelog v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config = TomlConfig::load(&config_path)?;

    let token = resolve_api_token(args.api_token.as_deref(), &config)?;
    let base_url = args
        .base_url
        .or_else(|| config.api_base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let history_dir = args
        .history_dir
        .or_else(|| config.history_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("MySpotifyData"));

    let mut streams = compile_streaming_history(&history_dir)?;
    attach_track_keys(&mut streams);

    let mut unique = unique_tracks(&streams);
    if let Some(limit) = args.limit {
        unique.truncate(limit);
    }
    info!(
        streams = streams.len(),
        tracks = unique.len(),
        "history compiled, starting enrichment"
    );

    let catalog = CatalogClient::new(CatalogAuth {
        base_url,
        bearer_token: token,
    })?;
    let fetcher = PreviewFetcher::new()?;
    let enricher = TrackEnricher::new(catalog, fetcher);

    let mut enriched = Vec::with_capacity(unique.len());
    let mut skipped = 0usize;
    for (track_name, artist_name) in &unique {
        match enricher.enrich(track_name, artist_name).await {
            Ok(track) => enriched.push(track),
            Err(e) => {
                // One unresolvable track never aborts the batch
                warn!(track = %track_name, artist = %artist_name, error = %e,
                      "enrichment failed, skipping track");
                skipped += 1;
            }
        }
    }
    info!(
        enriched = enriched.len(),
        skipped = skipped,
        "enrichment complete"
    );

    let document = dataset::build_dataset(&streams, &enriched);
    dataset::write_json(&document, &args.output)?;
    Ok(())
}

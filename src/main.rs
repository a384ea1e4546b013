use clap::Parser;
use gramdisha::engine::{BoundarySource, Engine, EngineConfig};
use std::sync::Arc;

/// GramDisha — place resolution for civic reporting.
///
/// Resolves free-text area queries inside a state/district scope by fanning
/// out to a commercial autocomplete service, an open geocoder, and the
/// offline gazetteer, or reverse-resolves a dropped pin back into the
/// administrative hierarchy.
///
/// Examples:
///   disha Koramangala --state Karnataka --district "Bengaluru Urban"
///   disha --reverse --lat 19.0760 --lon 72.8777
///   disha --serve --port 8731
#[derive(Parser)]
#[command(name = "disha", version, about, long_about = None)]
struct Cli {
    /// Area query text (positional).
    #[arg(index = 1)]
    query: Option<String>,

    /// State scope for the query.
    #[arg(long)]
    state: Option<String>,

    /// District scope for the query (must belong to the state).
    #[arg(long)]
    district: Option<String>,

    /// Reverse-resolve a coordinate instead of searching.
    #[arg(long)]
    reverse: bool,

    /// Latitude (-90 to 90), for --reverse.
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude (-180 to 180), for --reverse.
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Run the HTTP API instead of a one-shot command.
    #[arg(long)]
    serve: bool,

    /// Bind host for --serve.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port for --serve.
    #[arg(long, default_value_t = 8731)]
    port: u16,

    /// API key for the commercial autocomplete provider. Falls back to the
    /// GRAMDISHA_PLACES_KEY environment variable; absent means the provider
    /// is skipped.
    #[arg(long)]
    places_key: Option<String>,

    /// Path or URL of the district boundary GeoJSON dataset.
    #[arg(long)]
    boundaries: Option<String>,

    /// Offline mode: gazetteer search only, no network calls.
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gramdisha=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig {
        offline: cli.offline,
        ..EngineConfig::default()
    };
    if let Some(key) = cli
        .places_key
        .clone()
        .or_else(|| std::env::var("GRAMDISHA_PLACES_KEY").ok())
    {
        config.primary_api_key = key;
    }
    if let Some(boundaries) = &cli.boundaries {
        config.boundary_source = if boundaries.starts_with("http://") || boundaries.starts_with("https://") {
            BoundarySource::Url(boundaries.clone())
        } else {
            BoundarySource::File(boundaries.into())
        };
    }

    let engine = Arc::new(Engine::new(config));

    if cli.serve {
        gramdisha::server::start(engine, &cli.host, cli.port).await;
        return;
    }

    if cli.reverse {
        run_reverse(&engine, &cli).await;
        return;
    }

    run_suggest(&engine, &cli).await;
}

async fn run_reverse(engine: &Engine, cli: &Cli) {
    let (Some(lat), Some(lon)) = (cli.lat, cli.lon) else {
        eprintln!("Error: --reverse needs --lat and --lon");
        std::process::exit(1);
    };

    let outcome = engine.reverse_resolve(lat, lon).await.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    eprintln!(
        "  Pin {} -> state: {} district: {}",
        outcome.coords,
        outcome.state.unwrap_or("?"),
        outcome.district.unwrap_or("?"),
    );
    println!(
        "{}",
        serde_json::json!({
            "lat": outcome.coords.lat,
            "lng": outcome.coords.lng,
            "state": outcome.state,
            "district": outcome.district,
            "area_label": outcome.area_label,
            "confidence": outcome.confidence,
        })
    );
}

async fn run_suggest(engine: &Engine, cli: &Cli) {
    let (Some(query), Some(state), Some(district)) = (&cli.query, &cli.state, &cli.district) else {
        eprintln!("Error: No query specified.");
        eprintln!();
        eprintln!("Usage:");
        eprintln!("  disha Koramangala --state Karnataka --district \"Bengaluru Urban\"");
        eprintln!("  disha --reverse --lat 19.0760 --lon 72.8777");
        eprintln!("  disha --serve");
        std::process::exit(1);
    };

    let aggregate = engine.suggest(query, state, district).await;
    if let Some(advisory) = aggregate.advisory {
        eprintln!("  Note: {}", advisory);
    }
    for suggestion in &aggregate.suggestions {
        eprintln!("  [{}] {}", suggestion.source, suggestion.label);
    }
    println!("{}", serde_json::to_string_pretty(&aggregate.suggestions).unwrap());
}

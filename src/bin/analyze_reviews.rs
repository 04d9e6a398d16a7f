use review_insights::models::{CategoryLayer, FullAnalysis, ProgressUpdate, RawReviewRecord};
use review_insights::services::analysis::{AnalysisError, CancelFlag, PatternCatalog, ReviewAnalyzer};
use review_insights::services::config_store::{ConfigStore, EngineConfig};
use review_insights::services::text_processor::preview;
use std::path::PathBuf;
use tracing::{info, warn};

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn load_catalog(
    store: &ConfigStore,
    config: &EngineConfig,
    override_path: Option<&str>,
) -> Result<PatternCatalog, String> {
    let path = override_path
        .map(PathBuf::from)
        .or_else(|| store.resolve_catalog_path(config));

    match path {
        Some(path) => {
            info!(path = %path.display(), "catalog.loading");
            PatternCatalog::from_path(&path).map_err(|e| e.to_string())
        }
        None => PatternCatalog::builtin().map_err(|e| e.to_string()),
    }
}

fn print_summary(analysis: &FullAnalysis) {
    println!("Catalog: {}", analysis.catalog_version);
    println!(
        "Reviews: {} analyzed, {} skipped",
        analysis.total_reviews, analysis.skipped_records
    );
    println!();

    for product in &analysis.products {
        println!(
            "== {} ({} reviews, avg {:.2}, 5-star {}%)",
            product.product,
            product.review_count,
            product.ratings.average,
            product.ratings.five_star_percentage
        );
        for (label, stats) in [
            ("Pain", &product.pain_points),
            ("Benefit", &product.benefits),
            ("Transformation", &product.transformations),
        ] {
            for stat in stats.iter().take(3) {
                println!(
                    "  [{}] {} {} ({}%, {})",
                    label,
                    stat.name,
                    stat.count,
                    stat.percentage,
                    stat.frequency.label()
                );
                if let Some(q) = stat.quotes.first() {
                    println!("      \"{}\"", preview(q, 100));
                }
            }
        }
    }
    println!();

    let segments = &analysis.segments;
    println!("Segments:");
    for profile in segments.profiles.iter().filter(|p| p.total_reviews > 0) {
        println!(
            "  {:<28} {:>5} ({}%, avg {:.2})",
            profile.name, profile.total_reviews, profile.percentage, profile.average_rating
        );
    }
    println!(
        "  multi-segment {} ({}%), unsegmented {} ({}%)",
        segments.multi_segment.count,
        segments.multi_segment.percentage,
        segments.unsegmented.count,
        segments.unsegmented.percentage
    );

    if !segments.overlaps.is_empty() {
        println!();
        println!("Top overlaps:");
        for o in segments.overlaps.iter().take(5) {
            println!(
                "  {} x {}: {} ({}% of identity, {}% of motivation)",
                o.identity, o.motivation, o.count, o.percent_of_identity, o.percent_of_motivation
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1].starts_with("--") {
        eprintln!(
            "Usage:\n  analyze_reviews <reviews.json> [--catalog <taxonomy.json>] [--config <dir>] [--out <analysis.json>] [--quiet]\n\nNotes:\n  - reviews.json is an array of records with reviewer/body/rating/date/product fields.\n  - Without --catalog the config's catalogPath is used, then the built-in taxonomy.\n  - Ctrl-C cancels the run; no partial output is written."
        );
        return Ok(());
    }

    review_insights::init_logging();

    let path = args[1].clone();
    let catalog_override = parse_arg_value(&args, "--catalog");
    let out_path = parse_arg_value(&args, "--out");
    let quiet = has_flag(&args, "--quiet");

    let store = match parse_arg_value(&args, "--config") {
        Some(dir) => ConfigStore::new(PathBuf::from(dir)),
        None => ConfigStore::new(
            ConfigStore::default_config_dir().ok_or("no config directory available")?,
        ),
    };
    let config = store.load()?;
    info!(path = %store.config_file().display(), "config.loaded");
    let catalog = load_catalog(&store, &config, catalog_override.as_deref())?;
    let layers: Vec<String> = CategoryLayer::ALL
        .iter()
        .map(|&layer| format!("{}={}", layer.as_str(), catalog.layer_ids(layer).len()))
        .collect();
    info!(version = catalog.version(), layers = %layers.join(" "), "catalog.loaded");

    let raw = std::fs::read_to_string(&path).map_err(|e| format!("read file failed: {}", e))?;
    let records: Vec<RawReviewRecord> =
        serde_json::from_str(&raw).map_err(|e| format!("parse reviews failed: {}", e))?;

    let analyzer = ReviewAnalyzer::new(catalog, config.analysis.clone());
    let cancel = CancelFlag::new();
    let worker_cancel = cancel.clone();

    let mut task = tokio::task::spawn_blocking(move || {
        let sink = move |u: ProgressUpdate| {
            if !quiet {
                eprintln!("[{:>3}%] {}", u.percent, u.stage);
            }
        };
        analyzer.analyze_records(&records, &sink, &worker_cancel)
    });

    let result = tokio::select! {
        joined = &mut task => joined,
        _ = tokio::signal::ctrl_c() => {
            warn!("cli.interrupted");
            cancel.cancel();
            task.await
        }
    };

    let analysis = match result.map_err(|e| format!("analysis task failed: {}", e))? {
        Ok(analysis) => analysis,
        Err(AnalysisError::Cancelled { stage }) => {
            eprintln!("Cancelled before {}", stage);
            return Ok(());
        }
        Err(e) => return Err(e.to_string()),
    };

    if !quiet {
        print_summary(&analysis);
    }

    if let Some(out_path) = out_path {
        let json = serde_json::to_string_pretty(&analysis).map_err(|e| e.to_string())?;
        std::fs::write(&out_path, json).map_err(|e| format!("write out failed: {}", e))?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}

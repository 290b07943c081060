mod cli;

use stagehand::config;
use stagehand::manager::MediaManager;
use stagehand_av::{FfprobeProber, Prober};
use stagehand_common::MediaType;
use stagehand_db::pool::{get_conn, init_pool};
use stagehand_db::queries::catalog;
use stagehand_parser::Arbitrator;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "stagehand=debug,stagehand_parser=debug,stagehand_av=debug,stagehand_db=debug".to_string()
        } else {
            "stagehand=info,stagehand_parser=warn,stagehand_av=warn,stagehand_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scan { media_type } => scan(cli.config.as_deref(), media_type),
        Commands::Classify {
            file,
            base_dir,
            json,
        } => classify_file(&file, base_dir.as_deref(), cli.config.as_deref(), json),
        Commands::Probe { file, json } => probe_file(&file, cli.config.as_deref(), json),
        Commands::Catalog { media_type, json } => list_catalog(cli.config.as_deref(), media_type, json),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("stagehand {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_catalog(config: &config::Config) -> Result<stagehand_db::DbPool> {
    let db_path = config.database.path.to_string_lossy();
    tracing::debug!("Opening catalog at {}", db_path);
    init_pool(&db_path).with_context(|| format!("Failed to open catalog: {}", db_path))
}

fn scan(config_path: Option<&Path>, only: Option<MediaType>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let types = match only {
        Some(media_type) => {
            if config.library(media_type).is_none() {
                anyhow::bail!("No {} library is configured", media_type);
            }
            vec![media_type]
        }
        None => config.enabled_types(),
    };
    if types.is_empty() {
        anyhow::bail!("No libraries configured; add [movies], [shows] or [music] to the config");
    }

    let pool = open_catalog(&config)?;
    let manager = Arc::new(MediaManager::from_config(config, pool)?);

    let rt = tokio::runtime::Runtime::new()?;
    let results = rt.block_on(manager.process_types(types));

    let mut failed = false;
    for result in results {
        match result {
            Ok(report) => println!(
                "{}: {} discovered, {} skipped, {} catalogued, {} low-confidence, {} removed, {} failed",
                report.media_type,
                report.discovered,
                report.skipped,
                report.inserted,
                report.markers,
                report.removed,
                report.failed
            ),
            Err(e) => {
                failed = true;
                eprintln!("Scan failed: {:#}", e);
            }
        }
    }

    if failed {
        anyhow::bail!("One or more scans failed");
    }
    Ok(())
}

fn classify_file(file: &Path, base_dir: Option<&Path>, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let prober = FfprobeProber::new(config.probe.ffprobe_options());
    let arbitrator = Arbitrator::new(prober, config.classifier.parser_config());
    let arbitration = arbitrator.evaluate(file, base_dir)?;
    let winner = arbitration.winner();

    if json {
        let value = serde_json::json!({
            "threshold": arbitration.threshold,
            "winner": winner,
            "candidates": arbitration.candidates,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("Media: {}", arbitration.probe);
    println!();
    for candidate in &arbitration.candidates {
        println!(
            "  {:<6} {:.2}  {}",
            candidate.media_type().label(),
            candidate.confidence(),
            candidate.title().unwrap_or("-")
        );
    }
    println!();

    match winner {
        Some(meta) => {
            println!("Classified as {} ({:.2})", meta.media_type().label(), meta.confidence());
            if let (Some(dir), Some(name)) = (meta.dir_name(), meta.file_name()) {
                println!("Destination: {}", dir.join(name).display());
            }
        }
        None => println!(
            "No classification reached the {:.2} threshold",
            arbitration.threshold
        ),
    }

    Ok(())
}

fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let prober = FfprobeProber::new(config.probe.ffprobe_options());
    let info = prober.probe(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!(
        "Container: {}",
        info.format().format_long_name.as_deref().unwrap_or("unknown")
    );
    if let Some(duration) = info.duration() {
        let secs = duration.as_secs();
        let mins = secs / 60;
        let hours = mins / 60;
        println!("Duration: {:02}:{:02}:{:02}", hours, mins % 60, secs % 60);
    }
    if let Some(format) = info.video_format() {
        println!("Video format: {}", format);
    }
    println!("English audio: {}", info.has_english_audio());
    println!("English subtitles: {}", info.has_english_subtitles());

    println!("\nStreams: {}", info.streams().len());
    for stream in info.streams() {
        print!("  [{}] {:?} {}", stream.index, stream.kind, stream.description());
        if let Some(ref lang) = stream.language {
            print!(" ({})", lang);
        }
        println!();
    }

    Ok(())
}

fn list_catalog(config_path: Option<&Path>, media_type: MediaType, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_catalog(&config)?;
    let conn = get_conn(&pool)?;
    let entries = catalog::list_entries(&conn, media_type)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        let mut flags = Vec::new();
        if entry.status.already_exists {
            flags.push("exists");
        }
        if entry.status.is_upgrade {
            flags.push("upgrade");
        }
        println!(
            "{:.2}  {}  {}{}",
            entry.confidence,
            entry.fields.title().unwrap_or("-"),
            entry.path,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            }
        );
    }
    println!("{} {} entries", entries.len(), media_type);

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = stagehand_av::check_tools(config.probe.ffprobe.as_deref());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available() {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Files will be classified from their paths only.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Database: {}", config.database.path.display());
            println!("  Threshold: {}", config.classifier.threshold);
            for media_type in MediaType::ALL {
                match config.library(media_type) {
                    Some(library) => println!(
                        "  {}: {} (provider: {})",
                        media_type,
                        library.upload_dir.display(),
                        if library.api_key.is_some() { "yes" } else { "no" }
                    ),
                    None => println!("  {}: not configured", media_type),
                }
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Database: {}", config.database.path.display());
            println!("  Threshold: {}", config.classifier.threshold);
        }
    }

    Ok(())
}

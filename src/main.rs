//! Image Scout: keyword-driven image search browser
//!
//! Usage:
//!   image-scout                        - Start the GUI
//!   image-scout keywords               - List keywords served by the backend
//!   image-scout search <line> [--total N]
//!   image-scout expand <term>          - Ask Gemini for related keywords
//!   image-scout import <file>          - Parse a keyword file
//!   image-scout config [set <field> <value>]
//!   image-scout help                   - Show help

mod ai;
mod app;
mod backend;
mod config;
mod keywords;
mod orchestrator;
mod ui;

use std::env;
use std::sync::Arc;

use app::ImageScout;
use iced::{window, Size};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::ai::GeminiClient;
use crate::backend::BackendClient;
use crate::keywords::{KeywordEntry, KeywordId, KeywordStatus, KeywordStore};
use crate::orchestrator::{Applied, Orchestrator, DEFAULT_RESULT_CAP};

fn main() -> iced::Result {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args: Vec<String> = env::args().skip(1).collect();
    if !args.is_empty() {
        if let Err(e) = handle_cli_command(&args) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    start_gui()
}

fn handle_cli_command(args: &[String]) -> Result<(), String> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

    match args[0].as_str() {
        "keywords" => {
            let backend = BackendClient::from_env();
            let lines = rt.block_on(backend.keywords());
            let mut store = KeywordStore::new();
            store.ingest(lines);
            if store.is_empty() {
                println!("No keywords returned by {}", backend.base_url());
            }
            for entry in store.entries() {
                print_entry(entry);
            }
            Ok(())
        }
        "search" => {
            let (line, total) = parse_search_args(&args[1..])?;
            rt.block_on(search(&line, total))
        }
        "expand" => {
            let term = args[1..].join(" ");
            if term.trim().is_empty() {
                return Err("Usage: image-scout expand <term>".to_string());
            }
            let config = config::load();
            let client = GeminiClient::from_env();
            let suggestions = rt
                .block_on(client.generate_related_keywords(term.trim(), &config.gemini_api_key))
                .map_err(|e| e.to_string())?;
            for suggestion in suggestions {
                println!("{}", suggestion);
            }
            Ok(())
        }
        "import" => {
            let path = args
                .get(1)
                .ok_or_else(|| "Usage: image-scout import <file>".to_string())?;
            let lines = rt
                .block_on(keywords::read_keyword_file(path))
                .map_err(|e| format!("Could not read {}: {}", path, e))?;
            let mut store = KeywordStore::new();
            let added = store.ingest(lines);
            println!("Imported {} keywords", added.len());
            for entry in store.entries() {
                print_entry(entry);
            }
            Ok(())
        }
        "config" => handle_config(&args[1..]),
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => Err(format!(
            "Unknown command: {}\nRun 'image-scout help' for usage",
            other
        )),
    }
}

fn parse_search_args(args: &[String]) -> Result<(String, u32), String> {
    let mut total = DEFAULT_RESULT_CAP;
    let mut words = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--total" {
            let value = iter
                .next()
                .ok_or_else(|| "--total needs a number".to_string())?;
            total = value
                .parse()
                .map_err(|_| format!("Invalid --total value: {}", value))?;
        } else {
            words.push(arg.as_str());
        }
    }
    let line = words.join(" ");
    if line.trim().is_empty() {
        return Err("Usage: image-scout search <line> [--total N]".to_string());
    }
    Ok((line, total))
}

async fn search(line: &str, total: u32) -> Result<(), String> {
    let config = config::load();
    if !config.is_search_configured() {
        return Err(format!(
            "{}\nRun 'image-scout config set api-key <key>' and 'image-scout config set cx <id>'",
            backend::BackendError::MissingCredentials
        ));
    }

    let mut orchestrator = Orchestrator::new(
        config,
        Arc::new(BackendClient::from_env()),
        Arc::new(GeminiClient::from_env()),
    );
    let id = search_line(&mut orchestrator, line, total).await?;

    let entry = orchestrator
        .store()
        .get(id)
        .ok_or_else(|| "Keyword disappeared during search".to_string())?;
    if let KeywordStatus::Error(message) = &entry.status {
        return Err(message.clone());
    }

    let results = entry.results.as_deref().unwrap_or_default();
    println!("{} results for {:?}", results.len(), entry.term);
    for (index, result) in results.iter().enumerate() {
        let size = result
            .dimensions()
            .map(|(w, h)| format!(" ({} x {})", w, h))
            .unwrap_or_default();
        println!("{:>3}. {}{}", index + 1, result.title, size);
        println!("     {}", result.link);
    }
    Ok(())
}

/// Ingest one line and run its auto-search with the requested cap
async fn search_line(
    orchestrator: &mut Orchestrator,
    line: &str,
    total: u32,
) -> Result<KeywordId, String> {
    let ticket = orchestrator
        .ingest([line])
        .ok_or_else(|| format!("Not a valid keyword line: {:?}", line))?;
    let id = ticket.keyword;
    let outcome = orchestrator.run_search(ticket.with_total(total)).await;
    if orchestrator.finish_search(outcome) != Applied::Applied {
        return Err("Search did not complete".to_string());
    }
    Ok(id)
}

fn handle_config(args: &[String]) -> Result<(), String> {
    let path = config::config_path().map_err(|e| e.to_string())?;

    match args {
        [] => {
            let config = config::load_from(&path).map_err(|e| e.to_string())?;
            println!("Config file: {}", path.display());
            println!("  googleApiKey: {}", config::mask(&config.google_api_key));
            println!("  googleCxId:   {}", display_or_unset(&config.google_cx_id));
            println!("  geminiApiKey: {}", config::mask(&config.gemini_api_key));
            Ok(())
        }
        [cmd, field, value @ ..] if cmd == "set" && !value.is_empty() => {
            let mut config = config::load_from(&path).map_err(|e| e.to_string())?;
            config.set_field(field, &value.join(" "))?;
            config::save_to(&path, &config).map_err(|e| e.to_string())?;
            println!("Saved {} to {}", field, path.display());
            Ok(())
        }
        _ => Err("Usage: image-scout config [set <field> <value>]".to_string()),
    }
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn print_entry(entry: &KeywordEntry) {
    match &entry.timecode {
        Some(timecode) => println!("{:<40} {}", entry.term, timecode),
        None => println!("{}", entry.term),
    }
}

fn print_help() {
    println!("Image Scout - keyword-driven image search\n");
    println!("Usage: image-scout [command]\n");
    println!("Commands:");
    println!("  (none)                        Start the GUI");
    println!("  keywords                      List keywords served by the backend");
    println!("  search <line> [--total N]     Search one keyword line (default {} results)", DEFAULT_RESULT_CAP);
    println!("  expand <term>                 Ask Gemini for related keywords");
    println!("  import <file>                 Parse a keyword file");
    println!("  config                        Show config path and masked values");
    println!("  config set <field> <value>    Update one field (api-key, cx, gemini)");
    println!("  help                          Show this help message");
    println!("\nEnvironment: IMAGE_SCOUT_BACKEND_URL, IMAGE_SCOUT_CONFIG,");
    println!("  IMAGE_SCOUT_GEMINI_MODEL, IMAGE_SCOUT_GEMINI_URL, RUST_LOG");
}

fn start_gui() -> iced::Result {
    tracing::info!("Starting Image Scout...");

    iced::application(ImageScout::title, ImageScout::update, ImageScout::view)
        .subscription(ImageScout::subscription)
        .theme(ImageScout::theme)
        .window(window::Settings {
            size: Size::new(1200.0, 800.0),
            position: window::Position::Centered,
            min_size: Some(Size::new(800.0, 500.0)),
            resizable: true,
            ..Default::default()
        })
        .antialiasing(true)
        .run_with(ImageScout::new)
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use playalong::catalog::Catalog;
use playalong::config::AppConfig;
use playalong::session::{create_session, join_session, SessionDocument, SessionView};
use playalong::store::{InMemoryStore, SessionDocumentStore};
use playalong::sync::{LocalSessionController, MirrorState, PlaybackState, RemoteSessionMirror};
use playalong::timing::MetronomeScheduler;

const DEFAULT_BEATS: usize = 8;

fn print_usage() {
    println!("PLAYALONG - Shared chord practice sessions");
    println!();
    println!("Usage: playalong [--config <PATH>] [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --list-progressions   List the chord progressions in the catalog");
    println!("  --solo [BEATS]        Practice alone for BEATS beats (default 8)");
    println!("  --conduct [BEATS]     Conduct a session with a local participant mirror");
    println!("  --config <PATH>       Load settings from a YAML file");
    println!("  --help                Show this help message");
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_deref().unwrap_or("info")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_view(prefix: &str, view: &SessionView, catalog: &Catalog) {
    let current = view
        .current_chord
        .as_deref()
        .map(|id| catalog.label(id).to_string())
        .unwrap_or_else(|| "-".to_string());
    let next = view
        .next_chord
        .as_deref()
        .map(|id| catalog.label(id).to_string())
        .unwrap_or_else(|| "(end)".to_string());
    println!(
        "[{}] {:<6} next {:<6} {:>3.0}%  {} BPM{}",
        prefix,
        current,
        next,
        view.progress_percent(),
        view.bpm,
        if view.is_playing { "" } else { "  (stopped)" }
    );
}

fn list_progressions(catalog: &Catalog) {
    for progression in catalog.progressions() {
        let chords: Vec<String> = progression
            .chords
            .iter()
            .map(|id| catalog.label(id).to_string())
            .collect();
        println!(
            "{:<12} {:<20} {:<8} {:>3} BPM{}  {}",
            progression.id,
            progression.name,
            progression.key,
            progression.tempo,
            if progression.looping { " loop" } else { "" },
            chords.join(" ")
        );
    }
}

async fn run_solo(config: &AppConfig, beats: usize) -> Result<()> {
    let catalog = config.catalog();
    let progression = config.default_progression(&catalog)?;
    let controller =
        LocalSessionController::solo(PlaybackState::new(config.default_bpm()?, progression)?);
    let scheduler = MetronomeScheduler::start(&controller);
    let mut changes = controller.subscribe();

    print_view("solo", &controller.view(), &catalog);
    controller.set_playing(true);
    let _ = changes.borrow_and_update();

    for _ in 0..beats {
        changes.changed().await.context("Controller went away")?;
        let view = changes.borrow_and_update().view();
        print_view("solo", &view, &catalog);
    }

    controller.set_playing(false);
    scheduler.stop().await;
    Ok(())
}

async fn run_conduct(config: &AppConfig, beats: usize) -> Result<()> {
    let catalog = config.catalog();
    let store: Arc<dyn SessionDocumentStore> = Arc::new(InMemoryStore::new());
    store.open().await?;

    let initial = SessionDocument::new(
        config.default_bpm()?,
        config.default_progression(&catalog)?,
        Utc::now(),
    );
    let code = create_session(store.as_ref(), &initial).await?;
    println!("Session code: {}", code);

    let controller = LocalSessionController::conductor(
        Arc::clone(&store),
        code.clone(),
        PlaybackState::from_document(&initial)?,
    );
    let scheduler = MetronomeScheduler::start(&controller);

    // Participants type the code by hand
    let joined = join_session(store.as_ref(), &code.as_str().to_lowercase()).await?;
    let mirror = RemoteSessionMirror::with_retry(Arc::clone(&store), joined, config.sync.retry);
    let mut states = mirror.states();
    states
        .wait_for(|s| !matches!(s, MirrorState::Connecting))
        .await
        .context("Mirror went away")?;

    controller.set_playing(true);
    let mut shown = 0;
    while shown < beats {
        states.changed().await.context("Mirror went away")?;
        let state = states.borrow_and_update().clone();
        match state {
            MirrorState::Connected(document) => {
                print_view("participant", &SessionView::from_document(&document), &catalog);
                shown += 1;
            }
            MirrorState::Error(e) => return Err(anyhow!("Participant lost the session: {}", e)),
            MirrorState::Connecting => {}
        }
    }

    controller.set_playing(false);
    controller.flush().await;
    if let Some(e) = controller.sync_error() {
        warn!("Session {} fell out of sync: {}", code, e);
    }

    scheduler.stop().await;
    mirror.unsubscribe().await;
    store.close().await?;
    Ok(())
}

fn parse_beats(arg: Option<&String>) -> Result<usize> {
    match arg {
        Some(value) => value
            .parse()
            .map_err(|_| anyhow!("Invalid beat count: {}", value)),
        None => Ok(DEFAULT_BEATS),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let config = match args.iter().position(|a| a == "--config") {
        Some(index) => {
            if index + 1 >= args.len() {
                eprintln!("Error: --config requires a path");
                std::process::exit(1);
            }
            let path = args.remove(index + 1);
            args.remove(index);
            AppConfig::load(&path)?
        }
        None => AppConfig::default(),
    };
    init_logging(&config);

    if args.is_empty() {
        println!("PLAYALONG - Shared chord practice sessions");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[0].as_str() {
        "--list-progressions" => {
            list_progressions(&config.catalog());
        }
        "--solo" => {
            let beats = parse_beats(args.get(1))?;
            run_solo(&config, beats).await?;
        }
        "--conduct" => {
            let beats = parse_beats(args.get(1))?;
            run_conduct(&config, beats).await?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[0]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}

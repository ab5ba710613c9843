//! `trackpilot-cli` – runs the perception loop against a track.
//!
//! This binary:
//!
//! 1. Loads `~/.trackpilot/config.toml`, writing a default file when it is
//!    absent.
//! 2. Resolves and loads the track raster and parameter file.  Any failure
//!    here is fatal (exit code 1).
//! 3. Opens the configured telemetry capture and registers the sinks: the
//!    periodic log summary always, the headless sim display when
//!    `sim_display = true`.
//! 4. Runs the tick driver until **Ctrl-C**, then prints a short summary.

mod config;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use trackpilot_hal::SimDisplay;
use trackpilot_perception::{MapTransform, TrackAssets, TrackSession};
use trackpilot_runtime::observability::init_tracing;
use trackpilot_runtime::{DisplaySink, LogSink, PerceptionPipeline, ReplaySource, TickDriver};
use trackpilot_types::PilotError;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG filters (default "info"); TRACKPILOT_LOG_FORMAT=json switches
    // to newline-delimited JSON.  User-facing output stays on println!.
    let _tracing = init_tracing("trackpilot");

    print_banner();

    let cfg = load_config();

    let mut driver = match build_driver(&cfg) {
        Ok(driver) => driver,
        Err(e) => {
            error!(error = %e, "session start failed");
            println!("  {} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after the current tick …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; stop the process with a signal instead");
    }

    // ── Tick loop ─────────────────────────────────────────────────────────
    // One tick runs to completion before the next, so a single-threaded
    // runtime is enough.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build Tokio runtime");
            std::process::exit(1);
        }
    };

    println!(
        "  Running at {} ms per tick.  Press {} to stop.\n",
        cfg.tick_interval_ms.to_string().bold(),
        "Ctrl-C".bold().cyan()
    );
    runtime.block_on(driver.run(shutdown));

    println!();
    println!(
        "  {} {} tick(s), {} published, final mean angle {:.2}°",
        "✓".green().bold(),
        driver.ticks(),
        driver.published(),
        driver.last_signal().mean_angle_deg
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Startup
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            match config::save(&config::Config::default()) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

fn build_driver(cfg: &config::Config) -> Result<TickDriver, PilotError> {
    if cfg.track.is_empty() {
        return Err(PilotError::TrackConfig {
            field: "track".to_string(),
            details: "no track configured; set `track` in the config or TRACKPILOT_TRACK".to_string(),
        });
    }
    if cfg.telemetry_replay.is_empty() {
        return Err(PilotError::TelemetryUnavailable(
            "no telemetry capture configured; set `telemetry_replay` or TRACKPILOT_REPLAY"
                .to_string(),
        ));
    }

    let assets = TrackAssets::resolve(&cfg.sim_root, &cfg.track, &cfg.layout);
    let session = TrackSession::load(&assets)?;
    println!(
        "  Track {} loaded ({} × {} px)",
        assets.track_dir.display().to_string().bold(),
        session.transform.width,
        session.transform.height
    );

    let transform = session.transform;
    let pipeline = PerceptionPipeline::from_session(session, cfg.sensor_config())?;
    let source = ReplaySource::open(&cfg.telemetry_replay, cfg.replay_loop)?;
    info!(frames = source.len(), looping = cfg.replay_loop, "telemetry source ready");

    let driver = TickDriver::new(pipeline, Box::new(source), cfg.tick_interval());
    Ok(register_sinks(driver, cfg, transform))
}

/// The log summary is always registered; the sim display only on request.
fn register_sinks(mut driver: TickDriver, cfg: &config::Config, transform: MapTransform) -> TickDriver {
    driver.add_sink(Box::new(LogSink::new(cfg.log_every_ticks)));
    if cfg.sim_display {
        driver.add_sink(Box::new(DisplaySink::new(SimDisplay::new("sim-display"), transform)));
        info!("sim display attached");
    }
    driver
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"  _                  _          _ _       _   "#.bold().cyan());
    println!("{}", r#" | |_ _ __ __ _  ___| | ___ __ (_) | ___ | |_ "#.bold().cyan());
    println!("{}", r#" | __| '__/ _` |/ __| |/ / '_ \| | |/ _ \| __|"#.bold().cyan());
    println!("{}", r#" | |_| | | (_| | (__|   <| |_) | | | (_) | |_ "#.bold().cyan());
    println!("{}", r#"  \__|_|  \__,_|\___|_|\_\ .__/|_|_|\___/ \__|"#.bold().cyan());
    println!("{}", r#"                         |_|                  "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "trackpilot".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Track-boundary perception for racing simulators");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

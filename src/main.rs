use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
mod app;
mod config;
mod console;
mod error;
mod events;
mod mappings;
mod services;
mod storage;
mod utils;

use app::Multitoon;
use config::Config;
use console::ConsoleExit;
use events::WindowHandle;
use services::{create_injector, create_keyboard_listener, create_window_query, HeldKeys, KeyTracker, WindowQuery};
use utils::ActivityLog;

#[derive(Parser, Debug)]
#[command(name = "multitoon")]
#[command(about = "Broadcast one keyboard to up to four game client windows")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "multitoon.toml")]
    config: String,

    /// Log injections instead of performing them
    #[arg(long)]
    dry_run: bool,

    /// Log level (overrides [logging] level)
    #[arg(long)]
    log_level: Option<String>,

    /// Start broadcasting immediately
    #[arg(long)]
    start: bool,

    /// Load this preset at startup
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    preset: Option<u8>,

    /// Start the keep-alive pulser immediately
    #[arg(long)]
    keep_alive: bool,

    /// Do not read commands from stdin
    #[arg(long)]
    no_console: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let result = runtime.block_on(run(args));
    // The device reader and stdin never return on their own
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

async fn run(args: Args) -> Result<()> {
    let config = Arc::new(Config::load(&args.config)?);
    let level = args.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    init_tracing(&level)?;

    info!("Starting multitoon v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config);

    if args.dry_run {
        warn!("Dry-run mode: no keyboard is read and nothing is injected");
    } else {
        utils::permissions::check_permissions()?;
        if let Err(e) = services::xdotool::probe().await {
            warn!("{}; window discovery and injection will fail until it is fixed", e);
        }
    }

    let storage_dir = config.storage_dir()?;
    let activity = Arc::new(ActivityLog::default());
    let held = Arc::new(HeldKeys::new());
    let query = create_window_query(args.dry_run);
    let injector = create_injector(args.dry_run);

    let app = Arc::new(Multitoon::new(
        &config,
        &storage_dir,
        query.clone(),
        injector,
        held.clone(),
        activity.clone(),
    ));

    match detect_control_window(query.as_ref(), config.window.control_window_name.as_deref()).await {
        Some(handle) => app.set_control_window(handle),
        None => warn!("Could not determine the control window; only game windows open the focus gate"),
    }

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let tracker = KeyTracker::new(held, events_tx);
    let keyboard_listener = create_keyboard_listener(config.clone(), tracker, args.dry_run)?;

    let keyboard_handle = tokio::spawn(async move {
        if let Err(e) = keyboard_listener.run().await {
            error!("Keyboard listener stopped: {}", e);
        }
    });
    let hotkey_handle = tokio::spawn(app.clone().watch_hotkeys(events_rx));

    info!("All components initialized");

    if let Some(index) = args.preset {
        if let Err(e) = app.load_preset(index).await {
            warn!("Startup preset {} not loaded: {}", index, e);
        }
    }
    if args.start {
        app.start_service().await;
    }
    if args.keep_alive {
        if let Err(e) = app.start_keep_alive() {
            warn!("Keep-alive not started: {}", e);
        }
    }

    let console = (!args.no_console).then(|| tokio::spawn(console::run(app.clone(), activity.clone())));
    wait_for_exit(console).await;

    info!("Shutting down...");

    // Stops the loop and releases every key still held on the targets
    app.shutdown().await;

    keyboard_handle.abort();
    hotkey_handle.abort();

    info!("multitoon exited");
    Ok(())
}

/// The window the operator controls multitoon from: the one named in the config, or the
/// window focused at startup (normally the terminal).
async fn detect_control_window(query: &dyn WindowQuery, name: Option<&str>) -> Option<WindowHandle> {
    let found = match name {
        Some(name) => query.find_by_name(name).await.map(|handles| handles.into_iter().next()),
        None => query.focused_window().await,
    };
    match found {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Control window lookup failed: {}", e);
            None
        }
    }
}

async fn wait_for_exit(console: Option<JoinHandle<ConsoleExit>>) {
    let console_quit = async {
        match console {
            Some(handle) => match handle.await {
                Ok(ConsoleExit::Quit) => {}
                Ok(ConsoleExit::InputClosed) => {
                    info!("Console input closed; press Ctrl+C to exit");
                    std::future::pending::<()>().await
                }
                Err(e) => {
                    error!("Console task failed: {}", e);
                    std::future::pending::<()>().await
                }
            },
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Received Ctrl+C"),
            Err(err) => error!("Failed to wait for the shutdown signal: {}", err),
        },
        _ = console_quit => info!("Quit requested from the console"),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}

//! Pomoduru - a work/break timer that suspends the machine when work is over
//!
//! This is the main entry point for the pomoduru daemon and its settings tool.

use std::{path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use pomoduru::{
    api::create_router,
    config::{render_settings, Command, Config, ConfigCommand},
    services::{check_systemctl_available, LocalClock, NotifySend, Systemctl},
    settings::Settings,
    state::AppState,
    timer::{Scheduler, Timer},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomoduru={},tower_http=info", config.log_level()))
        .init();

    let settings_path = config.settings_path()?;

    if let Some(Command::Config(command)) = &config.command {
        return run_config_command(command, &settings_path);
    }

    let settings = Settings::load_or_create(&settings_path)?;
    settings.validate()?;

    info!("Starting pomoduru v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: work={:?}, break={:?}, warning={:?}, extend={:?}, always_on={}",
        settings.work_duration,
        settings.break_duration,
        settings.warning_time,
        settings.extend_duration,
        settings.always_on
    );

    // Suspension is best-effort, so a missing systemctl only gets a warning
    if let Err(e) = check_systemctl_available().await {
        warn!("{}", e);
    }

    let timer = Timer::new(settings, Arc::new(NotifySend), Arc::new(Systemctl));
    let scheduler = Scheduler::new(timer.clone(), Arc::new(LocalClock));
    let state = AppState::new(timer, scheduler, config.port, config.host.clone());

    state.scheduler.start();

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Control API running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start   - Start a work session");
    info!("  POST /stop    - Stop the timer");
    info!("  POST /extend  - Extend work once during the warning");
    info!("  GET  /status  - Timer, schedule and server status");
    info!("  GET  /health  - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => tracing::error!("Failed to listen for signals: {}", e),
            }
        }
    }

    state.scheduler.stop();
    state.timer.stop();

    info!("Shutdown complete");
    Ok(())
}

/// `pomoduru config show|set`
fn run_config_command(command: &ConfigCommand, path: &Path) -> anyhow::Result<()> {
    let mut settings = Settings::load_or_create(path)?;

    match command {
        ConfigCommand::Show => {
            println!("{}", render_settings(&settings, path));
        }
        ConfigCommand::Set(args) => {
            let changes = args.apply(&mut settings)?;
            if changes.is_empty() {
                println!("No changes made. Use flags to set configuration values.");
                return Ok(());
            }

            for change in &changes {
                println!("{}", change);
            }
            settings.save(path)?;
            println!("Configuration saved successfully!");
        }
    }

    Ok(())
}

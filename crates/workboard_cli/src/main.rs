//! CLI smoke and inspection entry point.
//!
//! # Responsibility
//! - Verify `workboard_core` linkage (`ping`, version).
//! - Open the configured store and print per-entity row counts.
//!
//! Usage: `workboard_cli [config.toml]`

use log::error;
use std::process::ExitCode;
use std::sync::Arc;
use workboard_core::db::{open_db, open_db_in_memory};
use workboard_core::{
    init_logging_from_config, ChangeHub, GoalFilter, OutcomeFilter, ProblemFilter, ProjectFilter,
    TaskFilter, WorkboardConfig, WorkboardService,
};

fn main() -> ExitCode {
    println!("workboard_core ping={}", workboard_core::ping());
    println!("workboard_core version={}", workboard_core::core_version());

    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: Option<String>) -> Result<(), String> {
    let config = match config_path {
        Some(path) => WorkboardConfig::load(&path).map_err(|err| err.to_string())?,
        None => WorkboardConfig::default(),
    };
    init_logging_from_config(&config).map_err(|err| err.to_string())?;

    let conn = match config.database_path.as_deref() {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .map_err(|err| err.to_string())?;

    let hub = Arc::new(ChangeHub::new(config.hub.channel_capacity));
    let service = WorkboardService::try_new(&conn, hub).map_err(|err| err.to_string())?;

    let counts = [
        (
            "projects",
            service.list_projects(&ProjectFilter::default()).map(|v| v.len()),
        ),
        (
            "tasks",
            service.list_tasks(&TaskFilter::default()).map(|v| v.len()),
        ),
        (
            "problems",
            service.list_problems(&ProblemFilter::default()).map(|v| v.len()),
        ),
        (
            "outcomes",
            service.list_outcomes(&OutcomeFilter::default()).map(|v| v.len()),
        ),
        (
            "goals",
            service.list_goals(&GoalFilter::default()).map(|v| v.len()),
        ),
    ];
    for (label, count) in counts {
        let count = count.map_err(|err| err.to_string())?;
        println!("{label}={count}");
    }
    Ok(())
}

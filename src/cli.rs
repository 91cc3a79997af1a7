use std::path::PathBuf;

use crate::config::Settings;
use crate::data::loader::{load_candidates_csv, LoadError};
use crate::data::source::{load_dataset, select_source};
use crate::data::store::SnapshotStore;
use crate::data::ScoredDataset;
use crate::error::OptimizeError;
use crate::optimizer::{budget_range, sweep_budgets, OptimizeParams, RosterResult};
use crate::scoring::ScoringFormula;
use crate::server;

const USAGE: &str = "usage: roster-optimizer <serve|optimize|players|validate|sync|sweep>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Optimize,
    Players,
    Validate,
    Sync,
    Sweep,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("optimize") => Some(Command::Optimize),
        Some("players") => Some(Command::Players),
        Some("validate") => Some(Command::Validate),
        Some("sync") => Some(Command::Sync),
        Some("sweep") => Some(Command::Sweep),
        _ => None,
    }
}

/// Runs one command and returns the process exit code: 0 ok, 1 runtime failure, 2 usage.
pub fn run_with_args(args: &[String]) -> i32 {
    let settings = Settings::from_env();
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(settings),
        Some(Command::Optimize) => handle_optimize(args, &settings),
        Some(Command::Players) => handle_players(args, &settings),
        Some(Command::Validate) => handle_validate(args, &settings),
        Some(Command::Sync) => handle_sync(args, &settings),
        Some(Command::Sweep) => handle_sweep(args, &settings),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

/// Positional arguments after the command, flags removed.
fn positional(args: &[String]) -> Vec<&str> {
    args.iter()
        .skip(2)
        .map(String::as_str)
        .filter(|arg| !arg.starts_with("--"))
        .collect()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn handle_serve(settings: Settings) -> i32 {
    match server::run_server(settings) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn load_active_dataset(settings: &Settings) -> Result<ScoredDataset, LoadError> {
    let source = select_source(&settings.players_csv, &settings.store_path, settings.auto_sync);
    load_dataset(source.as_ref(), &ScoringFormula::default())
}

fn handle_optimize(args: &[String], settings: &Settings) -> i32 {
    let positional = positional(args);
    let usage = "usage: roster-optimizer optimize <budget> [team_size] [strategy] [--table]";
    let Some(raw_budget) = positional.first() else {
        eprintln!("{usage}");
        return 2;
    };
    let Ok(budget) = raw_budget.parse::<f64>() else {
        eprintln!("invalid budget '{raw_budget}'");
        eprintln!("{usage}");
        return 2;
    };
    let team_size = match positional.get(1).map(|raw| raw.parse::<i64>()) {
        None => None,
        Some(Ok(size)) => Some(size),
        Some(Err(_)) => {
            eprintln!("invalid team_size '{}'", positional[1]);
            eprintln!("{usage}");
            return 2;
        }
    };

    let params = OptimizeParams {
        budget,
        team_size,
        strategy: positional.get(2).map(|raw| raw.to_string()),
        ..OptimizeParams::default()
    };
    let request = match params.into_request(settings.max_team_size) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };

    let dataset = match load_active_dataset(settings) {
        Ok(dataset) => dataset,
        Err(err) => {
            eprintln!("failed to load candidates: {err}");
            return 1;
        }
    };

    let service = settings.optimization_service();
    match service.run(&request, &dataset) {
        Ok(result) if has_flag(args, "--table") => {
            print_roster_table(&result);
            0
        }
        Ok(result) => print_json(&*result),
        Err(err) => {
            eprintln!("optimization failed: {err}");
            1
        }
    }
}

fn print_roster_table(result: &RosterResult) {
    println!("id\trole\tprice\tscore");
    for candidate in &result.selected {
        println!(
            "{}\t{}\t{:.2}\t{:.2}",
            candidate.id, candidate.role, candidate.price, candidate.score
        );
    }
    println!(
        "total\t{}\t{:.2}\t{:.2}",
        result.selected.len(),
        result.total_cost,
        result.total_score
    );
}

fn handle_players(args: &[String], settings: &Settings) -> i32 {
    let dataset = match load_active_dataset(settings) {
        Ok(dataset) => dataset,
        Err(err) => {
            eprintln!("failed to load candidates: {err}");
            return 1;
        }
    };

    if has_flag(args, "--table") {
        println!("id\trole\tprice\tscore");
        for candidate in dataset.candidates() {
            println!(
                "{}\t{}\t{:.2}\t{:.2}",
                candidate.id, candidate.role, candidate.price, candidate.score
            );
        }
        return 0;
    }
    print_json(&dataset.candidates())
}

fn handle_validate(args: &[String], settings: &Settings) -> i32 {
    let path = csv_path_arg(args, settings);
    match load_candidates_csv(&path) {
        Ok(candidates) => {
            println!(
                "validation passed: {} ({} candidates)",
                path.display(),
                candidates.len()
            );
            0
        }
        Err(LoadError::Integrity(issues)) => {
            eprintln!("validation failed: {} issue(s)", issues.len());
            for issue in issues {
                eprintln!("- {issue}");
            }
            1
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            1
        }
    }
}

fn handle_sync(args: &[String], settings: &Settings) -> i32 {
    let path = csv_path_arg(args, settings);
    let store = SnapshotStore::new(&settings.store_path);
    match store.sync_from_csv(&path) {
        Ok(written) => {
            println!(
                "sync complete: records={written}, store='{}'",
                store.path().display()
            );
            0
        }
        Err(err) => {
            eprintln!("sync failed: {err}");
            1
        }
    }
}

fn csv_path_arg(args: &[String], settings: &Settings) -> PathBuf {
    positional(args)
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.players_csv.clone())
}

fn handle_sweep(args: &[String], settings: &Settings) -> i32 {
    let positional = positional(args);
    let usage = "usage: roster-optimizer sweep <from> <to> <step> [strategy]";
    let bounds: Option<Vec<f64>> = positional
        .iter()
        .take(3)
        .map(|raw| raw.parse::<f64>().ok())
        .collect();
    let Some(&[from, to, step]) = bounds.as_deref() else {
        eprintln!("{usage}");
        return 2;
    };
    let budgets = match budget_range(from, to, step) {
        Ok(budgets) => budgets,
        Err(message) => {
            eprintln!("{message}");
            return 2;
        }
    };

    let params = OptimizeParams {
        budget: from,
        strategy: positional.get(3).map(|raw| raw.to_string()),
        ..OptimizeParams::default()
    };
    let template = match params.into_request(settings.max_team_size) {
        Ok(template) => template,
        Err(err @ OptimizeError::BadRequest(_)) => {
            eprintln!("{err}");
            return 2;
        }
        Err(err) => {
            eprintln!("sweep failed: {err}");
            return 1;
        }
    };

    let dataset = match load_active_dataset(settings) {
        Ok(dataset) => dataset,
        Err(err) => {
            eprintln!("failed to load candidates: {err}");
            return 1;
        }
    };

    let service = settings.optimization_service();
    let entries = sweep_budgets(&service, &dataset, &template, &budgets, 0);
    print_json(&entries)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize output: {err}");
            1
        }
    }
}

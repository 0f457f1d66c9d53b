use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::{json, Value};
use sliding_robots::catalog::PuzzleCatalog;
use sliding_robots::constants::max_slide_ticks;
use sliding_robots::engine::{now_ms, positions_are_distinct};
use sliding_robots::error::CatalogError;
use sliding_robots::input::{ControlAction, InputAction};
use sliding_robots::robot::Robot;
use sliding_robots::server_utils::{parse_move_script, ScriptedMove};
use sliding_robots::session::{Session, SessionOptions};
use sliding_robots::types::{RuntimeEvent, SessionPhase};

const DEFAULT_MAX_TICKS: u64 = 30 * 60 * 5;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Puzzle id; a seeded random pick when omitted.
    #[arg(long)]
    puzzle: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    /// JSON catalog to use instead of the built-in puzzles.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Comma separated `color:direction` slides, e.g. `red:right,blue:up`.
    #[arg(long)]
    moves: Option<String>,
    #[arg(long)]
    max_ticks: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct SimulationResultLine {
    #[serde(rename = "puzzleId")]
    puzzle_id: u32,
    seed: u64,
    #[serde(rename = "scriptedMoves")]
    scripted_moves: usize,
    #[serde(rename = "skippedMoves")]
    skipped_moves: usize,
    #[serde(rename = "rejectedMoves")]
    rejected_moves: usize,
    moves: u32,
    #[serde(rename = "minimumMoves")]
    minimum_moves: u32,
    victory: bool,
    phase: SessionPhase,
    ticks: u64,
    #[serde(rename = "virtualMs")]
    virtual_ms: u64,
    #[serde(rename = "stopEvents")]
    stop_events: usize,
    robots: Vec<Robot>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct SimulationRun {
    #[serde(flatten)]
    result: SimulationResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    run: SimulationRun,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "puzzleId")]
    puzzle_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

#[derive(Default)]
struct AnomalyLog {
    messages: Vec<String>,
    records: Vec<AnomalyRecord>,
    seen: HashSet<String>,
}

impl AnomalyLog {
    fn push(&mut self, tick: u64, message: impl Into<String>) {
        let message = message.into();
        self.records.push(AnomalyRecord {
            tick,
            message: message.clone(),
        });
        if self.seen.insert(message.clone()) {
            self.messages.push(message);
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let started_at_ms = now_ms();
    let seed = cli.seed.unwrap_or(started_at_ms);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed, started_at_ms));

    let catalog = match load_catalog(cli.catalog.as_deref()) {
        Ok(catalog) => catalog,
        Err(error) => {
            emit_log(
                "error",
                "catalog_load_failed",
                &run_id,
                None,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    let script = match parse_move_script(cli.moves.as_deref().unwrap_or("")) {
        Ok(script) => script,
        Err(error) => {
            emit_log(
                "error",
                "script_invalid",
                &run_id,
                None,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let puzzle_id = match cli.puzzle {
        Some(id) => id,
        None => match catalog.random_puzzle_id(&mut rng) {
            Ok(id) => id,
            Err(error) => {
                emit_log(
                    "error",
                    "puzzle_pick_failed",
                    &run_id,
                    None,
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(1);
            }
        },
    };

    emit_log(
        "info",
        "simulation_started",
        &run_id,
        Some(puzzle_id),
        None,
        json!({
            "seed": seed,
            "scriptedMoves": script.len(),
        }),
    );

    let max_ticks = cli.max_ticks.unwrap_or(DEFAULT_MAX_TICKS);
    let run = match run_simulation(&catalog, puzzle_id, seed, &script, max_ticks) {
        Ok(run) => run,
        Err(error) => {
            emit_log(
                "error",
                "puzzle_load_failed",
                &run_id,
                Some(puzzle_id),
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(1);
        }
    };

    for anomaly in &run.anomaly_records {
        emit_log(
            "warn",
            "anomaly_detected",
            &run_id,
            Some(puzzle_id),
            Some(anomaly.tick),
            json!({ "message": anomaly.message }),
        );
    }
    emit_log(
        "info",
        "simulation_finished",
        &run_id,
        Some(puzzle_id),
        Some(run.result.ticks),
        json!({
            "victory": run.result.victory,
            "moves": run.result.moves,
            "minimumMoves": run.result.minimum_moves,
            "anomalyCount": run.anomaly_records.len(),
        }),
    );

    match serde_json::to_string(&run.result) {
        Ok(line) => println!("{line}"),
        Err(error) => {
            emit_log(
                "error",
                "result_serialize_failed",
                &run_id,
                Some(puzzle_id),
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    }

    let has_anomaly = !run.result.anomalies.is_empty();
    if let Some(path) = cli.summary_out.as_ref() {
        let summary = RunSummary {
            run_id: run_id.clone(),
            started_at_ms,
            finished_at_ms: now_ms(),
            anomaly_count: run.anomaly_records.len(),
            run,
        };
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                Some(puzzle_id),
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    }

    if has_anomaly {
        std::process::exit(1);
    }
}

fn load_catalog(path: Option<&Path>) -> Result<PuzzleCatalog, CatalogError> {
    match path {
        Some(path) => PuzzleCatalog::load(path),
        None => PuzzleCatalog::builtin(),
    }
}

/// Replays `script` on a virtual clock, ticking every slide to rest before the next one.
fn run_simulation(
    catalog: &PuzzleCatalog,
    puzzle_id: u32,
    seed: u64,
    script: &[ScriptedMove],
    max_ticks: u64,
) -> Result<SimulationRun, CatalogError> {
    let options = SessionOptions::default();
    let mut session = Session::new(options);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut clock_ms = 0u64;
    session.load_puzzle(puzzle_id, catalog, clock_ms)?;

    let board = session.board();
    let slide_limit = max_slide_ticks(board);
    let mut anomalies = AnomalyLog::default();
    let mut skipped_moves = 0usize;
    let mut rejected_moves = 0usize;
    let mut stop_events = 0usize;
    let mut victory = false;
    let mut aborted = false;

    'script: for (idx, scripted) in script.iter().enumerate() {
        if session.phase() != SessionPhase::Active {
            skipped_moves = script.len() - idx;
            break;
        }
        session.handle_action(
            InputAction::Control(ControlAction::SelectRobot(scripted.color)),
            catalog,
            &mut rng,
            clock_ms,
        )?;
        if !session.apply_direction(scripted.dir, clock_ms) {
            rejected_moves += 1;
            continue;
        }

        let mut slide_ticks = 0u64;
        while session.is_sliding() {
            if session.tick_count() >= max_ticks {
                anomalies.push(session.tick_count(), "tick safety limit exceeded");
                aborted = true;
                break 'script;
            }
            let moves_before = session.moves();
            let report = session.tick();
            clock_ms += options.tick_ms;
            slide_ticks += 1;
            let tick = session.tick_count();

            if !positions_are_distinct(session.robots()) {
                anomalies.push(tick, "two robots share a cell");
            }
            for robot in session.robots() {
                if !board.contains(robot.position()) {
                    anomalies.push(tick, format!("{} robot left the board", robot.color()));
                }
            }
            if session.moves() < moves_before {
                anomalies.push(tick, "move counter decreased");
            }
            let snapshot = session.build_snapshot(true);
            stop_events += snapshot
                .events
                .iter()
                .filter(|event| matches!(event, RuntimeEvent::RobotStopped { .. }))
                .count();
            if report.victory {
                victory = true;
            }
            if slide_ticks > slide_limit {
                anomalies.push(tick, format!("slide ran past {slide_limit} ticks"));
                aborted = true;
                break 'script;
            }
        }
    }

    if victory && session.moves() == 0 {
        anomalies.push(session.tick_count(), "victory without a completed move");
    }
    let on_goal = |robot: &Robot| session.goal() == Some(robot.position());
    if victory && !session.robots().iter().any(on_goal) {
        anomalies.push(session.tick_count(), "victory with an empty goal cell");
    }
    let settle_at = clock_ms + options.quiescence_ms;
    if !aborted && session.should_tick(settle_at) {
        anomalies.push(
            session.tick_count(),
            "session keeps ticking after the quiescence window",
        );
    }

    Ok(SimulationRun {
        result: SimulationResultLine {
            puzzle_id,
            seed,
            scripted_moves: script.len(),
            skipped_moves,
            rejected_moves,
            moves: session.moves(),
            minimum_moves: session.minimum_moves(),
            victory,
            phase: session.phase(),
            ticks: session.tick_count(),
            virtual_ms: clock_ms,
            stop_events,
            robots: session.robots().to_vec(),
            anomalies: anomalies.messages,
        },
        anomaly_records: anomalies.records,
    })
}

fn default_run_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    puzzle_id: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        puzzle_id,
        tick,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(text) => eprintln!("{text}"),
        Err(error) => eprintln!("[simulate] failed to serialize log line for {event}: {error}"),
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}

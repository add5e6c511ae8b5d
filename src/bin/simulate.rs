use clap::Parser;
use serde::Serialize;
use serde_json::json;
use solo_packman_server::engine::{GameEngine, GameEngineOptions};
use solo_packman_server::logging::{emit_log, now_ms, LogContext, LogLevel};
use solo_packman_server::pathfind::find_path_where;
use solo_packman_server::types::{Direction, GameSummary, HeldDirections, Position, RuntimeEvent};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = 3)]
    games: usize,
    #[arg(long, default_value_t = 1)]
    seed: u32,
    #[arg(long, default_value_t = 10)]
    max_minutes: u64,
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum GameOutcome {
    GameOver,
    Timeout,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    game: usize,
    seed: u32,
    outcome: GameOutcome,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    #[serde(flatten)]
    summary: GameSummary,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "gameCount")]
    game_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "bestScore")]
    best_score: u32,
    #[serde(rename = "maxLevel")]
    max_level: u32,
    games: Vec<GameResultLine>,
}

fn main() {
    let cli = Cli::parse();
    let started_at_ms = now_ms();
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(cli.seed, started_at_ms));
    let run_context = LogContext::new(match_id.clone());
    let tick_ms = cli.tick_ms.max(1);
    let max_ms = cli.max_minutes.saturating_mul(60_000);

    let mut results = Vec::with_capacity(cli.games);
    for game in 0..cli.games {
        let seed = cli.seed.wrapping_add(game as u32);
        let context = run_context.clone().with_seed(seed);
        let engine = match GameEngine::new(GameEngineOptions { seed }) {
            Ok(engine) => engine,
            Err(error) => {
                emit_log(
                    LogLevel::Error,
                    "engine_init_failed",
                    &context,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };

        emit_log(LogLevel::Info, "game_started", &context, json!({ "game": game }));
        let result = run_game(engine, game, tick_ms, max_ms, &context);
        emit_log(
            LogLevel::Info,
            "game_finished",
            &context,
            json!({
                "outcome": result.outcome,
                "score": result.summary.score,
                "level": result.summary.level,
                "durationMs": result.duration_ms,
            }),
        );

        match serde_json::to_string(&result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                LogLevel::Warn,
                "result_serialize_failed",
                &context,
                json!({ "error": error.to_string() }),
            ),
        }
        results.push(result);
    }

    let summary = build_run_summary(match_id, started_at_ms, now_ms(), results);

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                LogLevel::Error,
                "summary_write_failed",
                &run_context,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        LogLevel::Info,
        "run_finished",
        &run_context,
        json!({
            "gameCount": summary.game_count,
            "averageScore": summary.average_score,
            "bestScore": summary.best_score,
            "maxLevel": summary.max_level,
            "summaryOut": summary_out_written,
        }),
    );
}

fn run_game(
    mut engine: GameEngine,
    game: usize,
    tick_ms: u64,
    max_ms: u64,
    context: &LogContext,
) -> GameResultLine {
    let seed = engine.seed();
    engine.start();
    let mut tick = 0u64;

    while engine.clock_ms() < max_ms {
        let held = autopilot(&engine);
        let frame = engine.advance(tick_ms, held);
        tick += 1;

        for event in &frame.events {
            match event {
                RuntimeEvent::PlayerHit { lives_left } => emit_log(
                    LogLevel::Info,
                    "player_hit",
                    &context.at_tick(tick),
                    json!({ "livesLeft": lives_left }),
                ),
                RuntimeEvent::LevelCleared { level } => emit_log(
                    LogLevel::Info,
                    "level_cleared",
                    &context.at_tick(tick),
                    json!({ "level": level }),
                ),
                RuntimeEvent::GameOver { summary } => {
                    return GameResultLine {
                        game,
                        seed,
                        outcome: GameOutcome::GameOver,
                        duration_ms: engine.clock_ms(),
                        summary: summary.clone(),
                    };
                }
                _ => {}
            }
        }
    }

    GameResultLine {
        game,
        seed,
        outcome: GameOutcome::Timeout,
        duration_ms: engine.clock_ms(),
        summary: engine.summary(),
    }
}

/// Heads for the nearest thing worth eating, steering around cells next to
/// pursuers unless powered up, when pursuers become targets too.
fn autopilot(engine: &GameEngine) -> HeldDirections {
    let board = engine.board();
    let start = engine.player().pos;
    let powered = engine.is_powered_up();
    let pursuer_cells: Vec<Position> = engine.pursuers().iter().map(|p| p.pos).collect();

    let is_goal = |pos: Position| {
        board.has_dot(pos)
            || engine.pills().iter().any(|pill| pill.is_at(pos))
            || engine.fruit().is_at(pos)
            || (powered && pursuer_cells.contains(&pos))
    };

    let mut path = Vec::new();
    if !powered {
        let mut cautious = board.passability().clone();
        for pursuer in &pursuer_cells {
            cautious.set_passable(*pursuer, false);
            for next in pursuer.neighbours(board.height(), board.width()) {
                if next != start {
                    cautious.set_passable(next, false);
                }
            }
        }
        path = find_path_where(&cautious, start, &is_goal);
    }
    if path.is_empty() {
        path = find_path_where(board.passability(), start, &is_goal);
    }

    path.first()
        .and_then(|next| direction_between(start, *next))
        .map(HeldDirections::only)
        .unwrap_or_default()
}

fn direction_between(from: Position, to: Position) -> Option<Direction> {
    Direction::ALL.into_iter().find(|dir| from.step(*dir) == to)
}

fn default_match_id(seed: u32, started_at_ms: u64) -> String {
    format!("sim-{seed}-{started_at_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    games: Vec<GameResultLine>,
) -> RunSummary {
    let game_count = games.len();
    let total: u64 = games.iter().map(|game| game.summary.score as u64).sum();
    let average_score = if game_count == 0 {
        0
    } else {
        (total / game_count as u64) as u32
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        game_count,
        average_score,
        best_score: games.iter().map(|game| game.summary.score).max().unwrap_or(0),
        max_level: games.iter().map(|game| game.summary.level).max().unwrap_or(0),
        games,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

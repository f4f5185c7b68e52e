//! beat-runner: headless runner for the beat idle game core.
//!
//! Usage:
//!   beat-runner --seed 7 --frames 3600 --fps 60 --db saves.db --slot main
//!   beat-runner --config data/tuning.json --autoplay
//!   beat-runner --ipc-mode

use anyhow::Result;
use beat_idle_core::{
    catalog::EntryKind,
    clock::{ManualClock, SystemClock, TimeSource},
    cost::purchase_cost,
    game_loop::{GameLoop, LoopPhase},
    rng::PcgSource,
    store::{SaveStore, SqliteSaves},
    Action, GameConfig, GameState,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Frames { count: u64 },
    Dispatch { action: Action },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    frame: u64,
    phase: &'static str,
    #[serde(flatten)]
    state: &'a GameState,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let frames = parse_arg(&args, "--frames", 600u64);
    let fps = parse_arg(&args, "--fps", 60u32).max(1);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let autoplay = args.iter().any(|a| a == "--autoplay");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let slot = string_arg(&args, "--slot").unwrap_or("main");

    let config = match string_arg(&args, "--config") {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    if !ipc_mode {
        println!("Beat Idle: beat-runner");
        println!("  seed:      {seed}");
        println!("  frames:    {frames} @ {fps} fps");
        println!("  db:        {db}");
        println!("  slot:      {slot}");
        println!();
    }

    let store = if db == ":memory:" { SaveStore::in_memory()? } else { SaveStore::open(db)? };
    store.migrate()?;
    let saves = SqliteSaves::new(Arc::new(store), slot);

    let clock = ManualClock::new(SystemClock.now_ms());
    let step_ms = 1000 / i64::from(fps);
    let mut game = GameLoop::new(
        config,
        Arc::new(clock.clone()),
        Arc::new(saves),
        Box::new(PcgSource::new(seed)),
    );
    let mounted = game.mount()?;
    log::info!("runner: mounted slot {slot} ({} startup events)", mounted.len());

    if ipc_mode {
        run_ipc_loop(&mut game, &clock, step_ms)?;
    } else {
        for frame in 0..frames {
            clock.advance(step_ms);
            game.frame();
            if autoplay && frame % u64::from(fps) == 0 {
                play_greedy(&mut game);
            }
        }
        game.stop();
        print_summary(&game.state(), frames);
    }

    Ok(())
}

fn run_ipc_loop(game: &mut GameLoop, clock: &ManualClock, step_ms: i64) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Frames { count } => {
                for _ in 0..count {
                    clock.advance(step_ms);
                    game.frame();
                }
            }
            IpcCommand::Dispatch { action } => {
                game.dispatch(&action);
            }
            IpcCommand::GetState => {}
        }
        write_state(&mut stdout, game)?;
    }
    game.stop();
    Ok(())
}

fn write_state(out: &mut impl Write, game: &GameLoop) -> Result<()> {
    let state = game.state();
    let ui = UiState {
        frame: game.engine().frame(),
        phase: match game.phase() {
            LoopPhase::Uninitialized => "uninitialized",
            LoopPhase::Running => "running",
            LoopPhase::Stopped => "stopped",
        },
        state: &state,
    };
    writeln!(out, "{}", serde_json::to_string(&ui)?)?;
    out.flush()?;
    Ok(())
}

/// Tap once, then buy the cheapest sound module that is affordable and fits.
fn play_greedy(game: &mut GameLoop) {
    game.dispatch(&Action::AddBeats { amount: 1.0 });
    let state = game.state();
    let catalog = *game.engine().catalog();
    let pick = catalog
        .entries
        .iter()
        .filter(|e| e.kind == EntryKind::Sound && state.is_entry_unlocked(e.id))
        .filter(|e| e.consumption.iter().all(|(k, amt)| state.pool(*k).headroom() >= *amt))
        .map(|e| (e.id, purchase_cost(e, state.owned(e.id))))
        .filter(|(_, cost)| *cost <= state.beats)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((id, _)) = pick {
        game.dispatch(&Action::PurchaseCatalogEntry { id: id.to_string() });
    }
}

fn print_summary(state: &GameState, frames: u64) {
    println!("=== RUN SUMMARY ===");
    println!("  frames run:      {frames}");
    println!("  elapsed:         {:.1}s", state.elapsed_time);
    println!("  beats:           {:.1}", state.beats);
    println!("  lifetime beats:  {:.1}", state.lifetime_beats);
    println!("  production rate: {:.2}/s", state.production_rate);
    println!("  engagement:      {:.1}", state.engagement);

    println!();
    println!("=== OWNED ===");
    let owned: Vec<_> = state.catalog_instances.iter().filter(|(_, i)| i.owned_count > 0).collect();
    if owned.is_empty() {
        println!("  (nothing yet)");
    }
    for (id, instance) in owned {
        println!("  {id:<10} x{}", instance.owned_count);
    }

    println!();
    println!("=== PROGRESS ===");
    let phases: Vec<&str> = state.phases.iter().map(String::as_str).collect();
    println!("  phases:          {}", phases.join(", "));
    println!(
        "  achievements:    {}/{}",
        state.unlocked_achievement_count(),
        state.achievements.len()
    );

    println!();
    println!("=== PATTERN ===");
    for line in state.pattern_code.lines() {
        println!("  {line}");
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

use board_2048::board::Direction;
use board_2048::game::Game;
use board_2048::spawn::{Spawner, FOUR_TILE_CHANCE};
use board_2048::trace::{self, encode_run, Meta};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

fn main() {
    let args = Args::parse();

    // Subcommand-driven continuous generator mode
    if let Some(Cmd::Forever {
        out_dir,
        max_gb,
        quiet,
        steps,
    }) = &args.cmd
    {
        let gb = max_gb.unwrap_or(1.0);
        let max_bytes: u64 = if gb.is_finite() && gb > 0.0 {
            (gb * 1e9) as u64
        } else {
            1_000_000_000
        };
        let cfg = GameConfig::from_args(&args);
        if let Err(e) = run_generator_mode(out_dir, max_bytes, *quiet, *steps, &cfg) {
            eprintln!("Generator mode failed: {e:?}");
        }
        return;
    }

    let cfg = GameConfig::from_args(&args);
    let start = Instant::now();

    let pb = if !args.quiet {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | Games: {pos} | {msg}")
                .unwrap()
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let mut total_moves: u64 = 0;
    let mut best_tile: u32 = 0;
    let mut last_record = None;
    for _ in 0..args.games.max(1) {
        let record = run_single_game(args.steps, &cfg);
        total_moves += record.moves.len() as u64;
        best_tile = best_tile.max(record.meta.highest_tile);
        if let Some(pb) = &pb {
            pb.inc(1);
            pb.set_message(format!("best tile: {best_tile}"));
        }
        last_record = Some(record);
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    if !args.quiet {
        println!(
            "Games: {} | Moves: {} | moves/sec: {:.1} | best tile: {}",
            args.games.max(1),
            total_moves,
            (total_moves as f64) / elapsed,
            best_tile
        );
    }

    // Optionally write a trace of the final run
    if let (Some(out_path), Some(record)) = (args.out, last_record) {
        if let Err(e) = trace::write_run_to_path(out_path, &record.meta, &record.states, &record.moves)
        {
            eprintln!("Failed to write trace: {e}");
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "selfplay", about = "Random-policy 2048 runner and trace generator")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Cmd>,

    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    games: u64,

    /// Board width
    #[arg(long, default_value_t = 4)]
    width: u8,

    /// Board height
    #[arg(long, default_value_t = 4)]
    height: u8,

    /// Chance a spawned tile is a 4 instead of a 2
    #[arg(long, default_value_t = FOUR_TILE_CHANCE)]
    four_chance: f64,

    /// Per-game: stop after this many moves
    #[arg(long)]
    steps: Option<u64>,

    /// Suppress status line output
    #[arg(long)]
    quiet: bool,

    /// Write a binary trace of the final run to this path
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Continuously generate runs into a directory until stopped or size cap reached
    Forever {
        /// Output directory for generated runs
        #[arg(long)]
        out_dir: PathBuf,
        /// Maximum total GB allowed in out_dir (default 1.0)
        #[arg(long)]
        max_gb: Option<f64>,
        /// Suppress the spinner status line
        #[arg(long)]
        quiet: bool,
        /// Per-run: stop after this many moves
        #[arg(long)]
        steps: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy)]
struct GameConfig {
    width: u8,
    height: u8,
    spawner: Spawner,
}

impl GameConfig {
    fn from_args(args: &Args) -> Self {
        GameConfig {
            width: args.width.max(1),
            height: args.height.max(1),
            spawner: Spawner::new(args.four_chance),
        }
    }
}

struct GameRecord {
    meta: Meta,
    states: Vec<u8>,
    moves: Vec<u8>,
}

fn run_single_game(steps: Option<u64>, cfg: &GameConfig) -> GameRecord {
    let start = Instant::now();
    let start_wall = trace::now_unix_seconds();
    let mut rng = rand::thread_rng();
    let mut game = Game::new(u32::from(cfg.width), u32::from(cfg.height), cfg.spawner, &mut rng);

    let mut states: Vec<u8> = Vec::with_capacity(1024);
    let mut moves: Vec<u8> = Vec::with_capacity(1024);
    states.extend_from_slice(&game.board().exponents());

    let mut move_count: u64 = 0;
    while !game.is_over() {
        let dir = *Direction::ALL.choose(&mut rng).unwrap();
        if game.step(dir, &mut rng).is_none() {
            break;
        }
        moves.push(dir.to_u8());
        states.extend_from_slice(&game.board().exponents());
        move_count += 1;
        if let Some(limit) = steps {
            if move_count >= limit {
                break;
            }
        }
    }

    let meta = Meta {
        width: cfg.width,
        height: cfg.height,
        steps: moves.len() as u32,
        start_unix_s: start_wall,
        elapsed_s: start.elapsed().as_secs_f64() as f32,
        highest_tile: game.board().highest_tile(),
        engine_str: Some("random-policy".to_string()),
    };
    GameRecord { meta, states, moves }
}

fn run_generator_mode(
    dir: &PathBuf,
    max_bytes: u64,
    quiet: bool,
    steps: Option<u64>,
    cfg: &GameConfig,
) -> anyhow::Result<()> {
    fs::create_dir_all(dir)?;
    let mut runs_written: u64 = 0;
    let mut bytes_written: u64 = directory_size_bytes(dir)?;
    let pb = if !quiet {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | Runs: {pos} | Size: {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    loop {
        if bytes_written >= max_bytes {
            break;
        }
        let record = run_single_game(steps, cfg);
        let bytes = encode_run(&record.meta, &record.states, &record.moves);
        let path = autoname(dir, record.meta.start_unix_s);
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, &bytes)?;
        runs_written += 1;
        bytes_written = bytes_written.saturating_add(bytes.len() as u64);
        if let Some(pb) = &pb {
            pb.set_position(runs_written);
            pb.set_message(format!("{:.2} GB", (bytes_written as f64) / 1e9));
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    eprintln!(
        "Generator stopped. Runs: {}, Size: {:.2} GB",
        runs_written,
        (bytes_written as f64) / 1e9
    );
    Ok(())
}

fn autoname(dir: &PathBuf, start_unix_s: u64) -> PathBuf {
    // shard by day number since epoch to keep dirs lighter
    let day = start_unix_s / 86_400;
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let subdir = dir.join(format!("d{:08}", day));
    subdir.join(format!("run-{}-{:09}.b2run", start_unix_s, nanos))
}

fn directory_size_bytes(dir: &PathBuf) -> anyhow::Result<u64> {
    let mut total = 0u64;
    if !dir.exists() {
        return Ok(0);
    }
    for entry in walkdir::WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            if let Ok(md) = entry.metadata() {
                total = total.saturating_add(md.len());
            }
        }
    }
    Ok(total)
}

//! Reverie driver binary.
//!
//! Wires the interpreter core to host collaborators and runs the step
//! loop. Graphics/audio backends plug in through the collaborator traits;
//! this binary ships the headless set, which renders text to the log and
//! discards media commands. Launching an actual game additionally needs
//! an archive-decoder backend for the `--game-root` contents.

mod headless;

use anyhow::{bail, Context, Result};
use clap::Parser;
use core_config::{load_prefs, GameConfig, KeyValueStore};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reverie", about = "Visual-novel scripting runtime")]
struct Cli {
    /// Root directory of the game (bytecode archive + configuration).
    #[arg(long)]
    game_root: Option<PathBuf>,

    /// Scenario to start from, overriding the configured entry scenario.
    #[arg(long)]
    seen_start: Option<i32>,

    /// Font file used by the text renderer.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Log verbosity: none, info, warning, error.
    #[arg(long, default_value = "error")]
    log_level: String,

    /// Run the built-in smoke scenario against the headless collaborators.
    #[arg(long)]
    headless_demo: bool,
}

fn install_tracing(level: &str) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = match level {
        "none" => return Ok(None),
        "info" => "info",
        "warning" => "warn",
        "error" => "error",
        other => bail!("unknown log level '{other}'"),
    };

    // The unimplemented-opcode trace accumulates in its own file so a full
    // playthrough can be audited afterwards.
    let appender = tracing_appender::rolling::never(".", "reverie-trace.log");
    let (trace_writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{filter},machine.unimplemented=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(trace_writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = install_tracing(&cli.log_level)?;

    let prefs = load_prefs(None).context("loading runtime preferences")?;
    let font = cli.font.or(prefs.font_path);
    info!(target: "driver", font = ?font, "starting up");

    if cli.headless_demo {
        let exit = headless::run_demo(cli.seen_start.unwrap_or(0))?;
        std::process::exit(exit);
    }

    let Some(game_root) = cli.game_root.or(prefs.game_root) else {
        bail!("--game-root is required (or set game_root in reverie.toml)");
    };
    if !game_root.is_dir() {
        bail!("game root {} is not a directory", game_root.display());
    }

    // The INI decoder is a collaborator; without one linked in, the typed
    // view is built over an empty store so startup paths stay exercised.
    let store = KeyValueStore::new();
    let config = GameConfig::from_store(&store);
    let saves = core_save::SaveSystem::for_game(&config.sanitized_regname());
    info!(
        target: "driver",
        game_root = %game_root.display(),
        save_dir = %saves.save_dir().display(),
        "resolved game paths"
    );

    bail!(
        "no archive-decoder backend is linked into this binary; \
         run with --headless-demo to exercise the interpreter core"
    );
}

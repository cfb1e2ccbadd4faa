mod app;
mod render;
mod storage;
mod theme;

use anyhow::Context;
use app::{App, StoreHandle};
use clap::{Parser, Subcommand};
use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rush_core::{
    Category, Dice, GameConfig, LeaderboardConfig, LeaderboardStore, Period, PersistenceProvider, RngDice,
    TICK_MILLIS,
};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use storage::{FileStore, Profile};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "rush", version, about = "Timed recognition mini-games")]
struct Cli {
    /// Player name (remembered for next time)
    #[arg(short, long)]
    name: Option<String>,

    /// Game to select at start
    #[arg(short, long)]
    category: Option<Category>,

    /// JSON file overriding per-game tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where scores, the profile and the log are kept
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Fixed seed for reproducible rounds
    #[arg(long)]
    seed: Option<u64>,

    /// Never ring the terminal bell
    #[arg(long)]
    no_bell: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a ranking and exit
    Leaderboard {
        #[arg(short, long, default_value = "strawberry")]
        category: Category,

        /// all, daily, weekly or monthly
        #[arg(short, long, default_value = "all")]
        period: Period,

        /// Also show this player's best score and recent history
        #[arg(long)]
        player: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(FileStore::default_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("cannot create data directory {}", data_dir.display()))?;
    init_logging(&data_dir)?;

    let config = match cli.config {
        Some(ref path) => GameConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => GameConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")?;

    let local = Arc::new(FileStore::new(&data_dir));
    let store = Arc::new(LeaderboardStore::from_config(
        LeaderboardConfig::from_env(),
        local.clone(),
    ));
    info!(data_dir = %data_dir.display(), store = ?store, "starting");

    if let Some(Command::Leaderboard {
        category,
        period,
        player,
    }) = cli.command
    {
        return runtime.block_on(print_leaderboard(&store, category, period, player.as_deref()));
    }

    let mut profile = runtime.block_on(Profile::load(local.as_ref()));
    if let Some(name) = cli.name {
        profile.player_name = name;
    }
    if let Some(category) = cli.category {
        profile.category = category;
    }
    if cli.no_bell {
        profile.haptics_enabled = false;
    }

    let dice: Box<dyn Dice> = match cli.seed {
        Some(seed) => Box::new(RngDice::seeded(seed)),
        None => Box::new(RngDice::from_entropy()),
    };
    let handle = StoreHandle {
        store,
        local: local as Arc<dyn PersistenceProvider>,
        runtime: runtime.handle().clone(),
    };
    let mut app = App::new(config, dice, handle, profile);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let result = run_app(&mut stdout, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen, Show)?;

    result.context("terminal error")
}

/// Log to `rush.log` in the data directory; stdout belongs to the UI
fn init_logging(data_dir: &Path) -> anyhow::Result<()> {
    let path = data_dir.join("rush.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;
    Ok(())
}

fn run_app(stdout: &mut io::Stdout, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(TICK_MILLIS);
    let mut last_tick = Instant::now();

    loop {
        render::render(stdout, app)?;
        stdout.flush()?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break;
                }

                match app.handle_key(key) {
                    app::AppAction::Continue => {}
                    app::AppAction::Quit => break,
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

async fn print_leaderboard(
    store: &LeaderboardStore,
    category: Category,
    period: Period,
    player: Option<&str>,
) -> anyhow::Result<()> {
    let view = store.query(category, period).await?;
    println!("{} - {} ({})", category.title(), period, view.source);
    if view.is_empty() {
        println!("  no scores yet");
    }
    for (i, entry) in view.entries.iter().enumerate() {
        println!(
            "{:>4}  {:<14}{:>7}  {}",
            i + 1,
            entry.player_name,
            entry.score,
            entry.created_at.format("%Y-%m-%d %H:%M UTC")
        );
    }

    if let Some(player) = player {
        let best = store.best_score(category, player).await?;
        let history = store.history(category, player).await?;
        println!();
        println!("{}: best {} over {} rounds", player, best, history.len());
        for entry in history.iter().take(10) {
            println!("  {}  {:>5}", entry.created_at.format("%Y-%m-%d %H:%M UTC"), entry.score);
        }
    }
    Ok(())
}

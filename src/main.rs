use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deck_meta::api::parse_window;
use deck_meta::archive::{load_window, ArchiveSource, ArchiveWindow, LocalArchive, RemoteArchive};
use deck_meta::calculate::{
    aggregate_players_and_decks, best_and_worst, compute_deck_matchups, compute_deck_stats,
    compute_deck_trend_by_month, compute_deck_vs_field, compute_standings, filter_rows,
    VersusSort,
};
use deck_meta::catalog::DeckCatalog;
use deck_meta::config::AppConfig;
use deck_meta::fetch::{Fetcher, FetcherConfig};
use deck_meta::live::LiveSession;
use deck_meta::models::{MatchResult, PlayerId, PointRules, Tournament};
use deck_meta::storage::{
    export_tournament, read_json, JsonFileLiveStore, LiveStore, MemoryLiveStore, StorageConfig,
};

#[derive(Parser)]
#[command(name = "deck-meta")]
#[command(about = "Swiss card-game tournament tracker with deck meta analytics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which archived tournaments to analyse.
#[derive(Args, Debug)]
struct WindowArgs {
    /// all, single, last or month
    #[arg(long, default_value = "all")]
    mode: String,

    /// Tournament id for --mode single
    #[arg(long)]
    id: Option<String>,

    /// Number of most recent tournaments for --mode last
    #[arg(long)]
    last: Option<usize>,

    /// YYYY-MM for --mode month
    #[arg(long)]
    month: Option<String>,
}

impl WindowArgs {
    fn window(&self) -> Result<ArchiveWindow> {
        Ok(parse_window(
            Some(&self.mode),
            self.id.as_deref(),
            self.last,
            self.month.as_deref(),
        )?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print player standings of a tournament
    Standings {
        /// Tournament JSON file (default: the live tournament)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print per-deck meta share and win rate of a tournament
    DeckStats {
        /// Tournament JSON file (default: the live tournament)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the deck-vs-deck matchup matrix of a tournament
    Matchups {
        /// Tournament JSON file (default: the live tournament)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Aggregate player and deck leaderboards over archived tournaments
    Archive {
        #[command(flatten)]
        window: WindowArgs,

        /// Minimum matches for the ranked deck lists (default from config)
        #[arg(long)]
        min_matches: Option<u32>,

        /// Rows to print per table
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Report one deck against the field
    Lab {
        /// Deck key or catalog name
        deck: String,

        /// Restrict the monthly trend to this opponent deck
        #[arg(long)]
        opponent: Option<String>,

        /// Minimum matches per opponent row (default from config)
        #[arg(long)]
        min_sample: Option<u32>,

        /// Row order: matches or wr
        #[arg(long, default_value = "matches")]
        sort: String,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Edit the live tournament
    Live {
        #[command(subcommand)]
        action: LiveAction,
    },

    /// Start the API server
    Serve {
        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default from config)
        #[arg(long)]
        port: Option<u16>,

        /// Keep the live tournament in memory only
        #[arg(long)]
        ephemeral: bool,
    },
}

#[derive(Subcommand)]
enum LiveAction {
    /// Replace the live tournament with an empty one
    New {
        #[arg(long)]
        name: Option<String>,

        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        rounds: Option<u32>,

        #[arg(long)]
        location: Option<String>,

        /// Points as WIN/DRAW/LOSS, e.g. 3/1/0
        #[arg(long)]
        points: Option<String>,
    },

    /// Add a player to the roster
    AddPlayer { name: String },

    /// Assign a deck to a player; an empty deck clears it
    SetDeck {
        /// Player id or name
        player: String,

        /// Deck key or catalog name
        deck: String,
    },

    /// Open the next round
    StartRound,

    /// Pair two players in the current round; without B the match is a bye
    AddMatch {
        /// Player id or name
        a: String,

        /// Player id or name
        b: Option<String>,
    },

    /// Record a match result: A, B or D
    Result {
        #[arg(long)]
        round: u32,

        #[arg(long)]
        table: u32,

        result: String,
    },

    /// Lock the current round
    CloseRound,

    /// Print the live tournament
    Show {
        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },

    /// Write the live tournament as JSON
    Export {
        /// Output directory (default: <data_dir>/exports)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Discard the live tournament
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(Path::new(&cli.config))
        .with_context(|| format!("Failed to load config {}", cli.config))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(dir);
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!("Starting deck-meta v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Standings { file } => {
            let t = load_subject(file.as_deref(), &storage)?;
            print_header(&t);
            println!(
                "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>4} {:>6}",
                "#", "Player", "W", "L", "D", "Pts", "Played"
            );
            for (i, s) in compute_standings(&t).iter().enumerate() {
                println!(
                    "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>4} {:>6}",
                    i + 1,
                    s.name,
                    s.wins,
                    s.losses,
                    s.draws,
                    s.points,
                    s.played
                );
            }
        }
        Commands::DeckStats { file } => {
            let t = load_subject(file.as_deref(), &storage)?;
            print_header(&t);
            println!(
                "{:<24} {:>7} {:>6} {:>7} {:>9} {:>6}",
                "Deck", "Players", "Meta", "Matches", "W-L-D", "WR"
            );
            for d in compute_deck_stats(&t) {
                println!(
                    "{:<24} {:>7} {:>5.1}% {:>7} {:>9} {:>5.1}%",
                    d.deck_name,
                    d.players,
                    d.meta_share * 100.0,
                    d.matches,
                    format!("{}-{}-{}", d.wins, d.losses, d.draws),
                    d.win_rate * 100.0
                );
            }
        }
        Commands::Matchups { file } => {
            let t = load_subject(file.as_deref(), &storage)?;
            let catalog = open_catalog(&config, &storage, None).await;
            print_header(&t);
            println!(
                "{:<20} {:<20} {:>7} {:>9} {:>6}",
                "Deck A", "Deck B", "Matches", "A-B-D", "A WR"
            );
            for cell in compute_deck_matchups(&t) {
                println!(
                    "{:<20} {:<20} {:>7} {:>9} {:>5.1}%",
                    catalog.label(cell.a_did.as_str(), Some(&t)),
                    catalog.label(cell.b_did.as_str(), Some(&t)),
                    cell.matches,
                    format!("{}-{}-{}", cell.a_wins, cell.b_wins, cell.draws),
                    cell.a_win_rate * 100.0
                );
            }
        }
        Commands::Archive {
            window,
            min_matches,
            top,
        } => {
            let window = window.window()?;
            let fetcher = build_fetcher(&storage)?;
            let archive = open_archive(&config, &storage, &fetcher);
            let catalog = open_catalog(&config, &storage, Some(&fetcher)).await;

            let tournaments = load_window(archive, &window).await?;
            let agg = aggregate_players_and_decks(&tournaments);
            let min_matches = min_matches.unwrap_or(config.analysis.dashboard_min_matches);

            println!(
                "{} tournaments, {} players, {} deck entries",
                tournaments.len(),
                agg.players.len(),
                agg.total_entries
            );

            println!("\nPlayers");
            for (i, p) in agg.players.iter().take(top).enumerate() {
                println!(
                    "{:>3}  {:<24} {:>4} pts {:>3}-{}-{} {:>5.1}%",
                    i + 1,
                    p.name,
                    p.points,
                    p.wins,
                    p.losses,
                    p.draws,
                    p.win_rate * 100.0
                );
            }

            println!("\nDecks by meta share");
            for d in agg.decks.iter().take(top) {
                println!(
                    "  {:<24} {:>4} entries {:>5.1}%",
                    catalog.label(d.did.as_str(), None),
                    d.entries,
                    d.meta_share * 100.0
                );
            }

            println!("\nDecks by win rate (N>={})", min_matches);
            for d in agg.decks_by_win_rate(min_matches).into_iter().take(top) {
                println!(
                    "  {:<24} {:>4} matches {:>5.1}%",
                    catalog.label(d.did.as_str(), None),
                    d.matches,
                    d.win_rate * 100.0
                );
            }

            println!("\nDecks by dominance (N>={})", min_matches);
            for d in agg.decks_by_dominance(min_matches).into_iter().take(top) {
                println!(
                    "  {:<24} {:.4}",
                    catalog.label(d.did.as_str(), None),
                    d.dominance()
                );
            }
        }
        Commands::Lab {
            deck,
            opponent,
            min_sample,
            sort,
            window,
        } => {
            let window = window.window()?;
            let sort: VersusSort = sort.parse().map_err(anyhow::Error::msg)?;
            let fetcher = build_fetcher(&storage)?;
            let archive = open_archive(&config, &storage, &fetcher);
            let catalog = open_catalog(&config, &storage, Some(&fetcher)).await;
            let min_sample = min_sample.unwrap_or(config.analysis.lab_min_sample);

            let did = catalog.resolve_key(&deck).unwrap_or(&deck).to_string();
            let opponent = opponent.map(|o| catalog.resolve_key(&o).unwrap_or(&o).to_string());

            let tournaments = load_window(archive, &window).await?;
            let field = compute_deck_vs_field(&tournaments, &did);
            let s = &field.summary;
            println!(
                "{}: {} tournaments, {} matches, {}-{}-{}, {:.1}%",
                catalog.label(&did, None),
                s.tournaments,
                s.matches,
                s.wins,
                s.losses,
                s.draws,
                s.win_rate * 100.0
            );

            println!("\nVersus (N>={})", min_sample);
            for row in filter_rows(&field.rows, min_sample, sort) {
                println!(
                    "  {:<24} {:>4} {:>9} {:>5.1}%",
                    catalog.label(row.opponent_did.as_str(), None),
                    row.matches,
                    format!("{}-{}-{}", row.wins, row.losses, row.draws),
                    row.win_rate * 100.0
                );
            }

            let bw = best_and_worst(&field.rows, min_sample);
            for (title, rows) in [("Best", &bw.best), ("Worst", &bw.worst)] {
                println!("\n{}", title);
                for row in rows {
                    println!(
                        "  {:<24} {:>5.1}% ({} games)",
                        catalog.label(row.opponent_did.as_str(), None),
                        row.win_rate * 100.0,
                        row.matches
                    );
                }
            }

            println!("\nTrend");
            for p in compute_deck_trend_by_month(&tournaments, &did, opponent.as_deref()) {
                println!("  {}  {:>4} matches {:>5.1}%", p.ym, p.matches, p.win_rate * 100.0);
            }
        }
        Commands::Live { action } => {
            run_live(action, &config, &storage, today).await?;
        }
        Commands::Serve {
            host,
            port,
            ephemeral,
        } => {
            let fetcher = build_fetcher(&storage)?;
            let archive = open_archive(&config, &storage, &fetcher);
            let catalog = open_catalog(&config, &storage, Some(&fetcher)).await;

            let store: Box<dyn LiveStore> = if ephemeral {
                Box::new(MemoryLiveStore::new())
            } else {
                Box::new(JsonFileLiveStore::in_data_dir(&storage))
            };
            let mut session = LiveSession::open(store, config.live.clone(), today)?;
            session.sync_decks(catalog.clone())?;

            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let serve_archive = config.archive.base_url.is_none();

            let state = deck_meta::api::state::AppState {
                config: Arc::new(config),
                live: Arc::new(tokio::sync::RwLock::new(session)),
                archive,
                catalog: Arc::new(catalog),
            };
            let mut app = deck_meta::api::build_router(state);
            if serve_archive {
                // lets another instance use this one as its remote archive
                app = app.nest_service("/archive", ServeDir::new(storage.archive_dir()));
            }

            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

async fn run_live(
    action: LiveAction,
    config: &AppConfig,
    storage: &StorageConfig,
    today: NaiveDate,
) -> Result<()> {
    let store = JsonFileLiveStore::in_data_dir(storage);
    let mut session = LiveSession::open(store, config.live.clone(), today)?;
    let catalog = open_catalog(config, storage, None).await;

    match action {
        LiveAction::New {
            name,
            date,
            rounds,
            location,
            points,
        } => {
            let date = match date {
                Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .with_context(|| format!("Invalid --date (expected YYYY-MM-DD): {}", d))?,
                None => today,
            };
            session.new_tournament(name.as_deref(), date)?;
            if let Some(rounds) = rounds {
                session.set_rounds(rounds)?;
            }
            if let Some(location) = location {
                session.set_location(&location)?;
            }
            if let Some(points) = points {
                session.set_rules(parse_points(&points)?)?;
            }
            let t = session.tournament();
            println!("Created {} ({})", t.id, t.name);
        }
        LiveAction::AddPlayer { name } => {
            let pid = session.add_player(&name)?;
            println!("{}", pid);
        }
        LiveAction::SetDeck { player, deck } => {
            let pid = find_player(session.tournament(), &player)?;
            let did = catalog.resolve_key(&deck).unwrap_or(deck.trim()).to_string();
            session.sync_decks(catalog)?;
            session.set_entry(pid.as_str(), &did)?;
        }
        LiveAction::StartRound => {
            let r = session.start_round()?;
            println!("Round {} started", r);
        }
        LiveAction::AddMatch { a, b } => {
            let a = find_player(session.tournament(), &a)?;
            let b = b.map(|b| find_player(session.tournament(), &b)).transpose()?;
            let mid = session.add_match(a.as_str(), b.as_ref().map(PlayerId::as_str))?;
            println!("{}", mid);
        }
        LiveAction::Result {
            round,
            table,
            result,
        } => {
            let Some(result) = MatchResult::from_code(&result) else {
                bail!("Unknown result '{}', expected A, B or D", result);
            };
            let mid = session
                .tournament()
                .rounds
                .iter()
                .find(|r| r.r == round)
                .and_then(|r| r.matches.iter().find(|m| m.table == table))
                .map(|m| m.mid.clone())
                .with_context(|| format!("No table {} in round {}", table, round))?;
            session.set_result(mid.as_str(), result)?;
        }
        LiveAction::CloseRound => {
            let r = session.close_round()?;
            println!("Round {} closed", r);
        }
        LiveAction::Show { json } => {
            let t = session.tournament();
            if json {
                println!("{}", serde_json::to_string_pretty(t)?);
                return Ok(());
            }
            print_header(t);
            for p in &t.players {
                let deck = t
                    .deck_of(p.pid.as_str())
                    .map(|did| catalog.label(did.as_str(), Some(t)))
                    .unwrap_or_else(|| "-".to_string());
                println!("  {:<12} {:<24} {}", p.pid.as_str(), p.name, deck);
            }
            for round in &t.rounds {
                let state = if round.locked { "closed" } else { "open" };
                println!("Round {} ({})", round.r, state);
                for m in &round.matches {
                    let name = |pid: &PlayerId| {
                        t.player(pid.as_str())
                            .map_or_else(|| pid.to_string(), |p| p.name.clone())
                    };
                    let b = m.b.as_ref().map_or_else(|| "BYE".to_string(), name);
                    let result = m.result.map_or("-", |r| r.code());
                    println!("  {:>3}  {:<20} vs {:<20} {}", m.table, name(&m.a), b, result);
                }
            }
        }
        LiveAction::Export { out } => {
            let dir = out.unwrap_or_else(|| storage.exports_dir());
            let path = export_tournament(session.tournament(), &dir)?;
            println!("{}", path.display());
        }
        LiveAction::Reset => {
            session.reset(today)?;
        }
    }

    Ok(())
}

/// A tournament file, or the live tournament when no file is given.
fn load_subject(file: Option<&Path>, storage: &StorageConfig) -> Result<Tournament> {
    match file {
        Some(path) => {
            read_json(path).with_context(|| format!("Failed to read tournament {:?}", path))
        }
        None => JsonFileLiveStore::in_data_dir(storage)
            .load()?
            .context("No live tournament; pass --file or run `deck-meta live new`"),
    }
}

fn print_header(t: &Tournament) {
    println!(
        "{} ({}) {} players, {}/{} rounds",
        t.name,
        t.date,
        t.players.len(),
        t.rounds.len(),
        t.format.rounds
    );
}

fn build_fetcher(storage: &StorageConfig) -> Result<Fetcher> {
    Ok(Fetcher::new(
        FetcherConfig::default().with_cache_dir(storage.cache_dir()),
    )?)
}

fn open_archive(
    config: &AppConfig,
    storage: &StorageConfig,
    fetcher: &Fetcher,
) -> Arc<dyn ArchiveSource> {
    match &config.archive.base_url {
        Some(base) => Arc::new(RemoteArchive::new(
            base.clone(),
            config.archive.index_path.clone(),
            fetcher.clone(),
        )),
        None => Arc::new(LocalArchive::new(
            storage.archive_dir(),
            config.archive.index_path.clone(),
        )),
    }
}

async fn open_catalog(
    config: &AppConfig,
    storage: &StorageConfig,
    fetcher: Option<&Fetcher>,
) -> DeckCatalog {
    let location = config
        .catalog
        .path
        .clone()
        .unwrap_or_else(|| storage.catalog_path().to_string_lossy().to_string());
    DeckCatalog::load_or_empty(&location, fetcher).await
}

/// Player by id, else by case-insensitive name.
fn find_player(t: &Tournament, input: &str) -> Result<PlayerId> {
    let input = input.trim();
    if let Some(p) = t.player(input) {
        return Ok(p.pid.clone());
    }
    let matches: Vec<_> = t
        .players
        .iter()
        .filter(|p| p.name.eq_ignore_ascii_case(input))
        .collect();
    match matches.as_slice() {
        [p] => Ok(p.pid.clone()),
        [] => bail!("No player '{}'", input),
        _ => bail!("'{}' matches several players; use the player id", input),
    }
}

/// `3/1/0` → win, draw and loss points.
fn parse_points(s: &str) -> Result<PointRules> {
    let parts: Vec<u32> = s
        .split('/')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("Invalid --points '{}'", s))?;
    match parts.as_slice() {
        [win, draw, loss] => Ok(PointRules {
            win_points: *win,
            draw_points: *draw,
            loss_points: *loss,
        }),
        _ => bail!("--points expects WIN/DRAW/LOSS, got '{}'", s),
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use master_of_games::api::{build_router, cors_layer, state::AppState};
use master_of_games::config::AppConfig;
use master_of_games::league::{self, ScopeTarget, WeekReport, YearReport};
use master_of_games::models::{NewGame, PlayerId, RaceMetric, TiebreakScope, TitleId};
use master_of_games::storage::{LeagueStore, StorageConfig};

#[derive(Parser)]
#[command(name = "master-of-games")]
#[command(about = "Game-night results tracker with weekly and yearly champions")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show weekly standings (defaults to the current week)
    Week {
        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        week: Option<u32>,
    },

    /// Show yearly standings (defaults to the current year)
    Year {
        #[arg(long)]
        year: Option<i32>,
    },

    /// Show the cumulative year race
    Race {
        #[arg(long)]
        year: Option<i32>,

        /// Number of players to show
        #[arg(long)]
        top: Option<i32>,

        #[arg(long, default_value = "wins")]
        metric: String,
    },

    /// List recent games, newest first
    Games {
        /// Number of games to show (0 = all)
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Include soft-deleted games
        #[arg(long)]
        all: bool,
    },

    /// Add a player to the roster
    AddPlayer { name: String },

    /// Add a game title
    AddTitle { name: String },

    /// Record a game
    AddGame {
        /// Local date played (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Local time played (HH:MM)
        #[arg(long, default_value = "19:00")]
        time: String,

        #[arg(long)]
        title_id: i64,

        /// Participant ids, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        players: Vec<i64>,

        /// Winner ids, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        winners: Vec<i64>,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Settle a tied week or year
    Tiebreak {
        /// weekly or yearly
        scope: String,

        /// Scope key, e.g. 2026-W07 or 2026
        key: String,

        /// Chosen winner; omit to draw one by chance
        #[arg(long)]
        winner: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(Some(cli.config.as_path()))
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    init_tracing(
        cli.log_level.as_deref().unwrap_or(&config.log_level),
        cli.json_logs,
    );

    tracing::info!("Starting master-of-games v{}", env!("CARGO_PKG_VERSION"));

    let offset = config.league.offset()?;
    let store = LeagueStore::open(StorageConfig::new(config.data_dir.clone()))
        .with_context(|| format!("Failed to open data dir {}", config.data_dir.display()))?;

    store.seed(&config.league.seed_players, &config.league.seed_titles)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let state = AppState::new(Arc::new(store), config.league.clone())?;
            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));

            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Commands::Week { year, week } => {
            let (this_year, this_week) = league::current_week(Utc::now().with_timezone(&offset));
            let report = league::week_standings(
                &store,
                year.unwrap_or(this_year),
                week.unwrap_or(this_week),
            )?;
            print_week(&report);
        }
        Commands::Year { year } => {
            let year = year.unwrap_or_else(|| current_year(offset));
            let report = league::year_standings(&store, year, config.league.qualification)?;
            print_year(&report);
        }
        Commands::Race { year, top, metric } => {
            let metric: RaceMetric = metric.parse()?;
            let year = year.unwrap_or_else(|| current_year(offset));
            let race = league::year_race(
                &store,
                year,
                metric,
                top.unwrap_or(config.league.race_top_n),
            )?;

            if race.is_empty() {
                println!("No games recorded in {}", year);
                return Ok(());
            }
            let weeks: Vec<String> = race.weeks.iter().map(|w| format!("W{:02}", w)).collect();
            println!("{:<20} {}", format!("{} {}", race.year, race.metric), weeks.join(" "));
            for series in &race.series {
                let values: Vec<String> = series.values.iter().map(|v| format!("{:>3}", v)).collect();
                println!("{:<20} {}", series.name, values.join(" "));
            }
        }
        Commands::Games { limit, all } => {
            let games = store.recent_games(limit, all)?;
            if games.is_empty() {
                println!("No games recorded");
            }
            for game in games {
                println!(
                    "#{:<4} {}  {:<20} players {:?}  winners {:?}{}",
                    game.id,
                    game.played_at.format("%Y-%m-%d %H:%M"),
                    game.title,
                    game.participant_ids.iter().map(|p| p.get()).collect::<Vec<_>>(),
                    game.winner_ids.iter().map(|p| p.get()).collect::<Vec<_>>(),
                    if game.is_active { "" } else { "  (inactive)" },
                );
            }
        }
        Commands::AddPlayer { name } => {
            let player = store.add_player(&name)?;
            println!("Added player #{} {}", player.id, player.name);
        }
        Commands::AddTitle { name } => {
            let title = store.add_title(&name)?;
            println!("Added title #{} {}", title.id, title.name);
        }
        Commands::AddGame {
            date,
            time,
            title_id,
            players,
            winners,
            notes,
        } => {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("Invalid --date (expected YYYY-MM-DD): {}", date))?;
            let time = NaiveTime::parse_from_str(&time, "%H:%M")
                .with_context(|| format!("Invalid --time (expected HH:MM): {}", time))?;
            let played_at = offset
                .from_local_datetime(&date.and_time(time))
                .single()
                .context("Ambiguous local time")?;

            let new = NewGame {
                played_at,
                title_id: TitleId::new(title_id),
                participant_ids: players.into_iter().map(PlayerId::new).collect(),
                winner_ids: winners.into_iter().map(PlayerId::new).collect(),
                notes,
            };
            let game = store.add_game(new, config.league.weekdays_only)?;
            println!("Recorded game #{} ({} on {})", game.id, game.title, game.local_date());
        }
        Commands::Tiebreak { scope, key, winner } => {
            let scope: TiebreakScope = scope
                .parse()
                .map_err(|_| anyhow!("Unknown scope {:?} (expected weekly or yearly)", scope))?;
            let target = ScopeTarget::parse(scope, &key)?;
            let rule = config.league.qualification;

            let tiebreaker = match winner {
                Some(winner) => {
                    league::record_tiebreak(&store, rule, target, PlayerId::new(winner), Utc::now())?
                }
                None => league::draw_tiebreak(
                    &store,
                    rule,
                    target,
                    &mut rand::thread_rng(),
                    Utc::now(),
                )?,
            };
            println!(
                "{} {}: player {} wins the tiebreak among {:?}",
                tiebreaker.scope,
                tiebreaker.scope_key,
                tiebreaker.winner_id,
                tiebreaker.tied_player_ids.iter().map(|p| p.get()).collect::<Vec<_>>(),
            );
        }
    }

    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

fn current_year(offset: FixedOffset) -> i32 {
    use chrono::Datelike;
    Utc::now().with_timezone(&offset).year()
}

fn name_of(players: &std::collections::BTreeMap<PlayerId, String>, id: PlayerId) -> String {
    players
        .get(&id)
        .cloned()
        .unwrap_or_else(|| format!("#{}", id))
}

fn print_week(report: &WeekReport) {
    let ws = &report.standings;
    println!("Week {} ({} games)", ws.scope_key, ws.total_games);

    let mut rows: Vec<_> = ws.wins.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (player, wins) in rows {
        println!("  {:<20} {}", name_of(&report.players, *player), wins);
    }

    match ws.winner_id {
        Some(winner) => println!("Champion: {}", name_of(&report.players, winner)),
        None if ws.tie_unresolved => println!("Tied, awaiting tiebreak"),
        None => println!("No champion yet"),
    }
}

fn print_year(report: &YearReport) {
    let ys = &report.standings;
    match ys.attendance_cutoff {
        Some(cutoff) => println!("Year {} (qualify with {}+ days)", ys.scope_key, cutoff),
        None => println!("Year {}", ys.scope_key),
    }

    for s in &ys.stats {
        println!(
            "  {:<20} {:>3} days {:>4} games {:>4} wins {:>6.1}%{}",
            name_of(&report.players, s.player_id),
            s.attendance,
            s.games_played,
            s.wins,
            s.win_rate,
            if s.qualified { "" } else { "  (not qualified)" },
        );
    }

    match ys.winner_id {
        Some(winner) => println!("Master of Games: {}", name_of(&report.players, winner)),
        None if ys.tie_unresolved => println!("Tied, awaiting tiebreak"),
        None => println!("No champion yet"),
    }
}

//! Main entry point for the plex-remote CLI application.

use clap::{Parser, Subcommand};
use log::{debug, warn};
use plex_remote::api::{self, MediaServer, PLEX_TV_URL, PlexClient};
use plex_remote::config::Config;
use plex_remote::error::{AppError, Result};
use plex_remote::listing::names_from_list;
use plex_remote::orchestrator::{Orchestrator, StartShowOptions};
use plex_remote::session::{MemorySession, Response, SessionStore};
use plex_remote::ui::{print_response, prompt_answer_stdin};

/// Command-line arguments for the plex-remote application.
#[derive(Parser, Debug)]
#[command(
    name = "plex-remote",
    version,
    about = "Play TV shows on Plex players by name",
    long_about = "Pick an episode of a show from your Plex library and start it on a Plex client."
)]
struct Args {
    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(short, long, default_value_t = 1, global = true)]
    log: u8,

    /// Player to start playback on (overrides config)
    #[arg(short, long, global = true)]
    player: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play an episode of a show
    Play {
        /// Show name, as you would say it
        #[arg(required = true, num_args = 1..)]
        show: Vec<String>,

        /// Season number
        #[arg(short, long)]
        season: Option<i64>,

        /// Episode number; 203 means season 2 episode 3 when no season is given
        #[arg(short, long)]
        episode: Option<i64>,

        /// Pick a random episode instead of continuing
        #[arg(short, long)]
        random: bool,

        /// Only pick among this top-rated fraction, e.g. 0.25
        #[arg(short, long)]
        top_rated: Option<f64>,
    },
    /// List what is On Deck
    OnDeck,
    /// List players that accept playback
    Players,
    /// List online servers on the Plex account
    Servers,
    /// Write a default config file if there is none yet
    Init,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_level = match args.log {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    debug!("Log level set to {:?}", log_level);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    if let Command::Init = args.command {
        let path = Config::create_default_if_missing()?;
        println!("Config file: {}", path.display());
        return Ok(());
    }

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        let mut config = Config::new();
        config.apply_env(|key| std::env::var(key).ok());
        config
    });

    let orchestrator = Orchestrator::from_config(&config)?;

    match args.command {
        Command::Play {
            show,
            season,
            episode,
            random,
            top_rated,
        } => {
            let player = args
                .player
                .or_else(|| config.default_player.clone())
                .ok_or_else(|| {
                    AppError::InvalidArgument(
                        "no player given; use --player or set default_player".to_string(),
                    )
                })?;

            let options = StartShowOptions {
                force_random: random,
                only_top_rated: top_rated,
                episode_number: episode,
                season_number: season,
                ..StartShowOptions::new(&show.join(" "), &player)
            };
            play(&orchestrator, &options).await
        }
        Command::OnDeck => {
            let items = api::on_deck(orchestrator.server()).await?;
            for name in names_from_list(&items) {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Players => list_players(orchestrator.server()).await,
        Command::Servers => {
            let web = PlexClient::new(PLEX_TV_URL, config.token.as_deref())?;
            for server in api::servers(&web).await? {
                println!("{} {}", server.name, server.client_identifier);
            }
            Ok(())
        }
        Command::Init => Ok(()),
    }
}

/// One start-show turn, followed by an answer turn if a question was asked.
async fn play(orchestrator: &Orchestrator, options: &StartShowOptions) -> Result<()> {
    let session = MemorySession::new();

    let mut response = Response::new();
    let result = orchestrator
        .start_show(options, &mut response, &session)
        .await;
    print_response(&response);
    result?;

    if response.ends_session() || session.peek_prompt().is_none() {
        return Ok(());
    }

    let answer = prompt_answer_stdin()?;
    let mut reply = Response::new();
    let result = orchestrator
        .answer_prompt(answer, &mut reply, &session)
        .await;
    print_response(&reply);
    result
}

async fn list_players(server: &dyn MediaServer) -> Result<()> {
    let players = api::players(server).await?;
    if players.is_empty() {
        println!("No players available");
    }
    for player in players {
        println!("{} ({}) {}", player.name, player.product, player.address);
    }
    Ok(())
}

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use ministream_client::api::{self, Confirmation, SearchQuery};
use ministream_client::session::{Credentials, SessionManager};
use ministream_client::studio::{ClipTimeline, PublishMetadata};
use ministream_client::{ApiClient, Config, FileStorage, TokenStore};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line client for MiniStream
#[derive(Debug, Parser)]
#[command(name = "ministream", version, about)]
struct Cli {
    /// API base URL, overriding MINISTREAM_API_URL
    #[arg(long, global = true, value_name = "url")]
    api_url: Option<String>,

    /// Directory for persisted tokens and preferences, overriding MINISTREAM_DATA_DIR
    #[arg(long, global = true, value_name = "dir")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MINISTREAM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Search videos and series
    Search { query: String },
    /// Delete the watch history
    ClearHistory {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Merge local clips into one video, in the order given
    Merge {
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
        /// Publish the merged video right away
        #[arg(long, requires_all = ["title", "description", "genre", "language"])]
        publish: bool,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ministream=info,ministream_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    debug!("Using API at {} with data in {:?}", config.api.base_url, config.data_dir);

    let storage = FileStorage::open(config.storage_path())
        .with_context(|| format!("opening storage in {:?}", config.data_dir))?;
    let tokens = TokenStore::new(Arc::new(storage));
    let api = Arc::new(ApiClient::new(&config.api, tokens).context("building HTTP client")?);
    let session = SessionManager::new(Arc::clone(&api));

    match cli.command {
        Command::Login { email, password } => {
            let snapshot = session
                .login(&Credentials::new(email, password))
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            if let Some(user) = snapshot.user {
                println!("Logged in as {} <{}>", user.display_name, user.email);
            }
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
        }
        Command::Whoami => {
            let snapshot = session.initialize().await;
            match snapshot.user {
                Some(user) => {
                    let role = if user.is_creator { "creator" } else { "viewer" };
                    println!("{} <{}> ({})", user.display_name, user.email, role);
                }
                None => println!("Not logged in"),
            }
        }
        Command::Search { query } => {
            let results = api::discover::search(&api, &SearchQuery::text(query)).await?;
            for series in &results.series {
                println!("[series {}] {} ({} episodes)", series.id, series.title, series.episode_count);
            }
            for video in &results.videos {
                println!(
                    "[video {}] {} {}",
                    video.id,
                    video.title,
                    video.duration_formatted.as_deref().unwrap_or("")
                );
            }
            if results.series.is_empty() && results.videos.is_empty() {
                println!("No results");
            }
        }
        Command::ClearHistory { yes } => {
            let confirmation = if yes {
                Some(Confirmation::assume_yes())
            } else {
                prompt_confirmation("Clear your entire watch history? [y/N] ")?
            };
            let Some(confirmation) = confirmation else {
                println!("Cancelled");
                return Ok(());
            };
            api::discover::clear_history(&api, confirmation).await?;
            println!("Watch history cleared");
        }
        Command::Merge {
            files,
            publish,
            title,
            description,
            genre,
            language,
        } => {
            let mut timeline = ClipTimeline::with_config(&config.studio);
            timeline.add_clip_files(&files).await?;
            let merged = timeline.merge(&api).await?;
            println!(
                "Merged {} clips: {} ({}s)",
                merged.clip_count, merged.video_url, merged.duration
            );

            if publish {
                let metadata = PublishMetadata {
                    title: title.unwrap_or_default(),
                    description: description.unwrap_or_default(),
                    genre: genre.unwrap_or_default(),
                    language: language.unwrap_or_default(),
                    ..Default::default()
                };
                let video = timeline.publish(&api, &metadata).await?;
                info!("Published video {}", video.id);
                println!("Published \"{}\" as video {}", video.title, video.id);
            }
        }
    }

    Ok(())
}

/// Ask on stdin; anything but an explicit yes declines
fn prompt_confirmation(question: &str) -> anyhow::Result<Option<Confirmation>> {
    let mut stdout = io::stdout();
    stdout.write_all(question.as_bytes())?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    if answer.is_empty() {
        bail!("no answer on stdin; pass --yes to skip the prompt");
    }
    Ok(Confirmation::from_answer(&answer))
}

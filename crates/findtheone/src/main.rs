//! `findtheone` - command-line client for the FindTheOne dating backend.
//!
//! Drives the client core against a live server: matches, chat with
//! coin-gated unlocks, the coin store, and the discovery deck.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod commands;
mod settings;

use clap::{Parser, Subcommand};
use findtheone_api::{ApiClient, Credentials, MatchId, MessageId, SwipeAction, UserId};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settings::AppSettings;

#[derive(Parser)]
#[command(name = "findtheone", version, about = "FindTheOne command-line client")]
struct Cli {
    /// Backend base URL (overrides the stored setting).
    #[arg(long, global = true, env = "FINDTHEONE_API_URL")]
    api_url: Option<String>,

    /// Bearer token from `signin`.
    #[arg(long, global = true, env = "FINDTHEONE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Signed-in user id, for tokens that do not carry one.
    #[arg(long, global = true, env = "FINDTHEONE_USER_ID")]
    user_id: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and print a bearer token.
    Signin {
        /// Account email.
        email: String,
        /// Account password.
        #[arg(long, env = "FINDTHEONE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List matches.
    Matches,
    /// Show the coin balance.
    Coins,
    /// List coin packages.
    Packages,
    /// Buy a coin package.
    Buy {
        /// Package id (e.g. `starter`).
        package: String,
    },
    /// Show the conversation with a match.
    Chat {
        /// Match id from `matches`.
        match_id: i64,
    },
    /// Send a message to a match.
    Send {
        /// Match id from `matches`.
        match_id: i64,
        /// Message text.
        text: String,
    },
    /// Spend a coin to read a received message.
    Unlock {
        /// Match id from `matches`.
        match_id: i64,
        /// Message id from `chat`.
        message_id: i64,
    },
    /// Show the next suggested profile, or like/pass on it.
    Discover {
        /// Like the current profile.
        #[arg(long, conflicts_with = "pass")]
        like: bool,
        /// Pass on the current profile.
        #[arg(long)]
        pass: bool,
    },
    /// Store client settings.
    Config {
        /// Backend base URL to store.
        #[arg(long)]
        set_api_url: Option<String>,
        /// Request timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "findtheone=info,findtheone_core=info,findtheone_api=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut settings = AppSettings::load().await?;

    if let Command::Config {
        set_api_url,
        timeout_secs,
    } = &cli.command
    {
        if let Some(url) = set_api_url {
            settings.api_base_url.clone_from(url);
        }
        if let Some(secs) = timeout_secs {
            settings.timeout_secs = *secs;
        }
        settings.api_config()?;
        let path = settings.save().await?;
        println!("Saved {} ({})", path.display(), settings.api_base_url);
        return Ok(());
    }

    if let Some(url) = &cli.api_url {
        settings.api_base_url.clone_from(url);
    }
    debug!("Using backend at {}", settings.api_base_url);

    let mut client = ApiClient::new(settings.api_config()?)?;
    if let Some(token) = &cli.token {
        client = client.with_credentials(Credentials::new(token.as_str()));
    }

    let user_id = cli.user_id.map(UserId);
    match cli.command {
        Command::Signin { email, password } => commands::signin(&client, &email, &password).await,
        Command::Matches => commands::matches(client, user_id).await,
        Command::Coins => commands::coins(client).await,
        Command::Packages => commands::packages(client).await,
        Command::Buy { package } => commands::buy(client, &package).await,
        Command::Chat { match_id } => commands::chat(client, user_id, MatchId(match_id)).await,
        Command::Send { match_id, text } => {
            commands::send(client, user_id, MatchId(match_id), &text).await
        }
        Command::Unlock {
            match_id,
            message_id,
        } => commands::unlock(client, user_id, MatchId(match_id), MessageId(message_id)).await,
        Command::Discover { like, pass } => {
            let action = if like {
                Some(SwipeAction::Like)
            } else if pass {
                Some(SwipeAction::Pass)
            } else {
                None
            };
            commands::discover(client, action).await
        }
        Command::Config { .. } => Ok(()),
    }
}

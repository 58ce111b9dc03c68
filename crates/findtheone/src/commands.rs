//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{Context, bail};
use findtheone_api::{ApiClient, MatchId, Message, MessageId, Profile, SwipeAction, UserId};
use findtheone_core::{
    Balance, ChatSession, CoinLedger, CoinStore, DiscoveryDeck, SwipeResult, UNLOCK_COST,
    UnlockOutcome, Visibility,
};
use tracing::warn;

/// The signed-in user: `--user-id` if given, else the id in the bearer token.
fn viewer(client: &ApiClient, user_id: Option<UserId>) -> anyhow::Result<UserId> {
    let credentials = client
        .credentials()
        .context("No token; run `findtheone signin <email>` and pass --token")?;
    user_id
        .or_else(|| credentials.user_id())
        .context("Token does not carry a user id; pass --user-id")
}

async fn open_chat(
    client: ApiClient,
    user_id: Option<UserId>,
    match_id: MatchId,
) -> anyhow::Result<ChatSession<ApiClient>> {
    let viewer = viewer(&client, user_id)?;
    let session = ChatSession::new(Arc::new(client), viewer);
    session.open().await?;
    session.select_match(match_id).await?;
    Ok(session)
}

fn print_profile(profile: &Profile) {
    let age = profile.age.map(|a| format!(", {a}")).unwrap_or_default();
    let location = profile
        .location
        .as_deref()
        .map(|l| format!(" - {l}"))
        .unwrap_or_default();
    println!("{} (user {}){age}{location}", profile.name, profile.id);
    if let Some(bio) = &profile.bio {
        println!("  {bio}");
    }
}

/// Text shown in place of a message the viewer cannot read yet.
fn placeholder(visibility: Visibility, balance: Balance) -> Option<String> {
    match visibility {
        Visibility::Visible => None,
        Visibility::Pending => Some("[unlocking...]".into()),
        Visibility::Unlockable => Some(format!("[locked: unlock for {UNLOCK_COST} coin]")),
        Visibility::Locked => Some(match balance {
            Balance::Unknown => "[locked: balance unknown]".into(),
            Balance::Known(_) => "[locked: not enough coins]".into(),
        }),
    }
}

fn print_message(message: &Message, visibility: Visibility, viewer: UserId, balance: Balance) {
    let who = if message.sender_id == viewer { "you" } else { "them" };
    let time = message.sent_at.format("%Y-%m-%d %H:%M");
    match placeholder(visibility, balance) {
        Some(text) => println!("#{} {time} {who}: {text}", message.id),
        None => println!("#{} {time} {who}: {}", message.id, message.content),
    }
}

fn print_timeline(session: &ChatSession<ApiClient>) {
    if let Some(active) = session.active_match() {
        println!("Conversation with {}", active.profile.name);
    }
    let timeline = session.timeline();
    if timeline.is_empty() {
        println!("No messages yet.");
    }
    let balance = session.balance();
    for (message, visibility) in &timeline {
        print_message(message, *visibility, session.viewer(), balance);
    }
    println!("Balance: {} coins", session.balance());
}

pub async fn signin(client: &ApiClient, email: &str, password: &str) -> anyhow::Result<()> {
    let response = client.signin(email, password).await?;
    println!("Signed in as {} (user {})", response.name, response.id);
    println!("export FINDTHEONE_TOKEN={}", response.token);
    println!("export FINDTHEONE_USER_ID={}", response.id);
    Ok(())
}

pub async fn matches(client: ApiClient, user_id: Option<UserId>) -> anyhow::Result<()> {
    let viewer = viewer(&client, user_id)?;
    let session = ChatSession::new(Arc::new(client), viewer);
    session.open().await?;

    let matches = session.matches();
    if matches.is_empty() {
        println!("No matches yet.");
    }
    for summary in &matches {
        print!("[{}] ", summary.match_id);
        print_profile(&summary.profile);
    }
    Ok(())
}

pub async fn coins(client: ApiClient) -> anyhow::Result<()> {
    let ledger = CoinLedger::new(Arc::new(client));
    ledger.refresh_balance().await?;
    println!("Balance: {} coins", ledger.balance());
    Ok(())
}

pub async fn packages(client: ApiClient) -> anyhow::Result<()> {
    let store = CoinStore::new(Arc::new(client));
    for package in store.load_packages().await? {
        let popular = if package.popular { " (popular)" } else { "" };
        let per_coin = package
            .price_per_coin()
            .map(|p| format!(", {p:.3} per coin"))
            .unwrap_or_default();
        println!(
            "{}: {} coins + {} bonus for {:.2}{per_coin}{popular}",
            package.id, package.coins, package.bonus, package.price
        );
    }
    Ok(())
}

pub async fn buy(client: ApiClient, package: &str) -> anyhow::Result<()> {
    let backend = Arc::new(client);
    let ledger = CoinLedger::new(Arc::clone(&backend));
    let store = CoinStore::new(backend);
    if let Err(e) = ledger.refresh_balance().await {
        warn!("Could not load balance before purchase: {e}");
    }

    let receipt = store.purchase(package, &ledger).await?;
    println!("{}", receipt.message);
    println!("Balance: {} coins", ledger.balance());
    Ok(())
}

pub async fn chat(client: ApiClient, user_id: Option<UserId>, match_id: MatchId) -> anyhow::Result<()> {
    let session = open_chat(client, user_id, match_id).await?;
    print_timeline(&session);
    session.close();
    Ok(())
}

pub async fn send(
    client: ApiClient,
    user_id: Option<UserId>,
    match_id: MatchId,
    text: &str,
) -> anyhow::Result<()> {
    let session = open_chat(client, user_id, match_id).await?;
    session.send(text).await?;
    print_timeline(&session);
    session.close();
    Ok(())
}

pub async fn unlock(
    client: ApiClient,
    user_id: Option<UserId>,
    match_id: MatchId,
    message_id: MessageId,
) -> anyhow::Result<()> {
    let session = open_chat(client, user_id, match_id).await?;
    let outcome = session.unlock(message_id).await;

    match outcome {
        UnlockOutcome::Unlocked {
            already_unlocked: true,
        } => println!("Message #{message_id} was already unlocked."),
        UnlockOutcome::Unlocked { .. } => {
            println!("Unlocked message #{message_id} for {UNLOCK_COST} coin.");
        }
        UnlockOutcome::InsufficientCoins => {}
        UnlockOutcome::InvalidRequest => {
            println!("Message #{message_id} is no longer available.");
        }
        UnlockOutcome::Failed | UnlockOutcome::Cancelled => {
            println!("Could not unlock message #{message_id}; try again.");
        }
    }
    if session.purchase_prompt() {
        println!("Not enough coins. See `findtheone packages` and `findtheone buy <package>`.");
    }
    print_timeline(&session);
    session.close();
    Ok(())
}

pub async fn discover(client: ApiClient, action: Option<SwipeAction>) -> anyhow::Result<()> {
    let deck = DiscoveryDeck::new(Arc::new(client));
    deck.refresh().await?;

    let Some(action) = action else {
        match deck.current() {
            Some(profile) => {
                print_profile(&profile);
                println!("{} profiles left", deck.remaining());
            }
            None => println!("No more suggestions."),
        }
        return Ok(());
    };

    match deck.swipe(action).await {
        SwipeResult::Recorded {
            profile, is_match, ..
        } => {
            if is_match {
                println!("It's a match with {}!", profile.name);
            } else {
                println!("{action:?} {}", profile.name);
            }
            if let Some(next) = deck.current() {
                print!("Next: ");
                print_profile(&next);
            }
        }
        SwipeResult::Exhausted => println!("No more suggestions."),
        SwipeResult::Failed => bail!("Could not record the swipe; try again"),
        SwipeResult::Busy => bail!("Another swipe is still in progress"),
    }
    deck.close();
    Ok(())
}

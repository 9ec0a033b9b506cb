use std::fmt::Write as _;
use std::sync::Arc;

use channel::{ApiClient, ApiError, BoardFeed, ChannelConfig, NewPost, SocketManager, Subscription};
use clap::{Parser, Subcommand};
use events::{BoardId, PostId, PostStatus, WireMessage};
use layout::{BoardScheduler, LifecycleConfig, PlacementOptions, Snapshot};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("api request failed: {0}")]
    Api(#[from] ApiError),
    #[error("could not join the {0} room")]
    JoinFailed(&'static str),
    #[error("invalid status `{0}`; expected PENDING, APPROVED or REJECTED")]
    InvalidStatus(String),
    #[error("signal handler failed: {0}")]
    Signal(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "wall-viewer", about = "Message wall viewer and moderation CLI")]
struct Cli {
    /// Server URL; overrides `WALL_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Channel path; overrides `WALL_CHANNEL_PATH`.
    #[arg(long)]
    path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the API answers and count posts awaiting moderation.
    Ping,
    /// Follow a board and print what the wall would display.
    Board {
        /// Board to follow; the active board when omitted.
        #[arg(long)]
        id: Option<BoardId>,
    },
    /// Join the admin room and print every moderation event.
    Admin,
    /// Submit a post for moderation.
    Post {
        #[arg(long)]
        message: String,
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        board_id: Option<BoardId>,
    },
    /// Change a post's moderation status.
    Moderate { post_id: PostId, status: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = channel_config(ChannelConfig::from_env(), &cli);
    let api = ApiClient::new(&config.base_url)?;

    match cli.command {
        Command::Ping => run_ping(&api).await,
        Command::Board { id } => run_board(&api, config, id).await,
        Command::Admin => run_admin(config).await,
        Command::Post { message, nickname, board_id } => {
            let post = api
                .create_post(&NewPost { board_id, message: Some(message), nickname, ..NewPost::default() })
                .await?;
            print_json(&post)
        }
        Command::Moderate { post_id, status } => {
            let status: PostStatus = status.parse().map_err(|_| CliError::InvalidStatus(status))?;
            let post = api.update_post_status(post_id, status).await?;
            print_json(&post)
        }
    }
}

fn channel_config(mut config: ChannelConfig, cli: &Cli) -> ChannelConfig {
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(path) = &cli.path {
        config = config.with_path(path.clone());
    }
    config
}

async fn run_ping(api: &ApiClient) -> Result<(), CliError> {
    let pending = api.list_posts(None, Some(PostStatus::Pending)).await?;
    println!("ok ({} pending)", pending.len());
    Ok(())
}

// =============================================================================
// BOARD VIEWER
// =============================================================================

async fn run_board(api: &ApiClient, config: ChannelConfig, id: Option<BoardId>) -> Result<(), CliError> {
    let board = match id {
        Some(id) => api.fetch_board(id).await?,
        None => api.fetch_active_board().await?,
    };
    info!(board_id = board.id, title = %board.title, "viewer: following board");

    let scheduler = Arc::new(BoardScheduler::spawn(LifecycleConfig::default(), PlacementOptions::default()));
    scheduler.set_posts(board.posts.unwrap_or_default());

    let manager = SocketManager::new(config);
    let feed = BoardFeed::attach(&manager, board.id, Arc::clone(&scheduler));

    let mut snapshots = scheduler.subscribe();
    let outcome = loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print!("{}", render_snapshot(feed.board_id(), &snapshot));
            }
            signal = tokio::signal::ctrl_c() => break signal,
        }
    };

    drop(feed);
    shutdown(&manager, outcome)
}

/// Tear down the shared connection, then report how the run ended.
fn shutdown(manager: &SocketManager, outcome: std::io::Result<()>) -> Result<(), CliError> {
    manager.cleanup();
    outcome.map_err(CliError::Signal)
}

fn render_snapshot(board_id: BoardId, snapshot: &Snapshot) -> String {
    let mut out = format!(
        "[board-{board_id}] {} shown, {} live, {} queued\n",
        snapshot.entities.len(),
        snapshot.live_posts,
        snapshot.queued
    );
    for entity in &snapshot.entities {
        let marker = if entity.is_exiting { "-" } else { "+" };
        let _ = writeln!(
            out,
            "  {marker} #{:<5} {:>5.1}% {:>5.1}% {:>6.1}° {:<14} {}: {}",
            entity.post.id,
            entity.position.left,
            entity.position.top,
            entity.rotation,
            entity.animation.as_str(),
            entity.post.nickname_text(),
            entity.post.message_text(),
        );
    }
    out
}

// =============================================================================
// ADMIN FEED
// =============================================================================

async fn run_admin(config: ChannelConfig) -> Result<(), CliError> {
    let manager = SocketManager::new(config);
    let admin = Subscription::builder(&manager)
        .on_message(|message: &WireMessage| println!("{}", describe(message)))
        .on_disconnect(|| warn!("viewer: admin feed disconnected"))
        .auto_connect(false)
        .build();

    // Room membership is per connection, so re-join after every reconnect.
    let rejoin = manager.clone();
    manager.add_connection_listener(Arc::new(move || {
        let manager = rejoin.clone();
        tokio::spawn(async move {
            manager.emit_event(&events::ClientEvent::JoinAdmin).await;
        });
    }));

    if !admin.join_admin().await {
        manager.cleanup();
        return Err(CliError::JoinFailed("admin"));
    }
    info!(transport = admin.transport(), "viewer: admin feed joined");

    let signal = tokio::signal::ctrl_c().await;
    drop(admin);
    shutdown(&manager, signal)
}

fn describe(message: &WireMessage) -> String {
    match message.post() {
        Ok(post) => format!(
            "{:<20} post #{} board {} {}: {}",
            message.kind.as_str(),
            post.id,
            post.board_id,
            post.status.as_str(),
            post.message_text()
        ),
        Err(_) => match message.board() {
            Ok(board) => format!("{:<20} board #{} {:?}", message.kind.as_str(), board.id, board.title),
            Err(_) => format!("{:<20} {}", message.kind.as_str(), message.data),
        },
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

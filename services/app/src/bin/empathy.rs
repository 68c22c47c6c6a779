//! services/app/src/bin/empathy.rs

use app_lib::{
    adapters::{FileSessionStore, ReqwestTransport},
    config::Config,
    error::AppError,
    gateway::ApiGateway,
    screens::{
        challenges::ChallengesScreen, initial_route, stories::FeaturedStoriesScreen, QueryState,
        Route,
    },
};
use clap::{Parser, Subcommand};
use empathy_core::domain::Credentials;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "empathy")]
#[command(about = "Command-line client for the empathy community backend")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session on this device
    Login { email: String, password: String },
    /// Remove the stored session
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Backend at {}", config.base_url);

    // --- 2. Initialize Adapters ---
    let sessions = Arc::new(FileSessionStore::new(&config.session_path));
    let transport = Arc::new(ReqwestTransport::new(&config.base_url, config.request_timeout)?);
    let gateway = ApiGateway::new(transport, sessions.clone());

    // --- 3. Run the Requested Flow ---
    match args.command {
        Some(Command::Login { email, password }) => {
            let session = gateway.login(&Credentials { email, password }).await?;
            println!("Signed in as {}", session.display_name());
        }
        Some(Command::Logout) => {
            gateway.logout().await?;
            println!("Signed out");
        }
        None => overview(&gateway, initial_route(&*sessions).await).await,
    }
    Ok(())
}

/// Prints what the home flow would show. Load failures are reported, not fatal.
async fn overview(gateway: &ApiGateway, route: Route) {
    if route != Route::Home {
        println!("Not signed in. Use `empathy login <email> <password>`.");
        return;
    }
    if let Some(session) = gateway.current_session().await {
        println!("Welcome back, {}", session.display_name());
    }

    let challenges = ChallengesScreen::new(gateway.clone());
    let stories = FeaturedStoriesScreen::new(gateway.clone());
    let (challenges_done, stories_done) = tokio::join!(challenges.on_focus(), stories.on_focus());
    if let Err(e) = challenges_done.and(stories_done) {
        warn!("A screen load did not finish: {}", e);
    }

    match challenges.state() {
        QueryState::Ready(list) => {
            println!("\nChallenges ({}):", list.len());
            for c in &list {
                println!("  [{}] {} ({}, {})", c.id, c.name, c.category, c.difficulty);
            }
        }
        QueryState::Failed(e) => println!("\nChallenges unavailable: {}", e.message()),
        _ => {}
    }

    match stories.state() {
        QueryState::Ready(list) => {
            println!("\nStories ({}):", list.len());
            for s in &list {
                println!("  {} ({} likes): {}", s.author_display_name, s.like_count, s.text);
            }
        }
        QueryState::Failed(e) => println!("\nStories unavailable: {}", e.message()),
        _ => {}
    }
}

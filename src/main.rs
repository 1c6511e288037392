use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use yatube::auth::password::hash_password;
use yatube::config::{Cli, Command, Config};
use yatube::db::{self, groups, users};
use yatube::forms::{slug_problem, username_problem};
use yatube::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Ensure media directory exists
    std::fs::create_dir_all(config.media_path())?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(AppState::new(pool, config)).await,
        Command::CreateAdmin {
            username,
            password,
            email,
        } => {
            if let Some(problem) = username_problem(&username) {
                anyhow::bail!("Invalid username: {}", problem);
            }
            let hash = hash_password(&password, config.auth.password_cost)?;
            let conn = pool.get()?;
            let id = users::upsert_admin(&conn, &username, &email, &hash)?;
            tracing::info!("Administrator {} ready (id {})", username, id);
            Ok(())
        }
        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            if let Some(problem) = slug_problem(&slug) {
                anyhow::bail!("Invalid slug: {}", problem);
            }
            let conn = pool.get()?;
            if groups::slug_taken(&conn, &slug)? {
                anyhow::bail!("Group with slug {} already exists", slug);
            }
            let id = groups::create(&conn, &title, &slug, &description)?;
            tracing::info!("Group {} created (id {})", slug, id);
            Ok(())
        }
    }
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    {
        let conn = state.db.get()?;
        let purged = yatube::auth::session::purge_expired(&conn)?;
        if purged > 0 {
            tracing::info!("Purged {} expired session(s)", purged);
        }
    }

    let addr: SocketAddr =
        format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;
    let app = yatube::build_router(state);

    // Start server
    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

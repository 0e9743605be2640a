//! Recompute stored post counters from live posts.
//!
//! Operators run this after a `post_count_consistency` alert. Each counter is
//! rewritten in its own transaction, so the tool is safe to rerun while the
//! server keeps serving traffic.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use tokio::runtime::Builder;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use inkwell::domain::ports::UserRepository;
use inkwell::domain::{PostService, UserId};
use inkwell::outbound::persistence::{
    DbPool, DieselPostRepository, DieselUserRepository, PoolConfig,
};

/// `reconcile-post-counts` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reconcile-post-counts",
    about = "Recompute each user's post counter from their live posts",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `INKWELL_DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
    /// Reconcile only this user.
    #[arg(long = "user-id", value_name = "uuid", value_parser = parse_user_id)]
    user_id: Option<UserId>,
}

fn parse_user_id(raw: &str) -> Result<UserId, String> {
    UserId::new(raw).map_err(|err| err.to_string())
}

fn resolve_database_url(cli_value: Option<String>) -> Result<String> {
    cli_value
        .or_else(|| env::var("INKWELL_DATABASE_URL").ok())
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| eyre!("missing --database-url and INKWELL_DATABASE_URL is unset"))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .try_init()
        .map_err(|err| eyre!("tracing init failed: {err}"))?;

    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<()> {
    let database_url = resolve_database_url(args.database_url)?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|err| eyre!("create database pool: {err}"))?;

    let users = DieselUserRepository::new(pool.clone());
    let posts = PostService::new(
        Arc::new(DieselPostRepository::new(pool)),
        Arc::new(DefaultClock),
    );

    let targets = match args.user_id {
        Some(user_id) => vec![user_id],
        None => users
            .list_ids()
            .await
            .map_err(|err| eyre!("list users: {err}"))?,
    };

    let mut corrected = 0_usize;
    let mut failed = 0_usize;
    for user_id in &targets {
        match posts.reconcile_post_count(user_id).await {
            Ok(outcome) if outcome.corrected() => corrected += 1,
            Ok(_) => {}
            Err(err) => {
                failed += 1;
                error!(user_id = %user_id, error = %err, "reconciliation failed");
            }
        }
    }

    info!(
        checked = targets.len(),
        corrected, failed, "post count reconciliation finished"
    );
    if failed > 0 {
        return Err(eyre!("{failed} user(s) could not be reconciled"));
    }
    Ok(())
}

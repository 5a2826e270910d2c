//! CLI administration tool for link-lifecycle.
//!
//! Manages short links, runs expiry sweeps and performs database checks
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List all links with click counts
//! cargo run --bin admin -- links list
//!
//! # Show one link
//! cargo run --bin admin -- links show promo
//!
//! # Create or overwrite a link (asks before overwriting)
//! cargo run --bin admin -- links set promo https://example.com --expires-in-hours 48
//!
//! # Delete expired links now
//! cargo run --bin admin -- sweep
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server (see `link_lifecycle::config`); at minimum
//! `DATABASE_URL`. When Redis is configured, `links set` invalidates the
//! shared cache entry.

use link_lifecycle::application::services::LinkService;
use link_lifecycle::config::{self, Config};
use link_lifecycle::domain::entities::Link;
use link_lifecycle::domain::expiry_sweeper::ExpirySweeper;
use link_lifecycle::domain::repositories::LinkRepository;
use link_lifecycle::infrastructure::cache::{CacheService, NullCache, RedisCache};
use link_lifecycle::infrastructure::persistence::PgLinkRepository;
use link_lifecycle::server;

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing link-lifecycle.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage short links
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Delete expired links now
    Sweep,

    /// Show link and click totals
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Link management subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// List all links, newest first
    List,

    /// Show a single link
    Show {
        /// Short code
        code: String,
    },

    /// Create a link under a chosen code, or overwrite its target
    Set {
        /// Short code
        code: String,

        /// Target URL
        url: String,

        /// Hours until the link expires (omit or 0 for never)
        #[arg(short, long)]
        expires_in_hours: Option<u32>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    let pool = server::connect_database(&config).await?;

    match cli.command {
        Commands::Links { action } => handle_link_action(action, &config, &pool).await?,
        Commands::Sweep => handle_sweep(&config, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

fn repository(pool: &PgPool) -> Arc<dyn LinkRepository> {
    Arc::new(PgLinkRepository::new(Arc::new(pool.clone())))
}

/// Connects to the shared Redis cache when configured.
///
/// The server's in-process cache lives in another process and cannot be
/// reached from here; its entries lapse with `CACHE_TTL_SECONDS`.
async fn shared_cache(config: &Config) -> Result<Arc<dyn CacheService>> {
    match &config.redis_url {
        Some(url) if config.cache_enabled => {
            let cache = RedisCache::connect(url, config.cache_ttl_seconds)
                .await
                .context("Failed to connect to Redis")?;
            Ok(Arc::new(cache))
        }
        _ => Ok(Arc::new(NullCache::new())),
    }
}

/// Dispatches link management commands.
async fn handle_link_action(action: LinkAction, config: &Config, pool: &PgPool) -> Result<()> {
    let repo = repository(pool);
    let cache = shared_cache(config).await?;
    let service = server::build_link_service(config, repo, cache);

    match action {
        LinkAction::List => list_links(&service, config).await?,
        LinkAction::Show { code } => show_link(&service, config, &code).await?,
        LinkAction::Set {
            code,
            url,
            expires_in_hours,
            yes,
        } => set_link(&service, config, code, url, expires_in_hours, yes).await?,
    }

    Ok(())
}

/// Lists all links with click counts and expiry state.
///
/// # Output Format
///
/// ```text
/// Links
///
///   Code       Clicks  Expires           Target
///   ──────────────────────────────────────────────────────────────
///   promo          12  2026-01-02 10:30  https://example.com/sale
///   aB3dE9x         0  never             https://example.com
/// ```
async fn list_links(service: &LinkService, config: &Config) -> Result<()> {
    println!("{}", "Links".bright_blue().bold());
    println!();

    let links = service
        .list_links()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    let code_width = links
        .iter()
        .map(|l| l.code.len())
        .max()
        .unwrap_or(4)
        .max(config.code_length)
        .max(4);

    println!(
        "  {:<code_width$} {:>7}  {:<17} {}",
        "Code".bright_white().bold(),
        "Clicks".bright_white().bold(),
        "Expires".bright_white().bold(),
        "Target".bright_white().bold(),
    );
    println!("  {}", "─".repeat(code_width + 60).bright_black());

    for link in &links {
        println!(
            "  {:<code_width$} {:>7}  {:<17} {}",
            link.code.cyan(),
            link.click_count,
            expiry_label(link),
            link.long_url
        );
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Shows the details of one link.
async fn show_link(service: &LinkService, config: &Config, code: &str) -> Result<()> {
    let link = service
        .get_clicks(code)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    print_link(&link, service, config);
    Ok(())
}

/// Creates or overwrites a link after confirmation.
///
/// Overwrites keep the accumulated click count and invalidate the shared
/// cache entry, so the next redirect uses the new target.
async fn set_link(
    service: &LinkService,
    config: &Config,
    code: String,
    url: String,
    expires_in_hours: Option<u32>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "Set short link".bright_blue().bold());
    println!();

    let existing = match service.get_clicks(&code).await {
        Ok(link) => Some(link),
        Err(link_lifecycle::AppError::NotFound { .. }) => None,
        Err(e) => anyhow::bail!("Database error: {}", e),
    };

    let expires_at = match expires_in_hours {
        None | Some(0) => None,
        Some(hours) => Some(
            Utc::now()
                .checked_add_signed(TimeDelta::hours(i64::from(hours)))
                .context("Expiry is too far in the future")?,
        ),
    };

    if let Some(ref current) = existing {
        println!("{}", "  This code already exists:".yellow());
        println!("    Target: {}", current.long_url.bright_black());
        println!("    Clicks: {}", current.click_count);
        println!();
    }

    println!("  Code:    {}", code.cyan());
    println!("  Target:  {}", url.bright_white());
    println!(
        "  Expires: {}",
        expires_at.map_or_else(
            || "never".to_string(),
            |at| at.format("%Y-%m-%d %H:%M UTC").to_string()
        )
    );
    println!();

    if !skip_confirm {
        let prompt = if existing.is_some() {
            "Overwrite this link?"
        } else {
            "Create this link?"
        };

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(existing.is_none())
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    let link = service
        .put_link(&code, url, expires_at)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to save link: {}", e))?;

    println!();
    println!("{}", "Link saved".green().bold());
    println!();
    print_link(&link, service, config);

    Ok(())
}

/// Runs one expiry sweep.
async fn handle_sweep(config: &Config, pool: &PgPool) -> Result<()> {
    println!("{}", "Sweeping expired links...".bright_blue());

    let sweeper = ExpirySweeper::new(repository(pool), config.sweep_interval());
    let deleted = sweeper
        .sweep_once()
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

    println!(
        "{} {}",
        "Deleted expired links:".green().bold(),
        deleted.to_string().bright_white().bold()
    );

    Ok(())
}

/// Displays link and click totals.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "Statistics".bright_blue().bold());
    println!();

    let (links, clicks, expired): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(click_count), 0)::BIGINT,
            COUNT(*) FILTER (WHERE expires_at < now())
        FROM links
        "#,
    )
    .fetch_one(pool)
    .await?;

    println!("  Links:          {}", links.to_string().bright_green().bold());
    println!("  Clicks:         {}", clicks.to_string().bright_green().bold());
    println!("  Awaiting sweep: {}", expired.to_string().yellow().bold());
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}

fn print_link(link: &Link, service: &LinkService, config: &Config) {
    println!("  Code:      {}", link.code.cyan());
    println!(
        "  Short URL: {}",
        service.short_url(&config.base_url, &link.code).bright_white()
    );
    println!("  Target:    {}", link.long_url);
    println!("  Clicks:    {}", link.click_count);
    println!(
        "  Created:   {}",
        link.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("  Expires:   {}", expiry_label(link));
}

fn expiry_label(link: &Link) -> ColoredString {
    match link.expires_at {
        None => "never".bright_black(),
        Some(at) if link.is_expired() => format!("{} (expired)", at.format("%Y-%m-%d %H:%M")).red(),
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string().normal(),
    }
}

use anyhow::{Context, Result};

use crate::cli::context::AppContext;
use crate::cli::output::{OutputOptions, Spinner};
use crate::cli::renderer;
use crate::core::api::{ApiError, ReportApi};
use crate::core::models::chart::ChartBucket;
use crate::core::models::status::{StatusIndicator, StatusInfo};

/// Password variable consulted when `--password` is omitted.
pub const PASSWORD_ENV: &str = "CALLDASH_PASSWORD";

fn api_failure(ctx: &AppContext, err: ApiError) -> anyhow::Error {
    ctx.forget_session_if_rejected();
    anyhow::anyhow!(err.user_message())
}

pub async fn balance(ctx: &AppContext, opts: &OutputOptions) -> Result<()> {
    ctx.require_login()?;
    let spinner = Spinner::start("Fetching balance...", opts.is_text());
    let result = ctx.api.balance().await;
    spinner.stop();
    let balance = result.map_err(|e| api_failure(ctx, e))?;

    if opts.is_text() {
        println!("{}", renderer::render_balance(&balance, opts.use_color));
    } else {
        opts.print_json(&balance)?;
    }
    Ok(())
}

pub async fn history(
    limit: u32,
    offset: u32,
    stats: bool,
    ctx: &AppContext,
    opts: &OutputOptions,
) -> Result<()> {
    ctx.require_login()?;
    if stats {
        return history_stats(ctx, opts).await;
    }
    if !(1..=500).contains(&limit) {
        anyhow::bail!("--limit must be between 1 and 500");
    }
    let spinner = Spinner::start("Fetching payment history...", opts.is_text());
    let result = ctx.api.payment_history(limit, offset).await;
    spinner.stop();
    let page = result.map_err(|e| api_failure(ctx, e))?;

    if opts.is_text() {
        println!("{}", renderer::render_history(&page, opts.use_color));
    } else {
        opts.print_json(&page)?;
    }
    Ok(())
}

async fn history_stats(ctx: &AppContext, opts: &OutputOptions) -> Result<()> {
    let spinner = Spinner::start("Fetching payment summary...", opts.is_text());
    let result = ctx.api.payment_stats().await;
    spinner.stop();
    let stats = result.map_err(|e| api_failure(ctx, e))?;

    if opts.is_text() {
        println!("{}", renderer::render_payment_stats(&stats, opts.use_color));
    } else {
        opts.print_json(&stats)?;
    }
    Ok(())
}

pub async fn chart(
    bucket: &str,
    campaign: Option<&str>,
    ctx: &AppContext,
    opts: &OutputOptions,
) -> Result<()> {
    ctx.require_login()?;
    let bucket = ChartBucket::from_id(bucket).with_context(|| {
        format!(
            "Unknown chart bucket '{}' (hour|day|week|month|15min|30min|1hour)",
            bucket
        )
    })?;
    let spinner = Spinner::start("Fetching chart...", opts.is_text());
    let result = ctx.api.chart(bucket, ctx.campaign(campaign)).await;
    spinner.stop();
    let series = result.map_err(|e| api_failure(ctx, e))?;

    if opts.is_text() {
        println!("{}", renderer::render_chart(&series, opts.use_color));
    } else {
        opts.print_json(&series)?;
    }
    Ok(())
}

pub async fn login(
    username: &str,
    password: Option<String>,
    ctx: &AppContext,
    opts: &OutputOptions,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => std::env::var(PASSWORD_ENV)
            .with_context(|| format!("Pass --password or set {}", PASSWORD_ENV))?,
    };

    let grant = ctx
        .api
        .login(username, &password)
        .await
        .map_err(|e| match e {
            ApiError::Server { message, .. } => anyhow::anyhow!("Login failed: {}", message),
            other => anyhow::anyhow!(other.user_message()),
        })?;

    ctx.store
        .save(&ctx.session.state())
        .with_context(|| format!("Failed to save session to {}", ctx.store.path().display()))?;
    tracing::info!(username = %grant.username, "logged in");

    if opts.is_text() {
        let name = grant.full_name.as_deref().unwrap_or(&grant.username);
        println!("Logged in as {}", name);
    } else {
        opts.print_json(&serde_json::json!({
            "username": grant.username,
            "full_name": grant.full_name,
        }))?;
    }
    Ok(())
}

pub fn logout(ctx: &AppContext, _opts: &OutputOptions) -> Result<()> {
    ctx.session.clear();
    if ctx.store.remove()? {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

pub async fn status(ctx: &AppContext, opts: &OutputOptions) -> Result<()> {
    let base_url = ctx.config.api.effective_base_url();
    let status = match ctx.api.health().await {
        Ok(info) => info,
        Err(e) => StatusInfo {
            indicator: StatusIndicator::Unreachable,
            app: None,
            description: Some(e.user_message()),
        },
    };

    let user = if status.indicator != StatusIndicator::Unreachable && ctx.session.is_authenticated()
    {
        match ctx.api.me().await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "could not identify session user");
                ctx.forget_session_if_rejected();
                None
            }
        }
    } else {
        None
    };

    if opts.is_text() {
        println!(
            "{}",
            renderer::render_status(&base_url, &status, user.as_ref(), opts.use_color)
        );
        if !ctx.session.is_authenticated() {
            println!("  Not logged in");
        } else if let (None, Some(name)) = (&user, ctx.session.username()) {
            println!("  Logged in as {}", name);
        }
    } else {
        opts.print_json(&serde_json::json!({
            "backend": status,
            "user": user,
        }))?;
    }

    if status.indicator == StatusIndicator::Unreachable {
        std::process::exit(1);
    }
    Ok(())
}

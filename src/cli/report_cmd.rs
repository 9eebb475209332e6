use anyhow::Result;
use chrono::NaiveDate;

use crate::cli::context::AppContext;
use crate::cli::output::{OutputOptions, Spinner};
use crate::cli::renderer;
use crate::core::timeframe::Timeframe;

pub struct ReportArgs {
    pub timeframe: Option<Timeframe>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub campaign: Option<String>,
}

/// Dates on the command line imply a custom range.
pub fn resolve_timeframe(
    timeframe: Option<Timeframe>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Timeframe> {
    let has_dates = start.is_some() || end.is_some();
    match timeframe {
        Some(tf) if has_dates && tf != Timeframe::Custom => {
            anyhow::bail!(
                "--start/--end only apply to the custom timeframe (got '{}')",
                tf.id()
            )
        }
        Some(tf) => Ok(tf),
        None if has_dates => Ok(Timeframe::Custom),
        None => Ok(Timeframe::Live),
    }
}

/// One-shot fetch: select, wait for the result, render, exit.
pub async fn run(args: ReportArgs, ctx: &AppContext, opts: &OutputOptions) -> Result<()> {
    ctx.require_login()?;
    let timeframe = resolve_timeframe(args.timeframe, args.start, args.end)?;
    let controller = ctx.controller(args.campaign.as_deref());

    let spinner = Spinner::start("Fetching report...", opts.is_text());
    match controller.set_timeframe(timeframe) {
        Some(fetch) => fetch.await?,
        None => {
            controller.set_custom_range(args.start, args.end)?;
            controller.apply_filters().await?;
        }
    }
    controller.shutdown();
    spinner.stop();

    let view = controller.view();
    ctx.forget_session_if_rejected();

    if opts.is_text() {
        println!("{}", renderer::render_dashboard(&view, opts.use_color));
    } else {
        opts.print_json(&view)?;
    }

    match (&view.snapshot, &view.refresh.error) {
        (None, Some(error)) => anyhow::bail!("{}", error),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn defaults_to_live() {
        assert_eq!(resolve_timeframe(None, None, None).unwrap(), Timeframe::Live);
    }

    #[test]
    fn dates_imply_custom() {
        let tf = resolve_timeframe(None, Some(d("2024-03-01")), None).unwrap();
        assert_eq!(tf, Timeframe::Custom);
    }

    #[test]
    fn dates_with_fixed_timeframe_rejected() {
        let err = resolve_timeframe(Some(Timeframe::Yesterday), None, Some(d("2024-03-01")))
            .unwrap_err();
        assert!(err.to_string().contains("custom"));
    }

    #[test]
    fn explicit_timeframe_kept() {
        let tf = resolve_timeframe(Some(Timeframe::Last30Days), None, None).unwrap();
        assert_eq!(tf, Timeframe::Last30Days);
    }
}

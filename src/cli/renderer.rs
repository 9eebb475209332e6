use colored::{control, ColoredString, Colorize};

use crate::core::controller::ControllerView;
use crate::core::formatter::{
    format_balance, format_billing, format_count, format_duration_secs, format_fetched_at,
    format_percent, format_ratio_bar, sparkline,
};
use crate::core::models::balance::BalanceInfo;
use crate::core::models::chart::ChartSeries;
use crate::core::models::payment::{PaymentPage, PaymentStats};
use crate::core::models::report::{ReportSnapshot, ReportSource};
use crate::core::models::status::{StatusIndicator, StatusInfo};
use crate::core::models::user::UserProfile;

const BAR_WIDTH: usize = 12;
const MAX_DISPOSITIONS: usize = 12;

/// Render the dashboard for one controller state.
///
/// Layout:
/// ```text
///  Campaign 0006 · Live (today) · 2024-03-10 (live)
///   Calls     1,523 total, 988 connected
///   ASR       64.87% [████████░░░░]
///   ACD       0.21s
///   Billing   ₹2.42 (deduction pending)
///   Balance   $97.58 of $100.00
///   Dispositions
///     A        500 [████░░░░░░░░]
///   Chart     ▂▃▅▇█ (30min, peak 110)
///   Updated 14:05:09
/// ```
pub fn render_dashboard(view: &ControllerView, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();

    let range = view
        .range()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "no data yet".to_string());
    // The range belongs to the snapshot, so label it with the snapshot's own timeframe.
    let shown = view
        .snapshot
        .as_ref()
        .map(|s| s.timeframe)
        .unwrap_or(view.timeframe);
    let mut header = format!(
        " Campaign {} · {} · {}",
        view.campaign,
        shown.display_name(),
        range
    );
    if let Some(source) = view.snapshot.as_ref().and_then(|s| s.report.source) {
        header.push_str(match source {
            ReportSource::Live => " (live)",
            ReportSource::Historical => " (historical)",
        });
    }
    lines.push(header.bold().to_string());
    if shown != view.timeframe {
        lines.push(format!(
            "  {}",
            format!("{} selected, not loaded yet", view.timeframe.display_name()).yellow()
        ));
    }

    if view.refresh.loading {
        lines.push(format!("  {}", "Loading…".dimmed()));
    }

    if let Some(snapshot) = &view.snapshot {
        render_snapshot(&mut lines, snapshot);
    }

    if let Some(error) = &view.refresh.error {
        let label = if view.is_stale() {
            "Error (showing last good data)"
        } else {
            "Error"
        };
        lines.push(format!("  {} {}", format!("{}:", label).red().bold(), error.red()));
    }

    if view.live_timer_armed {
        lines.push(format!("  {}", "Auto-refresh on".dimmed()));
    }

    lines.join("\n")
}

fn render_snapshot(lines: &mut Vec<String>, snapshot: &ReportSnapshot) {
    let report = &snapshot.report;

    lines.push(format!(
        "  {}     {} total, {} connected, {} unanswered",
        "Calls".cyan(),
        format_count(report.total_calls),
        format_count(report.connected_calls),
        format_count(report.unconnected_calls())
    ));
    lines.push(format!(
        "  {}       {} {}",
        "ASR".cyan(),
        color_by_asr(report.asr_percent, &format_percent(report.asr_percent)),
        format_ratio_bar(report.connected_calls, report.total_calls, BAR_WIDTH).magenta()
    ));
    lines.push(format!(
        "  {}       {}",
        "ACD".cyan(),
        format_duration_secs(report.acd_seconds)
    ));

    let pending = if report.deduction_pending {
        format!(" {}", "(deduction pending)".dimmed())
    } else {
        String::new()
    };
    lines.push(format!(
        "  {}   {}{}",
        "Billing".cyan(),
        format_billing(report.billing_total),
        pending
    ));

    if let Some(current) = snapshot.current_balance() {
        let of_initial = snapshot
            .balance
            .as_ref()
            .map(|b| format!(" of {}", format_balance(b.initial_balance)))
            .unwrap_or_default();
        let amount = format_balance(current);
        let amount = if current <= 0.0 { amount.red() } else { amount.green() };
        lines.push(format!("  {}   {}{}", "Balance".cyan(), amount, of_initial));
    }

    let dispositions = report.top_dispositions();
    if !dispositions.is_empty() {
        lines.push(format!("  {}", "Dispositions".cyan()));
        for (code, count) in dispositions.iter().take(MAX_DISPOSITIONS) {
            lines.push(format!(
                "    {:<8} {:>7} {}",
                code,
                format_count(*count),
                format_ratio_bar(*count, report.total_calls, BAR_WIDTH).magenta()
            ));
        }
        if dispositions.len() > MAX_DISPOSITIONS {
            lines.push(format!(
                "    {}",
                format!("… {} more", dispositions.len() - MAX_DISPOSITIONS).dimmed()
            ));
        }
    }

    if let Some(chart) = &snapshot.chart {
        if !chart.points.is_empty() {
            lines.push(format!(
                "  {}     {} ({}, peak {})",
                "Chart".cyan(),
                sparkline(&chart.values()),
                chart.bucket,
                format_count(chart.peak())
            ));
        }
    }

    lines.push(format!("  {}", format_fetched_at(&snapshot.fetched_at).dimmed()));
}

/// Color ASR green/yellow/red by how many attempts connected.
fn color_by_asr(asr_percent: f64, text: &str) -> ColoredString {
    if asr_percent >= 50.0 {
        text.green()
    } else if asr_percent >= 25.0 {
        text.yellow()
    } else {
        text.red()
    }
}

pub fn render_balance(balance: &BalanceInfo, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines = vec![" Balance".bold().to_string()];
    let current = format_balance(balance.current_balance);
    let current = if balance.is_depleted() {
        current.red()
    } else {
        current.green()
    };
    lines.push(format!("  {}   {}", "Current".cyan(), current));
    lines.push(format!(
        "  {}   {}",
        "Opening".cyan(),
        format_balance(balance.initial_balance)
    ));
    lines.push(format!(
        "  {}     {}",
        "Spent".cyan(),
        format_balance(balance.spent_today())
    ));
    if let Some(reset) = balance.last_reset_date {
        lines.push(format!("  {}     {}", "Reset".cyan(), reset));
    }
    lines.join("\n")
}

pub fn render_history(page: &PaymentPage, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines = vec![format!(
        " Payment history ({}-{} of {})",
        if page.payments.is_empty() { 0 } else { page.offset + 1 },
        page.offset as usize + page.payments.len(),
        page.total
    )
    .bold()
    .to_string()];

    if page.payments.is_empty() {
        lines.push(format!("  {}", "No transactions".dimmed()));
        return lines.join("\n");
    }

    for record in &page.payments {
        let delta = record.delta();
        let amount = format!("{:>10}", format_signed(delta));
        let amount = if delta < 0.0 { amount.red() } else { amount.green() };
        lines.push(format!(
            "  {}  {:<11} {} → {}  {}",
            record.timestamp.dimmed(),
            record.payment_type,
            amount,
            format_balance(record.new_balance),
            record.description.as_deref().unwrap_or("")
        ));
    }

    if page.has_more() {
        lines.push(format!(
            "  {}",
            format!("More: --offset {}", page.offset as usize + page.payments.len()).dimmed()
        ));
    }
    lines.join("\n")
}

pub fn render_payment_stats(stats: &PaymentStats, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines = vec![format!(" Payment summary ({} transactions)", stats.total_transactions)
        .bold()
        .to_string()];
    lines.push(format!(
        "  {}  {:>10}  ({})",
        "Recharged".cyan(),
        format_balance(stats.total_recharged_amount).green(),
        stats.total_recharges
    ));
    lines.push(format!(
        "  {}   {:>10}  ({})",
        "Deducted".cyan(),
        format_balance(stats.total_deducted_amount).red(),
        stats.total_deductions
    ));
    lines.push(format!(
        "  {}        {:>10}",
        "Net".cyan(),
        format_signed(stats.net_amount())
    ));
    match &stats.last_transaction {
        Some(last) => lines.push(format!(
            "  {}       {} {} {}",
            "Last".cyan(),
            last.timestamp.dimmed(),
            last.payment_type,
            format_balance(last.amount)
        )),
        None => lines.push(format!("  {}", "No transactions".dimmed())),
    }
    lines.join("\n")
}

fn format_signed(delta: f64) -> String {
    if delta >= 0.0 {
        format!("+{}", format_balance(delta))
    } else {
        format_balance(delta)
    }
}

pub fn render_chart(series: &ChartSeries, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines = vec![format!(" Connected calls ({})", series.bucket).bold().to_string()];
    let peak = series.peak();
    for point in &series.points {
        lines.push(format!(
            "  {:<8} {:>7} {}",
            point.time,
            format_count(point.connected_calls),
            format_ratio_bar(point.connected_calls, peak, 24).magenta()
        ));
    }
    if let Some(total) = series.total_connected {
        lines.push(format!("  {}     {}", "Total".cyan(), format_count(total)));
    }
    if let Some(updated) = &series.last_updated {
        lines.push(format!("  {}", format!("Updated {}", updated).dimmed()));
    }
    lines.join("\n")
}

pub fn render_status(
    base_url: &str,
    status: &StatusInfo,
    user: Option<&UserProfile>,
    use_color: bool,
) -> String {
    control::set_override(use_color);

    let status_text = status.indicator.to_string();
    let colored_status: ColoredString = match status.indicator {
        StatusIndicator::Operational => status_text.green(),
        StatusIndicator::Degraded => status_text.yellow(),
        StatusIndicator::Unreachable => status_text.red(),
    };
    let mut lines = vec![format!(" {}", base_url).bold().to_string()];
    lines.push(format!("  {}    {}", "Status".cyan(), colored_status));
    if let Some(app) = &status.app {
        lines.push(format!("  {}       {}", "App".cyan(), app));
    }
    if let Some(description) = &status.description {
        lines.push(format!("  {}", description.dimmed()));
    }
    if let Some(user) = user {
        lines.push(format!(
            "  {}      {} ({})",
            "User".cyan(),
            user.display_name(),
            user.username
        ));
    }
    lines.join("\n")
}

use chrono::{DateTime, Local, Utc};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Returns "1,234,567" style thousands grouping.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Returns "64.87%".
pub fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

/// Returns "0.21s" under a minute, "2m 05s" above.
pub fn format_duration_secs(seconds: f64) -> String {
    if seconds < 60.0 {
        return format!("{:.2}s", seconds.max(0.0));
    }
    let total = seconds.round() as u64;
    format!("{}m {:02}s", total / 60, total % 60)
}

/// Returns "₹2.42" for billed usage.
pub fn format_billing(amount: f64) -> String {
    format!("₹{:.2}", amount)
}

/// Returns "$97.58" for account balances.
pub fn format_balance(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

/// Returns "Updated 14:05:09" for today, "Updated Mar 09 14:05" otherwise.
pub fn format_fetched_at(fetched_at: &DateTime<Utc>) -> String {
    let local = fetched_at.with_timezone(&Local);
    if local.date_naive() == Local::now().date_naive() {
        format!("Updated {}", local.format("%H:%M:%S"))
    } else {
        format!("Updated {}", local.format("%b %d %H:%M"))
    }
}

/// Returns "[█████░░░░░░░]" where █ is the share of `value` in `total`.
pub fn format_ratio_bar(value: u64, total: u64, width: usize) -> String {
    let ratio = if total == 0 {
        0.0
    } else {
        (value as f64 / total as f64).clamp(0.0, 1.0)
    };
    let filled_blocks = (ratio * width as f64).round() as usize;
    let empty_blocks = width.saturating_sub(filled_blocks);
    format!("[{}{}]", "█".repeat(filled_blocks), "░".repeat(empty_blocks))
}

/// One block character per value, scaled to the series maximum.
pub fn sparkline(values: &[u64]) -> String {
    let max = values.iter().copied().max().unwrap_or(0);
    values
        .iter()
        .map(|&v| {
            if max == 0 {
                SPARK_LEVELS[0]
            } else {
                let idx = ((v as f64 / max as f64) * (SPARK_LEVELS.len() - 1) as f64).round();
                SPARK_LEVELS[idx as usize]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn format_count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1523), "1,523");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn format_percent_two_decimals() {
        assert_eq!(format_percent(64.866), "64.87%");
        assert_eq!(format_percent(0.0), "0.00%");
    }

    #[test]
    fn format_duration_short_and_long() {
        assert_eq!(format_duration_secs(0.21), "0.21s");
        assert_eq!(format_duration_secs(125.0), "2m 05s");
        assert_eq!(format_duration_secs(-1.0), "0.00s");
    }

    #[test]
    fn format_money() {
        assert_eq!(format_billing(2.4), "₹2.40");
        assert_eq!(format_balance(97.58), "$97.58");
        assert_eq!(format_balance(-3.5), "-$3.50");
    }

    #[test]
    fn format_fetched_at_today_shows_time_only() {
        let result = format_fetched_at(&Utc::now());
        assert!(result.starts_with("Updated "));
        assert_eq!(result.matches(':').count(), 2);
    }

    #[test]
    fn format_fetched_at_older_shows_date() {
        let result = format_fetched_at(&(Utc::now() - Duration::days(3)));
        assert_eq!(result.matches(':').count(), 1);
    }

    #[test]
    fn ratio_bar_width() {
        assert_eq!(format_ratio_bar(0, 10, 12), "[░░░░░░░░░░░░]");
        assert_eq!(format_ratio_bar(10, 10, 12), "[████████████]");
        assert_eq!(format_ratio_bar(5, 10, 12), "[██████░░░░░░]");
        assert_eq!(format_ratio_bar(5, 0, 4), "[░░░░]");
    }

    #[test]
    fn sparkline_scales_to_max() {
        assert_eq!(sparkline(&[0, 4, 8]), "▁▅█");
        assert_eq!(sparkline(&[0, 0]), "▁▁");
        assert_eq!(sparkline(&[]), "");
    }
}

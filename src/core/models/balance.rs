use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Prepaid account balance as reported by `/balance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceInfo {
    /// Balance after today's usage has been deducted
    pub current_balance: f64,
    /// Balance at the start of the current business day
    #[serde(default)]
    pub initial_balance: f64,
    /// Business day the initial balance was last carried over
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reset_date: Option<NaiveDate>,
}

impl BalanceInfo {
    /// Amount consumed since the last daily reset, never negative.
    pub fn spent_today(&self) -> f64 {
        (self.initial_balance - self.current_balance).max(0.0)
    }

    pub fn is_depleted(&self) -> bool {
        self.current_balance <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_balance_response() {
        let json = r#"{
            "current_balance": 97.58,
            "initial_balance": 100.0,
            "last_reset_date": "2024-03-10"
        }"#;
        let balance: BalanceInfo = serde_json::from_str(json).unwrap();
        assert!((balance.current_balance - 97.58).abs() < 1e-10);
        assert_eq!(
            balance.last_reset_date,
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
    }

    #[test]
    fn deserialize_balance_without_reset_date() {
        let json = r#"{ "current_balance": 12.0, "initial_balance": 0.0, "last_reset_date": null }"#;
        let balance: BalanceInfo = serde_json::from_str(json).unwrap();
        assert!(balance.last_reset_date.is_none());
    }

    #[test]
    fn spent_today_is_clamped() {
        let balance = BalanceInfo {
            current_balance: 120.0,
            initial_balance: 100.0,
            last_reset_date: None,
        };
        assert_eq!(balance.spent_today(), 0.0);

        let balance = BalanceInfo {
            current_balance: 97.5,
            initial_balance: 100.0,
            last_reset_date: None,
        };
        assert!((balance.spent_today() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn depleted_at_zero() {
        let balance = BalanceInfo {
            current_balance: 0.0,
            initial_balance: 100.0,
            last_reset_date: None,
        };
        assert!(balance.is_depleted());
    }
}

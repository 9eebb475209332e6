use serde::{Deserialize, Serialize};

/// One ledger entry from `/payment-history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: u64,
    pub amount: f64,
    /// recharge, deduction, adjustment or set_balance
    pub payment_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub previous_balance: f64,
    pub new_balance: f64,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl PaymentRecord {
    /// Signed effect on the balance.
    pub fn delta(&self) -> f64 {
        self.new_balance - self.previous_balance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPage {
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
}

impl PaymentPage {
    pub fn has_more(&self) -> bool {
        (self.offset as u64) + (self.payments.len() as u64) < self.total
    }
}

/// Most recent ledger entry as summarised by `/payment-history/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastTransaction {
    pub amount: f64,
    #[serde(rename = "type")]
    pub payment_type: String,
    pub timestamp: String,
}

/// Recharge and deduction totals over the whole ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentStats {
    #[serde(default)]
    pub total_transactions: u64,
    #[serde(default)]
    pub total_recharges: u64,
    #[serde(default)]
    pub total_recharged_amount: f64,
    #[serde(default)]
    pub total_deductions: u64,
    #[serde(default)]
    pub total_deducted_amount: f64,
    #[serde(default)]
    pub last_transaction: Option<LastTransaction>,
}

impl PaymentStats {
    /// Recharged minus deducted.
    pub fn net_amount(&self) -> f64 {
        self.total_recharged_amount - self.total_deducted_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_history_page() {
        let json = r#"{
            "success": true,
            "total": 3,
            "limit": 2,
            "offset": 0,
            "payments": [
                {
                    "id": 7,
                    "amount": 50.0,
                    "payment_type": "recharge",
                    "description": "Recharge $50.0",
                    "previous_balance": 10.0,
                    "new_balance": 60.0,
                    "timestamp": "2024-03-10 09:15:00",
                    "date": "2024-03-10",
                    "time": "09:15:00",
                    "transaction_id": "tx-1"
                },
                {
                    "id": 6,
                    "amount": 2.45,
                    "payment_type": "deduction",
                    "description": null,
                    "previous_balance": 12.45,
                    "new_balance": 10.0,
                    "timestamp": "2024-03-09 23:59:00",
                    "date": "2024-03-09",
                    "time": "23:59:00",
                    "transaction_id": null
                }
            ]
        }"#;
        let page: PaymentPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.payments.len(), 2);
        assert_eq!(page.payments[0].transaction_id.as_deref(), Some("tx-1"));
        assert!(page.payments[1].description.is_none());
        assert!(page.has_more());
    }

    #[test]
    fn delta_is_signed() {
        let record = PaymentRecord {
            id: 1,
            amount: 2.45,
            payment_type: "deduction".into(),
            description: None,
            previous_balance: 12.45,
            new_balance: 10.0,
            timestamp: "2024-03-09 23:59:00".into(),
            transaction_id: None,
        };
        assert!((record.delta() + 2.45).abs() < 1e-10);
    }

    #[test]
    fn last_page_has_no_more() {
        let page = PaymentPage {
            total: 1,
            limit: 50,
            offset: 0,
            payments: vec![PaymentRecord {
                id: 1,
                amount: 5.0,
                payment_type: "recharge".into(),
                description: None,
                previous_balance: 0.0,
                new_balance: 5.0,
                timestamp: "2024-03-10 10:00:00".into(),
                transaction_id: None,
            }],
        };
        assert!(!page.has_more());
    }

    #[test]
    fn deserialize_stats() {
        let json = r#"{
            "success": true,
            "total_transactions": 5,
            "total_recharges": 2,
            "total_recharged_amount": 150.0,
            "total_deductions": 3,
            "total_deducted_amount": 7.35,
            "last_transaction": {
                "amount": 2.45,
                "type": "deduction",
                "timestamp": "2024-03-09 23:59:00"
            }
        }"#;
        let stats: PaymentStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_transactions, 5);
        assert_eq!(stats.total_deductions, 3);
        let last = stats.last_transaction.as_ref().unwrap();
        assert_eq!(last.payment_type, "deduction");
        assert!((stats.net_amount() - 142.65).abs() < 1e-9);
    }

    #[test]
    fn deserialize_stats_without_transactions() {
        let json = r#"{
            "success": true,
            "total_transactions": 0,
            "total_recharges": 0,
            "total_recharged_amount": 0,
            "total_deductions": 0,
            "total_deducted_amount": 0,
            "last_transaction": null
        }"#;
        let stats: PaymentStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats, PaymentStats::default());
    }
}

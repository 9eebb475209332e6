use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusIndicator {
    Operational,
    Degraded,
    Unreachable,
}

impl std::fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operational => write!(f, "Operational"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Unreachable => write!(f, "Unreachable"),
        }
    }
}

/// Result of probing the backend health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub indicator: StatusIndicator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub fn parse_indicator(status: &str) -> StatusIndicator {
    match status {
        "ok" => StatusIndicator::Operational,
        _ => StatusIndicator::Degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_indicator_values() {
        assert_eq!(parse_indicator("ok"), StatusIndicator::Operational);
        assert_eq!(parse_indicator("starting"), StatusIndicator::Degraded);
    }

    #[test]
    fn indicator_display() {
        assert_eq!(StatusIndicator::Unreachable.to_string(), "Unreachable");
    }
}

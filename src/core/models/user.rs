use serde::{Deserialize, Serialize};

/// Account behind the current token, from `/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_me() {
        let json = r#"{"id": 3, "username": "ops", "full_name": "Ops Desk"}"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.display_name(), "Ops Desk");
    }

    #[test]
    fn blank_full_name_falls_back_to_username() {
        let json = r#"{"id": 3, "username": "ops", "full_name": null}"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.display_name(), "ops");

        let user = UserProfile {
            full_name: Some("  ".into()),
            ..user
        };
        assert_eq!(user.display_name(), "ops");
    }
}

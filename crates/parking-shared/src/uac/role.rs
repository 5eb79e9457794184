use egui::WidgetText;

/// Access level of an account. A user may hold several but only one is active
/// at a time
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Staff,
    Client,
}

impl Role {
    /// Name shown to users
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Staff => "Staff",
            Role::Client => "Client",
        }
    }
}

impl From<Role> for WidgetText {
    fn from(value: Role) -> Self {
        value.label().into()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Role::Admin, "ADMIN")]
    #[case(Role::Staff, "STAFF")]
    #[case(Role::Client, "CLIENT")]
    fn wire_name_matches_storage_name(#[case] role: Role, #[case] expected: &str) {
        assert_eq!(role.to_string(), expected);
        assert_eq!(
            serde_json::to_string(&role).unwrap(),
            format!("\"{expected}\"")
        );
        assert_eq!(expected.parse::<Role>().unwrap(), role);
    }

    #[test]
    fn unknown_role_rejected() {
        assert!("OWNER".parse::<Role>().is_err());
    }
}

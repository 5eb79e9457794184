use crate::{id::AccountId, time::Timestamp};

use super::{Login, PersonName, PhoneNumber, Role};

/// One access level of an account as reported by the server. Inactive levels
/// are kept by the server but grant nothing
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccountRole {
    pub level: Role,
    pub active: bool,
}

/// Full account details, used both for the logged in user and on admin screens
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub login: Login,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub user_levels: Vec<AccountRole>,
    pub active: bool,
    pub blocked: bool,
    pub verified: bool,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub last_successful_login: Option<Timestamp>,
    #[serde(default)]
    pub last_successful_login_ip: Option<String>,
    #[serde(default)]
    pub last_unsuccessful_login: Option<Timestamp>,
    #[serde(default)]
    pub last_unsuccessful_login_ip: Option<String>,
}

/// Row of the administrator's account list
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: AccountId,
    pub login: Login,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<Role>,
    pub active: bool,
    pub blocked: bool,
    pub verified: bool,
}

/// Editable personal data of the own account
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone_number: PhoneNumber,
}

impl Account {
    /// Roles currently granted (inactive levels excluded) in the order the
    /// server listed them
    pub fn roles(&self) -> Vec<Role> {
        self.user_levels
            .iter()
            .filter(|level| level.active)
            .map(|level| level.level)
            .collect()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

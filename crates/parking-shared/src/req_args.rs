//! This module stores the expected format of the arguments for the requests.
//! Structs holding secrets are not serializable; the client exposes the
//! secrets only while building the request body

use secrecy::{ExposeSecret, SecretString};
use std::fmt::Debug;

use crate::{
    const_config::client::CLIENT_DEFAULT_PAGE_SIZE,
    uac::{Email, Login, PersonName, PhoneNumber, Role},
};

#[derive(Clone)]
pub struct LoginReqArgs {
    pub login: String,
    pub password: SecretString,
}

/// Self registration of a client account
#[derive(Clone)]
pub struct RegisterReqArgs {
    pub login: Login,
    pub email: Email,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone_number: PhoneNumber,
    pub password: SecretString,
}

/// Account created by an administrator with an initial role
#[derive(Clone)]
pub struct CreateAccountReqArgs {
    pub account: RegisterReqArgs,
    pub role: Role,
}

#[derive(Clone)]
pub struct ChangePasswordReqArgs {
    pub current_password: SecretString,
    pub new_password: SecretString,
}

#[derive(Clone)]
pub struct ResetPasswordReqArgs {
    pub token: String,
    pub new_password: SecretString,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ResetPasswordRequestReqArgs {
    pub email: Email,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ChangeEmailReqArgs {
    pub email: Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SortConfig {
    pub field: String,
    pub direction: SortDirection,
}

/// Paging of long lists. Persisted so the user returns to the same page
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
    pub sort: Option<SortConfig>,
}

impl LoginReqArgs {
    pub fn new<S: Into<String>>(login: S, password: SecretString) -> Self {
        Self {
            login: login.into(),
            password,
        }
    }

    pub fn password(mut self, password: SecretString) -> Self {
        self.password = password;
        self
    }
}

impl Debug for LoginReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginReqArgs")
            .field("login", &self.login)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .finish()
    }
}

impl Debug for RegisterReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterReqArgs")
            .field("login", &self.login)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone_number", &self.phone_number)
            .finish_non_exhaustive()
    }
}

impl Debug for CreateAccountReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAccountReqArgs")
            .field("account", &self.account)
            .field("role", &self.role)
            .finish()
    }
}

impl Debug for ResetPasswordReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetPasswordReqArgs").finish_non_exhaustive()
    }
}

impl RegisterReqArgs {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "login": self.login,
            "email": self.email,
            "firstName": self.first_name,
            "lastName": self.last_name,
            "phoneNumber": self.phone_number,
            "password": self.password.expose_secret(),
        })
    }
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 0,
            page_size: CLIENT_DEFAULT_PAGE_SIZE,
            sort: None,
        }
    }
}

impl PageRequest {
    /// Query string parameters in the form the server expects
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut result = vec![
            ("pageNumber", self.page_number.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(sort) = &self.sort {
            let direction = match sort.direction {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            };
            result.push(("sort", format!("{},{direction}", sort.field)));
        }
        result
    }

    /// Sorts by `field`, flipping the direction if already sorted by it
    pub fn sort_by(&mut self, field: &str) {
        self.sort = Some(match self.sort.take() {
            Some(current) if current.field == field => SortConfig {
                field: current.field,
                direction: current.direction.toggled(),
            },
            _ => SortConfig {
                field: field.to_string(),
                direction: SortDirection::Asc,
            },
        });
        self.page_number = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_args_debug_hides_password() {
        let args = LoginReqArgs::new("jerzybem", SecretString::from("P@ssw0rd!"));

        let actual = format!("{args:?}");

        assert!(!actual.contains("P@ssw0rd!"));
        assert!(actual.contains("has_password: true"));
    }

    #[test]
    fn query_includes_sort_when_set() {
        let mut page = PageRequest::default();
        page.sort_by("login");

        let actual = page.to_query();

        assert_eq!(
            actual,
            vec![
                ("pageNumber", "0".to_string()),
                ("pageSize", "10".to_string()),
                ("sort", "login,asc".to_string())
            ]
        );
    }

    #[test]
    fn sorting_same_field_twice_flips_direction_and_resets_page() {
        let mut page = PageRequest {
            page_number: 3,
            ..Default::default()
        };
        page.sort_by("email");
        page.page_number = 2;

        page.sort_by("email");

        assert_eq!(
            page.sort,
            Some(SortConfig {
                field: "email".into(),
                direction: SortDirection::Desc
            })
        );
        assert_eq!(page.page_number, 0);
    }
}

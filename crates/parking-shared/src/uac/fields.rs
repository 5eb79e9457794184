use std::fmt::Display;

use egui::WidgetText;

use crate::errors::ConversionError;

/// Account login, unique per account
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Login(String);

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

/// First or last name
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonName(String);

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl Login {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 32;
}

impl Email {
    pub const MAX_LENGTH: usize = 64;
}

impl PersonName {
    pub const MIN_LENGTH: usize = 2;
    pub const MAX_LENGTH: usize = 32;
}

impl PhoneNumber {
    pub const LENGTH: usize = 9;
}

fn check_length(value: &str, min: usize, max: usize) -> Result<(), ConversionError> {
    let actual = value.chars().count();
    if actual == 0 {
        return Err(ConversionError::Empty);
    }
    if actual < min {
        return Err(ConversionError::MinNotMet { min, actual });
    }
    if actual > max {
        return Err(ConversionError::MaxExceeded { max, actual });
    }
    Ok(())
}

impl TryFrom<String> for Login {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        check_length(&value, Self::MIN_LENGTH, Self::MAX_LENGTH)?;
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(ConversionError::InvalidFormat {
                expected: "letters, digits, '.', '_' or '-'",
            });
        }
        Ok(Self(value))
    }
}

impl TryFrom<String> for Email {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        check_length(&value, 3, Self::MAX_LENGTH)?;
        let invalid = ConversionError::InvalidFormat {
            expected: "an address like name@example.com",
        };
        let Some((local, domain)) = value.split_once('@') else {
            return Err(invalid);
        };
        let domain_ok = domain.contains('.') && domain.split('.').all(|part| !part.is_empty());
        if local.is_empty() || !domain_ok || value.chars().any(char::is_whitespace) {
            return Err(invalid);
        }
        Ok(Self(value))
    }
}

impl TryFrom<String> for PersonName {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        check_length(&value, Self::MIN_LENGTH, Self::MAX_LENGTH)?;
        if !value
            .chars()
            .all(|c| c.is_alphabetic() || c == '-' || c == ' ')
        {
            return Err(ConversionError::InvalidFormat {
                expected: "letters, spaces or '-'",
            });
        }
        Ok(Self(value))
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(ConversionError::Empty);
        }
        if value.len() != Self::LENGTH || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConversionError::InvalidFormat {
                expected: "9 digits",
            });
        }
        Ok(Self(value))
    }
}

/// Checks the password rules the server enforces so the user gets feedback
/// before submitting
pub fn validate_password(password: &str) -> Result<(), ConversionError> {
    check_length(password, 8, 64)?;
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_alphanumeric());
    if has_upper && has_lower && has_digit && has_special {
        Ok(())
    } else {
        Err(ConversionError::InvalidFormat {
            expected: "upper and lower case letters, a digit and a special character",
        })
    }
}

macro_rules! string_newtype_conversions {
    ($($name: ident),*) => {$(
        impl TryFrom<&str> for $name {
            type Error = ConversionError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                value.to_string().try_into()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&$name> for WidgetText {
            fn from(value: &$name) -> Self {
                (&value.0).into()
            }
        }
    )*};
}

string_newtype_conversions!(Login, Email, PersonName, PhoneNumber);

//! Parking lots and their sectors

use std::{fmt::Display, str::FromStr};

use egui::WidgetText;

use crate::{
    errors::ConversionError,
    id::{ParkingId, SectorId},
};

/// How the server picks a sector when a reservation does not name one
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::EnumIter,
    strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectorDeterminationStrategy {
    #[default]
    LeastOccupied,
    MostOccupied,
    LeastOccupiedWeighted,
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::EnumIter,
    strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectorType {
    #[default]
    Covered,
    Uncovered,
    Underground,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parking {
    pub id: ParkingId,
    pub city: String,
    pub zip_code: String,
    pub street: String,
    pub strategy: SectorDeterminationStrategy,
    #[serde(default)]
    pub sectors: Vec<Sector>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub id: SectorId,
    pub parking_id: ParkingId,
    pub name: String,
    #[serde(rename = "type")]
    pub sector_type: SectorType,
    pub max_places: u32,
    pub weight: u32,
    #[serde(default)]
    pub occupied_places: u32,
    pub active: bool,
}

/// Data required to create or edit a parking
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingDraft {
    pub city: City,
    pub zip_code: ZipCode,
    pub street: Street,
    pub strategy: SectorDeterminationStrategy,
}

/// Data required to create or edit a sector
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorDraft {
    pub name: SectorName,
    #[serde(rename = "type")]
    pub sector_type: SectorType,
    pub max_places: MaxPlaces,
    pub weight: Weight,
}

impl Parking {
    pub fn address(&self) -> String {
        format!("{}, {} {}", self.street, self.zip_code, self.city)
    }

    pub fn active_sectors(&self) -> impl Iterator<Item = &Sector> {
        self.sectors.iter().filter(|s| s.active)
    }

    /// Free places over all active sectors
    pub fn free_places(&self) -> u32 {
        self.active_sectors().map(Sector::free_places).sum()
    }
}

impl Sector {
    pub fn free_places(&self) -> u32 {
        self.max_places.saturating_sub(self.occupied_places)
    }

    /// Starting values for editing this sector
    ///
    /// Fails if the server holds data that no longer passes the client rules
    pub fn to_draft(&self) -> Result<SectorDraft, ConversionError> {
        Ok(SectorDraft {
            name: self.name.as_str().try_into()?,
            sector_type: self.sector_type,
            max_places: self.max_places.try_into()?,
            weight: self.weight.try_into()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct City(String);

/// Postal code in the `NN-NNN` format
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Street(String);

/// Sector name in the `<capital letter>-<two digits>` format eg. `A-01`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectorName(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MaxPlaces(u32);

/// Relative preference of a sector when the weighted strategy is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Weight(u32);

impl City {
    pub const MAX_LENGTH: usize = 50;
}

impl Street {
    pub const MAX_LENGTH: usize = 50;
}

impl MaxPlaces {
    pub const MAX: u32 = 1000;
}

impl Weight {
    pub const MAX: u32 = 100;
}

fn check_text(value: &str, min: usize, max: usize) -> Result<(), ConversionError> {
    let actual = value.trim().chars().count();
    if actual == 0 {
        Err(ConversionError::Empty)
    } else if actual < min {
        Err(ConversionError::MinNotMet { min, actual })
    } else if actual > max {
        Err(ConversionError::MaxExceeded { max, actual })
    } else {
        Ok(())
    }
}

impl TryFrom<String> for City {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        check_text(&value, 2, Self::MAX_LENGTH)?;
        if !value
            .chars()
            .all(|c| c.is_alphabetic() || c == ' ' || c == '-')
        {
            return Err(ConversionError::InvalidFormat {
                expected: "letters, spaces or '-'",
            });
        }
        Ok(Self(value))
    }
}

impl TryFrom<String> for ZipCode {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(ConversionError::Empty);
        }
        let bytes = value.as_bytes();
        let is_valid = bytes.len() == 6
            && bytes.iter().enumerate().all(|(i, b)| {
                if i == 2 {
                    *b == b'-'
                } else {
                    b.is_ascii_digit()
                }
            });
        if !is_valid {
            return Err(ConversionError::InvalidFormat { expected: "NN-NNN" });
        }
        Ok(Self(value))
    }
}

impl TryFrom<String> for Street {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        check_text(&value, 2, Self::MAX_LENGTH)?;
        Ok(Self(value))
    }
}

impl TryFrom<String> for SectorName {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(ConversionError::Empty);
        }
        let bytes = value.as_bytes();
        let is_valid = bytes.len() == 4
            && bytes[0].is_ascii_uppercase()
            && bytes[1] == b'-'
            && bytes[2].is_ascii_digit()
            && bytes[3].is_ascii_digit();
        if !is_valid {
            return Err(ConversionError::InvalidFormat { expected: "A-01" });
        }
        Ok(Self(value))
    }
}

impl TryFrom<u32> for MaxPlaces {
    type Error = ConversionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if (1..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConversionError::OutOfRange {
                min: 1,
                max: Self::MAX.into(),
            })
        }
    }
}

impl TryFrom<u32> for Weight {
    type Error = ConversionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if (1..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConversionError::OutOfRange {
                min: 1,
                max: Self::MAX.into(),
            })
        }
    }
}

macro_rules! number_from_str {
    ($($name: ident),*) => {$(
        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                if s.is_empty() {
                    return Err(ConversionError::Empty);
                }
                let value: u32 = s.parse().map_err(|_| ConversionError::InvalidFormat {
                    expected: "a whole number",
                })?;
                value.try_into()
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    )*};
}

macro_rules! text_conversions {
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

        impl From<&$name> for WidgetText {
            fn from(value: &$name) -> Self {
                (&value.0).into()
            }
        }
    )*};
}

number_from_str!(MaxPlaces, Weight);
text_conversions!(City, ZipCode, Street, SectorName);

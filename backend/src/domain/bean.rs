//! Bean aggregate, roast levels, and bean form validation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::roaster::Roaster;
use super::search::SortColumn;
use super::validator::{self, Validator};

pub const BEAN_NAME_MAX: usize = 100;

/// How dark a bean is roasted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoastLevel {
    Light,
    MediumLight,
    Medium,
    MediumDark,
    Dark,
}

impl RoastLevel {
    pub const ALL: [Self; 5] = [
        Self::Light,
        Self::MediumLight,
        Self::Medium,
        Self::MediumDark,
        Self::Dark,
    ];

    /// Stored and submitted representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::MediumLight => "medium-light",
            Self::Medium => "medium",
            Self::MediumDark => "medium-dark",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for RoastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when text does not name a roast level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown roast level '{0}'")]
pub struct UnknownRoastLevel(pub String);

impl FromStr for RoastLevel {
    type Err = UnknownRoastLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| UnknownRoastLevel(s.to_owned()))
    }
}

/// A coffee product belonging to exactly one roaster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bean {
    pub id: i64,
    pub name: String,
    pub roast_level: RoastLevel,
    pub roaster_id: i64,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

/// A bean together with its roaster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanDetail {
    pub bean: Bean,
    pub roaster: Roaster,
}

/// A bean as listed in search results. `roaster_name` is `None` when the
/// roaster disappeared between the two reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanListing {
    pub bean: Bean,
    pub roaster_name: Option<String>,
}

/// Validated bean fields ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanDraft {
    pub name: String,
    pub roast_level: RoastLevel,
    pub roaster_id: i64,
}

/// Raw bean form. Fields stay textual so bad input becomes a field error
/// rather than a rejected request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BeanForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roast_level: String,
    #[serde(default)]
    pub roaster_id: String,
}

impl BeanForm {
    /// Check every field and return the typed draft or the collected errors.
    pub fn validate(&self) -> Result<BeanDraft, Validator> {
        let mut v = Validator::new();
        let name = self.name.trim();

        v.check_field(validator::not_blank(name), "name", "this field cannot be blank");
        v.check_field(
            validator::max_chars(name, BEAN_NAME_MAX),
            "name",
            "this field must have at most 100 characters",
        );

        let roast_level = self.roast_level.trim().parse::<RoastLevel>().ok();
        if roast_level.is_none() {
            let permitted: Vec<&str> = RoastLevel::ALL.iter().map(|l| l.as_str()).collect();
            v.add_field_error(
                "roast_level",
                format!("this field must be one of {}", permitted.join(", ")),
            );
        }

        let roaster_id = self
            .roaster_id
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0);
        v.check_field(
            roaster_id.is_some(),
            "roaster_id",
            "this field must be greater than 0",
        );

        match (roast_level, roaster_id) {
            (Some(roast_level), Some(roaster_id)) if v.is_valid() => Ok(BeanDraft {
                name: name.to_owned(),
                roast_level,
                roaster_id,
            }),
            _ => Err(v),
        }
    }
}

impl From<&Bean> for BeanForm {
    fn from(value: &Bean) -> Self {
        Self {
            name: value.name.clone(),
            roast_level: value.roast_level.as_str().to_owned(),
            roaster_id: value.roaster_id.to_string(),
        }
    }
}

/// Columns a bean list may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeanSortColumn {
    Id,
    Name,
    RoastLevel,
}

impl SortColumn for BeanSortColumn {
    const ALL: &'static [Self] = &[Self::Id, Self::Name, Self::RoastLevel];
    const DEFAULT: Self = Self::Id;

    fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::RoastLevel => "roast_level",
        }
    }
}

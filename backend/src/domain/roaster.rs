//! Roaster aggregate and its form validation.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::bean::Bean;
use super::search::SortColumn;
use super::validator::{self, Validator};

pub const ROASTER_NAME_MAX: usize = 50;
pub const ROASTER_DESCRIPTION_MAX: usize = 300;
pub const ROASTER_LOCATION_MAX: usize = 100;

/// A coffee roasting company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roaster {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub website: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    /// Optimistic-concurrency token; starts at 1 and increments per update.
    pub version: i32,
}

/// A roaster together with the beans it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoasterDetail {
    pub roaster: Roaster,
    pub beans: Vec<Bean>,
}

/// Validated roaster fields ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoasterDraft {
    pub name: String,
    pub description: String,
    pub website: String,
    pub location: String,
}

/// Raw roaster form as submitted by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoasterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub location: String,
}

impl RoasterForm {
    /// Check every field and return the trimmed draft or the collected errors.
    ///
    /// # Examples
    /// ```
    /// use roastery::domain::RoasterForm;
    ///
    /// let form = RoasterForm {
    ///     name: "Ember & Oak".into(),
    ///     description: "Small batch".into(),
    ///     website: "https://ember.example".into(),
    ///     location: "Leeds, UK".into(),
    /// };
    /// assert!(form.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<RoasterDraft, Validator> {
        let mut v = Validator::new();
        let name = self.name.trim();
        let description = self.description.trim();
        let website = self.website.trim();
        let location = self.location.trim();

        v.check_field(validator::not_blank(name), "name", "this field cannot be blank");
        v.check_field(
            validator::max_chars(name, ROASTER_NAME_MAX),
            "name",
            "this field must have at most 50 characters",
        );
        v.check_field(
            validator::max_chars(description, ROASTER_DESCRIPTION_MAX),
            "description",
            "this field must have at most 300 characters",
        );
        v.check_field(validator::is_url(website), "website", "this field must be a valid URL");
        v.check_field(validator::not_blank(location), "location", "this field cannot be blank");
        v.check_field(
            validator::max_chars(location, ROASTER_LOCATION_MAX),
            "location",
            "this field must have at most 100 characters",
        );

        if !v.is_valid() {
            return Err(v);
        }
        Ok(RoasterDraft {
            name: name.to_owned(),
            description: description.to_owned(),
            website: website.to_owned(),
            location: location.to_owned(),
        })
    }
}

impl From<&Roaster> for RoasterForm {
    fn from(value: &Roaster) -> Self {
        Self {
            name: value.name.clone(),
            description: value.description.clone(),
            website: value.website.clone(),
            location: value.location.clone(),
        }
    }
}

/// Columns a roaster list may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoasterSortColumn {
    Id,
    Name,
    Location,
}

impl SortColumn for RoasterSortColumn {
    const ALL: &'static [Self] = &[Self::Id, Self::Name, Self::Location];
    const DEFAULT: Self = Self::Id;

    fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Location => "location",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn form() -> RoasterForm {
        RoasterForm {
            name: "Ember & Oak".into(),
            description: "Small batch roaster".into(),
            website: "https://ember.example".into(),
            location: "Leeds, UK".into(),
        }
    }

    #[rstest]
    fn valid_form_is_trimmed(mut form: RoasterForm) {
        form.name = "  Ember & Oak ".into();
        let draft = form.validate().expect("valid form");
        assert_eq!(draft.name, "Ember & Oak");
    }

    #[rstest]
    #[case::blank_name(|f: &mut RoasterForm| f.name = "  ".into(), "name")]
    #[case::long_name(|f: &mut RoasterForm| f.name = "n".repeat(51), "name")]
    #[case::long_description(|f: &mut RoasterForm| f.description = "d".repeat(301), "description")]
    #[case::bad_website(|f: &mut RoasterForm| f.website = "ember.example".into(), "website")]
    #[case::blank_location(|f: &mut RoasterForm| f.location = String::new(), "location")]
    fn invalid_fields_are_reported(
        mut form: RoasterForm,
        #[case] mutate: fn(&mut RoasterForm),
        #[case] field: &str,
    ) {
        mutate(&mut form);
        let v = form.validate().expect_err("invalid form");
        assert!(v.field_error(field).is_some(), "expected error on {field}");
        assert_eq!(v.field_errors().len(), 1);
    }

    #[rstest]
    fn blank_name_reports_blank_before_length() {
        let v = RoasterForm::default().validate().expect_err("empty form");
        assert_eq!(v.field_error("name"), Some("this field cannot be blank"));
        assert!(v.field_error("website").is_some());
        assert!(v.field_error("location").is_some());
    }

    #[rstest]
    fn fifty_character_name_is_accepted(mut form: RoasterForm) {
        form.name = "é".repeat(ROASTER_NAME_MAX);
        assert!(form.validate().is_ok());
    }
}

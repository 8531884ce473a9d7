//! Free-text search and sort directives for list pages.
//!
//! Sort directives are a closed set: each entity exposes a column enum that
//! implements [`SortColumn`], and raw query strings are resolved against it
//! before any query is built. Persistence adapters map the enum to concrete
//! columns with a `match`, so no user text ever reaches SQL as an identifier.

use std::fmt;

use serde::Deserialize;

use super::validator::{self, Validator};

/// Maximum number of characters accepted in a search term.
pub const SEARCH_TERM_MAX: usize = 50;

/// Ordering direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Lower-case suffix used in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A column an entity list may be ordered by.
pub trait SortColumn: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every sortable column; this is the allow-list.
    const ALL: &'static [Self];
    /// Column used when no directive is supplied.
    const DEFAULT: Self;

    /// Name used in query strings.
    fn as_str(self) -> &'static str;
}

/// Raised when a sort directive names an unknown column or direction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported sort directive '{raw}'; expected one of {allowed}")]
pub struct SortError {
    raw: String,
    allowed: String,
}

/// Validated `(column, direction)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortDirective<C> {
    column: C,
    direction: SortDirection,
}

impl<C: SortColumn> Default for SortDirective<C> {
    fn default() -> Self {
        Self::new(C::DEFAULT, SortDirection::Asc)
    }
}

impl<C: SortColumn> SortDirective<C> {
    /// Build a directive from parts that are already valid.
    pub fn new(column: C, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    pub fn column(&self) -> C {
        self.column
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Resolve a raw directive against `C::ALL`.
    ///
    /// Accepted forms are `name_asc`, `name_desc`, `+name`, `-name`, and a
    /// bare `name` (ascending).
    ///
    /// # Examples
    /// ```
    /// use roastery::domain::{RoasterSortColumn, SortDirection, SortDirective};
    ///
    /// let sort = SortDirective::<RoasterSortColumn>::parse("name_desc").unwrap();
    /// assert_eq!(sort.column(), RoasterSortColumn::Name);
    /// assert_eq!(sort.direction(), SortDirection::Desc);
    /// assert!(SortDirective::<RoasterSortColumn>::parse("website_asc").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, SortError> {
        let trimmed = raw.trim();
        let (name, direction) = if let Some(rest) = trimmed.strip_prefix('-') {
            (rest, SortDirection::Desc)
        } else if let Some(rest) = trimmed.strip_prefix('+') {
            (rest, SortDirection::Asc)
        } else if let Some(rest) = trimmed.strip_suffix("_desc") {
            (rest, SortDirection::Desc)
        } else if let Some(rest) = trimmed.strip_suffix("_asc") {
            (rest, SortDirection::Asc)
        } else {
            (trimmed, SortDirection::Asc)
        };

        C::ALL
            .iter()
            .copied()
            .find(|column| column.as_str() == name)
            .map(|column| Self::new(column, direction))
            .ok_or_else(|| SortError {
                raw: raw.to_owned(),
                allowed: allowed_directives::<C>().join(", "),
            })
    }
}

impl<C: SortColumn> fmt::Display for SortDirective<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.column.as_str(), self.direction.as_str())
    }
}

/// Every `column_direction` string accepted for `C`, in declaration order.
pub fn allowed_directives<C: SortColumn>() -> Vec<String> {
    C::ALL
        .iter()
        .flat_map(|column| {
            [SortDirection::Asc, SortDirection::Desc]
                .into_iter()
                .map(move |direction| SortDirective::new(*column, direction).to_string())
        })
        .collect()
}

/// Raw list-page query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

/// A validated search over one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery<C> {
    term: String,
    sort: SortDirective<C>,
}

impl<C: SortColumn> Default for SearchQuery<C> {
    fn default() -> Self {
        Self {
            term: String::new(),
            sort: SortDirective::default(),
        }
    }
}

impl<C: SortColumn> SearchQuery<C> {
    /// Build a query from already validated parts.
    pub fn new(term: impl Into<String>, sort: SortDirective<C>) -> Self {
        Self {
            term: term.into().trim().to_owned(),
            sort,
        }
    }

    /// Validate raw parameters, recording problems under `term` and `sort`.
    pub fn from_params(params: &SearchParams) -> Result<Self, Validator> {
        let mut v = Validator::new();
        let term = params.term.as_deref().unwrap_or_default().trim();
        v.check_field(
            validator::max_chars(term, SEARCH_TERM_MAX),
            "term",
            "this field must be at most 50 characters",
        );

        let sort = match params.sort.as_deref().filter(|raw| validator::not_blank(raw)) {
            None => Some(SortDirective::default()),
            Some(raw) => match SortDirective::parse(raw) {
                Ok(sort) => Some(sort),
                Err(error) => {
                    v.add_field_error("sort", error.to_string());
                    None
                }
            },
        };

        match sort {
            Some(sort) if v.is_valid() => Ok(Self::new(term, sort)),
            _ => Err(v),
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn sort(&self) -> SortDirective<C> {
        self.sort
    }

    /// Whitespace-delimited words of the term.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.term.split_whitespace()
    }

    /// `ILIKE` patterns, one per word, each matching the word as a substring.
    pub fn term_patterns(&self) -> Vec<String> {
        self.words()
            .map(|word| format!("%{}%", escape_like(word)))
            .collect()
    }

    /// `true` when every word occurs case-insensitively in `haystack`.
    pub fn matches(&self, haystack: &str) -> bool {
        let haystack = haystack.to_lowercase();
        self.words()
            .all(|word| haystack.contains(&word.to_lowercase()))
    }
}

/// Escape `LIKE` metacharacters using PostgreSQL's default `\` escape.
fn escape_like(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len());
    for ch in word.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Col {
        Id,
        Name,
    }

    impl SortColumn for Col {
        const ALL: &'static [Self] = &[Self::Id, Self::Name];
        const DEFAULT: Self = Self::Id;

        fn as_str(self) -> &'static str {
            match self {
                Self::Id => "id",
                Self::Name => "name",
            }
        }
    }

    fn params(term: Option<&str>, sort: Option<&str>) -> SearchParams {
        SearchParams {
            term: term.map(str::to_owned),
            sort: sort.map(str::to_owned),
        }
    }

    #[rstest]
    #[case("id_asc", Col::Id, SortDirection::Asc)]
    #[case("id_desc", Col::Id, SortDirection::Desc)]
    #[case("name_asc", Col::Name, SortDirection::Asc)]
    #[case("-name", Col::Name, SortDirection::Desc)]
    #[case("+name", Col::Name, SortDirection::Asc)]
    #[case("name", Col::Name, SortDirection::Asc)]
    fn parses_accepted_forms(
        #[case] raw: &str,
        #[case] column: Col,
        #[case] direction: SortDirection,
    ) {
        let sort = SortDirective::<Col>::parse(raw).expect("directive parses");
        assert_eq!(sort, SortDirective::new(column, direction));
    }

    #[rstest]
    #[case("website_asc")]
    #[case("name_sideways")]
    #[case("id; DROP TABLE roasters")]
    #[case("")]
    fn rejects_unknown_directives(#[case] raw: &str) {
        assert!(SortDirective::<Col>::parse(raw).is_err());
    }

    #[rstest]
    fn missing_sort_defaults_to_id_asc() {
        let query = SearchQuery::<Col>::from_params(&params(None, None)).expect("valid");
        assert_eq!(query.sort(), SortDirective::new(Col::Id, SortDirection::Asc));
        assert_eq!(query.term(), "");
    }

    #[rstest]
    fn invalid_sort_is_a_field_error() {
        let v = SearchQuery::<Col>::from_params(&params(None, Some("colour_desc")))
            .expect_err("invalid sort");
        let message = v.field_error("sort").expect("sort error");
        assert!(message.contains("id_asc, id_desc, name_asc, name_desc"));
    }

    #[rstest]
    fn overlong_term_is_a_field_error() {
        let long = "x".repeat(SEARCH_TERM_MAX + 1);
        let v = SearchQuery::<Col>::from_params(&params(Some(&long), None)).expect_err("too long");
        assert!(v.field_error("term").is_some());
    }

    #[rstest]
    fn term_patterns_wrap_and_escape_each_word() {
        let query = SearchQuery::<Col>::new("  dark 100%_pure  ", SortDirective::default());
        assert_eq!(query.term_patterns(), ["%dark%", r"%100\%\_pure%"]);
    }

    #[rstest]
    fn empty_term_has_no_patterns_and_matches_everything() {
        let query = SearchQuery::<Col>::default();
        assert!(query.term_patterns().is_empty());
        assert!(query.matches("anything at all"));
    }

    #[rstest]
    #[case("Dark Roast Espresso", true)]
    #[case("roasted darkly", true)]
    #[case("dark chocolate", false)]
    fn matches_requires_every_word(#[case] haystack: &str, #[case] expected: bool) {
        let query = SearchQuery::<Col>::new("dark roast", SortDirective::default());
        assert_eq!(query.matches(haystack), expected);
    }
}

//! Path and form parameters shared by the resource handlers.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload};

use crate::domain::Error;

use super::HttpResult;

/// A positive record id taken from the `{id}` path segment.
///
/// Anything that is not a positive integer is reported as not found, so
/// probing with junk ids reveals nothing about the routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(pub i64);

/// Parse a path id; non-numeric and non-positive values are 404.
pub fn parse_id(raw: &str) -> HttpResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id >= 1)
        .ok_or_else(|| Error::not_found("the requested resource could not be found"))
}

impl FromRequest for EntityId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(parse_id(req.match_info().get("id").unwrap_or_default()).map(Self))
    }
}

/// Parse the hidden `version` field of an edit form.
pub fn parse_version(raw: &str) -> HttpResult<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|version| *version >= 1)
        .ok_or_else(|| Error::invalid_request("version must be a positive integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case("1", Some(1))]
    #[case("9000", Some(9000))]
    #[case("0", None)]
    #[case("-4", None)]
    #[case("abc", None)]
    #[case("", None)]
    fn parse_id_accepts_positive_integers(#[case] raw: &str, #[case] expected: Option<i64>) {
        let parsed = parse_id(raw);
        assert_eq!(parsed.as_ref().ok().copied(), expected);
        if let Err(err) = parsed {
            assert_eq!(err.code(), ErrorCode::NotFound);
        }
    }

    #[rstest]
    #[case(" 3 ", Some(3))]
    #[case("0", None)]
    #[case("three", None)]
    fn parse_version_is_bad_request_when_malformed(
        #[case] raw: &str,
        #[case] expected: Option<i32>,
    ) {
        let parsed = parse_version(raw);
        assert_eq!(parsed.as_ref().ok().copied(), expected);
        if let Err(err) = parsed {
            assert_eq!(err.code(), ErrorCode::InvalidRequest);
        }
    }
}

//! NewTypes for URLs and names used when interacting with the API.

use crate::errors::InvalidApiUrl;
use aliri_braid::braid;

/// An [ApiUrl] is the base URL of a ChRIS Collection+JSON API, e.g.
/// `https://cube.chrisproject.org/api/v1/`. It doubles as the URL of the
/// entry-point collection (the feeds collection).
#[braid(validator, serde)]
pub struct ApiUrl(String);

impl aliri_braid::Validator for ApiUrl {
    type Error = InvalidApiUrl;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if !(s.starts_with("http://") || s.starts_with("https://")) {
            Err(InvalidApiUrl::Protocol(s.to_string()))
        } else if !s.ends_with("/api/v1/") {
            Err(InvalidApiUrl::EndpointVersion(s.to_string()))
        } else {
            Ok(())
        }
    }
}

/// A URL to a paginated list of items, e.g. `plugins/` or `pipelines/`
#[braid(serde)]
pub struct CollectionUrl;

/// A URL to a single item, e.g. `plugins/1/` or `pipelines/2/`
#[braid(serde)]
pub struct ItemUrl;

/// A user's username.
#[braid(serde)]
pub struct Username;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("https://cube.chrisproject.org/api/v1/")]
    #[case("http://192.168.0.4:8000/api/v1/")]
    // the API may be mounted under a path prefix
    #[case("https://example.org/chris/api/v1/")]
    fn test_accepts_base_urls(#[case] url: &str) {
        let parsed = ApiUrl::try_from(url).unwrap();
        assert_eq!(parsed.as_str(), url);
    }

    // Schemes are matched case-sensitively; the URL is used verbatim.
    #[rstest]
    #[case("")]
    #[case("ftp://example.org/api/v1/")]
    #[case("HTTPS://example.org/api/v1/")]
    #[case("cube.chrisproject.org/api/v1/")]
    fn test_rejects_bad_scheme(#[case] url: &str) {
        assert!(matches!(
            ApiUrl::try_from(url).unwrap_err(),
            InvalidApiUrl::Protocol { .. }
        ))
    }

    #[rstest]
    #[case("https://example.org")]
    #[case("https://example.org/api/v1")]
    #[case("https://example.org/api/v2/")]
    #[case("https://example.org/api/v1/?limit=5")]
    #[case("https://example.org/api/v1/plugins/")]
    fn test_rejects_non_base_paths(#[case] url: &str) {
        assert!(matches!(
            ApiUrl::try_from(url).unwrap_err(),
            InvalidApiUrl::EndpointVersion { .. }
        ))
    }
}

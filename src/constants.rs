use std::time::Duration;

/// Media type of Collection+JSON request and response bodies.
pub const COLLECTION_JSON_MIME: &str = "application/vnd.collection+json";

/// `Accept` header value sent with every request. The plain-JSON fallback
/// is for the auth-token and account-creation endpoints.
pub(crate) const ACCEPT_MIME: &str = "application/vnd.collection+json, application/json";

/// Default per-request timeout. Every request has a timeout: either this
/// one or a per-call override.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Link relation of the next page of a paginated collection.
pub(crate) const NEXT_REL: &str = "next";

/// Link relation of the previous page of a paginated collection.
pub(crate) const PREVIOUS_REL: &str = "previous";

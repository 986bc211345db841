//! Key schema for the volatile store
//!
//! Movie details: `movie:{movie_id}`, shared by every user.
//! Sessions: the bare session id (a UUID string), value = user id.

/// Prefix of movie detail entries.
pub const MOVIE_PREFIX: &str = "movie";

/// Key builder
pub struct CacheKey;

impl CacheKey {
    /// Movie detail cache entry
    /// Format: movie:{movie_id}
    pub fn movie(movie_id: i64) -> String {
        format!("{}:{}", MOVIE_PREFIX, movie_id)
    }

    /// Session ledger entry. Session ids are used verbatim.
    pub fn session(session_id: &str) -> String {
        session_id.to_string()
    }

    /// Entity label for metrics. Anything without a known prefix is a session.
    pub fn entity_type(key: &str) -> &'static str {
        match key.split_once(':') {
            Some((MOVIE_PREFIX, _)) => "movie",
            Some(_) => "unknown",
            None => "session",
        }
    }
}

//! Randomized client identities.
//!
//! Every request presents a browser `User-Agent` drawn uniformly from a pool
//! so that traffic does not carry one uniform fingerprint.

use rand::seq::SliceRandom as _;

/// Identity used when the pool is empty.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Current desktop browser user agents.
pub const BROWSER_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    // Chrome on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    // Chrome on Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    // Firefox
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
    // Safari
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    // Edge
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

/// The client identity presented on a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Identity {
    /// Returns the identity as `(header name, value)` pairs.
    #[must_use]
    pub fn headers(&self) -> [(&'static str, &str); 1] {
        [("User-Agent", self.user_agent.as_str())]
    }
}

/// Draws a random [`Identity`] per call from a fixed pool.
#[derive(Debug, Clone)]
pub struct IdentityRotator {
    pool: Vec<String>,
}

impl IdentityRotator {
    /// Creates a rotator over a custom pool.
    #[must_use]
    pub fn new<I, S>(pool: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pool: pool.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a random identity from the pool, or [`DEFAULT_USER_AGENT`]
    /// if the pool is empty.
    #[must_use]
    pub fn identity(&self) -> Identity {
        let user_agent = self
            .pool
            .choose(&mut rand::thread_rng())
            .map_or(DEFAULT_USER_AGENT, String::as_str);

        Identity {
            user_agent: user_agent.to_owned(),
        }
    }

    /// Number of identities in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

impl Default for IdentityRotator {
    fn default() -> Self {
        Self::new(BROWSER_USER_AGENTS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn default_pool_yields_browser_agents() {
        let rotator = IdentityRotator::default();
        assert_eq!(rotator.len(), BROWSER_USER_AGENTS.len());
        for _ in 0..20 {
            let identity = rotator.identity();
            assert!(BROWSER_USER_AGENTS.contains(&identity.user_agent.as_str()));
        }
    }

    #[test]
    fn empty_pool_falls_back_to_default() {
        let rotator = IdentityRotator::new(Vec::<String>::new());
        assert!(rotator.is_empty());
        assert_eq!(rotator.identity().user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn single_entry_pool_is_deterministic() {
        let rotator = IdentityRotator::new(["TestAgent/1.0"]);
        assert_eq!(rotator.identity().user_agent, "TestAgent/1.0");
    }

    #[test]
    fn rotation_covers_more_than_one_agent() {
        let rotator = IdentityRotator::default();
        let seen: BTreeSet<String> = (0..500).map(|_| rotator.identity().user_agent).collect();
        assert!(seen.len() > 1);
    }

    #[test]
    fn headers_expose_user_agent() {
        let identity = Identity {
            user_agent: "Agent".to_string(),
        };
        assert_eq!(identity.headers(), [("User-Agent", "Agent")]);
    }
}

//! Signer and verifier configuration.
//!
//! All configuration is driven by environment variables:
//!
//! | Variable                     | Default       | Meaning                              |
//! |------------------------------|---------------|--------------------------------------|
//! | `HTTPSIG_KEY_ID`             | (empty)       | Key identifier used when signing     |
//! | `HTTPSIG_ALGORITHM`          | `hmac-sha256` | Algorithm used when signing          |
//! | `HTTPSIG_HEADERS`            | (empty)       | Space-separated header list to sign  |
//! | `HTTPSIG_ALLOWED_CLOCK_SKEW` | `300`         | Seconds; negative disables the check |
//! | `HTTPSIG_ALLOWED_ALGORITHMS` | `hmac-sha256` | Comma or space separated allow-list  |
//! | `HTTPSIG_REQUIRED_HEADERS`   | (empty)       | Headers every signature must cover   |

use tracing::warn;

/// Default allowed clock skew, in seconds.
pub const DEFAULT_ALLOWED_CLOCK_SKEW: i64 = 300;

/// Default signing algorithm.
pub const DEFAULT_ALGORITHM: &str = "hmac-sha256";

/// Configuration for signing requests.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerConfig {
    /// Key identifier sent as `keyId`.
    pub key_id: String,
    /// Algorithm name.
    pub algorithm: String,
    /// Header list; empty means `date` only.
    pub headers: Vec<String>,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            algorithm: DEFAULT_ALGORITHM.to_owned(),
            headers: Vec::new(),
        }
    }
}

impl SignerConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("HTTPSIG_KEY_ID") {
            config.key_id = v;
        }
        if let Some(v) = lookup("HTTPSIG_ALGORITHM") {
            config.algorithm = v.trim().to_owned();
        }
        if let Some(v) = lookup("HTTPSIG_HEADERS") {
            config.headers = split_list(&v);
        }

        config
    }
}

/// Configuration for verifying requests.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierConfig {
    /// Allowed age of the signed timestamp in seconds; negative disables the
    /// check, zero is rejected at verification time.
    pub allowed_clock_skew: i64,
    /// Algorithms a request may be signed with.
    pub allowed_algorithms: Vec<String>,
    /// Headers every signature must cover.
    pub required_headers: Vec<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            allowed_clock_skew: DEFAULT_ALLOWED_CLOCK_SKEW,
            allowed_algorithms: vec![DEFAULT_ALGORITHM.to_owned()],
            required_headers: Vec::new(),
        }
    }
}

impl VerifierConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("HTTPSIG_ALLOWED_CLOCK_SKEW") {
            match v.trim().parse() {
                Ok(skew) => config.allowed_clock_skew = skew,
                Err(e) => {
                    warn!(value = %v, error = %e, "Ignoring invalid HTTPSIG_ALLOWED_CLOCK_SKEW");
                }
            }
        }
        if let Some(v) = lookup("HTTPSIG_ALLOWED_ALGORITHMS") {
            config.allowed_algorithms = split_list(&v);
        }
        if let Some(v) = lookup("HTTPSIG_REQUIRED_HEADERS") {
            config.required_headers = split_list(&v);
        }

        config
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

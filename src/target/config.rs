use std::{fmt, time::Duration};

use http::Uri;
use serde::Deserialize;


#[derive(Debug, Clone, confique::Config)]
pub struct TargetConfig {
    /// Base URL of the system under test. The endpoint paths (`/register`,
    /// `/login`, `/bookings`) are appended to this, so it may contain a
    /// path prefix like `https://tickets.example.com/api`.
    #[config(default = "http://localhost", env = "SEATRUSH_BASE_URL")]
    pub base_url: BaseUrl,

    /// Upper bound for a single request, including reading the response
    /// body. Requests exceeding this count as failed. Handed to the HTTP
    /// client of every goose user.
    #[config(default = "60s", deserialize_with = crate::config::deserialize_duration)]
    pub timeout: Duration,
}

/// An `http` or `https` URL without query or fragment. Stored without
/// trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct BaseUrl(String);

impl BaseUrl {
    /// Returns the URI of `path` (which has to start with `/`) below this
    /// base URL.
    pub fn join(&self, path: &str) -> Result<Uri, http::uri::InvalidUri> {
        format!("{}{}", self.0, path).parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BaseUrl {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let uri: Uri = s.parse().map_err(|e| format!("invalid URL: {e}"))?;

        match uri.scheme_str() {
            Some("http" | "https") => {}
            Some(other) => return Err(format!("scheme must be http or https, not '{other}'")),
            None => return Err("must contain scheme (e.g. 'http://')".into()),
        }
        if uri.authority().is_none() {
            return Err("must have authority part".into());
        }
        if uri.query().is_some() || s.contains('?') {
            return Err("must not contain query part".into());
        }
        if s.contains('#') {
            return Err("must not contain fragment part (#...)".into());
        }

        Ok(Self(s.trim_end_matches('/').to_owned()))
    }
}

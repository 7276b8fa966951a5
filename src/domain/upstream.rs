//! The single upstream origin every request is forwarded to

use http::uri::{Authority, Scheme};
use http::{HeaderValue, Uri};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Scheme assumed when the configured origin omits one
pub const DEFAULT_SCHEME_PREFIX: &str = "https://";

/// Errors raised while parsing the configured upstream origin
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("upstream URL is empty")]
    Empty,

    #[error("upstream URL '{url}' is malformed: {reason}")]
    Malformed { url: String, reason: String },

    #[error("upstream URL '{0}' has no host")]
    MissingHost(String),
}

/// Parsed upstream origin, immutable after startup
#[derive(Clone, Debug)]
pub struct UpstreamTarget {
    scheme: Scheme,
    authority: Authority,
    host_header: HeaderValue,
    base_path: String,
    query: Option<String>,
}

impl UpstreamTarget {
    /// Parse a configured origin URL, prepending `https://` when it carries
    /// neither `http://` nor `https://`.
    pub fn parse(raw: &str) -> Result<Self, UpstreamError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UpstreamError::Empty);
        }

        let url: Cow<'_, str> =
            if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
                Cow::Borrowed(trimmed)
            } else {
                Cow::Owned(format!("{DEFAULT_SCHEME_PREFIX}{trimmed}"))
            };

        let malformed = |reason: String| UpstreamError::Malformed {
            url: url.to_string(),
            reason,
        };

        let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| malformed(e.to_string()))?;
        let scheme = uri
            .scheme()
            .cloned()
            .ok_or_else(|| malformed("missing scheme".to_string()))?;
        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| UpstreamError::MissingHost(url.to_string()))?;
        if authority.host().is_empty() {
            return Err(UpstreamError::MissingHost(url.to_string()));
        }

        // Userinfo never belongs in a Host header.
        let host = match authority.port() {
            Some(port) => format!("{}:{}", authority.host(), port),
            None => authority.host().to_string(),
        };
        let host_header = HeaderValue::from_str(&host).map_err(|e| malformed(e.to_string()))?;

        Ok(Self {
            scheme,
            authority,
            host_header,
            base_path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
        })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Value sent as the outbound `Host` header
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    /// Build the outbound URI for an inbound request URI.
    ///
    /// The request path is appended to the origin's base path with a single
    /// separator, and the origin's own query (if any) is placed ahead of the
    /// request query.
    pub fn rewrite_uri(&self, original: &Uri) -> Result<Uri, http::Error> {
        let path = join_paths(&self.base_path, original.path());
        let query = [self.query.as_deref(), original.query()]
            .into_iter()
            .flatten()
            .filter(|q| !q.is_empty())
            .collect::<Vec<_>>()
            .join("&");

        let path_and_query = if query.is_empty() {
            path
        } else {
            format!("{path}?{query}")
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.base_path)
    }
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

// URL prefix value type
//
// Registration form: scheme://host:port/path/
// host may be a name, an IP literal, or the wildcards '+' (strong) and '*' (weak).

use super::error::{DomainError, Result};
use std::fmt;

/// A validated URL prefix, as registered on a URL group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlPrefix {
    https: bool,
    host: String,
    port: u16,
    path: String,
}

/// Borrowed pieces of a URL before normalization
struct Parts<'a> {
    https: bool,
    host: &'a str,
    port: u16,
    path: &'a str,
}

fn split(input: &str) -> std::result::Result<Parts<'_>, &'static str> {
    let (scheme, rest) = input
        .split_once("://")
        .ok_or("missing '://' after scheme")?;

    let https = if scheme.eq_ignore_ascii_case("http") {
        false
    } else if scheme.eq_ignore_ascii_case("https") {
        true
    } else {
        return Err("scheme must be http or https");
    };

    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    let (host, port) = if authority.starts_with('[') {
        let end = authority.find(']').ok_or("unterminated IPv6 literal")?;
        let tail = &authority[end + 1..];
        let port = if tail.is_empty() {
            None
        } else {
            Some(
                tail.strip_prefix(':')
                    .ok_or("unexpected characters after IPv6 literal")?,
            )
        };
        (&authority[..=end], port)
    } else {
        match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    if host.is_empty() || host == "[]" {
        return Err("missing host");
    }
    if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("host contains whitespace or control characters");
    }

    let port = match port {
        Some(raw) => {
            let port: u16 = raw.parse().map_err(|_| "port is not a number")?;
            if port == 0 {
                return Err("port must be non-zero");
            }
            port
        }
        None if https => 443,
        None => 80,
    };

    if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("path contains whitespace or control characters");
    }

    Ok(Parts {
        https,
        host,
        port,
        path,
    })
}

impl UrlPrefix {
    /// Parse and normalize a prefix; the path always ends with '/'
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = |reason| DomainError::InvalidUrlPrefix {
            prefix: input.to_string(),
            reason,
        };

        let parts = split(trimmed).map_err(invalid)?;
        if parts.path.contains(['?', '#']) {
            return Err(invalid("prefix may not contain a query or fragment"));
        }

        let mut path = parts.path.to_string();
        if !path.ends_with('/') {
            path.push('/');
        }

        Ok(Self {
            https: parts.https,
            host: parts.host.to_ascii_lowercase(),
            port: parts.port,
            path,
        })
    }

    pub fn is_https(&self) -> bool {
        self.https
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// '+' or '*' host
    pub fn is_wildcard_host(&self) -> bool {
        self.host == "+" || self.host == "*"
    }

    /// Host precedence when routing: strong '+' (2), explicit host (1), weak '*' (0)
    pub fn host_rank(&self) -> u8 {
        match self.host.as_str() {
            "+" => 2,
            "*" => 0,
            _ => 1,
        }
    }

    /// Fully qualified form handed to the OS
    pub fn full_prefix(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, self.path)
    }

    /// Whether a request URL falls under this prefix
    pub fn matches(&self, url: &str) -> bool {
        let url = url.trim();
        let url = url.split(['?', '#']).next().unwrap_or(url);
        let Ok(parts) = split(url) else {
            return false;
        };

        if parts.https != self.https || parts.port != self.port {
            return false;
        }
        if !self.is_wildcard_host() && !parts.host.eq_ignore_ascii_case(&self.host) {
            return false;
        }

        let path = parts.path.to_ascii_lowercase();
        let prefix = self.path.to_ascii_lowercase();
        path.starts_with(&prefix) || format!("{}/", path) == prefix
    }
}

impl fmt::Display for UrlPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_prefix())
    }
}

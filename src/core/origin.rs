//! Site origins: the canonical origin plus alias domains.

use url::Url;

/// The origins a site is served from.
///
/// The first origin is canonical; canonical URLs are always built on it.
/// Aliases (e.g. `www.` or a legacy domain) only count for deciding whether
/// an absolute link is internal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOrigins {
    /// Serialized origins (`https://example.com`), canonical first.
    origins: Vec<String>,
    /// Lowercase `host[:port]` of every origin.
    hosts: Vec<String>,
}

impl SiteOrigins {
    /// Build from the canonical site URL and alias URLs.
    pub fn new(canonical: &str, aliases: &[String]) -> Result<Self, url::ParseError> {
        let mut origins = Vec::with_capacity(aliases.len() + 1);
        let mut hosts = Vec::with_capacity(aliases.len() + 1);

        for raw in std::iter::once(canonical).chain(aliases.iter().map(String::as_str)) {
            let url = Url::parse(raw)?;
            let origin = url.origin().ascii_serialization();
            let host = host_key(&url).ok_or(url::ParseError::EmptyHost)?;
            if !origins.contains(&origin) {
                origins.push(origin);
            }
            if !hosts.contains(&host) {
                hosts.push(host);
            }
        }

        Ok(Self { origins, hosts })
    }

    /// Canonical origin, without trailing slash.
    #[inline]
    pub fn canonical(&self) -> &str {
        &self.origins[0]
    }

    /// All origins, canonical first.
    #[inline]
    pub fn all(&self) -> &[String] {
        &self.origins
    }

    /// Whether `url` belongs to one of the site's hosts (scheme ignored).
    pub fn owns(&self, url: &Url) -> bool {
        host_key(url).is_some_and(|h| self.hosts.contains(&h))
    }

    /// Whether `url` is on the canonical origin (scheme, host and port).
    pub fn is_canonical(&self, url: &Url) -> bool {
        url.origin().ascii_serialization() == self.canonical()
    }

    /// Site path of an absolute web link, or `None` when the link points
    /// at a foreign host or cannot be parsed.
    ///
    /// The path is returned percent-encoded, exactly as the `url` crate
    /// serializes it. Protocol-relative links (`//host/x`) are accepted.
    pub fn internal_path(&self, link: &str) -> Option<String> {
        let parsed = if link.starts_with("//") {
            Url::parse(&format!("https:{link}")).ok()?
        } else {
            Url::parse(link).ok()?
        };
        if !matches!(parsed.scheme(), "http" | "https") || !self.owns(&parsed) {
            return None;
        }
        Some(parsed.path().to_string())
    }
}

fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

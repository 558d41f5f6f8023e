//! Response caching and security headers.
//!
//! Only anonymous, non-admin responses are made cacheable; everything else
//! gets no headers from here and keeps whatever the host sends.

use crate::config::Config;
use crate::core::{ClientContext, DeviceClass};

pub const CACHE_CONTROL: &str = "Cache-Control";
pub const LINK: &str = "Link";

const PUBLIC_CACHE: &str =
    "public, max-age=3600, s-maxage=3600, stale-while-revalidate=86400, stale-if-error=259200";
const VARY_BY_DEVICE: &str = "vary-by-device";
const HSTS: &str = "max-age=31536000; includeSubDomains; preload";

/// Ordered header list; names may repeat (`Link`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet(Vec<(&'static str, String)>);

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: &'static str, value: impl Into<String>) {
        self.0.push((name, value.into()));
    }

    /// First value for `name`, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(n, v)| (*n, v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Extend<(&'static str, String)> for HeaderSet {
    fn extend<T: IntoIterator<Item = (&'static str, String)>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

/// Switches that shape [`response_headers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderOptions {
    pub browser_caching: bool,
    pub vary_by_device: bool,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            browser_caching: true,
            vary_by_device: true,
        }
    }
}

impl From<&Config> for HeaderOptions {
    fn from(config: &Config) -> Self {
        Self {
            browser_caching: config.features.browser_caching,
            vary_by_device: config.cache.vary_by_device,
        }
    }
}

/// Caching and security headers for a page response.
pub fn response_headers(client: &ClientContext, options: HeaderOptions) -> HeaderSet {
    let mut headers = HeaderSet::new();
    if !options.browser_caching || client.is_logged_in() || client.admin {
        return headers;
    }

    let cache_control = if options.vary_by_device && client.device == DeviceClass::Mobile {
        format!("{PUBLIC_CACHE}, {VARY_BY_DEVICE}")
    } else {
        PUBLIC_CACHE.to_string()
    };

    headers.append(CACHE_CONTROL, cache_control);
    headers.append("X-Content-Type-Options", "nosniff");
    headers.append("X-XSS-Protection", "1; mode=block");
    headers.append("X-Frame-Options", "SAMEORIGIN");
    headers.append("Referrer-Policy", "strict-origin-when-cross-origin");
    if client.https {
        headers.append("Strict-Transport-Security", HSTS);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UserId;

    #[test]
    fn test_anonymous_desktop() {
        let headers = response_headers(&ClientContext::default(), HeaderOptions::default());
        assert_eq!(headers.get("cache-control"), Some(PUBLIC_CACHE));
        assert_eq!(headers.get("X-Frame-Options"), Some("SAMEORIGIN"));
        assert_eq!(headers.get("Strict-Transport-Security"), None);
        assert_eq!(headers.len(), 5);
    }

    #[test]
    fn test_mobile_https() {
        let client = ClientContext {
            device: DeviceClass::Mobile,
            https: true,
            ..ClientContext::default()
        };
        let headers = response_headers(&client, HeaderOptions::default());
        assert!(headers.get(CACHE_CONTROL).unwrap().ends_with(", vary-by-device"));
        assert_eq!(headers.get("Strict-Transport-Security"), Some(HSTS));
    }

    #[test]
    fn test_vary_by_device_disabled() {
        let client = ClientContext {
            device: DeviceClass::Mobile,
            ..ClientContext::default()
        };
        let options = HeaderOptions {
            vary_by_device: false,
            ..HeaderOptions::default()
        };
        assert_eq!(response_headers(&client, options).get(CACHE_CONTROL), Some(PUBLIC_CACHE));
    }

    #[test]
    fn test_logged_in_and_admin_get_nothing() {
        let user = ClientContext {
            user: Some(UserId(7)),
            ..ClientContext::default()
        };
        assert!(response_headers(&user, HeaderOptions::default()).is_empty());

        let admin = ClientContext {
            admin: true,
            ..ClientContext::default()
        };
        assert!(response_headers(&admin, HeaderOptions::default()).is_empty());
    }

    #[test]
    fn test_browser_caching_off() {
        let options = HeaderOptions {
            browser_caching: false,
            ..HeaderOptions::default()
        };
        assert!(response_headers(&ClientContext::default(), options).is_empty());
    }

    #[test]
    fn test_repeated_link_headers() {
        let mut headers = HeaderSet::new();
        headers.append(LINK, "</a.js>; rel=preload; as=script");
        headers.append(LINK, "</b.css>; rel=preload; as=style");
        assert_eq!(headers.get_all("link").count(), 2);
    }
}

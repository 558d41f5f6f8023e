//! Per-request inputs shared by every rule.
//!
//! All types here are built once per request and only read afterwards.

use std::fmt;

/// Script handles that must load eagerly with high priority.
pub const CRITICAL_SCRIPTS: &[&str] = &["jquery", "jquery-core", "wp-embed"];

/// Stylesheet handles that are never turned into preload-then-swap.
pub const CRITICAL_STYLES: &[&str] = &["critical-css", "wp-block-library"];

/// Handles whose preload `Link` header carries `fetchpriority=high`.
pub const PRIORITY_HANDLES: &[&str] = &["critical-css", "jquery", "wp-block-library"];

// ============================================================================
// Device / connection
// ============================================================================

/// Coarse device class derived from the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl DeviceClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
        }
    }

    /// Mobile or tablet.
    pub const fn is_handheld(self) -> bool {
        !matches!(self, Self::Desktop)
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective connection type, as sent in the `ECT` client hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionHint {
    Slow2g,
    G2,
    G3,
    G4,
}

impl ConnectionHint {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => Some(Self::Slow2g),
            "2g" => Some(Self::G2),
            "3g" => Some(Self::G3),
            "4g" => Some(Self::G4),
            _ => None,
        }
    }

    /// `slow-2g` and `2g` force script deferral.
    pub const fn is_slow(self) -> bool {
        matches!(self, Self::Slow2g | Self::G2)
    }
}

/// Identifier of a logged-in user, as resolved by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the rules need to know about the requesting client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub device: DeviceClass,
    /// Logged-in user, `None` for anonymous visitors.
    pub user: Option<UserId>,
    pub https: bool,
    /// Administrative screen (no caching, no content rewriting).
    pub admin: bool,
    pub connection: Option<ConnectionHint>,
}

impl ClientContext {
    pub const fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_slow_connection(&self) -> bool {
        self.connection.is_some_and(ConnectionHint::is_slow)
    }
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Script,
    Style,
}

impl ResourceKind {
    /// Value of the `as` attribute in preload hints.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
        }
    }
}

/// A registered script or stylesheet, as known to the host's asset registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub handle: String,
    pub src: String,
    pub kind: ResourceKind,
    pub critical: bool,
}

impl ResourceDescriptor {
    /// Describe a script; criticality comes from [`CRITICAL_SCRIPTS`].
    pub fn script(handle: impl Into<String>, src: impl Into<String>) -> Self {
        let handle = handle.into();
        let critical = CRITICAL_SCRIPTS.contains(&handle.as_str());
        Self {
            handle,
            src: src.into(),
            kind: ResourceKind::Script,
            critical,
        }
    }

    /// Describe a stylesheet; criticality comes from [`CRITICAL_STYLES`].
    pub fn style(handle: impl Into<String>, src: impl Into<String>) -> Self {
        let handle = handle.into();
        let critical = CRITICAL_STYLES.contains(&handle.as_str());
        Self {
            handle,
            src: src.into(),
            kind: ResourceKind::Style,
            critical,
        }
    }
}

// ============================================================================
// Images
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Avif,
}

impl ImageFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    pub const fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Avif => "image/avif",
        }
    }
}

/// An image about to be rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Intrinsic width, 0 when unknown.
    pub width: u32,
    /// Intrinsic height, 0 when unknown.
    pub height: u32,
    /// Likely LCP element; recomputed on every render.
    pub hero: bool,
}

impl ImageDescriptor {
    pub const fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_hint_parse() {
        assert_eq!(ConnectionHint::parse("slow-2g"), Some(ConnectionHint::Slow2g));
        assert_eq!(ConnectionHint::parse(" 2G "), Some(ConnectionHint::G2));
        assert_eq!(ConnectionHint::parse("4g"), Some(ConnectionHint::G4));
        assert_eq!(ConnectionHint::parse("5g"), None);
        assert!(ConnectionHint::G2.is_slow());
        assert!(!ConnectionHint::G3.is_slow());
    }

    #[test]
    fn test_descriptor_criticality() {
        assert!(ResourceDescriptor::script("jquery", "/jquery.js").critical);
        assert!(!ResourceDescriptor::script("theme", "/theme.js").critical);
        assert!(ResourceDescriptor::style("wp-block-library", "/b.css").critical);
        assert!(!ResourceDescriptor::style("jquery", "/x.css").critical);
    }

    #[test]
    fn test_anonymous_context() {
        let client = ClientContext::default();
        assert!(!client.is_logged_in());
        assert!(!client.is_slow_connection());
        assert_eq!(client.device, DeviceClass::Desktop);
    }
}

//! Device classification from the `User-Agent` header.
//!
//! Ordered, first match wins:
//!
//! 1. tablet keywords, or an `android` token with no `mobi` / `opera mini` after it
//! 2. mobile keywords
//! 3. desktop

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{ClientContext, ConnectionHint, DeviceClass, UserId};

static TABLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"tablet|ipad|playbook").expect("valid tablet pattern"));

static ANDROID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"android").expect("valid android pattern"));

static ANDROID_PHONE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"mobi|opera mini").expect("valid phone marker pattern"));

static MOBILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"up.browser|up.link|mmp|symbian|smartphone|midp|wap|phone|android|iemobile")
        .expect("valid mobile pattern")
});

/// Classify a raw user agent string.
pub fn classify(user_agent: &str) -> DeviceClass {
    let ua = user_agent.to_ascii_lowercase();

    if TABLET.is_match(&ua) || is_android_tablet(&ua) {
        return DeviceClass::Tablet;
    }
    if MOBILE.is_match(&ua) {
        return DeviceClass::Mobile;
    }
    DeviceClass::Desktop
}

/// `android(?!.*(mobi|opera mini))`: some `android` occurrence has no phone
/// marker anywhere after it. Checking the last occurrence is sufficient.
fn is_android_tablet(ua: &str) -> bool {
    ANDROID
        .find_iter(ua)
        .last()
        .is_some_and(|m| !ANDROID_PHONE_MARKER.is_match(&ua[m.end()..]))
}

// ============================================================================
// ClientContext construction
// ============================================================================

/// Cookie carrying the host-resolved user id.
pub const USER_COOKIE: &str = "speedway_user";

/// Build the per-request client context from raw header pairs.
///
/// Header names are matched case-insensitively. `https` is taken from the
/// transport unless a proxy reports `X-Forwarded-Proto`.
pub fn client_from_headers<'a, I>(headers: I, transport_https: bool, admin: bool) -> ClientContext
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut user_agent = "";
    let mut connection = None;
    let mut https = transport_https;
    let mut user = None;

    for (name, value) in headers {
        if name.eq_ignore_ascii_case("user-agent") {
            user_agent = value;
        } else if name.eq_ignore_ascii_case("ect") {
            connection = ConnectionHint::parse(value);
        } else if name.eq_ignore_ascii_case("x-forwarded-proto") {
            https = value.trim().eq_ignore_ascii_case("https");
        } else if name.eq_ignore_ascii_case("cookie") {
            user = user.or_else(|| user_from_cookie(value));
        }
    }

    ClientContext {
        device: classify(user_agent),
        user,
        https,
        admin,
        connection,
    }
}

/// Extract the user id from a `Cookie` header value.
fn user_from_cookie(cookie: &str) -> Option<UserId> {
    cookie
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == USER_COOKIE)
        .and_then(|(_, value)| value.trim().parse().ok())
        .filter(|id| *id > 0)
        .map(UserId)
}

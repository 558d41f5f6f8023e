//! Script loading plans.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::FeaturesConfig;
use crate::core::{ClientContext, DeviceClass, ResourceDescriptor};
use crate::debug;

/// Existing `type` attribute, so a module marker does not end up second.
static TYPE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+type\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).expect("valid type attribute pattern")
});

/// `src=` preceded by any whitespace, so wrapped tags are found too.
static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+src\s*=").expect("valid src attribute pattern"));

/// Attribute changes for one `<script>` tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptPlan {
    /// `fetchpriority="high"`; only set for critical handles.
    pub high_priority: bool,
    /// `type="module"`.
    pub module: bool,
    /// `defer`, unless the tag is already `defer` or `async`.
    pub defer: bool,
    /// `data-connection-aware="true"`, read by the client runtime.
    pub connection_aware: bool,
}

/// Decide how a script loads.
///
/// Critical handles short-circuit every later rule.
pub fn plan_script(
    desc: &ResourceDescriptor,
    client: &ClientContext,
    features: &FeaturesConfig,
) -> ScriptPlan {
    if desc.critical {
        return ScriptPlan {
            high_priority: true,
            ..ScriptPlan::default()
        };
    }

    if desc.src.contains(".module.js") {
        return ScriptPlan {
            module: true,
            ..ScriptPlan::default()
        };
    }

    let device_defer = client.device == DeviceClass::Mobile || features.js_loading;
    let slow = client.is_slow_connection();
    if slow {
        debug!("policy"; "slow connection, deferring {}", desc.handle);
    }

    ScriptPlan {
        defer: device_defer || slow,
        connection_aware: device_defer || slow,
        ..ScriptPlan::default()
    }
}

impl ScriptPlan {
    /// Whether the plan leaves the tag untouched.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }

    /// Render the plan into a host-generated `<script ... src=...>` tag.
    ///
    /// Attributes are inserted before the `src` attribute; inline scripts
    /// (no `src`) are returned unchanged.
    pub fn apply(&self, tag: &str) -> String {
        if self.is_noop() || src_offset(tag).is_none() {
            return tag.to_string();
        }

        let mut inserted = String::new();
        if self.high_priority {
            inserted.push_str(r#" fetchpriority="high""#);
        }

        let mut tag = tag.to_string();
        if self.module {
            tag = strip_type_attribute(&tag);
            inserted.push_str(r#" type="module""#);
        }

        let already_lazy = super::has_attribute(&tag, "defer") || super::has_attribute(&tag, "async");
        if self.defer && !already_lazy {
            inserted.push_str(" defer");
        }
        if self.connection_aware && !super::has_attribute(&tag, "data-connection-aware") {
            inserted.push_str(r#" data-connection-aware="true""#);
        }

        match src_offset(&tag) {
            Some(at) if !inserted.is_empty() => {
                tag.insert_str(at, &inserted);
                tag
            }
            _ => tag,
        }
    }
}

/// Byte offset of the whitespace before `src=` in the opening tag.
fn src_offset(tag: &str) -> Option<usize> {
    let open_end = tag.find('>').unwrap_or(tag.len());
    SRC_ATTR.find(&tag[..open_end]).map(|m| m.start())
}

/// Remove `type=...` from the opening tag only.
fn strip_type_attribute(tag: &str) -> String {
    let open_end = tag.find('>').unwrap_or(tag.len());
    let (open, rest) = tag.split_at(open_end);
    format!("{}{rest}", TYPE_ATTR.replace(open, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConnectionHint;

    const TAG: &str = r#"<script src="https://example.com/app.js" id="app-js"></script>"#;

    fn mobile() -> ClientContext {
        ClientContext {
            device: DeviceClass::Mobile,
            ..ClientContext::default()
        }
    }

    fn no_features() -> FeaturesConfig {
        FeaturesConfig::none()
    }

    #[test]
    fn test_critical_never_deferred() {
        let desc = ResourceDescriptor::script("jquery", "https://example.com/jquery.js");
        let plan = plan_script(&desc, &mobile(), &FeaturesConfig::default());
        assert!(plan.high_priority);
        assert!(!plan.defer);

        let tag = plan.apply(r#"<script src="https://example.com/jquery.js"></script>"#);
        assert_eq!(
            tag,
            r#"<script fetchpriority="high" src="https://example.com/jquery.js"></script>"#
        );
        assert!(!tag.contains("defer"));
    }

    #[test]
    fn test_critical_ignores_slow_connection() {
        let desc = ResourceDescriptor::script("jquery-core", "/jquery.js");
        let client = ClientContext {
            connection: Some(ConnectionHint::Slow2g),
            ..mobile()
        };
        let plan = plan_script(&desc, &client, &no_features());
        assert!(!plan.defer);
    }

    #[test]
    fn test_mobile_non_critical_deferred() {
        let desc = ResourceDescriptor::script("app", "https://example.com/app.js");
        let tag = plan_script(&desc, &mobile(), &no_features()).apply(TAG);
        assert_eq!(
            tag,
            r#"<script defer data-connection-aware="true" src="https://example.com/app.js" id="app-js"></script>"#
        );
    }

    #[test]
    fn test_existing_async_not_deferred() {
        let desc = ResourceDescriptor::script("app", "/app.js");
        let tag = plan_script(&desc, &mobile(), &no_features())
            .apply(r#"<script async src="/app.js"></script>"#);
        assert!(!tag.contains(" defer"));
        assert!(tag.contains(r#"data-connection-aware="true""#));
    }

    #[test]
    fn test_existing_defer_not_duplicated() {
        let desc = ResourceDescriptor::script("app", "/app.js");
        let tag = plan_script(&desc, &mobile(), &no_features())
            .apply(r#"<script defer src="/app.js"></script>"#);
        assert_eq!(tag.matches("defer").count(), 1);
    }

    #[test]
    fn test_desktop_untouched_without_js_loading() {
        let desc = ResourceDescriptor::script("app", "/app.js");
        let plan = plan_script(&desc, &ClientContext::default(), &no_features());
        assert!(plan.is_noop());
        assert_eq!(plan.apply(TAG), TAG);
    }

    #[test]
    fn test_js_loading_defers_on_desktop() {
        let desc = ResourceDescriptor::script("app", "/app.js");
        let plan = plan_script(&desc, &ClientContext::default(), &FeaturesConfig::default());
        assert!(plan.defer);
    }

    #[test]
    fn test_slow_connection_forces_defer() {
        let desc = ResourceDescriptor::script("app", "/app.js");
        let client = ClientContext {
            connection: Some(ConnectionHint::G2),
            ..ClientContext::default()
        };
        let plan = plan_script(&desc, &client, &no_features());
        assert!(plan.defer);

        let fast = ClientContext {
            connection: Some(ConnectionHint::G4),
            ..ClientContext::default()
        };
        assert!(!plan_script(&desc, &fast, &no_features()).defer);
    }

    #[test]
    fn test_module_replaces_type() {
        let desc = ResourceDescriptor::script("bundle", "/js/app.module.js");
        let tag = plan_script(&desc, &mobile(), &no_features())
            .apply(r#"<script type='text/javascript' src="/js/app.module.js"></script>"#);
        assert_eq!(tag, r#"<script type="module" src="/js/app.module.js"></script>"#);
    }

    #[test]
    fn test_wrapped_src_deferred() {
        let desc = ResourceDescriptor::script("app", "/app.js");
        let plan = plan_script(&desc, &mobile(), &no_features());

        let tag = plan.apply("<script\n  src=\"/app.js\"></script>");
        assert_eq!(
            tag,
            "<script defer data-connection-aware=\"true\"\n  src=\"/app.js\"></script>"
        );

        let tag = plan.apply("<script type=\"text/javascript\"\tsrc=\"/app.js\"></script>");
        assert!(tag.contains(" defer"));
        assert!(tag.ends_with("\tsrc=\"/app.js\"></script>"));
    }

    #[test]
    fn test_data_src_is_not_src() {
        let desc = ResourceDescriptor::script("app", "");
        let tag = r#"<script data-src="/lazy.js">x()</script>"#;
        assert_eq!(plan_script(&desc, &mobile(), &no_features()).apply(tag), tag);
    }

    #[test]
    fn test_inline_script_untouched() {
        let desc = ResourceDescriptor::script("app", "");
        let inline = "<script>var a = 1;</script>";
        assert_eq!(plan_script(&desc, &mobile(), &no_features()).apply(inline), inline);
    }
}

//! Stylesheet loading plans.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::FeaturesConfig;
use crate::core::{ClientContext, DeviceClass, ResourceDescriptor};
use crate::utils::html::escape_attr;

/// `rel="stylesheet"` in either quote style, as a standalone attribute.
static REL_STYLESHEET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\s)rel\s*=\s*(?:"stylesheet"|'stylesheet')"#).expect("valid rel pattern")
});

const PRELOAD_SWAP: &str =
    r#"${1}rel="preload" as="style" onload="this.onload=null;this.rel='stylesheet'""#;

/// Attribute changes for one `<link rel=stylesheet>` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylePlan {
    /// Preload-then-swap target; `None` keeps the tag render-blocking.
    pub fallback_href: Option<String>,
}

/// Decide how a stylesheet loads.
pub fn plan_style(
    desc: &ResourceDescriptor,
    client: &ClientContext,
    features: &FeaturesConfig,
) -> StylePlan {
    let swap = !desc.critical
        && !client.admin
        && (client.device == DeviceClass::Mobile || features.critical_css);

    StylePlan {
        fallback_href: swap.then(|| desc.src.clone()),
    }
}

impl StylePlan {
    pub const fn is_deferred(&self) -> bool {
        self.fallback_href.is_some()
    }

    /// Rewrite the tag to preload-then-swap and append a `<noscript>` fallback.
    ///
    /// Tags without a `rel=stylesheet` (already rewritten, or `rel=preload`)
    /// are returned unchanged.
    pub fn apply(&self, tag: &str) -> String {
        let Some(href) = &self.fallback_href else {
            return tag.to_string();
        };
        if !REL_STYLESHEET.is_match(tag) {
            return tag.to_string();
        }

        let rewritten = REL_STYLESHEET.replace(tag, PRELOAD_SWAP);
        format!(
            r#"{rewritten}<noscript><link rel="stylesheet" href="{}"></noscript>"#,
            escape_attr(href)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mobile() -> ClientContext {
        ClientContext {
            device: DeviceClass::Mobile,
            ..ClientContext::default()
        }
    }

    #[test]
    fn test_mobile_style_preload_swap() {
        let desc = ResourceDescriptor::style("theme", "/css/theme.css");
        let plan = plan_style(&desc, &mobile(), &FeaturesConfig::none());
        let tag = plan.apply(r#"<link rel='stylesheet' id='theme-css' href='/css/theme.css' media='all' />"#);
        assert_eq!(
            tag,
            r#"<link rel="preload" as="style" onload="this.onload=null;this.rel='stylesheet'" id='theme-css' href='/css/theme.css' media='all' /><noscript><link rel="stylesheet" href="/css/theme.css"></noscript>"#
        );
    }

    #[test]
    fn test_double_quoted_rel_recognised() {
        let desc = ResourceDescriptor::style("theme", "/a.css");
        let plan = plan_style(&desc, &mobile(), &FeaturesConfig::none());
        let tag = plan.apply(r#"<link rel="stylesheet" href="/a.css">"#);
        assert!(tag.starts_with(r#"<link rel="preload" as="style""#));
        assert!(tag.ends_with("</noscript>"));
    }

    #[test]
    fn test_critical_styles_untouched() {
        for handle in ["critical-css", "wp-block-library"] {
            let desc = ResourceDescriptor::style(handle, "/a.css");
            let plan = plan_style(&desc, &mobile(), &FeaturesConfig::default());
            let tag = r#"<link rel="stylesheet" href="/a.css">"#;
            assert_eq!(plan.apply(tag), tag);
        }
    }

    #[test]
    fn test_critical_css_feature_defers_on_desktop() {
        let desc = ResourceDescriptor::style("theme", "/a.css");
        let plan = plan_style(&desc, &ClientContext::default(), &FeaturesConfig::default());
        assert!(plan.is_deferred());

        let plan = plan_style(&desc, &ClientContext::default(), &FeaturesConfig::none());
        assert!(!plan.is_deferred());
    }

    #[test]
    fn test_admin_never_deferred() {
        let desc = ResourceDescriptor::style("theme", "/a.css");
        let client = ClientContext {
            admin: true,
            ..mobile()
        };
        assert!(!plan_style(&desc, &client, &FeaturesConfig::default()).is_deferred());
    }

    #[test]
    fn test_preload_tag_not_rewritten_twice() {
        let desc = ResourceDescriptor::style("theme", "/a.css");
        let plan = plan_style(&desc, &mobile(), &FeaturesConfig::none());
        let once = plan.apply(r#"<link rel="stylesheet" href="/a.css">"#);
        let head = once.split("<noscript>").next().unwrap_or_default().to_string();
        assert_eq!(plan.apply(&head), head);
    }
}

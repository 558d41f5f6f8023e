//! `<img>` attribute decisions: priority, lazy loading, layout reservation
//! and device-specific `sizes`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::core::{ClientContext, DeviceClass, ImageDescriptor};
pub use crate::utils::html::Attributes;

/// Opening `<img>` / `<iframe>` tags inside post content.
static LAZY_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(img|iframe)\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("valid lazy pattern")
});

const MOBILE_SIZES: &str = "(max-width: 480px) 100vw, 480px";
const TABLET_SIZES: &str = "(max-width: 768px) 100vw, 768px";
const MOBILE_STYLE: &str = "max-width: 100vw; width: 100%; height: auto;";

/// Inputs for the "is this the LCP image" heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeroHint<'a> {
    /// Raw `class` attribute of the image.
    pub classes: &'a str,
    /// The request is for the site's front page.
    pub front_page: bool,
    /// The page has a featured image.
    pub has_thumbnail: bool,
}

impl HeroHint<'_> {
    /// Class mentions `hero` or `banner`, or a front page with a thumbnail.
    ///
    /// The class test is a substring match, so `hero-image` counts.
    pub fn is_hero(&self) -> bool {
        self.classes.contains("hero")
            || self.classes.contains("banner")
            || (self.front_page && self.has_thumbnail)
    }
}

/// Apply the image decision table to host-supplied attributes.
///
/// | hero | fetchpriority | loading | decoding |
/// |------|---------------|---------|----------|
/// | yes  | high          | eager   | sync     |
/// | no   | (unchanged)   | lazy    | async    |
pub fn rewrite(mut attrs: Attributes, image: &ImageDescriptor, client: &ClientContext) -> Attributes {
    if image.hero {
        attrs.set("fetchpriority", "high");
        attrs.set("loading", "eager");
        attrs.set("decoding", "sync");
    } else {
        attrs.set("loading", "lazy");
        attrs.set("decoding", "async");
    }

    match client.device {
        DeviceClass::Mobile => {
            attrs.set("sizes", MOBILE_SIZES);
            append_style(&mut attrs, MOBILE_STYLE);
        }
        DeviceClass::Tablet => attrs.set("sizes", TABLET_SIZES),
        DeviceClass::Desktop => {}
    }

    if image.has_dimensions() {
        attrs.set("width", image.width.to_string());
        attrs.set("height", image.height.to_string());
        append_style(
            &mut attrs,
            &format!("aspect-ratio: {}/{};", image.width, image.height),
        );
    }

    attrs
}

/// Append a declaration block to `style`, keeping what the host set.
fn append_style(attrs: &mut Attributes, declarations: &str) {
    let style = match attrs.get("style").map(str::trim) {
        Some(existing) if existing.contains(declarations) => return,
        Some(existing) if !existing.is_empty() => {
            let sep = if existing.ends_with(';') { " " } else { "; " };
            format!("{existing}{sep}{declarations}")
        }
        _ => declarations.to_string(),
    };
    attrs.set("style", style);
}

/// Add `loading="lazy"` to every `<img>` / `<iframe>` without a `loading`
/// attribute. Admin screens are left untouched.
pub fn lazy_load_content<'a>(html: &'a str, client: &ClientContext) -> Cow<'a, str> {
    if client.admin {
        return Cow::Borrowed(html);
    }

    LAZY_CANDIDATE.replace_all(html, |caps: &Captures<'_>| {
        let tag = &caps[0];
        let Some(open) = crate::utils::html::OpenTag::split(tag) else {
            return tag.to_string();
        };
        if open.attributes().contains("loading") {
            return tag.to_string();
        }
        let close = if open.self_closing { "/>" } else { ">" };
        let body = tag[..tag.len() - close.len()].trim_end();
        format!(r#"{body} loading="lazy"{close}"#)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32, hero: bool) -> ImageDescriptor {
        ImageDescriptor {
            width,
            height,
            hero,
            ..ImageDescriptor::default()
        }
    }

    fn client(device: DeviceClass) -> ClientContext {
        ClientContext {
            device,
            ..ClientContext::default()
        }
    }

    #[test]
    fn test_hero_is_eager() {
        let attrs = rewrite(Attributes::new(), &image(0, 0, true), &client(DeviceClass::Desktop));
        assert_eq!(attrs.get("loading"), Some("eager"));
        assert_eq!(attrs.get("fetchpriority"), Some("high"));
        assert_eq!(attrs.get("decoding"), Some("sync"));
    }

    #[test]
    fn test_non_hero_is_lazy() {
        let attrs = rewrite(Attributes::new(), &image(0, 0, false), &client(DeviceClass::Desktop));
        assert_eq!(attrs.get("loading"), Some("lazy"));
        assert_eq!(attrs.get("decoding"), Some("async"));
        assert_eq!(attrs.get("fetchpriority"), None);
    }

    #[test]
    fn test_dimensions_and_aspect_ratio() {
        let attrs = rewrite(Attributes::new(), &image(1920, 1080, false), &client(DeviceClass::Desktop));
        assert_eq!(attrs.get("width"), Some("1920"));
        assert_eq!(attrs.get("height"), Some("1080"));
        assert_eq!(attrs.get("style"), Some("aspect-ratio: 1920/1080;"));
    }

    #[test]
    fn test_unknown_dimensions_leave_host_values() {
        let attrs = Attributes::parse(r#"width="300" height="200""#);
        let attrs = rewrite(attrs, &image(0, 0, false), &client(DeviceClass::Desktop));
        assert_eq!(attrs.get("width"), Some("300"));
        assert_eq!(attrs.get("style"), None);
    }

    #[test]
    fn test_mobile_sizes_and_style() {
        let attrs = Attributes::parse(r#"style="border: 0""#);
        let attrs = rewrite(attrs, &image(800, 600, false), &client(DeviceClass::Mobile));
        assert_eq!(attrs.get("sizes"), Some(MOBILE_SIZES));
        assert_eq!(
            attrs.get("style"),
            Some("border: 0; max-width: 100vw; width: 100%; height: auto; aspect-ratio: 800/600;")
        );
    }

    #[test]
    fn test_tablet_sizes() {
        let attrs = rewrite(Attributes::new(), &image(0, 0, false), &client(DeviceClass::Tablet));
        assert_eq!(attrs.get("sizes"), Some(TABLET_SIZES));
        assert_eq!(attrs.get("style"), None);
    }

    #[test]
    fn test_rewrite_is_stable() {
        let once = rewrite(Attributes::new(), &image(10, 5, false), &client(DeviceClass::Mobile));
        let twice = rewrite(once.clone(), &image(10, 5, false), &client(DeviceClass::Mobile));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_hero_hint() {
        assert!(HeroHint { classes: "wp-image-5 hero", ..Default::default() }.is_hero());
        assert!(HeroHint { classes: "site-banner", ..Default::default() }.is_hero());
        assert!(!HeroHint { classes: "thumb", ..Default::default() }.is_hero());
        assert!(
            HeroHint {
                classes: "",
                front_page: true,
                has_thumbnail: true
            }
            .is_hero()
        );
        assert!(
            !HeroHint {
                classes: "",
                front_page: true,
                has_thumbnail: false
            }
            .is_hero()
        );
    }

    #[test]
    fn test_lazy_load_content() {
        let html = r#"<p><img src="a.jpg"><img src="b.jpg" loading="eager"/><iframe src="v.html"></iframe></p>"#;
        let out = lazy_load_content(html, &ClientContext::default());
        assert_eq!(
            out,
            r#"<p><img src="a.jpg" loading="lazy"><img src="b.jpg" loading="eager"/><iframe src="v.html" loading="lazy"></iframe></p>"#
        );
    }

    #[test]
    fn test_lazy_load_content_self_closing() {
        let out = lazy_load_content(r#"<img src="a.jpg" />"#, &ClientContext::default());
        assert_eq!(out, r#"<img src="a.jpg" loading="lazy"/>"#);
    }

    #[test]
    fn test_lazy_load_skips_admin() {
        let client = ClientContext {
            admin: true,
            ..ClientContext::default()
        };
        let html = r#"<img src="a.jpg">"#;
        assert_eq!(lazy_load_content(html, &client), html);
    }
}

//! `<img>` attribute rewriting and content lazy loading.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{Page, RenderContext, Stage};
use crate::core::ImageDescriptor;
use crate::debug;
use crate::image::{HeroHint, lazy_load_content, prefer_modern_sources, rewrite};
use crate::utils::html::OpenTag;

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("valid img pattern")
});

/// Class the host puts on a post's featured image.
const THUMBNAIL_CLASS: &str = "wp-post-image";

pub struct MediaStage;

impl Stage for MediaStage {
    fn name(&self) -> &'static str {
        "media"
    }

    fn run(&self, page: &mut Page, ctx: &RenderContext<'_>) {
        if ctx.client.admin {
            return;
        }

        let scan = PageScan {
            front_page: ctx.is_front_page(),
            has_thumbnail: page.html.contains(THUMBNAIL_CLASS),
        };
        let rewritten = IMG_TAG
            .replace_all(&page.html, |caps: &Captures<'_>| rewrite_img(&caps[0], ctx, scan))
            .into_owned();

        page.html = if ctx.config.features.lazy_loading {
            lazy_load_content(&rewritten, ctx.client).into_owned()
        } else {
            rewritten
        };
    }
}

/// Page-level facts feeding the hero heuristic.
#[derive(Clone, Copy)]
struct PageScan {
    front_page: bool,
    has_thumbnail: bool,
}

fn rewrite_img(tag: &str, ctx: &RenderContext<'_>, scan: PageScan) -> String {
    let Some(open) = OpenTag::split(tag) else {
        return tag.to_string();
    };
    let mut attrs = open.attributes();

    let hero = HeroHint {
        classes: attrs.get("class").unwrap_or_default(),
        front_page: scan.front_page,
        has_thumbnail: scan.has_thumbnail,
    }
    .is_hero();

    let local = attrs.get("src").and_then(|src| ctx.local_file(src));
    let (width, height) = declared_size(attrs.get("width"), attrs.get("height"))
        .or_else(|| local.as_deref().and_then(intrinsic_size))
        .unwrap_or_default();

    let image = ImageDescriptor {
        width,
        height,
        hero,
        ..ImageDescriptor::default()
    };

    if ctx.config.features.webp
        && let Some(srcset) = attrs.get("srcset")
    {
        let modern = prefer_modern_sources(srcset, |url| {
            ctx.local_file(url).is_some_and(|path| path.is_file())
        })
        .into_owned();
        attrs.set("srcset", modern);
    }

    let attrs = rewrite(attrs, &image, ctx.client);
    let close = if open.self_closing { " />" } else { ">" };
    format!("<{}{}{close}", open.name, attrs.render())
}

/// Both dimensions from the tag, when they are plain positive integers.
fn declared_size(width: Option<&str>, height: Option<&str>) -> Option<(u32, u32)> {
    let width = width?.trim().parse().ok().filter(|w| *w > 0)?;
    let height = height?.trim().parse().ok().filter(|h| *h > 0)?;
    Some((width, height))
}

/// Dimensions read from the file header.
fn intrinsic_size(path: &Path) -> Option<(u32, u32)> {
    match ::image::image_dimensions(path) {
        Ok(size) => Some(size),
        Err(e) => {
            debug!("media"; "no dimensions for {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use ::image::{ImageBuffer, Rgb};

    use super::*;
    use crate::core::{ClientContext, DeviceClass};
    use crate::pipeline::test_support;

    fn run(html: &str, ctx: &RenderContext<'_>) -> String {
        let mut page = Page::new(html);
        MediaStage.run(&mut page, ctx);
        page.html
    }

    #[test]
    fn test_hero_class() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_support::config(dir.path());
        let client = ClientContext::default();
        let ctx = RenderContext::new(&config, &client, "/post/");

        let out = run(r#"<img src="/a.jpg" class="hero-image"><img src="/b.jpg">"#, &ctx);
        assert_eq!(
            out,
            concat!(
                r#"<img src="/a.jpg" class="hero-image" fetchpriority="high" loading="eager" decoding="sync">"#,
                r#"<img src="/b.jpg" loading="lazy" decoding="async">"#
            )
        );
    }

    #[test]
    fn test_front_page_thumbnail_is_hero() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_support::config(dir.path());
        let client = ClientContext::default();

        let html = r#"<img src="/t.jpg" class="wp-post-image" />"#;
        let front = run(html, &RenderContext::new(&config, &client, "/"));
        assert!(front.contains(r#"fetchpriority="high""#));
        assert!(front.ends_with(" />"));

        let post = run(html, &RenderContext::new(&config, &client, "/post/"));
        assert!(!post.contains("fetchpriority"));
    }

    #[test]
    fn test_dimensions_from_tag_and_file() {
        let dir = tempfile::tempdir().unwrap();
        ImageBuffer::from_pixel(40, 30, Rgb([1u8, 2, 3]))
            .save(dir.path().join("photo.png"))
            .unwrap();
        let config = test_support::config(dir.path());
        let client = ClientContext::default();
        let ctx = RenderContext::new(&config, &client, "/post/");

        let out = run(r#"<img src="/photo.png">"#, &ctx);
        assert!(out.contains(r#"width="40" height="30""#));
        assert!(out.contains("aspect-ratio: 40/30;"));

        let out = run(r#"<img src="/missing.jpg" width="300" height="200">"#, &ctx);
        assert!(out.contains("aspect-ratio: 300/200;"));

        let out = run(r#"<img src="/missing.jpg" width="100%">"#, &ctx);
        assert!(!out.contains("aspect-ratio"));
    }

    #[test]
    fn test_srcset_prefers_existing_webp() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a-300.webp"), b"webp").unwrap();
        let config = test_support::config(dir.path());
        let client = ClientContext::default();
        let ctx = RenderContext::new(&config, &client, "/post/");

        let html = r#"<img src="/a.jpg" srcset="/a-300.jpg 300w, /a-600.jpg 600w">"#;
        let out = run(html, &ctx);
        assert!(out.contains(r#"srcset="/a-300.webp 300w, /a-600.jpg 600w""#));

        let mut config = config.clone();
        config.features.webp = false;
        let ctx = RenderContext::new(&config, &client, "/post/");
        assert!(run(html, &ctx).contains(r#"srcset="/a-300.jpg 300w, /a-600.jpg 600w""#));
    }

    #[test]
    fn test_iframes_lazy_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_support::config(dir.path());
        let client = ClientContext {
            device: DeviceClass::Tablet,
            ..ClientContext::default()
        };
        let html = r#"<iframe src="/v.html"></iframe>"#;

        let out = run(html, &RenderContext::new(&config, &client, "/"));
        assert_eq!(out, r#"<iframe src="/v.html" loading="lazy"></iframe>"#);

        config.features.lazy_loading = false;
        assert_eq!(run(html, &RenderContext::new(&config, &client, "/")), html);
    }

    #[test]
    fn test_admin_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_support::config(dir.path());
        let client = ClientContext {
            admin: true,
            ..ClientContext::default()
        };
        let html = r#"<img src="/a.jpg" class="hero">"#;
        assert_eq!(run(html, &RenderContext::new(&config, &client, "/")), html);
    }
}

//! `<script src>` and `<link rel=stylesheet>` rewriting.
//!
//! For each external resource: source URL rewrites (version query, `.min`
//! sibling, CDN), then the loading plan, then a preload `Link` header for
//! same-origin sources. Google Fonts stylesheets are merged first.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

use super::{Page, RenderContext, Stage};
use crate::core::{ResourceDescriptor, ResourceKind};
use crate::debug;
use crate::minify;
use crate::policy::{self, GOOGLE_FONTS_HOST};
use crate::utils::html::{OpenTag, escape_attr};

static SCRIPT_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<script\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("valid script pattern")
});

static LINK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("valid link pattern")
});

const FONTS_PRECONNECT: &str = r#"<link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>"#;

pub struct TagStage;

impl Stage for TagStage {
    fn name(&self) -> &'static str {
        "tags"
    }

    fn run(&self, page: &mut Page, ctx: &RenderContext<'_>) {
        if ctx.config.features.google_fonts
            && let Some(merged) = merge_font_links(&page.html)
        {
            page.html = merged;
        }

        let mut links = Vec::new();

        let styled = LINK_TAG
            .replace_all(&page.html, |caps: &Captures<'_>| rewrite_style(&caps[0], ctx, &mut links))
            .into_owned();
        page.html = SCRIPT_OPEN
            .replace_all(&styled, |caps: &Captures<'_>| rewrite_script(&caps[0], ctx, &mut links))
            .into_owned();
        page.links.extend(links);
    }
}

fn rewrite_style(tag: &str, ctx: &RenderContext<'_>, links: &mut Vec<String>) -> String {
    let Some(open) = OpenTag::split(tag) else {
        return tag.to_string();
    };
    let attrs = open.attributes();
    let is_stylesheet = attrs
        .get("rel")
        .is_some_and(|rel| rel.trim().eq_ignore_ascii_case("stylesheet"));
    let Some(href) = attrs.get("href").filter(|_| is_stylesheet) else {
        return tag.to_string();
    };

    let handle = handle_of(attrs.get("id"), "-css", href);
    let src = rewrite_source(href, ResourceKind::Style, ctx);
    let tag = replace_attr_value(tag, "href", href, &src);

    let desc = ResourceDescriptor::style(handle, src);
    collect_link(&desc, ctx, links);
    policy::plan_style(&desc, ctx.client, &ctx.config.features).apply(&tag)
}

fn rewrite_script(tag: &str, ctx: &RenderContext<'_>, links: &mut Vec<String>) -> String {
    let Some(open) = OpenTag::split(tag) else {
        return tag.to_string();
    };
    let attrs = open.attributes();
    let Some(src) = attrs.get("src").filter(|s| !s.is_empty()) else {
        return tag.to_string();
    };

    let handle = handle_of(attrs.get("id"), "-js", src);
    let new_src = rewrite_source(src, ResourceKind::Script, ctx);
    let tag = replace_attr_value(tag, "src", src, &new_src);

    let desc = ResourceDescriptor::script(handle, new_src);
    collect_link(&desc, ctx, links);
    policy::plan_script(&desc, ctx.client, &ctx.config.features).apply(&tag)
}

fn collect_link(desc: &ResourceDescriptor, ctx: &RenderContext<'_>, links: &mut Vec<String>) {
    if !ctx.config.features.resource_hints {
        return;
    }
    if let Some(site) = ctx.site()
        && let Some(link) = policy::preload_link_header(desc, site)
    {
        links.push(link);
    }
}

/// Version query removal, `.min` redirect and CDN origin, in that order.
fn rewrite_source(src: &str, kind: ResourceKind, ctx: &RenderContext<'_>) -> String {
    let features = &ctx.config.features;
    let mut out = src.to_string();

    if features.remove_query_strings {
        out = policy::strip_version_query(&out).into_owned();
    }

    if features.minification
        && let Some(file) = ctx.local_file(&out)
        && file.is_file()
    {
        match minify::ensure_minified(&file, ctx.config.minify.engine) {
            Ok(Some(_)) => out = minify::minified_src(&out).into_owned(),
            Ok(None) => {}
            Err(e) => debug!("minify"; "{} {}: {:#}", kind.as_str(), file.display(), e),
        }
    }

    if features.cdn
        && let Some(site) = ctx.site()
        && let Ok(cdn) = Url::parse(&ctx.config.cdn.url)
    {
        out = policy::rewrite_cdn(&out, site, &cdn).into_owned();
    }

    out
}

/// Host handle from a `<handle>-js` / `<handle>-css` id, else the file stem.
fn handle_of(id: Option<&str>, suffix: &str, src: &str) -> String {
    if let Some(handle) = id.and_then(|id| id.strip_suffix(suffix)) {
        return handle.to_string();
    }
    let path = src.split(['?', '#']).next().unwrap_or(src);
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = file.split_once('.').map_or(file, |(stem, _)| stem);
    stem.to_string()
}

/// Replace the value of attribute `name` in the opening tag, keeping quotes.
fn replace_attr_value(tag: &str, name: &str, old: &str, new: &str) -> String {
    if old == new || old.is_empty() {
        return tag.to_string();
    }
    let mut from = 0;
    while let Some(pos) = tag[from..].find(old).map(|p| p + from) {
        let before = tag[..pos].trim_end_matches(['"', '\'']).trim_end();
        if let Some(head) = before.strip_suffix('=') {
            let head = head.trim_end();
            let split = head.len().saturating_sub(name.len());
            let is_name = head.is_char_boundary(split)
                && head[split..].eq_ignore_ascii_case(name)
                && head[..split].ends_with(char::is_whitespace);
            if is_name {
                return format!("{}{}{}", &tag[..pos], new, &tag[pos + old.len()..]);
            }
        }
        from = pos + old.len();
    }
    tag.to_string()
}

/// Replace every Google Fonts stylesheet with one merged request.
fn merge_font_links(html: &str) -> Option<String> {
    let mut hrefs = Vec::new();
    let mut spans = Vec::new();

    for m in LINK_TAG.find_iter(html) {
        let Some(open) = OpenTag::split(m.as_str()) else {
            continue;
        };
        let attrs = open.attributes();
        let is_stylesheet = attrs
            .get("rel")
            .is_some_and(|rel| rel.trim().eq_ignore_ascii_case("stylesheet"));
        if let Some(href) = attrs.get("href")
            && is_stylesheet
            && href.contains(GOOGLE_FONTS_HOST)
        {
            hrefs.push(href.to_string());
            spans.push(m.range());
        }
    }

    let merged = policy::merge_google_fonts(hrefs.iter().map(String::as_str))?;
    let replacement = format!(
        r#"{FONTS_PRECONNECT}<link rel="stylesheet" id="google-fonts-combined-css" href="{}" media="all">"#,
        escape_attr(&merged)
    );

    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    for (i, span) in spans.iter().enumerate() {
        out.push_str(&html[copied..span.start]);
        if i == 0 {
            out.push_str(&replacement);
        }
        copied = span.end;
    }
    out.push_str(&html[copied..]);
    Some(out)
}

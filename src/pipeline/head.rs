//! `<head>` injection: meta tags, inline CSS, hints, font preloads and the
//! client runtime.
//!
//! Everything goes into one block placed right before `</head>`, in this
//! order:
//!
//! | Block                     | Condition                         |
//! |---------------------------|-----------------------------------|
//! | viewport / theme-color    | always (viewport only if missing) |
//! | web-app capable metas     | mobile and tablet                 |
//! | performance CSS           | always                            |
//! | device CSS                | mobile and tablet                 |
//! | critical CSS              | `critical_css`                    |
//! | dark mode CSS             | `dark_mode`                       |
//! | font-display + preload    | `font_optimization`               |
//! | dns-prefetch / preconnect | `resource_hints`                  |
//! | client runtime            | always                            |

use std::fs;
use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

use super::{Page, RenderContext, Stage};
use crate::core::DeviceClass;
use crate::debug;
use crate::embed::client::{CLIENT_JS, ClientVars, LOAD_BUDGET_MS};
use crate::embed::css::{
    CRITICAL_CSS, DARK_MODE_CSS, FONT_DISPLAY_CSS, PERFORMANCE_CSS, PerformanceVars, device_css,
};
use crate::embed::worker;
use crate::minify::minify_inline_css;
use crate::theme::{self, Theme};
use crate::utils::html::escape_attr;
use crate::utils::mime;

static HEAD_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("valid head pattern"));

static VIEWPORT_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*\bname\s*=\s*["']?viewport"#).expect("valid viewport pattern")
});

/// Marker of an already processed page.
const MARKER: &str = r#"id="performance-optimizations""#;

const VIEWPORT: &str = "width=device-width, initial-scale=1, minimum-scale=1, maximum-scale=5";
const THEME_COLOR: &str = "#2196F3";

/// Third-party origins most pages end up talking to.
const HINT_ORIGINS: &[&str] = &[
    "https://fonts.googleapis.com",
    "https://fonts.gstatic.com",
    "https://ajax.googleapis.com",
    "https://cdn.jsdelivr.net",
];

/// Font extensions worth a preload, best compression first.
const FONT_EXTENSIONS: &[&str] = &["woff2", "woff", "ttf"];

pub struct HeadStage;

impl Stage for HeadStage {
    fn name(&self) -> &'static str {
        "head"
    }

    fn run(&self, page: &mut Page, ctx: &RenderContext<'_>) {
        if page.html.contains(MARKER) {
            debug!("head"; "{} already optimized", ctx.path);
            return;
        }

        let block = head_block(&page.html, ctx);
        match HEAD_CLOSE.find(&page.html) {
            Some(close) => page.html.insert_str(close.start(), &block),
            None => page.html.insert_str(0, &block),
        }
    }
}

fn head_block(html: &str, ctx: &RenderContext<'_>) -> String {
    let features = &ctx.config.features;
    let device = ctx.client.device;
    let mut out = String::new();

    if !VIEWPORT_META.is_match(html) {
        out.push_str(&format!(r#"<meta name="viewport" content="{VIEWPORT}">"#));
    }
    out.push_str(&format!(r#"<meta name="theme-color" content="{THEME_COLOR}">"#));
    if device.is_handheld() {
        out.push_str(r#"<meta name="mobile-web-app-capable" content="yes">"#);
        out.push_str(r#"<meta name="apple-mobile-web-app-capable" content="yes">"#);
        out.push_str(
            r#"<meta name="apple-mobile-web-app-status-bar-style" content="black-translucent">"#,
        );
    }

    push_style(
        &mut out,
        "performance-optimizations",
        &PERFORMANCE_CSS.render(&PerformanceVars { device }),
    );
    if let Some(css) = device_css(device) {
        push_style(&mut out, "device-optimizations", css);
    }
    if features.critical_css {
        push_style(&mut out, "critical-css", CRITICAL_CSS);
    }
    if features.dark_mode {
        push_style(&mut out, "dark-mode-styles", DARK_MODE_CSS);
    }
    if features.font_optimization {
        push_style(&mut out, "font-display-optimization", FONT_DISPLAY_CSS);
        let fonts = ctx.config.site.fonts.as_path();
        for (href, mime) in font_preloads(ctx.config.document_root(), fonts) {
            out.push_str(&format!(
                r#"<link rel="preload" href="{}" as="font" type="{mime}" crossorigin>"#,
                escape_attr(&href)
            ));
        }
    }
    if features.resource_hints {
        for origin in HINT_ORIGINS {
            out.push_str(&format!(r#"<link rel="dns-prefetch" href="{origin}">"#));
            out.push_str(&format!(r#"<link rel="preconnect" href="{origin}" crossorigin>"#));
        }
    }

    let vars = client_vars(ctx);
    out.push_str(&format!(
        r#"<script id="speedway-runtime">{}{}</script>"#,
        vars.to_script(),
        CLIENT_JS.render(&())
    ));
    out
}

fn push_style(out: &mut String, id: &str, css: &str) {
    out.push_str(&format!(r#"<style id="{id}">{}</style>"#, minify_inline_css(css)));
}

fn client_vars(ctx: &RenderContext<'_>) -> ClientVars {
    let features = &ctx.config.features;
    let dark_mode = features.dark_mode;
    ClientVars {
        device: ctx.client.device.as_str(),
        connection_aware: features.js_loading || ctx.client.device == DeviceClass::Mobile,
        cls: true,
        dark_mode,
        theme: ctx.theme.filter(|_| dark_mode).map(Theme::as_str),
        theme_endpoint: dark_mode.then(|| theme::ENDPOINT.to_string()),
        nonce: ctx.nonce.clone().filter(|_| dark_mode),
        service_worker: features.service_worker.then(|| worker::PATH.to_string()),
        load_budget: LOAD_BUDGET_MS,
    }
}

/// `(href, mime)` for every preloadable font directly inside `fonts`.
///
/// A missing directory yields nothing.
fn font_preloads(root: &Path, fonts: &Path) -> Vec<(String, &'static str)> {
    let Ok(entries) = fs::read_dir(root.join(fonts)) else {
        return Vec::new();
    };

    let base: String = fonts
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(format!("/{}", part.to_string_lossy())),
            _ => None,
        })
        .collect();

    let mut found: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let ext = path.extension()?.to_str()?.to_ascii_lowercase();
            let rank = FONT_EXTENSIONS.iter().position(|e| *e == ext)?;
            let name = path.file_name()?.to_str()?.to_string();
            Some((rank, name, mime::from_path(&path)))
        })
        .collect();
    found.sort();

    found
        .into_iter()
        .map(|(_, name, mime)| (format!("{base}/{name}"), mime))
        .collect()
}

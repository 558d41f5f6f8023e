//! Page rewriting pipeline.
//!
//! An explicit, ordered list of stages run over every HTML response. Each
//! stage reads the request context and feature flags and rewrites the page
//! in place; none of them keeps state between requests.
//!
//! # Standard order
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │   tags   │ → │  media   │ → │   head   │
//! └──────────┘   └──────────┘   └──────────┘
//!  script/link    img/iframe     meta, css,
//!  plans, URLs    attributes     hints, runtime
//! ```
//!
//! `head` runs last so the blocks it injects are never re-planned.

pub mod head;
mod media;
mod tags;

use std::borrow::Cow;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::Config;
use crate::core::ClientContext;
use crate::debug;
use crate::policy;
use crate::theme::Theme;
use crate::utils::path::join_url_path;

pub use head::HeadStage;
pub use media::MediaStage;
pub use tags::TagStage;

// =============================================================================
// Types
// =============================================================================

/// Everything a stage may read while rewriting one page.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub config: &'a Config,
    pub client: &'a ClientContext,
    /// URL path of the page being rendered.
    pub path: &'a str,
    /// Anti-forgery token for the theme save action.
    pub nonce: Option<String>,
    /// Stored preference of the logged-in user.
    pub theme: Option<Theme>,
    site: Option<Url>,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a Config, client: &'a ClientContext, path: &'a str) -> Self {
        Self {
            config,
            client,
            path,
            nonce: None,
            theme: None,
            site: config.site.origin(),
        }
    }

    pub fn with_theme(mut self, nonce: Option<String>, theme: Option<Theme>) -> Self {
        self.nonce = nonce;
        self.theme = theme;
        self
    }

    pub fn site(&self) -> Option<&Url> {
        self.site.as_ref()
    }

    pub fn is_front_page(&self) -> bool {
        let trim = |p: &str| p.trim_end_matches("index.html").trim_end_matches('/').to_string();
        trim(self.path) == trim(&self.config.site.front_page)
    }

    /// File under the document root for a same-origin `src`.
    pub fn local_file(&self, src: &str) -> Option<PathBuf> {
        let site = self.site()?;
        let url = policy::resolve(src, site)?;
        if url.origin() != site.origin() {
            return None;
        }
        let path: Cow<'_, str> = percent_decode_str(url.path()).decode_utf8().ok()?;
        join_url_path(self.config.document_root(), &path)
    }
}

/// A page moving through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub html: String,
    /// `Link` header values collected on the way.
    pub links: Vec<String>,
}

impl Page {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            links: Vec::new(),
        }
    }
}

/// One rewriting step.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, page: &mut Page, ctx: &RenderContext<'_>);
}

// =============================================================================
// Pipeline
// =============================================================================

#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// `tags`, `media`, `head`.
    pub fn standard() -> Self {
        Self::new().with(TagStage).with(MediaStage).with(HeadStage)
    }

    pub fn with(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|s| s.name())
    }

    pub fn run(&self, html: impl Into<String>, ctx: &RenderContext<'_>) -> Page {
        let mut page = Page::new(html);
        for stage in &self.stages {
            stage.run(&mut page, ctx);
        }
        debug!(
            "pipeline";
            "{} ({}, {} link header(s))",
            ctx.path,
            ctx.client.device,
            page.links.len()
        );
        page
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::Config;

    /// Config with a fixed origin and a temp document root.
    pub fn config(root: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.site.url = "https://example.com".into();
        config.site.root = root.to_path_buf();
        config
    }
}

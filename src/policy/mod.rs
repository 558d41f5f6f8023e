//! Loading strategy for scripts and stylesheets.
//!
//! A plan is computed from the resource, the client and the feature flags,
//! then rendered into the host-generated tag:
//!
//! ```ignore
//! let plan = plan_script(&desc, &client, &features);
//! let tag = plan.apply(r#"<script src="/app.js"></script>"#);
//! ```
//!
//! Rule order for scripts, first one that applies decides:
//!
//! | Rule                | Effect                                     |
//! |---------------------|--------------------------------------------|
//! | critical allowlist  | `fetchpriority="high"`, never deferred     |
//! | `.module.js` source | `type="module"`                            |
//! | mobile / js_loading | `defer` + `data-connection-aware="true"`   |
//! | `ECT: 2g/slow-2g`   | `defer`, regardless of device              |
//!
//! Stylesheets are either left alone (critical) or rewritten to
//! preload-then-swap with a `<noscript>` fallback.

mod script;
mod source;
mod style;

pub use script::{ScriptPlan, plan_script};
pub use source::{
    GOOGLE_FONTS_HOST, merge_google_fonts, preload_link_header, resolve, rewrite_cdn,
    strip_version_query,
};
pub use style::{StylePlan, plan_style};

/// Whether the opening tag of `tag` carries the attribute `name`.
fn has_attribute(tag: &str, name: &str) -> bool {
    crate::utils::html::OpenTag::split(tag).is_some_and(|open| open.attributes().contains(name))
}

//! Embedded browser resources.
//!
//! # Modules
//!
//! - `css` - inline `<style>` blocks (performance, device, critical, dark mode)
//! - `client` - the client runtime and its `window.speedway` configuration
//! - `worker` - the service worker served at [`worker::PATH`]
//!
//! # Usage
//!
//! ```ignore
//! use embed::css::PERFORMANCE_CSS;
//! use embed::client::{CLIENT_JS, ClientVars};
//!
//! let css = PERFORMANCE_CSS.render(&PerformanceVars { device: DeviceClass::Mobile });
//! let js = CLIENT_JS.render(&());
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod css {
    use super::{Template, TemplateVars};
    use crate::core::DeviceClass;

    /// Variables for performance.css.
    pub struct PerformanceVars {
        pub device: DeviceClass,
    }

    impl TemplateVars for PerformanceVars {
        fn apply(&self, content: &str) -> String {
            let width = match self.device {
                DeviceClass::Mobile => "100vw",
                DeviceClass::Tablet | DeviceClass::Desktop => "1200px",
            };
            content.replace("__CONTENT_WIDTH__", width)
        }
    }

    /// Layout stability rules for every page.
    pub const PERFORMANCE_CSS: Template<PerformanceVars> =
        Template::new(include_str!("css/performance.css"));

    pub const MOBILE_CSS: &str = include_str!("css/mobile.css");
    pub const TABLET_CSS: &str = include_str!("css/tablet.css");
    pub const CRITICAL_CSS: &str = include_str!("css/critical.css");
    pub const DARK_MODE_CSS: &str = include_str!("css/dark-mode.css");
    pub const FONT_DISPLAY_CSS: &str = include_str!("css/font-display.css");

    /// Touch and typography rules, `None` on desktop.
    pub const fn device_css(device: DeviceClass) -> Option<&'static str> {
        match device {
            DeviceClass::Mobile => Some(MOBILE_CSS),
            DeviceClass::Tablet => Some(TABLET_CSS),
            DeviceClass::Desktop => None,
        }
    }
}

pub mod client {
    use serde::Serialize;

    use super::Template;

    /// Page-load warning threshold in milliseconds.
    pub const LOAD_BUDGET_MS: u32 = 3000;

    /// The client runtime; configured entirely through `window.speedway`.
    pub const CLIENT_JS: Template<()> = Template::new(include_str!("client.js"));

    /// `window.speedway`, serialized as JSON ahead of [`CLIENT_JS`].
    #[derive(Debug, Clone, Default, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ClientVars {
        pub device: &'static str,
        /// Re-apply `defer` from `navigator.connection`.
        pub connection_aware: bool,
        /// Layout-shift helpers (space reservation, aspect ratios).
        pub cls: bool,
        pub dark_mode: bool,
        /// Server-side preference of a logged-in user.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub theme: Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub theme_endpoint: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub nonce: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub service_worker: Option<String>,
        pub load_budget: u32,
    }

    impl ClientVars {
        /// `window.speedway = {...};` safe to place inside `<script>`.
        pub fn to_script(&self) -> String {
            let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".into());
            format!("window.speedway={};", json.replace("</", "<\\/"))
        }
    }
}

pub mod worker {
    use super::{Template, TemplateVars};

    /// URL the worker is registered and served under.
    pub const PATH: &str = "/speedway-sw.js";

    /// Cache name; bump to invalidate every client cache.
    pub const CACHE_NAME: &str = "speedway-v1";

    pub struct WorkerVars {
        /// URLs fetched into the cache on install.
        pub precache: Vec<String>,
    }

    impl TemplateVars for WorkerVars {
        fn apply(&self, content: &str) -> String {
            let precache = serde_json::to_string(&self.precache).unwrap_or_else(|_| "[]".into());
            content
                .replace("__CACHE_NAME__", CACHE_NAME)
                .replace("__PRECACHE__", &precache)
        }
    }

    pub const SERVICE_WORKER_JS: Template<WorkerVars> =
        Template::new(include_str!("sw.js"));
}

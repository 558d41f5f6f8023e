//! Host server.
//!
//! Serves the document root and plays the CMS around the rule set: every
//! HTML response runs through [`Pipeline::standard`], gets the caching and
//! `Link` headers, and the theme save endpoint and service worker are
//! answered from memory.
//!
//! ```text
//! request ─┬─ POST /speedway/theme ──→ save_theme ──→ JSON
//!          ├─ GET  /speedway-sw.js ───→ embedded worker
//!          └─ GET  <path> ──→ file ──┬─ html ──→ pipeline + headers
//!                                    └─ other ─→ bytes (Range aware)
//! ```

mod lifecycle;
mod path;
mod response;

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Method, Request};

use crate::config::{Config, cfg};
use crate::core::{ClientContext, is_shutdown};
use crate::device::client_from_headers;
use crate::embed::worker::{self, SERVICE_WORKER_JS, WorkerVars};
use crate::headers::{HeaderOptions, HeaderSet, LINK, response_headers};
use crate::pipeline::{Pipeline, RenderContext};
use crate::theme::{self, FileStore, NonceIssuer, PreferenceStore, SAVE_ACTION, SaveRequest};
use crate::utils::mime;
use crate::{debug, log};

pub use path::{resolve_path, url_path};

/// Largest accepted theme form body.
const MAX_FORM_BYTES: u64 = 16 * 1024;

const JSON_SUCCESS: &str = r#"{"success":true}"#;
const JSON_FAILURE: &str = r#"{"success":false}"#;

/// Long-lived request state shared by every worker.
pub struct Host {
    config: Arc<Config>,
    pipeline: Pipeline,
    store: Box<dyn PreferenceStore>,
    nonces: NonceIssuer,
}

impl Host {
    /// Host backed by the `[theme].store` file.
    pub fn open(config: Arc<Config>) -> Result<Self> {
        let store = FileStore::open(&config.theme.store)
            .with_context(|| format!("failed to open {}", config.theme.store.display()))?;
        Ok(Self::with_store(config, Box::new(store)))
    }

    pub fn with_store(config: Arc<Config>, store: Box<dyn PreferenceStore>) -> Self {
        let nonces = NonceIssuer::new(&config.theme.secret);
        Self {
            config,
            pipeline: Pipeline::standard(),
            store,
            nonces,
        }
    }

    /// Client context for a request path and its headers.
    pub fn client<'a, I>(&self, path: &str, headers: I) -> ClientContext
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        client_from_headers(headers, false, self.config.serve.is_admin_path(path))
    }

    /// Rewritten page body and the headers to send with it.
    pub fn render_page(&self, html: String, path: &str, client: &ClientContext) -> (String, HeaderSet) {
        if client.admin {
            return (html, HeaderSet::new());
        }

        let features = &self.config.features;
        let (nonce, theme) = if features.dark_mode {
            (
                Some(self.nonces.issue(SAVE_ACTION, client.user)),
                client.user.and_then(|user| self.store.get(user)),
            )
        } else {
            (None, None)
        };

        let ctx = RenderContext::new(&self.config, client, path).with_theme(nonce, theme);
        let page = self.pipeline.run(html, &ctx);

        let mut headers = response_headers(client, HeaderOptions::from(self.config.as_ref()));
        headers.extend(page.links.into_iter().map(|link| (LINK, link)));
        (page.html, headers)
    }

    /// Status and JSON body for a theme save form.
    pub fn save_theme(&self, body: &[u8], client: &ClientContext) -> (u16, &'static str) {
        let request = SaveRequest::from_form(body);
        match theme::save_theme(self.store.as_ref(), &self.nonces, &request, client) {
            Ok(outcome) => {
                debug!("theme"; "{:?}", outcome);
                (200, JSON_SUCCESS)
            }
            Err(e) if e.is_forbidden() => {
                debug!("theme"; "rejected: {}", e);
                (403, JSON_FAILURE)
            }
            Err(e) => {
                log!("theme"; "save failed: {}", e);
                (500, JSON_FAILURE)
            }
        }
    }

    fn handle(&self, mut request: Request) -> Result<()> {
        if is_shutdown() {
            return response::respond_unavailable(request);
        }

        let path = url_path(request.url()).into_owned();
        let client = {
            let headers = request
                .headers()
                .iter()
                .map(|h| (h.field.as_str().as_str(), h.value.as_str()));
            self.client(&path, headers)
        };

        if path == theme::ENDPOINT && self.config.features.dark_mode {
            if request.method() != &Method::Post {
                return response::respond_method_not_allowed(request);
            }
            let mut body = Vec::new();
            request
                .as_reader()
                .take(MAX_FORM_BYTES)
                .read_to_end(&mut body)
                .context("failed to read theme form")?;
            let (status, json) = self.save_theme(&body, &client);
            return response::respond_json(request, status, json);
        }

        if !matches!(request.method(), Method::Get | Method::Head) {
            return response::respond_method_not_allowed(request);
        }

        if path == worker::PATH && self.config.features.service_worker {
            let script = SERVICE_WORKER_JS.render(&WorkerVars {
                precache: vec!["/".to_string()],
            });
            return response::respond_script(request, script);
        }

        let root = self.config.document_root();
        let Some(file) = resolve_path(&path, root) else {
            return response::respond_not_found(request, root);
        };

        if !mime::is_html(mime::from_path(&file)) {
            return response::respond_file(request, &file);
        }

        let bytes = std::fs::read(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        match String::from_utf8(bytes) {
            Ok(html) => {
                let (body, headers) = self.render_page(html, &path, &client);
                response::respond_page(request, body, &headers)
            }
            Err(_) => {
                debug!("serve"; "{} is not utf-8, sent as is", file.display());
                response::respond_file(request, &file)
            }
        }
    }
}

/// Bind and serve until Ctrl+C.
pub fn serve() -> Result<()> {
    let config = cfg();
    let host = Arc::new(Host::open(Arc::clone(&config))?);
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;

    log!("serve"; "http://{}", addr);
    log!("serve"; "document root {}", config.document_root().display());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.serve.threads)
        .build()
        .context("failed to create request pool")?;

    for request in server.incoming_requests() {
        let host = Arc::clone(&host);
        pool.spawn(move || {
            if let Err(e) = host.handle(request) {
                log!("serve"; "request error: {:#}", e);
            }
        });
    }
    Ok(())
}

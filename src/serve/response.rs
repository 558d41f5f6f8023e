//! HTTP response helpers.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::debug;
use crate::headers::HeaderSet;
use crate::utils::mime::{self, types};

/// Respond with a static file, honouring a single `Range`.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    if let Some(range) = range_header(&request) {
        return respond_range(request, path, content_type, &range);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body, &HeaderSet::new())
}

/// Respond with a rewritten HTML page and its policy headers.
pub fn respond_page(request: Request, body: String, headers: &HeaderSet) -> Result<()> {
    if is_head_request(&request) {
        let response = with_headers(Response::empty(StatusCode(200)), types::HTML, headers);
        return request.respond(response).map_err(Into::into);
    }
    send_body(request, 200, types::HTML, body.into_bytes(), headers)
}

pub fn respond_json(request: Request, status: u16, body: &'static str) -> Result<()> {
    send_body(request, status, types::JSON, body.as_bytes().to_vec(), &HeaderSet::new())
}

pub fn respond_script(request: Request, body: String) -> Result<()> {
    send_body(request, 200, types::JAVASCRIPT, body.into_bytes(), &HeaderSet::new())
}

/// Respond with the root's `404.html` if present, plain text otherwise.
pub fn respond_not_found(request: Request, root: &Path) -> Result<()> {
    let custom = root.join("404.html");
    match fs::read(&custom) {
        Ok(body) if !is_head_request(&request) => {
            send_body(request, 404, types::HTML, body, &HeaderSet::new())
        }
        Ok(_) => send_head(request, 404, types::HTML),
        Err(_) => send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec(), &HeaderSet::new()),
    }
}

pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    send_body(
        request,
        405,
        types::PLAIN,
        b"405 Method Not Allowed".to_vec(),
        &HeaderSet::new(),
    )
}

/// Respond with 503 while shutting down.
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(
        request,
        503,
        types::PLAIN,
        b"503 Service Unavailable".to_vec(),
        &HeaderSet::new(),
    )
}

// ============================================================================
// Range
// ============================================================================

fn respond_range(request: Request, path: &Path, content_type: &'static str, range: &str) -> Result<()> {
    let file_size = fs::metadata(path)?.len();
    let ranges = range.strip_prefix("bytes=").unwrap_or(range);

    let Some((start, end)) = parse_range(ranges, file_size) else {
        let mut headers = HeaderSet::new();
        headers.append("Content-Range", format!("bytes */{file_size}"));
        return send_body(request, 416, types::PLAIN, Vec::new(), &headers);
    };

    let length = end - start + 1;
    let mut file = fs::File::open(path)?;
    file.seek(SeekFrom::Start(start))?;

    let mut headers = HeaderSet::new();
    headers.append("Content-Range", format!("bytes {start}-{end}/{file_size}"));
    headers.append("Accept-Ranges", "bytes");

    let response = Response::new(
        StatusCode(206),
        Vec::new(),
        file.take(length),
        usize::try_from(length).ok(),
        None,
    );
    request.respond(with_headers(response, content_type, &headers))?;
    Ok(())
}

/// Parse `start-end`, `start-` or `-suffix` into an inclusive byte range.
///
/// `None` when the range cannot be satisfied.
fn parse_range(ranges: &str, file_size: u64) -> Option<(u64, u64)> {
    let last = file_size.checked_sub(1)?;
    let (start, end) = ranges.trim().split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    let (start, end) = match (start.is_empty(), end.is_empty()) {
        (false, false) => (start.parse().ok()?, end.parse::<u64>().ok()?.min(last)),
        (false, true) => (start.parse().ok()?, last),
        (true, false) => {
            let suffix: u64 = end.parse().ok()?;
            (file_size.saturating_sub(suffix), last)
        }
        (true, true) => return None,
    };

    (start <= end).then_some((start, end))
}

fn range_header(request: &Request) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv("range"))
        .map(|h| h.value.to_string())
}

// ============================================================================
// Senders
// ============================================================================

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = with_headers(Response::empty(StatusCode(status)), content_type, &HeaderSet::new());
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    headers: &HeaderSet,
) -> Result<()> {
    let response = Response::from_data(body).with_status_code(StatusCode(status));
    request.respond(with_headers(response, content_type, headers))?;
    Ok(())
}

fn with_headers<R: Read>(
    mut response: Response<R>,
    content_type: &'static str,
    headers: &HeaderSet,
) -> Response<R> {
    let all = std::iter::once(("Content-Type", content_type)).chain(headers.iter());
    for (name, value) in all {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => response.add_header(header),
            Err(()) => debug!("serve"; "dropping invalid header {}", name),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("0-499", 1000), Some((0, 499)));
        assert_eq!(parse_range("500-", 1000), Some((500, 999)));
        assert_eq!(parse_range("-100", 1000), Some((900, 999)));
        assert_eq!(parse_range("900-5000", 1000), Some((900, 999)));
    }

    #[test]
    fn test_unsatisfiable_range() {
        assert_eq!(parse_range("0-10", 0), None);
        assert_eq!(parse_range("600-500", 1000), None);
        assert_eq!(parse_range("1000-", 1000), None);
        assert_eq!(parse_range("-", 1000), None);
        assert_eq!(parse_range("abc", 1000), None);
    }
}

//! HTTP response handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::content::maybe_inject_reload;
use crate::bundle::Artifact;
use crate::embed::serve::{RELOAD_JS, ReloadVars};
use crate::utils::mime::{self, types};

/// Respond with the current bundle.
///
/// Clients revalidate every time (`no-cache`); a matching `If-None-Match`
/// gets a bodyless 304.
pub fn respond_bundle(request: Request, artifact: &Artifact) -> Result<()> {
    let etag = artifact.etag();
    let version = artifact.version().to_string();
    let headers = [
        make_header("Content-Type", types::JAVASCRIPT)?,
        make_header("Cache-Control", "no-cache")?,
        make_header("ETag", &etag)?,
        make_header("X-Swarm-Version", &version)?,
    ];

    if header_value(&request, "If-None-Match").is_some_and(|tags| etag_matches(&tags, &etag)) {
        return send_empty(request, 304, headers);
    }

    if is_head_request(&request) {
        return send_empty(request, 200, headers);
    }

    let mut response = Response::from_data(artifact.text().as_bytes().to_vec());
    for header in headers {
        response.add_header(header);
    }
    request.respond(response)?;
    Ok(())
}

/// Respond with the reload client, bound to the websocket port.
pub fn respond_reload_js(request: Request, ws_port: u16) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, types::JAVASCRIPT);
    }
    let body = RELOAD_JS.render(&ReloadVars { ws_port });
    send_body(request, 200, types::JAVASCRIPT, body.into_bytes())
}

/// Respond with a static file, injecting the reload script into HTML.
pub fn respond_file(request: Request, path: &Path, reload: bool) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let body = maybe_inject_reload(body, content_type, reload);

    send_body(request, 200, content_type, body)
}

pub fn respond_not_found(request: Request) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 404, types::PLAIN);
    }
    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", types::PLAIN)?)
        .with_header(make_header("Allow", "GET, HEAD")?);
    request.respond(response)?;
    Ok(())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, types::PLAIN, b"503 Service Unavailable".to_vec())
}

pub fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn send_empty<const N: usize>(request: Request, status: u16, headers: [Header; N]) -> Result<()> {
    let mut response = Response::empty(StatusCode(status));
    for header in headers {
        response.add_header(header);
    }
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow::anyhow!("invalid header {key}: {value}"))
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.to_string())
}

/// `If-None-Match` carries a comma separated list of tags, or `*`.
fn etag_matches(header: &str, etag: &str) -> bool {
    header.split(',').map(str::trim).any(|tag| {
        tag == "*" || tag == etag || tag.strip_prefix("W/").is_some_and(|weak| weak == etag)
    })
}

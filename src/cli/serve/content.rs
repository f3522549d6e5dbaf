//! Reload script injection for served HTML.

use crate::embed::serve::reload_script_tag;
use crate::utils::mime;

/// Inject the reload script if content is HTML and reload is enabled
pub fn maybe_inject_reload(body: Vec<u8>, content_type: &str, reload: bool) -> Vec<u8> {
    if reload && mime::is_html(content_type) {
        inject_reload_script(&body)
    } else {
        body
    }
}

/// Inject the reload script before the last `</body>` tag
fn inject_reload_script(content: &[u8]) -> Vec<u8> {
    let script = reload_script_tag();
    let script_bytes = script.as_bytes();

    const PATTERN: &[u8] = b"</body>";

    let mut result = Vec::with_capacity(content.len() + script_bytes.len());
    match content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        Some(pos) => {
            result.extend_from_slice(&content[..pos]);
            result.extend_from_slice(script_bytes);
            result.extend_from_slice(&content[pos..]);
        }
        // No </body>, append (browsers handle this gracefully)
        None => {
            result.extend_from_slice(content);
            result.extend_from_slice(script_bytes);
        }
    }
    result
}

//! Embedded static resources for the dev server.
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{RELOAD_JS, ReloadVars};
//!
//! let js = RELOAD_JS.render(&ReloadVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL the reload client is served from.
    pub const RELOAD_JS_URL: &str = "/__swarm/reload.js";

    /// Variables for reload.js.
    pub struct ReloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for ReloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__SWARM_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Browser client that reloads the page when a new bundle is published.
    pub const RELOAD_JS: Template<ReloadVars> = Template::new(include_str!("serve/reload.js"));

    /// `<script>` tag referencing [`RELOAD_JS_URL`].
    pub fn reload_script_tag() -> String {
        format!(r#"<script src="{RELOAD_JS_URL}"></script>"#)
    }
}

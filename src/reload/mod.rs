//! Hot reload for `swarm serve`.
//!
//! A websocket hub that tells connected browsers to reload after each
//! published bundle. The browser side lives in `embed/serve/reload.js`.

mod message;
mod server;

pub use message::ReloadMessage;
pub use server::{MAX_PORT_RETRIES, ReloadHub};

//! Process-wide state shared by the CLI and the dev server.

mod state;

pub use state::{is_shutdown, register_server, request_shutdown, setup_shutdown_handler};

//! Configuration section definitions.
//!
//! Each module corresponds to a section in `swarm.toml`:
//!
//! | Module  | TOML Section | Purpose                              |
//! |---------|--------------|--------------------------------------|
//! | `build` | `[build]`    | Workspace root, entry, output        |
//! | `serve` | `[serve]`    | Development server and hot reload    |
//! | `watch` | `[watch]`    | Debounce timing and change filtering |

mod build;
mod serve;
mod watch;

pub use build::{BuildConfig, DEFAULT_ENTRY};
pub use serve::ServeConfig;
pub use watch::WatchConfig;

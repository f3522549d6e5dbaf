//! swarm - module bundler and live-reload dev server.

fn main() -> anyhow::Result<()> {
    swarm::cli::run()
}

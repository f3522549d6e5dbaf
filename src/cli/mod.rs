//! Command-line interface module.

mod args;
pub mod build;
pub mod serve;

pub use args::{Cli, Commands, TargetArgs};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};

use crate::config::SwarmConfig;

/// Parse arguments, load configuration and run the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    crate::logger::set_verbose(cli.verbose);

    crate::core::setup_shutdown_handler()?;

    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    let mut config =
        SwarmConfig::load(cli.config.as_deref(), &cwd).context("failed to load configuration")?;
    apply_overrides(&mut config, &cli.command, &cwd);
    config.validate().context("invalid command-line arguments")?;

    match &cli.command {
        Commands::Serve { .. } => serve::serve(&config),
        Commands::Build { output, .. } => {
            let output = output.as_deref().map(|p| relative_to(p, &cwd));
            build::build(&config, output.as_deref())
        }
    }
}

/// Command-line flags win over `swarm.toml`. Paths given on the command line
/// are relative to the working directory, not the config file.
fn apply_overrides(config: &mut SwarmConfig, command: &Commands, cwd: &Path) {
    let target = match command {
        Commands::Serve {
            target,
            interface,
            port,
            no_reload,
        } => {
            if let Some(interface) = interface {
                config.serve.interface = *interface;
            }
            if let Some(port) = port {
                config.serve.port = *port;
            }
            if *no_reload {
                config.serve.reload = false;
            }
            target
        }
        Commands::Build { target, .. } => target,
    };

    if let Some(root) = &target.root {
        config.build.root = relative_to(root, cwd);
    }
    if let Some(entry) = &target.entry {
        config.build.entry = entry.clone();
    }
}

fn relative_to(path: &Path, cwd: &Path) -> PathBuf {
    if path == Path::new("-") || path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_serve_overrides() {
        let mut config = test_parse_config("[build]\nentry = \"from-file\"\n[serve]\nport = 1000");
        config.base_dir = PathBuf::from("/project");

        let command = parse(&["swarm", "serve", "-r", "web", "-p", "2000", "--no-reload"]);
        apply_overrides(&mut config, &command, Path::new("/cwd"));

        assert_eq!(config.root_path(), PathBuf::from("/cwd/web"));
        assert_eq!(config.build.entry, "from-file");
        assert_eq!(config.serve.port, 2000);
        assert!(!config.serve.reload);
    }

    #[test]
    fn test_build_overrides_keep_file_values() {
        let mut config = test_parse_config("[build]\nroot = \"site\"\n[serve]\nport = 1000");
        config.base_dir = PathBuf::from("/project");

        let command = parse(&["swarm", "build", "-e", "main"]);
        apply_overrides(&mut config, &command, Path::new("/cwd"));

        assert_eq!(config.root_path(), PathBuf::from("/project/site"));
        assert_eq!(config.build.entry, "main");
        assert_eq!(config.serve.port, 1000);
    }

    #[test]
    fn test_relative_to() {
        let cwd = Path::new("/cwd");
        assert_eq!(relative_to(Path::new("-"), cwd), PathBuf::from("-"));
        assert_eq!(relative_to(Path::new("/abs.js"), cwd), PathBuf::from("/abs.js"));
        assert_eq!(relative_to(Path::new("out.js"), cwd), PathBuf::from("/cwd/out.js"));
    }
}

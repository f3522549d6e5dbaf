//! One-shot bundling for `swarm build`.

use std::fs;
use std::io::{Write, stdout};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::bundle::Bundler;
use crate::config::SwarmConfig;
use crate::graph;
use crate::log;
use crate::workspace::Workspace;

/// Build the configured entry once.
///
/// Writes to `output` (or the configured output). Without either, or with
/// `-`, the bundle goes to stdout and nothing else is printed there.
pub fn build(config: &SwarmConfig, output: Option<&Path>) -> Result<()> {
    let start = Instant::now();

    let root = config.root_path();
    let workspace = Workspace::with_extensions(&root, config.build.extensions.clone())
        .with_context(|| format!("invalid workspace root {}", root.display()))?;
    let graph = graph::build(&workspace, &config.build.entry)
        .with_context(|| format!("failed to build module graph for `{}`", config.build.entry))?;
    let text = Bundler::bundle(&graph).context("failed to bundle")?;

    let target = output.map(Path::to_path_buf).or_else(|| config.output_path());
    match target.as_deref().filter(|p| *p != Path::new("-")) {
        Some(path) => {
            write_bundle(path, &text)?;
            log!(
                "build";
                "bundled {} module{} into {} in {}ms",
                graph.len(),
                if graph.len() == 1 { "" } else { "s" },
                path.display(),
                start.elapsed().as_millis()
            );
        }
        None => {
            let mut out = stdout().lock();
            out.write_all(text.as_bytes())?;
            out.flush()?;
        }
    }
    Ok(())
}

fn write_bundle(path: &Path, text: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, SwarmConfig) {
        let temp = TempDir::new().unwrap();
        let ep = temp.path().join("app/src/ep");
        fs::create_dir_all(&ep).unwrap();
        fs::write(ep.join("app.js"), "require('app/src/util');").unwrap();
        fs::write(temp.path().join("app/src/util.js"), "exports.x = 1;").unwrap();

        let config = SwarmConfig::load(None, temp.path()).unwrap();
        (temp, config)
    }

    #[test]
    fn test_build_writes_output() {
        let (temp, config) = fixture();
        let out = temp.path().join("dist/bundle.js");

        build(&config, Some(&out)).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        let util = text.find("\"app/src/util.js\"").unwrap();
        let app = text.find("__swarm.define(\"app/src/ep/app.js\"").unwrap();
        assert!(util < app);
        assert!(text.ends_with("__swarm.require(\"app/src/ep/app.js\");\n"));
    }

    #[test]
    fn test_build_uses_configured_output() {
        let (temp, mut config) = fixture();
        config.build.output = Some(PathBuf::from("out/app.js"));

        build(&config, None).unwrap();
        assert!(temp.path().join("out/app.js").is_file());
    }

    #[test]
    fn test_build_missing_dependency_fails() {
        let (temp, config) = fixture();
        fs::write(temp.path().join("app/src/util.js"), "require('./gone');").unwrap();

        let err = build(&config, Some(&temp.path().join("x.js"))).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("./gone"));
        assert!(!temp.path().join("x.js").exists());
    }
}

//! Serializes a module graph into one self-executing script.
//!
//! ```text
//! // banner
//! var __swarm = (function () { ...define, require... })();
//! __swarm.define("util.js", {}, function (require, module, exports) {
//! <source>
//! });
//! __swarm.define("app.js", {"./util":"util.js"}, function (require, module, exports) {
//! <source>
//! });
//! __swarm.require("app.js");
//! ```
//!
//! Every module body is wrapped in its own function scope. The output depends
//! only on the graph, never on the clock, so identical graphs produce
//! byte-identical bundles.

mod artifact;
pub mod runtime;

use std::fmt::Write;

pub use artifact::Artifact;

use crate::error::{Error, Result};
use crate::graph::{Module, ModuleGraph};
use runtime::{NAMESPACE, PRELUDE};

/// Graph-to-script serializer.
pub struct Bundler;

impl Bundler {
    /// Produce the bundle text for `graph`.
    ///
    /// Fails with [`Error::Bundle`] if any module contains a construct that
    /// would run past its wrapper. Nothing is returned in that case.
    pub fn bundle(graph: &ModuleGraph) -> Result<String> {
        for module in graph.ordered() {
            if let Some(defect) = module.defect {
                return Err(Error::Bundle {
                    module: module.key.clone(),
                    reason: defect.to_string(),
                });
            }
        }

        let capacity = PRELUDE.len() + graph.ordered().map(|m| m.source.len() + 128).sum::<usize>();
        let mut out = String::with_capacity(capacity);

        let entry = graph.entry();
        let _ = writeln!(
            out,
            "// swarm bundle: entry {}, {} module{}",
            json_string(&entry.key),
            graph.len(),
            if graph.len() == 1 { "" } else { "s" }
        );
        out.push_str(PRELUDE);

        for module in graph.ordered() {
            write_define(&mut out, graph, module);
        }

        let _ = writeln!(out, "{NAMESPACE}.require({});", json_string(&entry.key));
        Ok(out)
    }

    /// Bundle and wrap the text as a versioned [`Artifact`].
    pub fn bundle_artifact(graph: &ModuleGraph, version: u64) -> Result<Artifact> {
        let text = Self::bundle(graph)?;
        Ok(Artifact::new(text, version, graph.len()))
    }
}

fn write_define(out: &mut String, graph: &ModuleGraph, module: &Module) {
    let mut deps = String::from("{");
    for (i, (specifier, id)) in module.deps.iter().enumerate() {
        if i > 0 {
            deps.push(',');
        }
        deps.push_str(&json_string(specifier));
        deps.push(':');
        deps.push_str(&json_string(&graph.get(*id).key));
    }
    deps.push('}');

    let _ = writeln!(
        out,
        "{NAMESPACE}.define({}, {deps}, function (require, module, exports) {{",
        json_string(&module.key)
    );
    out.push_str(&strip_hashbang(&module.source));
    out.push_str("\n});\n");
}

/// A hashbang is only legal on the first line of a script, so comment it out.
fn strip_hashbang(source: &str) -> std::borrow::Cow<'_, str> {
    if source.starts_with("#!") {
        format!("//{source}").into()
    } else {
        source.into()
    }
}

fn json_string(value: &str) -> String {
    // Serializing a str cannot fail
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.escape_default()))
}

use std::fs;
use std::path::PathBuf;

use rustc_hash::FxHashMap;

use super::cache::ScanCache;
use super::scan::scan;
use super::{Module, ModuleGraph, ModuleId};
use crate::error::{Error, Result};
use crate::freshness::ContentHash;
use crate::workspace::Workspace;

/// Build the module graph reachable from `entry`.
///
/// Aborts on the first unresolvable specifier or unreadable file; no partial
/// graph is ever returned.
pub fn build(workspace: &Workspace, entry: &str) -> Result<ModuleGraph> {
    GraphBuilder::new(workspace, None).run(entry)
}

/// Like [`build`], reusing scan results for files whose content is unchanged.
pub fn build_with_cache(workspace: &Workspace, entry: &str, cache: &ScanCache) -> Result<ModuleGraph> {
    GraphBuilder::new(workspace, Some(cache)).run(entry)
}

struct GraphBuilder<'a> {
    workspace: &'a Workspace,
    cache: Option<&'a ScanCache>,
    modules: Vec<Module>,
    index: FxHashMap<PathBuf, ModuleId>,
    order: Vec<ModuleId>,
}

impl<'a> GraphBuilder<'a> {
    fn new(workspace: &'a Workspace, cache: Option<&'a ScanCache>) -> Self {
        Self {
            workspace,
            cache,
            modules: Vec::new(),
            index: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    fn run(mut self, entry: &str) -> Result<ModuleGraph> {
        let entry_path = self.workspace.resolve(entry)?;
        let entry_id = self.visit(entry_path)?;

        // Explicit DFS: (module, index of next specifier to follow)
        let mut stack = vec![(entry_id, 0usize)];

        while let Some(frame) = stack.last_mut() {
            let (id, next) = *frame;
            let module = &self.modules[id.index()];

            let Some(specifier) = module.specifiers.get(next).cloned() else {
                // All dependencies done: emit after them
                stack.pop();
                self.order.push(id);
                continue;
            };
            frame.1 += 1;

            let referrer = module.path.clone();
            let dep_path = self.workspace.resolve_from(&specifier, &referrer)?;

            let dep_id = match self.index.get(&dep_path) {
                // Already visited, possibly still on the stack (cycle)
                Some(&seen) => seen,
                None => {
                    let fresh = self.visit(dep_path)?;
                    stack.push((fresh, 0));
                    fresh
                }
            };
            self.modules[id.index()].deps.push((specifier, dep_id));
        }

        crate::debug!("graph"; "{} modules reachable from `{}`", self.modules.len(), entry);

        Ok(ModuleGraph {
            modules: self.modules,
            index: self.index,
            order: self.order,
            entry: entry_id,
        })
    }

    /// Load a module and mark it visited.
    fn visit(&mut self, path: PathBuf) -> Result<ModuleId> {
        let source = fs::read_to_string(&path).map_err(|e| Error::read(&path, e))?;
        let fingerprint = ContentHash::of(&source);
        let outcome = match self.cache {
            Some(cache) => cache.get_or_scan(fingerprint, &source),
            None => scan(&source),
        };

        #[allow(clippy::cast_possible_truncation)]
        let id = ModuleId(self.modules.len() as u32);
        let key = self.workspace.module_key(&path);

        self.index.insert(path.clone(), id);
        self.modules.push(Module {
            id,
            path,
            key,
            source,
            deps: Vec::with_capacity(outcome.specifiers.len()),
            specifiers: outcome.specifiers,
            fingerprint,
            defect: outcome.defect,
        });

        Ok(id)
    }
}

//! Loader emitted once at the top of every bundle.

/// Global the loader is bound to; module wrappers call through it.
pub const NAMESPACE: &str = "__swarm";

/// Module registry and memoizing `require`.
///
/// The cache entry is installed before a factory runs, so a module that is
/// re-entered through a cycle hands out its partially populated exports.
pub const PRELUDE: &str = r#"var __swarm = (function () {
  "use strict";
  var registry = Object.create(null);
  var cache = Object.create(null);

  function define(id, deps, factory) {
    registry[id] = [factory, deps];
  }

  function load(id) {
    var cached = cache[id];
    if (cached) return cached.exports;

    var entry = registry[id];
    if (!entry) throw new Error("[swarm] unknown module " + JSON.stringify(id));

    var module = { id: id, exports: {} };
    cache[id] = module;

    var deps = entry[1];
    var localRequire = function (specifier) {
      if (!Object.prototype.hasOwnProperty.call(deps, specifier)) {
        throw new Error("[swarm] cannot find " + JSON.stringify(specifier) + " from " + JSON.stringify(id));
      }
      return load(deps[specifier]);
    };

    entry[0].call(module.exports, localRequire, module, module.exports);
    return module.exports;
  }

  return { define: define, require: load };
})();
"#;

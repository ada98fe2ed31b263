use crate::namer::ModuleMap;

/// Module-name suffix that marks a package root.
const PACKAGE_INIT: &str = "__init__";

/// Resolve a raw import reference to the relative path of a repository file.
///
/// Tried in order, first hit wins:
/// 1. the reference is a registered module name;
/// 2. `reference.__init__` is registered (package root);
/// 3. a registered name ends with `.reference`, or the reference ends with
///    `.name`. Among several, the shortest name wins and equal lengths fall
///    back to name order.
///
/// Returns `None` for anything else, typically third-party packages.
///
/// # Examples
///
/// ```
/// use kachow_graph::namer::ModuleMap;
/// use kachow_graph::resolver::resolve_import;
///
/// let mut modules = ModuleMap::default();
/// modules.register("app/core/config.py");
/// modules.register("app/db/__init__.py");
///
/// assert_eq!(resolve_import(&modules, "app.core.config"), Some("app/core/config.py"));
/// assert_eq!(resolve_import(&modules, "app.db"), Some("app/db/__init__.py"));
/// assert_eq!(resolve_import(&modules, "config"), Some("app/core/config.py"));
/// assert_eq!(resolve_import(&modules, "app.core.config.settings"), None);
/// assert_eq!(resolve_import(&modules, "requests"), None);
/// ```
pub fn resolve_import<'a>(modules: &'a ModuleMap, reference: &str) -> Option<&'a str> {
    if reference.is_empty() {
        return None;
    }

    if let Some(path) = modules.get(reference) {
        return Some(path);
    }

    if let Some(path) = modules.get(&format!("{reference}.{PACKAGE_INIT}")) {
        return Some(path);
    }

    modules
        .iter()
        .filter(|(name, _)| ends_with_segment(name, reference) || ends_with_segment(reference, name))
        .min_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .map(|(_, path)| path)
}

/// `true` when `haystack` ends with `"." + needle`.
fn ends_with_segment(haystack: &str, needle: &str) -> bool {
    haystack.len() > needle.len()
        && haystack.ends_with(needle)
        && haystack.as_bytes()[haystack.len() - needle.len() - 1] == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules(paths: &[&str]) -> ModuleMap {
        let mut map = ModuleMap::default();
        for p in paths {
            map.register(p);
        }
        map
    }

    #[test]
    fn exact_match_beats_suffix_match() {
        let map = modules(&["utils.py", "app/utils.py"]);
        assert_eq!(resolve_import(&map, "utils"), Some("utils.py"));
        assert_eq!(resolve_import(&map, "app.utils"), Some("app/utils.py"));
    }

    #[test]
    fn package_root_beats_suffix_match() {
        let map = modules(&["models/__init__.py", "legacy/models.py"]);
        assert_eq!(resolve_import(&map, "models"), Some("models/__init__.py"));
    }

    #[test]
    fn suffix_match_prefers_shortest_module_name() {
        let map = modules(&["backend/app/services/auth.py", "services/auth.py"]);
        assert_eq!(resolve_import(&map, "auth"), Some("services/auth.py"));
    }

    #[test]
    fn equal_length_candidates_resolve_by_name_order() {
        let map = modules(&["pkg/a.py", "oth/a.py"]);
        assert_eq!(resolve_import(&map, "a"), Some("oth/a.py"));

        // Registration order does not change the winner
        let reversed = modules(&["oth/a.py", "pkg/a.py"]);
        assert_eq!(resolve_import(&reversed, "a"), Some("oth/a.py"));
    }

    #[test]
    fn qualified_reference_resolves_to_shorter_module() {
        let map = modules(&["config.py"]);
        assert_eq!(resolve_import(&map, "app.config"), Some("config.py"));
        assert_eq!(resolve_import(&map, "backend.app.config"), Some("config.py"));
    }

    #[test]
    fn symbol_reference_does_not_resolve() {
        let map = modules(&["app/core/config.py"]);
        assert_eq!(resolve_import(&map, "core.config.Settings"), None);
        assert_eq!(resolve_import(&map, "app.core.config.Settings"), None);
    }

    #[test]
    fn partial_segment_does_not_match() {
        let map = modules(&["app/myconfig.py"]);
        assert_eq!(resolve_import(&map, "config"), None);
    }

    #[test]
    fn empty_reference_and_empty_map() {
        assert_eq!(resolve_import(&modules(&["a.py"]), ""), None);
        assert_eq!(resolve_import(&ModuleMap::default(), "a"), None);
    }
}

use std::collections::BTreeMap;

/// Extension stripped from module names. Other extensions stay part of the name.
const MODULE_EXTENSION: &str = ".py";

/// Derive the dotted module name of a file from its relative path.
///
/// # Examples
///
/// ```
/// use kachow_graph::namer::module_name;
///
/// assert_eq!(module_name("app/core/config.py"), "app.core.config");
/// assert_eq!(module_name("pkg/__init__.py"), "pkg.__init__");
/// assert_eq!(module_name("web/index.js"), "web.index.js");
/// ```
pub fn module_name(relative_path: &str) -> String {
    let stem = relative_path
        .strip_suffix(MODULE_EXTENSION)
        .unwrap_or(relative_path);
    stem.replace(|c| c == '/' || c == '\\', ".")
}

/// Mapping from module name to relative file path for one scan.
///
/// Entries iterate in module-name order, which keeps suffix resolution
/// independent of the order files were walked in.
///
/// # Examples
///
/// ```
/// use kachow_graph::namer::ModuleMap;
///
/// let mut modules = ModuleMap::default();
/// modules.register("app/main.py");
/// assert_eq!(modules.get("app.main"), Some("app/main.py"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModuleMap {
    modules: BTreeMap<String, String>,
}

impl ModuleMap {
    /// Register a file and return its module name.
    ///
    /// A later path that normalizes to an existing name replaces the earlier
    /// entry; the replaced path is returned alongside.
    pub fn register(&mut self, relative_path: &str) -> (String, Option<String>) {
        let name = module_name(relative_path);
        let replaced = self
            .modules
            .insert(name.clone(), relative_path.to_string());
        (name, replaced)
    }

    /// Look up the file registered under an exact module name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.modules.get(name).map(String::as_str)
    }

    /// Iterate `(module name, relative path)` pairs in module-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.modules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

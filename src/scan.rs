use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::catalog::{self, ModuleInventory};
use crate::filter::PrefixFilter;

/// Entries ignored entirely during traversal, by bare file name.
pub const SKIPPED_FILENAMES: [&str; 3] = ["__init__.py", "setup.py", "tests"];

/// File whose presence marks a directory as an importable package.
pub const PACKAGE_MARKER: &str = "__init__.py";

const MODULE_EXTENSION: &str = "py";

/// Mapping from dotted module name to the set of classes it exposes.
pub type ModuleMap = HashMap<String, HashSet<String>>;

/// Walks `project_root` and produces the module mapping: every package and
/// module whose dotted name passes `filter`, each with the classes whose
/// declaring module also passes it.
pub fn build_module_map(project_root: &Path, filter: &PrefixFilter) -> Result<ModuleMap> {
    let inventories = traverse_modules(project_root, None)?;
    let mut members = catalog::resolve_class_members(&inventories, filter);
    members.retain(|module, _| filter.includes(module));
    Ok(members)
}

/// Recursively collects the inventory of every package and module under
/// `start_dir`.
///
/// Traversal is structural: the skip-set, the package marker and the `.py`
/// extension decide what is visited; inclusion filtering happens when the
/// mapping is assembled. A directory without `__init__.py` and a file with
/// another extension are skipped silently. Listing order is whatever the
/// directory yields; presentation sorting happens at render time.
pub fn traverse_modules(
    start_dir: &Path,
    parent_module: Option<&str>,
) -> Result<HashMap<String, ModuleInventory>> {
    let mut modules = HashMap::new();
    let entries = fs::read_dir(start_dir)
        .with_context(|| format!("failed to list directory: {}", start_dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if SKIPPED_FILENAMES.contains(&name) {
            continue;
        }

        let path = entry.path();
        if path.is_dir() && path.join(PACKAGE_MARKER).is_file() {
            let module_name = qualify(parent_module, name);
            let inventory =
                catalog::catalog_module(&path.join(PACKAGE_MARKER), &module_name, true);
            modules.extend(traverse_modules(&path, Some(module_name.as_str()))?);
            modules.insert(module_name, inventory);
        } else if path.is_file()
            && path.extension().is_some_and(|ext| ext == MODULE_EXTENSION)
        {
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let module_name = qualify(parent_module, stem);
            let inventory = catalog::catalog_module(&path, &module_name, false);
            modules.insert(module_name, inventory);
        }
    }

    Ok(modules)
}

fn qualify(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(prefix: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "{prefix}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn nested_package_modules_are_qualified() {
        let root = temp_dir("autoindex-scan-nested");
        write_file(&root.join("a/__init__.py"), "class Foo:\n    pass\n");
        write_file(&root.join("a/b.py"), "class Bar:\n    pass\n");

        let map = build_module_map(&root, &PrefixFilter::default()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], HashSet::from(["Foo".to_string()]));
        assert_eq!(map["a.b"], HashSet::from(["Bar".to_string()]));

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn skip_set_entries_never_become_modules() {
        let root = temp_dir("autoindex-scan-skip");
        write_file(&root.join("setup.py"), "class Setup:\n    pass\n");
        write_file(&root.join("tests/__init__.py"), "class TestCase:\n    pass\n");
        write_file(&root.join("pkg/__init__.py"), "");
        write_file(&root.join("pkg/real.py"), "class Real:\n    pass\n");

        let map = build_module_map(&root, &PrefixFilter::default()).unwrap();
        assert!(!map.contains_key("setup"));
        assert!(!map.contains_key("tests"));
        assert!(!map.contains_key("__init__"));
        assert!(map.contains_key("pkg.real"));

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn directory_without_package_marker_is_skipped() {
        let root = temp_dir("autoindex-scan-marker");
        write_file(&root.join("not_a_package/mod.py"), "class Lost:\n    pass\n");
        write_file(&root.join("plain.txt"), "class NotPython:\n    pass\n");

        let map = build_module_map(&root, &PrefixFilter::default()).unwrap();
        assert!(map.is_empty());

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn filter_drops_modules_but_keeps_their_inventories_for_resolution() {
        let root = temp_dir("autoindex-scan-filter");
        write_file(&root.join("proj_core.py"), "from other_mod import Helper\n");
        write_file(&root.join("other_mod.py"), "class Helper:\n    pass\n");

        let filter = PrefixFilter::new(vec!["proj_".to_string()]);
        let map = build_module_map(&root, &filter).unwrap();
        assert!(map.contains_key("proj_core"));
        assert!(!map.contains_key("other_mod"));
        // Helper's declaring module fails the filter, so the re-export is dropped
        assert!(map["proj_core"].is_empty());

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn in_tree_re_export_survives_when_declaring_module_passes() {
        let root = temp_dir("autoindex-scan-reexport");
        write_file(&root.join("pkg/__init__.py"), "from .models import User\n");
        write_file(&root.join("pkg/models.py"), "class User:\n    pass\n");

        let map = build_module_map(&root, &PrefixFilter::default()).unwrap();
        assert_eq!(map["pkg"], HashSet::from(["User".to_string()]));
        assert_eq!(map["pkg.models"], HashSet::from(["User".to_string()]));

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = temp_dir("autoindex-scan-missing");
        assert!(build_module_map(&root, &PrefixFilter::default()).is_err());
    }
}

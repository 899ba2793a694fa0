use sha2::{Digest, Sha256};

use crate::scan::ModuleMap;

/// Renders the module mapping as Sphinx directive text: one `automodule`
/// per module, one `autoclass` per class, modules and classes in
/// lexicographic order. Names are emitted verbatim; they are assumed to be
/// valid identifiers.
pub fn render_index(modules: &ModuleMap) -> String {
    let mut module_names: Vec<&String> = modules.keys().collect();
    module_names.sort();

    let mut data = String::new();
    for module in module_names {
        let mut classes: Vec<&String> = modules[module].iter().collect();
        classes.sort();

        data.push_str(&format!("\n.. automodule:: {module}\n    :members: \n"));
        for class in classes {
            data.push_str(&format!("\n.. autoclass:: {class}\n    :members: \n"));
        }
    }

    data
}

pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn modules_and_classes_are_sorted() {
        let mut modules = ModuleMap::new();
        modules.insert(
            "beta".to_string(),
            HashSet::from(["M".to_string()]),
        );
        modules.insert(
            "alpha".to_string(),
            HashSet::from(["Z".to_string(), "A".to_string()]),
        );

        let rendered = render_index(&modules);
        let alpha = rendered.find(".. automodule:: alpha").unwrap();
        let beta = rendered.find(".. automodule:: beta").unwrap();
        assert!(alpha < beta);

        let a = rendered.find(".. autoclass:: A").unwrap();
        let z = rendered.find(".. autoclass:: Z").unwrap();
        assert!(a < z);
    }

    #[test]
    fn directive_shape_matches_sphinx_expectations() {
        let mut modules = ModuleMap::new();
        modules.insert(
            "pkg.models".to_string(),
            HashSet::from(["User".to_string()]),
        );

        let rendered = render_index(&modules);
        assert_eq!(
            rendered,
            "\n.. automodule:: pkg.models\n    :members: \n\n.. autoclass:: User\n    :members: \n"
        );
    }

    #[test]
    fn empty_mapping_renders_nothing() {
        assert_eq!(render_index(&ModuleMap::new()), "");
    }

    #[test]
    fn hash_content_is_stable() {
        assert_eq!(hash_content("abc"), hash_content("abc"));
        assert_ne!(hash_content("abc"), hash_content("abd"));
    }
}

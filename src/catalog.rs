//! Static class inventory extraction.
//!
//! Modules are never imported or executed. Each source file is parsed with
//! tree-sitter and reduced to an inventory of top-level class definitions
//! plus `from` imports; a resolution pass then follows import chains through
//! the walked tree to compute the classes each module exposes as members,
//! attributed to their declaring module.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tree_sitter::Node;

use crate::filter::PrefixFilter;

#[derive(Debug, Clone)]
pub struct NamedImport {
    /// Name as defined in the source module.
    pub source_name: String,
    /// Name bound in the importing module (`as` alias, or the source name).
    pub local_name: String,
}

#[derive(Debug, Clone)]
pub enum ImportedNames {
    Named(Vec<NamedImport>),
    Star,
}

/// One `from X import ...` statement, with `X` resolved to an absolute
/// dotted name.
#[derive(Debug, Clone)]
pub struct FromImport {
    pub module: String,
    pub names: ImportedNames,
}

/// Statically extracted inventory of a single module source file.
#[derive(Debug, Clone, Default)]
pub struct ModuleInventory {
    pub classes: Vec<String>,
    pub imports: Vec<FromImport>,
}

/// Parses the source file backing `module_name` and returns its inventory.
///
/// Any failure is caught, logged and downgraded to an empty inventory so
/// that one broken module cannot abort the run.
pub fn catalog_module(source_path: &Path, module_name: &str, is_package: bool) -> ModuleInventory {
    match try_catalog_module(source_path, module_name, is_package) {
        Ok(inventory) => inventory,
        Err(err) => {
            log::warn!("error finding classes in module {module_name}: {err:#}");
            ModuleInventory::default()
        }
    }
}

fn try_catalog_module(
    source_path: &Path,
    module_name: &str,
    is_package: bool,
) -> Result<ModuleInventory> {
    let source = std::fs::read_to_string(source_path)
        .with_context(|| format!("failed to read module source: {}", source_path.display()))?;
    parse_inventory(&source, module_name, is_package)
}

/// Extracts the inventory from `source`. `is_package` marks `__init__.py`
/// sources, whose relative imports resolve against the package itself
/// rather than its parent.
pub fn parse_inventory(
    source: &str,
    module_name: &str,
    is_package: bool,
) -> Result<ModuleInventory> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .context("failed to load python grammar")?;
    let tree = parser
        .parse(source, None)
        .context("tree-sitter produced no parse tree")?;
    let root = tree.root_node();
    let bytes = source.as_bytes();

    let mut inventory = ModuleInventory::default();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        collect_top_level(&child, bytes, module_name, is_package, &mut inventory);
    }

    Ok(inventory)
}

fn collect_top_level(
    node: &Node,
    source: &[u8],
    module_name: &str,
    is_package: bool,
    inventory: &mut ModuleInventory,
) {
    match node.kind() {
        "class_definition" => {
            if let Some(name) = node.child_by_field_name("name") {
                let name = node_text(&name, source);
                if !name.is_empty() {
                    inventory.classes.push(name.to_string());
                }
            }
        }
        "decorated_definition" => {
            if let Some(definition) = node.child_by_field_name("definition") {
                collect_top_level(&definition, source, module_name, is_package, inventory);
            }
        }
        "import_from_statement" => {
            if let Some(import) = extract_from_import(node, source, module_name, is_package) {
                inventory.imports.push(import);
            }
        }
        // `import x` binds a module, not classes
        _ => {}
    }
}

fn extract_from_import(
    node: &Node,
    source: &[u8],
    module_name: &str,
    is_package: bool,
) -> Option<FromImport> {
    let module_node = node.child_by_field_name("module_name")?;
    let module = resolve_module_ref(&module_node, source, module_name, is_package)?;

    let mut cursor = node.walk();
    let is_star = node
        .children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import");
    if is_star {
        return Some(FromImport {
            module,
            names: ImportedNames::Star,
        });
    }

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let text = node_text(&child, source);
                if !text.is_empty() && !text.contains('.') {
                    names.push(NamedImport {
                        source_name: text.to_string(),
                        local_name: text.to_string(),
                    });
                }
            }
            "aliased_import" => {
                let Some(original) = child.child_by_field_name("name") else {
                    continue;
                };
                let original = node_text(&original, source);
                if original.is_empty() || original.contains('.') {
                    continue;
                }
                let local = child
                    .child_by_field_name("alias")
                    .map(|alias| node_text(&alias, source).to_string())
                    .unwrap_or_else(|| original.to_string());
                names.push(NamedImport {
                    source_name: original.to_string(),
                    local_name: local,
                });
            }
            _ => {}
        }
    }

    if names.is_empty() {
        return None;
    }
    Some(FromImport {
        module,
        names: ImportedNames::Named(names),
    })
}

/// Resolves the module reference of a `from` statement to an absolute
/// dotted name. Relative forms (`.`, `..pkg`) resolve against the importing
/// module's package; references escaping the tree root resolve to `None`.
fn resolve_module_ref(
    node: &Node,
    source: &[u8],
    module_name: &str,
    is_package: bool,
) -> Option<String> {
    match node.kind() {
        "dotted_name" => {
            let text = node_text(node, source);
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
        "relative_import" => {
            let mut level = 0usize;
            let mut target = None;
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "import_prefix" => {
                        level = node_text(&child, source).matches('.').count();
                    }
                    "dotted_name" => {
                        target = Some(node_text(&child, source).to_string());
                    }
                    _ => {}
                }
            }
            if level == 0 {
                return None;
            }

            let mut parts: Vec<&str> = module_name.split('.').collect();
            if !is_package {
                parts.pop();
            }
            for _ in 1..level {
                parts.pop()?;
            }

            let base = parts.join(".");
            match target {
                Some(target) if base.is_empty() => Some(target),
                Some(target) => Some(format!("{base}.{target}")),
                None if base.is_empty() => None,
                None => Some(base),
            }
        }
        _ => None,
    }
}

fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

#[derive(Debug, Clone)]
struct ClassBinding {
    declaring_module: String,
    class_name: String,
}

/// Computes each module's member-class set from the raw inventories.
///
/// Import chains are followed through the walked tree; a binding is kept
/// only if its declaring module passes `filter`, mirroring introspection on
/// a class object's owning module. The recorded name is always the class's
/// own name, never a local alias. Bindings from modules outside the tree
/// are dropped: their class-ness cannot be established without running code.
pub fn resolve_class_members(
    inventories: &HashMap<String, ModuleInventory>,
    filter: &PrefixFilter,
) -> HashMap<String, HashSet<String>> {
    let mut resolver = ExportResolver {
        inventories,
        cache: HashMap::new(),
        visiting: HashSet::new(),
    };

    let mut members = HashMap::new();
    for module in inventories.keys() {
        let classes: HashSet<String> = resolver
            .exports(module)
            .values()
            .filter(|binding| filter.includes(&binding.declaring_module))
            .map(|binding| binding.class_name.clone())
            .collect();
        members.insert(module.clone(), classes);
    }

    members
}

struct ExportResolver<'a> {
    inventories: &'a HashMap<String, ModuleInventory>,
    /// module -> local binding name -> class binding
    cache: HashMap<String, HashMap<String, ClassBinding>>,
    visiting: HashSet<String>,
}

impl ExportResolver<'_> {
    fn exports(&mut self, module: &str) -> HashMap<String, ClassBinding> {
        if let Some(cached) = self.cache.get(module) {
            return cached.clone();
        }
        if self.visiting.contains(module) {
            // circular import; the runtime equivalent fails to import
            return HashMap::new();
        }
        let Some(inventory) = self.inventories.get(module) else {
            return HashMap::new();
        };

        self.visiting.insert(module.to_string());

        let mut bindings: HashMap<String, ClassBinding> = HashMap::new();
        for import in &inventory.imports {
            let source_exports = self.exports(&import.module);
            match &import.names {
                ImportedNames::Star => {
                    for (name, binding) in &source_exports {
                        if !name.starts_with('_') {
                            bindings.insert(name.clone(), binding.clone());
                        }
                    }
                }
                ImportedNames::Named(named) => {
                    for name in named {
                        if let Some(binding) = source_exports.get(&name.source_name) {
                            bindings.insert(name.local_name.clone(), binding.clone());
                        }
                    }
                }
            }
        }

        // definitions shadow imports of the same name
        for class in &inventory.classes {
            bindings.insert(
                class.clone(),
                ClassBinding {
                    declaring_module: module.to_string(),
                    class_name: class.clone(),
                },
            );
        }

        self.visiting.remove(module);
        self.cache.insert(module.to_string(), bindings.clone());
        bindings
    }
}

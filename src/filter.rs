/// Prefix-based module inclusion filter.
///
/// An empty prefix list includes every module; otherwise a module is
/// included iff its dotted name starts with at least one prefix. Applied
/// both to the modules recorded in the mapping and to the declaring module
/// of every discovered class.
#[derive(Debug, Clone, Default)]
pub struct PrefixFilter {
    prefixes: Vec<String>,
}

impl PrefixFilter {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    pub fn includes(&self, module_name: &str) -> bool {
        if self.prefixes.is_empty() {
            return true;
        }

        self.prefixes
            .iter()
            .any(|prefix| module_name.starts_with(prefix))
    }
}

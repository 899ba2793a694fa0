//! # sphinx-autoindex
//!
//! Generates the autodoc section of a Sphinx `index.rst` for a Python
//! project by statically scanning its source tree. Discovered modules are
//! never imported or executed.
//!
//! ## Architecture
//!
//! - **scan**: Package/module discovery by recursive directory traversal
//! - **catalog**: Static class inventory extraction using tree-sitter AST parsing
//! - **filter**: Dotted-name prefix inclusion filter
//! - **render**: Sphinx `automodule`/`autoclass` directive formatting
//! - **patch**: Marker-delimited splicing into the index document
//! - **cli**: Command line definition
//! - **config**: Input path validation

pub mod catalog;
pub mod cli;
pub mod config;
pub mod filter;
pub mod patch;
pub mod render;
pub mod scan;

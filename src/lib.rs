// Copyright 2018-2024 the Deno authors. All rights reserved. MIT license.

#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

mod ast;
mod config;
mod graph;
mod module_id;
mod plugin;
pub mod plugins;
pub mod source;

pub use ast::media_type_for_id;
pub use ast::parse_source;
pub use ast::parse_with_media_type;
pub use ast::DefaultEsParser;
pub use ast::EsParser;
pub use ast::ParseError;
pub use ast::ParseOptions;
pub use ast::SyntaxTree;
pub use ast::TopLevelStatement;
pub use config::GraphConfig;
pub use deno_ast::MediaType;
pub use graph::Module;
pub use graph::ModuleGraph;
pub use graph::ModuleGraphError;
pub use graph::ModuleGraphErrorKind;
pub use module_id::ModuleId;
pub use module_id::ModuleSpecifier;
pub use plugin::HookMatch;
pub use plugin::Plugin;
pub use plugin::PluginChain;
pub use source::load_source;
pub use source::resolve_specifier;
pub use source::transform_source;

/// Builds the graph of modules reachable from `entry` through static imports
/// and re-exports.
///
/// Every module is resolved, loaded, transformed and parsed through the
/// plugins in `config`. A module that fails any of those steps is left out
/// of the graph along with everything only reachable through it, and the
/// failure is recorded in [`ModuleGraph::errors`]. Import cycles, including
/// self imports, are followed exactly once.
pub async fn build_graph(entry: &str, config: &GraphConfig) -> ModuleGraph {
  graph::Builder::build(entry, config).await
}

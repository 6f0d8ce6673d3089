// Copyright 2018-2024 the Deno authors. MIT license.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use deno_error::JsErrorBox;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::FutureExt;
use futures::StreamExt;
use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::ser::SerializeStruct;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

use crate::ast::parse_source;
use crate::ast::ParseError;
use crate::ast::SyntaxTree;
use crate::config::GraphConfig;
use crate::module_id::ModuleId;
use crate::source::load_source;
use crate::source::resolve_specifier;
use crate::source::transform_source;
use crate::source::LoadError;

fn importer_suffix(maybe_importer: &Option<ModuleId>) -> String {
  match maybe_importer {
    Some(importer) => format!(" from \"{}\"", importer),
    None => String::new(),
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleGraphErrorKind {
  UnresolvableSpecifier,
  InvalidSpecifier,
  ModuleNotFound,
  LoadFailed,
  ParseFailed,
}

/// Why a branch of the graph was pruned during a build.
#[derive(Debug, Error, deno_error::JsError)]
pub enum ModuleGraphError {
  /// No plugin resolved the specifier, or a resolve hook failed.
  #[class(type)]
  #[error("Unable to resolve \"{specifier}\"{}.", importer_suffix(.maybe_importer))]
  UnresolvableSpecifier {
    specifier: String,
    maybe_importer: Option<ModuleId>,
    #[source]
    maybe_source: Option<JsErrorBox>,
  },
  #[class(type)]
  #[error("Invalid module specifier \"{specifier}\"{}.", importer_suffix(.maybe_importer))]
  InvalidSpecifier {
    specifier: String,
    maybe_importer: Option<ModuleId>,
  },
  #[class("NotFound")]
  #[error("Cannot find module \"{specifier}\"{} at \"{}\".", importer_suffix(.maybe_importer), .path.display())]
  ModuleNotFound {
    specifier: String,
    maybe_importer: Option<ModuleId>,
    path: PathBuf,
  },
  #[class(generic)]
  #[error("Unable to load \"{id}\".")]
  LoadFailed {
    id: ModuleId,
    #[source]
    maybe_source: Option<LoadError>,
  },
  #[class(generic)]
  #[error("Unable to parse \"{id}\": {error}")]
  ParseFailed {
    id: ModuleId,
    #[source]
    error: ParseError,
  },
}

impl ModuleGraphError {
  pub fn kind(&self) -> ModuleGraphErrorKind {
    match self {
      Self::UnresolvableSpecifier { .. } => {
        ModuleGraphErrorKind::UnresolvableSpecifier
      }
      Self::InvalidSpecifier { .. } => ModuleGraphErrorKind::InvalidSpecifier,
      Self::ModuleNotFound { .. } => ModuleGraphErrorKind::ModuleNotFound,
      Self::LoadFailed { .. } => ModuleGraphErrorKind::LoadFailed,
      Self::ParseFailed { .. } => ModuleGraphErrorKind::ParseFailed,
    }
  }

  /// The specifier being resolved when resolution failed.
  pub fn maybe_specifier(&self) -> Option<&str> {
    match self {
      Self::UnresolvableSpecifier { specifier, .. }
      | Self::InvalidSpecifier { specifier, .. }
      | Self::ModuleNotFound { specifier, .. } => Some(specifier.as_str()),
      Self::LoadFailed { .. } | Self::ParseFailed { .. } => None,
    }
  }

  /// The resolved id when loading or parsing failed.
  pub fn maybe_id(&self) -> Option<&ModuleId> {
    match self {
      Self::LoadFailed { id, .. } | Self::ParseFailed { id, .. } => Some(id),
      Self::UnresolvableSpecifier { .. }
      | Self::InvalidSpecifier { .. }
      | Self::ModuleNotFound { .. } => None,
    }
  }
}

fn serialize_source_size<S>(
  source: &Arc<str>,
  serializer: S,
) -> Result<S::Ok, S::Error>
where
  S: Serializer,
{
  serializer.serialize_u64(source.len() as u64)
}

/// A module that was resolved, loaded and parsed while building the graph.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
  pub id: ModuleId,
  /// The source text as loaded, before any transform hook ran.
  #[serde(rename = "size", serialize_with = "serialize_source_size")]
  pub code: Arc<str>,
  #[serde(skip_serializing)]
  pub ast: SyntaxTree,
  dependents: IndexSet<ModuleId>,
}

impl Module {
  pub(crate) fn new(
    id: ModuleId,
    code: Arc<str>,
    ast: SyntaxTree,
    dependents: IndexSet<ModuleId>,
  ) -> Self {
    Self {
      id,
      code,
      ast,
      dependents,
    }
  }

  /// The ids of the modules in the graph that import this module.
  pub fn dependents(&self) -> &IndexSet<ModuleId> {
    &self.dependents
  }

  pub fn is_imported_by(&self, id: &str) -> bool {
    self.dependents.contains(id)
  }

  /// The length of the module's source text in bytes.
  pub fn size(&self) -> usize {
    self.code.len()
  }

  pub fn import_specifiers(&self) -> Vec<String> {
    self.ast.import_specifiers()
  }

  fn add_dependent(&mut self, importer: &ModuleId) {
    self.dependents.insert(importer.clone());
  }
}

/// The modules reachable from an entry specifier, keyed by id.
///
/// Only reverse edges are stored: each module records the modules that import
/// it. Forward edges are derived with [`ModuleGraph::dependencies_of`].
#[derive(Debug, Default)]
pub struct ModuleGraph {
  root: Option<ModuleId>,
  modules: IndexMap<ModuleId, Module>,
  errors: Vec<ModuleGraphError>,
}

impl ModuleGraph {
  /// The id of the entry module, if it could be built.
  pub fn root(&self) -> Option<&ModuleId> {
    self.root.as_ref()
  }

  pub fn get(&self, id: &str) -> Option<&Module> {
    self.modules.get(id)
  }

  pub fn contains(&self, id: &str) -> bool {
    self.modules.contains_key(id)
  }

  /// The modules in the order a depth-first walk from the root first
  /// visits them.
  pub fn modules(&self) -> impl Iterator<Item = &Module> {
    self.modules.values()
  }

  pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
    self.modules.keys()
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  /// The errors that pruned branches of the graph while it was built.
  pub fn errors(&self) -> &[ModuleGraphError] {
    &self.errors
  }

  /// Returns the first error recorded while building the graph, if any.
  pub fn valid(&self) -> Result<(), &ModuleGraphError> {
    match self.errors.first() {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }

  /// The modules imported by `id`, in graph order.
  pub fn dependencies_of<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Iterator<Item = &'a ModuleId> + 'a {
    self
      .modules
      .values()
      .filter(move |module| module.is_imported_by(id))
      .map(|module| &module.id)
  }
}

impl Serialize for ModuleGraph {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let mut graph = serializer.serialize_struct("ModuleGraph", 2)?;
    graph.serialize_field("root", &self.root)?;
    graph.serialize_field(
      "modules",
      &self.modules.values().collect::<Vec<_>>(),
    )?;
    graph.end()
  }
}

type PendingLoad<'a> =
  LocalBoxFuture<'a, (ModuleId, Result<Arc<str>, ModuleGraphError>)>;

pub(crate) struct Builder<'a> {
  config: &'a GraphConfig,
  graph: ModuleGraph,
  /// Every id that was claimed for loading.
  discovered: HashSet<ModuleId>,
  /// The resolved ids each materialized module imports, in source order.
  children: HashMap<ModuleId, Vec<ModuleId>>,
  /// Importers of modules whose load is still in flight.
  claimed: HashMap<ModuleId, IndexSet<ModuleId>>,
  pending: FuturesUnordered<PendingLoad<'a>>,
}

impl<'a> Builder<'a> {
  pub async fn build(entry: &str, config: &'a GraphConfig) -> ModuleGraph {
    let mut builder = Self {
      config,
      graph: ModuleGraph::default(),
      discovered: HashSet::new(),
      children: HashMap::new(),
      claimed: HashMap::new(),
      pending: FuturesUnordered::new(),
    };
    builder.fill(entry).await;
    builder.finish()
  }

  async fn fill(&mut self, entry: &str) {
    self.graph.root = self.visit(entry, None);
    while let Some((id, result)) = self.pending.next().await {
      self.visit_loaded(id, result);
    }
  }

  /// Resolves a specifier and schedules a load for ids that were not seen
  /// before. An id that is already in the graph, or whose load is in
  /// flight, only gains `maybe_importer` as a dependent.
  fn visit(
    &mut self,
    specifier: &str,
    maybe_importer: Option<&ModuleId>,
  ) -> Option<ModuleId> {
    let importer = maybe_importer.and_then(|id| self.graph.modules.get(id));
    let id = match resolve_specifier(specifier, self.config, importer) {
      Ok(id) => id,
      Err(err) => {
        self.prune(err);
        return None;
      }
    };
    if let Some(module) = self.graph.modules.get_mut(&id) {
      if let Some(importer) = maybe_importer {
        module.add_dependent(importer);
      }
    } else if let Some(dependents) = self.claimed.get_mut(&id) {
      if let Some(importer) = maybe_importer {
        dependents.insert(importer.clone());
      }
    } else if !self.discovered.contains(&id) {
      self.claim(id.clone(), maybe_importer);
    }
    // ids that were discovered before but are neither built nor in flight
    // failed to load or parse, and stay pruned
    Some(id)
  }

  fn claim(&mut self, id: ModuleId, maybe_importer: Option<&ModuleId>) {
    log::debug!("Claimed \"{}\".", id);
    self.discovered.insert(id.clone());
    self
      .claimed
      .insert(id.clone(), maybe_importer.cloned().into_iter().collect());
    let config = self.config;
    self.pending.push(
      async move {
        let result = load_source(&id, config).await;
        (id, result)
      }
      .boxed_local(),
    );
  }

  fn visit_loaded(
    &mut self,
    id: ModuleId,
    result: Result<Arc<str>, ModuleGraphError>,
  ) {
    let dependents = self.claimed.remove(&id).unwrap_or_default();
    let config = self.config;
    let result = result.and_then(|code| {
      let transformed = transform_source(&id, &code, config)?;
      let ast = parse_source(&id, &transformed, config)?;
      Ok((code, ast))
    });
    let (code, ast) = match result {
      Ok(built) => built,
      Err(err) => {
        self.prune(err);
        return;
      }
    };
    let specifiers = ast.import_specifiers();
    self
      .graph
      .modules
      .insert(id.clone(), Module::new(id.clone(), code, ast, dependents));
    let children = specifiers
      .iter()
      .filter_map(|specifier| self.visit(specifier, Some(&id)))
      .collect();
    self.children.insert(id, children);
  }

  fn prune(&mut self, err: ModuleGraphError) {
    log::debug!("Pruning branch: {:#}", err);
    self.graph.errors.push(err);
  }

  fn finish(self) -> ModuleGraph {
    let Self {
      mut graph,
      children,
      ..
    } = self;
    if let Some(root) = &graph.root {
      if !graph.modules.contains_key(root) {
        graph.root = None;
      }
    }
    if let Some(root) = &graph.root {
      let order = depth_first_order(root, &children);
      graph.modules.sort_by(|a, _, b, _| {
        order.get_index_of(a).cmp(&order.get_index_of(b))
      });
    }
    graph
  }
}

/// Orders ids the way a sequential depth-first walk from `root` would first
/// visit them.
fn depth_first_order(
  root: &ModuleId,
  children: &HashMap<ModuleId, Vec<ModuleId>>,
) -> IndexSet<ModuleId> {
  let mut order = IndexSet::new();
  let mut stack = vec![root];
  while let Some(id) = stack.pop() {
    if !order.insert(id.clone()) {
      continue;
    }
    if let Some(ids) = children.get(id) {
      stack.extend(ids.iter().rev());
    }
  }
  order
}

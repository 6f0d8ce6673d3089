// Copyright 2018-2024 the Deno authors. MIT license.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use deno_error::JsErrorBox;

use crate::config::GraphConfig;
use crate::graph::Module;
use crate::module_id::ModuleId;
use crate::plugin::Plugin;
use crate::source::LoadError;
use crate::source::LoadResult;
use crate::source::ResolveError;

pub enum Source<S> {
  Text(S),
  /// Loading the module fails with this message.
  Err(S),
}

pub type VirtualFsSources<S> = Vec<(S, Source<S>)>;

/// A plugin where the module sources are provided ahead of time, keyed by
/// the exact specifier they are imported with. This is useful for testing or
/// for building a graph over code that does not live on disk.
///
/// Specifiers are used as ids unchanged, so `./a.js` imported from two
/// different modules is the same module.
#[derive(Debug, Default, Clone)]
pub struct VirtualFsPlugin {
  sources: HashMap<String, Result<Arc<str>, String>>,
}

impl VirtualFsPlugin {
  pub fn new<S: AsRef<str>>(sources: Vec<(S, S)>) -> Self {
    Self::with_sources(
      sources
        .into_iter()
        .map(|(id, text)| (id, Source::Text(text)))
        .collect(),
    )
  }

  pub fn with_sources<S: AsRef<str>>(sources: VirtualFsSources<S>) -> Self {
    let mut plugin = Self::default();
    for (id, source) in sources {
      plugin.add_source(id, source);
    }
    plugin
  }

  pub fn add_source<S: AsRef<str>>(
    &mut self,
    id: impl AsRef<str>,
    source: Source<S>,
  ) {
    let entry = match source {
      Source::Text(text) => Ok(Arc::from(text.as_ref())),
      Source::Err(message) => Err(message.as_ref().to_string()),
    };
    self.sources.insert(id.as_ref().to_string(), entry);
  }

  pub fn add_source_with_text(
    &mut self,
    id: impl AsRef<str>,
    text: impl AsRef<str>,
  ) {
    self.add_source(id, Source::Text(text));
  }
}

#[async_trait(?Send)]
impl Plugin for VirtualFsPlugin {
  fn name(&self) -> &str {
    "virtual-fs"
  }

  fn resolve(
    &self,
    specifier: &str,
    _config: &GraphConfig,
    _importer: Option<&Module>,
  ) -> Result<Option<ModuleId>, ResolveError> {
    Ok(
      self
        .sources
        .contains_key(specifier)
        .then(|| ModuleId::from(specifier)),
    )
  }

  async fn load(&self, id: &ModuleId, _config: &GraphConfig) -> LoadResult {
    match self.sources.get(id.as_str()) {
      Some(Ok(text)) => Ok(Some(text.clone())),
      Some(Err(message)) => {
        Err(LoadError::Other(JsErrorBox::generic(message.clone())))
      }
      None => Ok(None),
    }
  }
}

// Copyright 2018-2024 the Deno authors. MIT license.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use deno_error::JsErrorBox;

use crate::ast::ParseError;
use crate::ast::SyntaxTree;
use crate::config::GraphConfig;
use crate::graph::Module;
use crate::module_id::ModuleId;
use crate::source::LoadResult;
use crate::source::ResolveError;

/// A set of optional hooks that take part in building a module graph.
///
/// Every hook has a default implementation that returns `None`, which means
/// "not handled here" and lets the next plugin in the configuration have a go.
/// Returning an error stops the hook chain for that call.
///
/// Hooks only receive shared references. They may perform their own I/O, but
/// they never see the graph that is being built.
#[async_trait(?Send)]
pub trait Plugin: fmt::Debug {
  /// Name used when logging which plugin handled a hook.
  fn name(&self) -> &str;

  /// Resolves an import specifier, as written in the importing module, to a
  /// canonical module id. `importer` is `None` for the entry specifier.
  fn resolve(
    &self,
    _specifier: &str,
    _config: &GraphConfig,
    _importer: Option<&Module>,
  ) -> Result<Option<ModuleId>, ResolveError> {
    Ok(None)
  }

  /// Loads the source text of a resolved module.
  async fn load(&self, _id: &ModuleId, _config: &GraphConfig) -> LoadResult {
    Ok(None)
  }

  /// Rewrites loaded source text before it is parsed.
  fn transform(
    &self,
    _id: &ModuleId,
    _code: &Arc<str>,
    _config: &GraphConfig,
  ) -> Result<Option<Arc<str>>, JsErrorBox> {
    Ok(None)
  }

  /// Parses source text into a syntax tree. When no plugin handles a module
  /// the default parser is used.
  fn parse(
    &self,
    _id: &ModuleId,
    _code: &Arc<str>,
  ) -> Result<Option<SyntaxTree>, ParseError> {
    Ok(None)
  }
}

/// A value produced by a hook along with the plugin that produced it.
pub struct HookMatch<'a, T> {
  pub plugin: &'a dyn Plugin,
  pub value: T,
}

/// Runs a hook over an ordered list of plugins.
///
/// The first hook that returns `Some` wins and the remaining plugins are not
/// invoked for that call.
#[derive(Clone, Copy)]
pub struct PluginChain<'a> {
  plugins: &'a [Box<dyn Plugin>],
}

impl<'a> PluginChain<'a> {
  pub fn new(plugins: &'a [Box<dyn Plugin>]) -> Self {
    Self { plugins }
  }

  pub fn len(&self) -> usize {
    self.plugins.len()
  }

  pub fn is_empty(&self) -> bool {
    self.plugins.is_empty()
  }

  pub fn first_match<T, E>(
    &self,
    mut hook: impl FnMut(&'a dyn Plugin) -> Result<Option<T>, E>,
  ) -> Result<Option<HookMatch<'a, T>>, E> {
    for plugin in self.plugins {
      let plugin: &'a dyn Plugin = &**plugin;
      if let Some(value) = hook(plugin)? {
        return Ok(Some(HookMatch { plugin, value }));
      }
    }
    Ok(None)
  }

  /// Same as [`PluginChain::first_match`], awaiting each hook before
  /// deciding whether to move on to the next plugin.
  pub async fn first_match_async<T, E, Fut>(
    &self,
    mut hook: impl FnMut(&'a dyn Plugin) -> Fut,
  ) -> Result<Option<HookMatch<'a, T>>, E>
  where
    Fut: Future<Output = Result<Option<T>, E>>,
  {
    for plugin in self.plugins {
      let plugin: &'a dyn Plugin = &**plugin;
      if let Some(value) = hook(plugin).await? {
        return Ok(Some(HookMatch { plugin, value }));
      }
    }
    Ok(None)
  }
}

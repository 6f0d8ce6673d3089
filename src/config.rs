// Copyright 2018-2024 the Deno authors. MIT license.

use crate::plugin::Plugin;
use crate::plugin::PluginChain;

/// Options for building a module graph.
///
/// The plugins are consulted in the order they were added. For every hook the
/// first plugin that produces a value wins.
#[derive(Debug, Default)]
pub struct GraphConfig {
  pub plugins: Vec<Box<dyn Plugin>>,
}

impl GraphConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
    self.plugins.push(Box::new(plugin));
    self
  }

  pub fn add_plugin(&mut self, plugin: impl Plugin + 'static) -> &mut Self {
    self.plugins.push(Box::new(plugin));
    self
  }

  pub(crate) fn chain(&self) -> PluginChain<'_> {
    PluginChain::new(&self.plugins)
  }
}

use module_graph::build_graph;
use module_graph::plugins::VirtualFsPlugin;
use module_graph::GraphConfig;
use module_graph::ModuleGraph;
use module_graph::Plugin;

pub struct TestBuilder {
  files: VirtualFsPlugin,
  plugins: Vec<Box<dyn Plugin>>,
  entry_point: String,
}

impl TestBuilder {
  pub fn new() -> Self {
    Self {
      files: Default::default(),
      plugins: Vec::new(),
      entry_point: "main.js".to_string(),
    }
  }

  pub fn file(
    &mut self,
    id: impl AsRef<str>,
    text: impl AsRef<str>,
  ) -> &mut Self {
    self.files.add_source_with_text(id, text);
    self
  }

  /// Adds a plugin after the virtual file tree.
  pub fn plugin(&mut self, plugin: impl Plugin + 'static) -> &mut Self {
    self.plugins.push(Box::new(plugin));
    self
  }

  pub fn entry_point(&mut self, value: impl AsRef<str>) -> &mut Self {
    self.entry_point = value.as_ref().to_string();
    self
  }

  pub async fn build(&mut self) -> ModuleGraph {
    let mut config =
      GraphConfig::new().with_plugin(std::mem::take(&mut self.files));
    config.plugins.extend(self.plugins.drain(..));
    build_graph(&self.entry_point, &config).await
  }
}

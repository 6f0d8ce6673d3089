// Copyright 2018-2024 the Deno authors. All rights reserved. MIT license.

use std::fs;
use std::path::Path;

use module_graph::ModuleGraph;

mod test_builder;

pub use test_builder::*;

pub fn init_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// Writes `files` below `dir`, creating parent directories as needed.
pub fn write_files(dir: &Path, files: &[(&str, &str)]) {
  for (path, text) in files {
    let path = dir.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
  }
}

/// The ids of the modules that import `id`, sorted.
pub fn dependents<'a>(graph: &'a ModuleGraph, id: &str) -> Vec<&'a str> {
  let module = graph
    .get(id)
    .unwrap_or_else(|| panic!("missing module {id}"));
  let mut ids = module
    .dependents()
    .iter()
    .map(|id| id.as_str())
    .collect::<Vec<_>>();
  ids.sort();
  ids
}

// Copyright 2018-2024 the Deno authors. MIT license.

use std::path::PathBuf;
use std::sync::Arc;

use deno_error::JsErrorBox;
use thiserror::Error;

use crate::config::GraphConfig;
use crate::graph::Module;
use crate::graph::ModuleGraphError;
use crate::module_id::ModuleId;

#[derive(Debug, Error, deno_error::JsError)]
pub enum ResolveError {
  #[class(type)]
  #[error("Invalid module specifier \"{0}\". Expected a path starting with \"/\" or \".\", or a bare package name.")]
  InvalidSpecifier(String),
  #[class("NotFound")]
  #[error("Cannot find module \"{}\".", .0.display())]
  ModuleNotFound(PathBuf),
  #[class(inherit)]
  #[error(transparent)]
  Other(#[from] JsErrorBox),
}

#[derive(Debug, Error, deno_error::JsError)]
pub enum LoadError {
  #[class(inherit)]
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[class(inherit)]
  #[error(transparent)]
  Other(#[from] JsErrorBox),
}

/// The result of a plugin's load hook. `Ok(None)` means the plugin does not
/// provide a source for the module.
pub type LoadResult = Result<Option<Arc<str>>, LoadError>;

/// Resolves `specifier`, as imported by `importer`, to a canonical module id
/// using the resolve hooks of the configured plugins.
pub fn resolve_specifier(
  specifier: &str,
  config: &GraphConfig,
  importer: Option<&Module>,
) -> Result<ModuleId, ModuleGraphError> {
  let maybe_importer = || importer.map(|module| module.id.clone());
  let result = config
    .chain()
    .first_match(|plugin| plugin.resolve(specifier, config, importer));
  match result {
    Ok(Some(resolved)) => {
      log::debug!(
        "Resolved \"{}\" to \"{}\" ({}).",
        specifier,
        resolved.value,
        resolved.plugin.name()
      );
      Ok(resolved.value)
    }
    Ok(None) => Err(ModuleGraphError::UnresolvableSpecifier {
      specifier: specifier.to_string(),
      maybe_importer: maybe_importer(),
      maybe_source: None,
    }),
    Err(ResolveError::InvalidSpecifier(_)) => {
      Err(ModuleGraphError::InvalidSpecifier {
        specifier: specifier.to_string(),
        maybe_importer: maybe_importer(),
      })
    }
    Err(ResolveError::ModuleNotFound(path)) => {
      Err(ModuleGraphError::ModuleNotFound {
        specifier: specifier.to_string(),
        maybe_importer: maybe_importer(),
        path,
      })
    }
    Err(ResolveError::Other(err)) => {
      Err(ModuleGraphError::UnresolvableSpecifier {
        specifier: specifier.to_string(),
        maybe_importer: maybe_importer(),
        maybe_source: Some(err),
      })
    }
  }
}

/// Loads the source text of a resolved module using the load hooks of the
/// configured plugins.
pub async fn load_source(
  id: &ModuleId,
  config: &GraphConfig,
) -> Result<Arc<str>, ModuleGraphError> {
  let result = config
    .chain()
    .first_match_async(|plugin| plugin.load(id, config))
    .await;
  match result {
    Ok(Some(loaded)) => {
      log::debug!("Loaded \"{}\" ({}).", id, loaded.plugin.name());
      Ok(loaded.value)
    }
    Ok(None) => Err(ModuleGraphError::LoadFailed {
      id: id.clone(),
      maybe_source: None,
    }),
    Err(err) => Err(ModuleGraphError::LoadFailed {
      id: id.clone(),
      maybe_source: Some(err),
    }),
  }
}

/// Runs the transform hooks over loaded source text. The text is returned
/// unchanged when no plugin transforms it.
pub fn transform_source(
  id: &ModuleId,
  code: &Arc<str>,
  config: &GraphConfig,
) -> Result<Arc<str>, ModuleGraphError> {
  let result = config
    .chain()
    .first_match(|plugin| plugin.transform(id, code, config));
  match result {
    Ok(Some(transformed)) => {
      log::debug!("Transformed \"{}\" ({}).", id, transformed.plugin.name());
      Ok(transformed.value)
    }
    Ok(None) => Ok(code.clone()),
    Err(err) => Err(ModuleGraphError::LoadFailed {
      id: id.clone(),
      maybe_source: Some(LoadError::Other(err)),
    }),
  }
}

#[cfg(test)]
pub mod tests {
  use async_trait::async_trait;
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::plugin::Plugin;
  use crate::plugins::VirtualFsPlugin;

  /// Resolves every specifier by mapping it through a fixed table.
  #[derive(Debug)]
  pub(crate) struct MockResolver {
    map: Vec<(&'static str, Result<&'static str, &'static str>)>,
  }

  impl MockResolver {
    pub fn new(
      map: Vec<(&'static str, Result<&'static str, &'static str>)>,
    ) -> Self {
      Self { map }
    }
  }

  #[async_trait(?Send)]
  impl Plugin for MockResolver {
    fn name(&self) -> &str {
      "mock-resolver"
    }

    fn resolve(
      &self,
      specifier: &str,
      _config: &GraphConfig,
      _importer: Option<&Module>,
    ) -> Result<Option<ModuleId>, ResolveError> {
      match self.map.iter().find(|(s, _)| *s == specifier) {
        Some((_, Ok(id))) => Ok(Some(ModuleId::from(*id))),
        Some((_, Err("invalid"))) => {
          Err(ResolveError::InvalidSpecifier(specifier.to_string()))
        }
        Some((_, Err("missing"))) => {
          Err(ResolveError::ModuleNotFound(PathBuf::from(specifier)))
        }
        Some((_, Err(message))) => {
          Err(ResolveError::Other(JsErrorBox::generic(message.to_string())))
        }
        None => Ok(None),
      }
    }
  }

  #[derive(Debug)]
  struct UppercaseTransform;

  #[async_trait(?Send)]
  impl Plugin for UppercaseTransform {
    fn name(&self) -> &str {
      "uppercase"
    }

    fn transform(
      &self,
      id: &ModuleId,
      code: &Arc<str>,
      _config: &GraphConfig,
    ) -> Result<Option<Arc<str>>, JsErrorBox> {
      if id.ends_with(".fail") {
        return Err(JsErrorBox::generic("cannot transform"));
      }
      Ok(id.ends_with(".up").then(|| code.to_uppercase().into()))
    }
  }

  #[test]
  fn resolve_maps_hook_errors_to_graph_errors() {
    let config = GraphConfig::new().with_plugin(MockResolver::new(vec![
      ("a", Ok("/a.js")),
      ("#b", Err("invalid")),
      ("./c", Err("missing")),
      ("d", Err("exploded")),
    ]));
    assert_eq!(
      resolve_specifier("a", &config, None).unwrap().as_str(),
      "/a.js"
    );
    assert!(matches!(
      resolve_specifier("#b", &config, None),
      Err(ModuleGraphError::InvalidSpecifier { .. })
    ));
    assert!(matches!(
      resolve_specifier("./c", &config, None),
      Err(ModuleGraphError::ModuleNotFound { .. })
    ));
    assert!(matches!(
      resolve_specifier("d", &config, None),
      Err(ModuleGraphError::UnresolvableSpecifier {
        maybe_source: Some(_),
        ..
      })
    ));
    let err = resolve_specifier("e", &config, None).unwrap_err();
    assert!(matches!(
      err,
      ModuleGraphError::UnresolvableSpecifier {
        maybe_source: None,
        ..
      }
    ));
    assert_eq!(err.to_string(), "Unable to resolve \"e\".");
  }

  #[tokio::test]
  async fn load_without_plugin_fails() {
    let config = GraphConfig::new();
    let err = load_source(&ModuleId::from("a.js"), &config)
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      ModuleGraphError::LoadFailed {
        maybe_source: None,
        ..
      }
    ));
  }

  #[tokio::test]
  async fn load_uses_first_plugin_with_source() {
    let config = GraphConfig::new()
      .with_plugin(VirtualFsPlugin::new(vec![("a.js", "first")]))
      .with_plugin(VirtualFsPlugin::new(vec![
        ("a.js", "second"),
        ("b.js", "only second"),
      ]));
    let a = load_source(&ModuleId::from("a.js"), &config).await.unwrap();
    assert_eq!(&*a, "first");
    let b = load_source(&ModuleId::from("b.js"), &config).await.unwrap();
    assert_eq!(&*b, "only second");
  }

  #[test]
  fn transform_defaults_to_identity() {
    let config = GraphConfig::new().with_plugin(UppercaseTransform);
    let code: Arc<str> = "export const a = 1;".into();
    let unchanged =
      transform_source(&ModuleId::from("a.js"), &code, &config).unwrap();
    assert!(Arc::ptr_eq(&unchanged, &code));
    let changed =
      transform_source(&ModuleId::from("a.up"), &code, &config).unwrap();
    assert_eq!(&*changed, "EXPORT CONST A = 1;");
    assert!(matches!(
      transform_source(&ModuleId::from("a.fail"), &code, &config),
      Err(ModuleGraphError::LoadFailed { .. })
    ));
  }
}

// Copyright 2018-2024 the Deno authors. MIT license.

use std::borrow::Cow;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use sys_traits::impls::RealSys;
use sys_traits::FsMetadata;
use sys_traits::FsRead;

use crate::config::GraphConfig;
use crate::graph::Module;
use crate::module_id::ModuleId;
use crate::plugin::Plugin;
use crate::source::LoadError;
use crate::source::LoadResult;
use crate::source::ResolveError;

/// Prefix of the ids given to bare package imports. Modules with such an id
/// are never read from disk.
pub const EXTERNAL_PREFIX: &str = "@fs/";

static BARE_SPECIFIER_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^@?[a-zA-Z]").unwrap());

fn default_base() -> PathBuf {
  std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_extensions() -> Vec<String> {
  [".js", ".ts", ".jsx", ".tsx"]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FsPluginOptions {
  /// Directory that `/`-rooted specifiers, and relative specifiers without
  /// an importer, are resolved against.
  pub base: PathBuf,
  /// Replaces the first path segment of a specifier when it matches a key
  /// exactly.
  pub alias: IndexMap<String, String>,
  /// Extensions tried, in order, when a path does not exist as written.
  pub extensions: Vec<String>,
}

impl Default for FsPluginOptions {
  fn default() -> Self {
    Self {
      base: default_base(),
      alias: IndexMap::new(),
      extensions: default_extensions(),
    }
  }
}

impl FsPluginOptions {
  pub fn new(base: impl Into<PathBuf>) -> Self {
    Self {
      base: base.into(),
      ..Default::default()
    }
  }

  pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(text)
  }

  pub fn with_alias(
    mut self,
    key: impl Into<String>,
    target: impl Into<String>,
  ) -> Self {
    self.alias.insert(key.into(), target.into());
    self
  }
}

/// Resolves specifiers to absolute paths on a file system and reads module
/// sources from it. Bare package imports are resolved to external ids that
/// this plugin does not load.
pub struct FsPlugin<TSys = RealSys> {
  sys: TSys,
  options: FsPluginOptions,
}

impl<TSys> fmt::Debug for FsPlugin<TSys> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FsPlugin")
      .field("options", &self.options)
      .finish()
  }
}

impl FsPlugin<RealSys> {
  pub fn new(options: FsPluginOptions) -> Self {
    Self::with_sys(RealSys, options)
  }
}

impl<TSys: FsMetadata + FsRead> FsPlugin<TSys> {
  pub fn with_sys(sys: TSys, options: FsPluginOptions) -> Self {
    Self { sys, options }
  }

  pub fn options(&self) -> &FsPluginOptions {
    &self.options
  }

  pub fn resolve_path(
    &self,
    specifier: &str,
    maybe_importer: Option<&ModuleId>,
  ) -> Result<ModuleId, ResolveError> {
    // `./logo.svg?inline` is `./logo.svg`
    let specifier = specifier
      .split_once('?')
      .map(|(path, _)| path)
      .unwrap_or(specifier);
    let specifier = match self.apply_alias(specifier) {
      Some(aliased) => Cow::Owned(aliased),
      None if BARE_SPECIFIER_RE.is_match(specifier) => {
        return Ok(ModuleId::new(format!("{EXTERNAL_PREFIX}{specifier}")));
      }
      None => Cow::Borrowed(specifier),
    };

    let path = if let Some(rest) = specifier.strip_prefix('/') {
      self.options.base.join(rest)
    } else if specifier.starts_with('.') {
      let dir = maybe_importer
        .and_then(|importer| Path::new(importer.as_str()).parent())
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(self.options.base.as_path());
      dir.join(&*specifier)
    } else {
      return Err(ResolveError::InvalidSpecifier(specifier.into_owned()));
    };

    let mut path =
      deno_path_util::normalize_path(Cow::Owned(path)).into_owned();
    if self.sys.fs_is_dir_no_err(&path) {
      path.push("index");
    }
    if !self.sys.fs_exists_no_err(&path) {
      let maybe_found = self
        .options
        .extensions
        .iter()
        .map(|ext| with_appended_extension(&path, ext))
        .find(|candidate| self.sys.fs_exists_no_err(candidate));
      path = match maybe_found {
        Some(found) => found,
        None => return Err(ResolveError::ModuleNotFound(path)),
      };
    }
    Ok(ModuleId::new(path.to_string_lossy()))
  }

  fn apply_alias(&self, specifier: &str) -> Option<String> {
    let (first, rest) = match specifier.find('/') {
      Some(index) => specifier.split_at(index),
      None => (specifier, ""),
    };
    let target = self.options.alias.get(first)?;
    Some(format!("{target}{rest}"))
  }
}

#[async_trait(?Send)]
impl<TSys: FsMetadata + FsRead> Plugin for FsPlugin<TSys> {
  fn name(&self) -> &str {
    "fs"
  }

  fn resolve(
    &self,
    specifier: &str,
    _config: &GraphConfig,
    importer: Option<&Module>,
  ) -> Result<Option<ModuleId>, ResolveError> {
    self
      .resolve_path(specifier, importer.map(|module| &module.id))
      .map(Some)
  }

  async fn load(&self, id: &ModuleId, _config: &GraphConfig) -> LoadResult {
    if id.starts_with(EXTERNAL_PREFIX) {
      return Ok(None);
    }
    match self.sys.fs_read_to_string(Path::new(id.as_str())) {
      Ok(text) => Ok(Some(text.into_owned().into())),
      Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
      Err(err) => Err(LoadError::Io(err)),
    }
  }
}

fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
  let mut path = path.as_os_str().to_owned();
  path.push(ext);
  PathBuf::from(path)
}

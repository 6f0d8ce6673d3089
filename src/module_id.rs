// Copyright 2018-2024 the Deno authors. MIT license.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

pub type ModuleSpecifier = url::Url;

/// Base used to turn ids that are not urls or absolute paths into a
/// specifier for parser diagnostics.
static ID_BASE_URL: Lazy<Url> =
  Lazy::new(|| Url::parse("file:///").unwrap());

/// The canonical identity of a module in the graph.
///
/// Ids are produced by resolve hooks and are opaque to the graph builder. The
/// filesystem plugin produces absolute paths, the virtual file tree plugin
/// uses the raw specifier, and external packages are marked with an `@fs/`
/// prefix.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn into_string(self) -> String {
    self.0
  }

  /// Converts the id to a url that can be handed to the parser so
  /// diagnostics point somewhere meaningful.
  pub fn to_specifier(&self) -> ModuleSpecifier {
    let path = Path::new(&self.0);
    if path.is_absolute() {
      if let Ok(url) = deno_path_util::url_from_file_path(path) {
        return url;
      }
    }
    match Url::parse(&self.0) {
      // single letter schemes are windows drive letters
      Ok(url) if url.scheme().len() > 1 => url,
      _ => ID_BASE_URL
        .join(&self.0)
        .unwrap_or_else(|_| ID_BASE_URL.clone()),
    }
  }
}

impl fmt::Display for ModuleId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl Deref for ModuleId {
  type Target = str;

  fn deref(&self) -> &str {
    &self.0
  }
}

impl Borrow<str> for ModuleId {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl AsRef<str> for ModuleId {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl From<&str> for ModuleId {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

impl From<String> for ModuleId {
  fn from(value: String) -> Self {
    Self(value)
  }
}

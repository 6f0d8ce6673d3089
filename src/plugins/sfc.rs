// Copyright 2018-2024 the Deno authors. MIT license.

use std::sync::Arc;

use async_trait::async_trait;
use deno_ast::MediaType;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::parse_with_media_type;
use crate::ast::DefaultEsParser;
use crate::ast::ParseError;
use crate::ast::SyntaxTree;
use crate::module_id::ModuleId;
use crate::plugin::Plugin;

static SCRIPT_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
  // quoted attribute values may contain `>`
  Regex::new(r#"(?is)<script\b((?:[^>"']|"[^"]*"|'[^']*')*)>(.*?)</script\s*>"#)
    .unwrap()
});
static TS_LANG_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"(?i)\blang\s*=\s*["']?(ts|tsx|typescript)\b"#).unwrap()
});

/// Source used for components without a script block.
const EMPTY_COMPONENT: &str = "export default {}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBlocks {
  /// The contents of every script block, joined in document order.
  pub content: String,
  /// Whether any block declares a TypeScript `lang`.
  pub is_typescript: bool,
}

/// Extracts the script blocks of a single file component.
pub fn extract_script_blocks(source: &str) -> Option<ScriptBlocks> {
  let mut blocks = SCRIPT_BLOCK_RE.captures_iter(source).peekable();
  blocks.peek()?;
  let mut content = String::new();
  let mut is_typescript = false;
  for block in blocks {
    is_typescript |= TS_LANG_RE.is_match(&block[1]);
    content.push_str(&block[2]);
    content.push('\n');
  }
  Some(ScriptBlocks {
    content,
    is_typescript,
  })
}

/// Parses single file components (`.vue` files by default) by extracting
/// their `<script>` blocks. Components without a script block parse as an
/// empty default export.
#[derive(Debug, Clone)]
pub struct SfcPlugin {
  extensions: Vec<String>,
}

impl Default for SfcPlugin {
  fn default() -> Self {
    Self {
      extensions: vec![".vue".to_string()],
    }
  }
}

impl SfcPlugin {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_extensions(
    extensions: impl IntoIterator<Item = impl Into<String>>,
  ) -> Self {
    Self {
      extensions: extensions.into_iter().map(Into::into).collect(),
    }
  }

  fn handles(&self, id: &ModuleId) -> bool {
    self.extensions.iter().any(|ext| id.ends_with(ext.as_str()))
  }
}

#[async_trait(?Send)]
impl Plugin for SfcPlugin {
  fn name(&self) -> &str {
    "sfc"
  }

  fn parse(
    &self,
    id: &ModuleId,
    code: &Arc<str>,
  ) -> Result<Option<SyntaxTree>, ParseError> {
    if !self.handles(id) {
      return Ok(None);
    }
    let (script, media_type) = match extract_script_blocks(code) {
      Some(blocks) if blocks.is_typescript => {
        (blocks.content, MediaType::TypeScript)
      }
      Some(blocks) => (blocks.content, MediaType::JavaScript),
      None => (EMPTY_COMPONENT.to_string(), MediaType::JavaScript),
    };
    parse_with_media_type(&DefaultEsParser, id, script.into(), media_type)
      .map(Some)
  }
}

// Copyright 2018-2024 the Deno authors. MIT license.

use std::fmt;
use std::sync::Arc;

use deno_ast::swc::ast::ModuleDecl;
use deno_ast::swc::ast::ModuleItem;
use deno_ast::MediaType;
use deno_ast::ParseDiagnostic;
use deno_ast::ParsedSource;
use deno_ast::ProgramRef;
use deno_error::JsErrorBox;
use thiserror::Error;

use crate::config::GraphConfig;
use crate::graph::ModuleGraphError;
use crate::module_id::ModuleId;

#[derive(Debug, Error, deno_error::JsError)]
pub enum ParseError {
  #[class(generic)]
  #[error(transparent)]
  Diagnostic(#[from] ParseDiagnostic),
  #[class(inherit)]
  #[error(transparent)]
  Other(#[from] JsErrorBox),
}

pub struct ParseOptions<'a> {
  pub id: &'a ModuleId,
  pub source: Arc<str>,
  pub media_type: MediaType,
}

/// Parses programs to a ParsedSource.
pub trait EsParser {
  fn parse_program(
    &self,
    options: ParseOptions,
  ) -> Result<ParsedSource, ParseDiagnostic>;
}

#[derive(Default, Clone)]
pub struct DefaultEsParser;

impl EsParser for DefaultEsParser {
  fn parse_program(
    &self,
    options: ParseOptions,
  ) -> Result<ParsedSource, ParseDiagnostic> {
    deno_ast::parse_program(deno_ast::ParseParams {
      specifier: options.id.to_specifier(),
      text: options.source,
      media_type: options.media_type,
      capture_tokens: false,
      scope_analysis: false,
      maybe_syntax: None,
    })
  }
}

/// Picks the dialect to parse a module with from the extension of its id.
/// Ids without a known extension are parsed as JavaScript.
pub fn media_type_for_id(id: &ModuleId) -> MediaType {
  match MediaType::from_specifier(&id.to_specifier()) {
    MediaType::Unknown => MediaType::JavaScript,
    media_type => media_type,
  }
}

/// Parses `source` with an explicit dialect, wrapping the result for use as
/// a parse hook's return value.
pub fn parse_with_media_type(
  parser: &dyn EsParser,
  id: &ModuleId,
  source: Arc<str>,
  media_type: MediaType,
) -> Result<SyntaxTree, ParseError> {
  let parsed_source = parser.parse_program(ParseOptions {
    id,
    source,
    media_type,
  })?;
  Ok(SyntaxTree::new(parsed_source))
}

/// A top level statement of a module, reduced to what the graph builder
/// needs to know about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopLevelStatement {
  /// `import ... from "specifier"` or `import "specifier"`.
  Import { specifier: String, type_only: bool },
  /// `export ... from "specifier"` or `export * from "specifier"`.
  ReExport { specifier: String, type_only: bool },
  Other,
}

impl TopLevelStatement {
  fn from_module_item(item: &ModuleItem) -> Self {
    match item {
      ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) => Self::Import {
        specifier: decl.src.value.to_string(),
        type_only: decl.type_only,
      },
      ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(decl)) => {
        match &decl.src {
          Some(src) => Self::ReExport {
            specifier: src.value.to_string(),
            type_only: decl.type_only,
          },
          None => Self::Other,
        }
      }
      ModuleItem::ModuleDecl(ModuleDecl::ExportAll(decl)) => Self::ReExport {
        specifier: decl.src.value.to_string(),
        type_only: decl.type_only,
      },
      _ => Self::Other,
    }
  }

  /// The module specifier of an import or re-export.
  pub fn specifier(&self) -> Option<&str> {
    match self {
      Self::Import { specifier, .. } | Self::ReExport { specifier, .. } => {
        Some(specifier.as_str())
      }
      Self::Other => None,
    }
  }
}

/// The parsed form of a module's source text.
#[derive(Clone)]
pub struct SyntaxTree {
  parsed_source: ParsedSource,
}

impl fmt::Debug for SyntaxTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SyntaxTree")
      .field("specifier", &self.parsed_source.specifier().as_str())
      .field("media_type", &self.parsed_source.media_type())
      .finish()
  }
}

impl SyntaxTree {
  pub fn new(parsed_source: ParsedSource) -> Self {
    Self { parsed_source }
  }

  pub fn parsed_source(&self) -> &ParsedSource {
    &self.parsed_source
  }

  pub fn media_type(&self) -> MediaType {
    self.parsed_source.media_type()
  }

  /// The top level statements of the program in source order. Every
  /// statement of a script is [`TopLevelStatement::Other`].
  pub fn statements(&self) -> Vec<TopLevelStatement> {
    match self.parsed_source.program_ref() {
      ProgramRef::Module(module) => module
        .body
        .iter()
        .map(TopLevelStatement::from_module_item)
        .collect(),
      ProgramRef::Script(script) => {
        script.body.iter().map(|_| TopLevelStatement::Other).collect()
      }
    }
  }

  /// The specifiers of the static imports and re-exports, in source order.
  /// A specifier appears once per statement that names it.
  pub fn import_specifiers(&self) -> Vec<String> {
    self
      .statements()
      .into_iter()
      .filter_map(|statement| match statement {
        TopLevelStatement::Import { specifier, .. }
        | TopLevelStatement::ReExport { specifier, .. } => Some(specifier),
        TopLevelStatement::Other => None,
      })
      .collect()
  }
}

/// Parses loaded source text with the parse hooks of the configured plugins,
/// falling back to the default parser when none of them handles the module.
pub fn parse_source(
  id: &ModuleId,
  code: &Arc<str>,
  config: &GraphConfig,
) -> Result<SyntaxTree, ModuleGraphError> {
  let result = config.chain().first_match(|plugin| plugin.parse(id, code));
  let result = match result {
    Ok(Some(parsed)) => {
      log::debug!("Parsed \"{}\" ({}).", id, parsed.plugin.name());
      Ok(parsed.value)
    }
    Ok(None) => parse_with_media_type(
      &DefaultEsParser,
      id,
      code.clone(),
      media_type_for_id(id),
    ),
    Err(err) => Err(err),
  };
  result.map_err(|error| ModuleGraphError::ParseFailed {
    id: id.clone(),
    error,
  })
}

#[cfg(test)]
mod tests {
  use async_trait::async_trait;
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::plugin::Plugin;

  fn parse(id: &str, source: &str) -> SyntaxTree {
    parse_source(&ModuleId::from(id), &source.into(), &GraphConfig::new())
      .unwrap()
  }

  fn import(specifier: &str) -> TopLevelStatement {
    TopLevelStatement::Import {
      specifier: specifier.to_string(),
      type_only: false,
    }
  }

  fn re_export(specifier: &str) -> TopLevelStatement {
    TopLevelStatement::ReExport {
      specifier: specifier.to_string(),
      type_only: false,
    }
  }

  #[test]
  fn test_statements() {
    let tree = parse(
      "mod.js",
      r#"
import a from "./a.js";
import "./side-effect.js";
const local = 1;
export { local };
export { b } from "./b.js";
export * from "./c.js";
export * as ns from "./d.js";
export default function () {
  return import("./dynamic.js");
}
"#,
    );
    assert_eq!(
      tree.statements(),
      vec![
        import("./a.js"),
        import("./side-effect.js"),
        TopLevelStatement::Other,
        TopLevelStatement::Other,
        re_export("./b.js"),
        re_export("./c.js"),
        re_export("./d.js"),
        TopLevelStatement::Other,
      ]
    );
    assert_eq!(
      tree.import_specifiers(),
      vec![
        "./a.js",
        "./side-effect.js",
        "./b.js",
        "./c.js",
        "./d.js"
      ]
    );
  }

  #[test]
  fn test_repeated_specifier() {
    let tree = parse(
      "mod.js",
      "import { a } from './a.js';\nimport { b } from './a.js';\n",
    );
    assert_eq!(tree.import_specifiers(), vec!["./a.js", "./a.js"]);
  }

  #[test]
  fn test_type_only_imports() {
    let tree = parse(
      "mod.ts",
      r#"
import type { A } from "./types.ts";
export type { B } from "./other.ts";
@decorator
class Foo {
  constructor(private value: A) {}
}
"#,
    );
    assert_eq!(tree.media_type(), MediaType::TypeScript);
    assert_eq!(
      &tree.statements()[..2],
      &[
        TopLevelStatement::Import {
          specifier: "./types.ts".to_string(),
          type_only: true,
        },
        TopLevelStatement::ReExport {
          specifier: "./other.ts".to_string(),
          type_only: true,
        },
      ]
    );
  }

  #[test]
  fn test_dialect_from_extension() {
    let tree = parse(
      "/app/App.tsx",
      "import React from 'react';\nexport const App = () => <div>{React.version}</div>;\n",
    );
    assert_eq!(tree.media_type(), MediaType::Tsx);
    assert_eq!(tree.import_specifiers(), vec!["react"]);

    let tree = parse("/app/view.jsx", "export default <p>hi</p>;\n");
    assert_eq!(tree.media_type(), MediaType::Jsx);

    let tree = parse("lodash", "export default 1;\n");
    assert_eq!(tree.media_type(), MediaType::JavaScript);
  }

  #[test]
  fn test_parse_failure() {
    let err = parse_source(
      &ModuleId::from("broken.js"),
      &"import { from './a.js';".into(),
      &GraphConfig::new(),
    )
    .unwrap_err();
    assert!(matches!(
      err,
      ModuleGraphError::ParseFailed {
        error: ParseError::Diagnostic(_),
        ..
      }
    ));
  }

  #[derive(Debug)]
  struct AlwaysTypeScript;

  #[async_trait(?Send)]
  impl Plugin for AlwaysTypeScript {
    fn name(&self) -> &str {
      "always-typescript"
    }

    fn parse(
      &self,
      id: &ModuleId,
      code: &Arc<str>,
    ) -> Result<Option<SyntaxTree>, ParseError> {
      parse_with_media_type(
        &DefaultEsParser,
        id,
        code.clone(),
        MediaType::TypeScript,
      )
      .map(Some)
    }
  }

  #[test]
  fn test_parse_hook_overrides_default() {
    let config = GraphConfig::new().with_plugin(AlwaysTypeScript);
    let tree = parse_source(
      &ModuleId::from("component.weird"),
      &"import type { A } from './a';\nlet a: A;\n".into(),
      &config,
    )
    .unwrap();
    assert_eq!(tree.media_type(), MediaType::TypeScript);
    assert_eq!(tree.import_specifiers(), vec!["./a"]);
  }
}

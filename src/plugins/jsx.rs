// Copyright 2018-2024 the Deno authors. MIT license.

use std::sync::Arc;

use async_trait::async_trait;
use deno_ast::MediaType;

use crate::ast::media_type_for_id;
use crate::ast::parse_with_media_type;
use crate::ast::DefaultEsParser;
use crate::ast::ParseError;
use crate::ast::SyntaxTree;
use crate::module_id::ModuleId;
use crate::plugin::Plugin;

/// Parses every module with JSX enabled, regardless of its extension.
///
/// Modules with a TypeScript extension are parsed as TSX, everything else as
/// JSX.
#[derive(Debug, Default, Clone)]
pub struct JsxPlugin;

impl JsxPlugin {
  pub fn new() -> Self {
    Self
  }

  fn media_type(id: &ModuleId) -> MediaType {
    match media_type_for_id(id) {
      MediaType::TypeScript
      | MediaType::Mts
      | MediaType::Cts
      | MediaType::Dts
      | MediaType::Dmts
      | MediaType::Dcts
      | MediaType::Tsx => MediaType::Tsx,
      _ => MediaType::Jsx,
    }
  }
}

#[async_trait(?Send)]
impl Plugin for JsxPlugin {
  fn name(&self) -> &str {
    "jsx"
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
      Self::media_type(id),
    )
    .map(Some)
  }
}

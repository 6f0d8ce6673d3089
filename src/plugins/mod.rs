// Copyright 2018-2024 the Deno authors. MIT license.

mod fs;
mod jsx;
mod sfc;
mod virtual_fs;

pub use fs::FsPlugin;
pub use fs::FsPluginOptions;
pub use fs::EXTERNAL_PREFIX;
pub use jsx::JsxPlugin;
pub use sfc::extract_script_blocks;
pub use sfc::ScriptBlocks;
pub use sfc::SfcPlugin;
pub use virtual_fs::Source;
pub use virtual_fs::VirtualFsPlugin;
pub use virtual_fs::VirtualFsSources;

//! Core library for packing images into a single texture atlas.
//!
//! - Allocator: binary tree of rectangles (`packer::tree`), one image per occupied node
//! - Pipeline: `pack_images` sorts inputs by diagonal, places them, composes the RGBA canvas
//!   and returns the description plus the names of images that did not fit
//! - Exporters: XML (`to_xml`) and JSON (`to_json`); `write_outputs` writes both artifacts atomically
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use tree_atlas_core::{PackerConfig, SourceImage, pack_images};
//! # fn main() -> anyhow::Result<()> {
//! let a = ImageReader::open("a.png")?.decode()?;
//! let b = ImageReader::open("b.png")?.decode()?;
//! let inputs = vec![SourceImage::from_dynamic("a", a), SourceImage::from_dynamic("b", b)];
//! let cfg = PackerConfig { width: 1024, height: 1024, margin: 2, ..Default::default() };
//! let out = pack_images(inputs, cfg)?;
//! println!("placed: {}, unplaced: {:?}", out.description.summary.count, out.unplaced);
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod export_xml;
pub mod model;
pub mod output;
pub mod packer;
pub mod pipeline;

pub use config::*;
pub use error::*;
pub use export::*;
pub use export_xml::*;
pub use model::*;
pub use output::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `tree_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{DescriptionFormat, PackerConfig, PackerConfigBuilder, SortOrder};
    pub use crate::model::{AtlasDescription, AtlasSummary, PackStats, PlacementRecord, Rect, SourceImage};
    pub use crate::packer::PackTree;
    pub use crate::{Layout, PackOutput, pack_images, pack_layout, write_outputs};
}

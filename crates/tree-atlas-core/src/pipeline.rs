use crate::compositing::blit_rgba;
use crate::config::{PackerConfig, SortOrder};
use crate::error::Result;
use crate::model::{AtlasDescription, AtlasSummary, Meta, PackStats, PlacementRecord, SourceImage};
use crate::packer::{PackTree, diagonal};
use image::RgbaImage;
use std::cmp::Ordering;
use tracing::{debug, info, instrument, warn};

/// Output of a packing run: the composed canvas, its description, and the
/// names of images that did not fit.
pub struct PackOutput {
    pub description: AtlasDescription,
    pub rgba: RgbaImage,
    /// Names of images that fit nowhere, in insertion order.
    pub unplaced: Vec<String>,
}

impl PackOutput {
    pub fn stats(&self) -> PackStats {
        PackStats::from_description(&self.description, self.unplaced.len())
    }

    /// True when every input image was placed.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }
}

/// Output of a layout-only run (no pixel data).
#[derive(Debug, Clone)]
pub struct Layout {
    pub description: AtlasDescription,
    pub unplaced: Vec<String>,
}

impl Layout {
    pub fn stats(&self) -> PackStats {
        PackStats::from_description(&self.description, self.unplaced.len())
    }
}

/// Orders two `(width, height)` sizes by their diagonal, smallest first.
pub fn compare_diagonal(a: (u32, u32), b: (u32, u32)) -> Ordering {
    let da = diagonal(a.0 as i64, a.1 as i64);
    let db = diagonal(b.0 as i64, b.1 as i64);
    da.total_cmp(&db)
}

/// Indices of `sizes` in the order they are inserted into the tree.
///
/// Uses `slice::sort_by`, which is stable: equal diagonals keep their input
/// order in both directions.
pub fn insertion_order(sizes: &[(u32, u32)], order: SortOrder) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..sizes.len()).collect();
    match order {
        SortOrder::DiagonalAsc => idx.sort_by(|&a, &b| compare_diagonal(sizes[a], sizes[b])),
        SortOrder::DiagonalDesc => idx.sort_by(|&a, &b| compare_diagonal(sizes[b], sizes[a])),
        SortOrder::None => {}
    }
    idx
}

/// Inserts every size into a fresh tree in `order`. Returns the tree and the
/// indices that could not be placed.
fn place_all<F>(
    sizes: &[(u32, u32)],
    order: &[usize],
    cfg: &PackerConfig,
    name_of: F,
) -> (PackTree, Vec<usize>)
where
    F: Fn(usize) -> String,
{
    let mut tree = PackTree::new(cfg.width, cfg.height, cfg.margin);
    let mut unplaced = Vec::new();
    for &i in order {
        let (w, h) = sizes[i];
        match tree.try_place(i, w, h) {
            Some(node) => debug!(name = %name_of(i), w, h, node, "placed"),
            None => {
                warn!(name = %name_of(i), w, h, "image does not fit in the atlas");
                unplaced.push(i);
            }
        }
    }
    (tree, unplaced)
}

fn build_meta(cfg: &PackerConfig) -> Meta {
    Meta {
        schema_version: "1".into(),
        app: "tree-atlas".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        format: "RGBA8888".into(),
        margin: cfg.margin,
        sort_order: cfg.sort_order,
    }
}

#[instrument(skip_all, fields(inputs = inputs.len()))]
/// Packs `inputs` into a single `cfg.width x cfg.height` atlas.
///
/// Notes:
/// - Images are sorted by diagonal (stable) and inserted one by one; an image
///   that fits nowhere is skipped and reported in `unplaced`.
/// - The canvas starts transparent black; placed pixels are copied verbatim.
/// - `description.frames` follows the tree's pre-order traversal.
pub fn pack_images(inputs: Vec<SourceImage>, cfg: PackerConfig) -> Result<PackOutput> {
    cfg.validate()?;

    let sizes: Vec<(u32, u32)> = inputs.iter().map(|i| (i.width(), i.height())).collect();
    let order = insertion_order(&sizes, cfg.sort_order);
    let (tree, unplaced_idx) = place_all(&sizes, &order, &cfg, |i| inputs[i].name().to_string());

    let mut canvas = RgbaImage::new(cfg.width, cfg.height);
    let mut frames = Vec::with_capacity(tree.placed_count());
    for p in tree.occupied_preorder() {
        let src = &inputs[p.item];
        frames.push(PlacementRecord {
            name: src.name().to_string(),
            frame: p.frame,
        });
        blit_rgba(src.rgba(), &mut canvas, p.frame.x, p.frame.y);
    }

    let unplaced: Vec<String> = unplaced_idx
        .into_iter()
        .map(|i| inputs[i].name().to_string())
        .collect();
    let description = AtlasDescription {
        summary: AtlasSummary {
            count: frames.len(),
            width: cfg.width,
            height: cfg.height,
        },
        frames,
        meta: build_meta(&cfg),
    };
    info!(
        placed = description.summary.count,
        unplaced = unplaced.len(),
        "packing finished"
    );

    Ok(PackOutput {
        description,
        rgba: canvas,
        unplaced,
    })
}

#[instrument(skip_all, fields(inputs = inputs.len()))]
/// Computes placements for `(key, width, height)` items without compositing.
/// Geometry matches `pack_images` for the same sizes and order.
pub fn pack_layout<K: Into<String>>(
    inputs: Vec<(K, u32, u32)>,
    cfg: PackerConfig,
) -> Result<Layout> {
    cfg.validate()?;

    let (names, sizes): (Vec<String>, Vec<(u32, u32)>) = inputs
        .into_iter()
        .map(|(k, w, h)| (k.into(), (w, h)))
        .unzip();
    let order = insertion_order(&sizes, cfg.sort_order);
    let (tree, unplaced_idx) = place_all(&sizes, &order, &cfg, |i| names[i].clone());

    let frames: Vec<PlacementRecord> = tree
        .occupied_preorder()
        .map(|p| PlacementRecord {
            name: names[p.item].clone(),
            frame: p.frame,
        })
        .collect();
    let unplaced = unplaced_idx.into_iter().map(|i| names[i].clone()).collect();

    Ok(Layout {
        description: AtlasDescription {
            summary: AtlasSummary {
                count: frames.len(),
                width: cfg.width,
                height: cfg.height,
            },
            frames,
            meta: build_meta(&cfg),
        },
        unplaced,
    })
}

use crate::model::AtlasDescription;
use serde_json::{Value, json};

/// Serialize the description as `{ description, frames, meta }`.
///
/// `description` holds the summary (`count`, `width`, `height`); `frames` is an
/// array of `{ name, x, y, w, h }` in tree traversal order.
pub fn to_json(desc: &AtlasDescription) -> Value {
    let frames: Vec<Value> = desc
        .frames
        .iter()
        .map(|fr| {
            json!({
                "name": fr.name,
                "x": fr.frame.x,
                "y": fr.frame.y,
                "w": fr.frame.w,
                "h": fr.frame.h,
            })
        })
        .collect();
    json!({
        "description": {
            "count": desc.summary.count,
            "width": desc.summary.width,
            "height": desc.summary.height,
        },
        "frames": frames,
        "meta": &desc.meta,
    })
}

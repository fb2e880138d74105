pub mod tree;

pub use tree::{NodeId, NodeState, OccupiedPreorder, PackNode, PackTree, Placement};

/// Diagonal metric `sqrt(a² + b²)`.
///
/// Ranks images by overall size (`a`, `b` = width, height) and scores how
/// closely a free rectangle matches an image (`a`, `b` = signed size deltas).
pub fn diagonal(a: i64, b: i64) -> f64 {
    let a = a as f64;
    let b = b as f64;
    (a * a + b * b).sqrt()
}

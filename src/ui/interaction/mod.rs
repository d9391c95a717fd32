//! Touch interaction: per-screen tap regions.

mod hit_area;

pub use hit_area::{HitArea, HitRegions};

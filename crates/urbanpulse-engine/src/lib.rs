//! Pure domain logic for the spatial sampling pipeline: probe-grid
//! generation, risk-weight formulas, the bounding-box coverage cache, and
//! query supersession. No network I/O lives in this crate; the only side
//! effect is cache persistence through an injectable store.

pub mod cache;
pub mod grid;
pub mod supersede;
pub mod types;
pub mod weight;

pub use cache::{CacheEntry, CacheStore, CoverageCache, FileStore, MemoryStore};
pub use grid::{generate_grid, GridSpec};
pub use supersede::{QueryGate, QueryTicket};
pub use types::{AmbientConditions, Building, Layer, ProbePoint, RawSample, WeightedPoint};
pub use weight::{
    flood_risk, flood_weight, is_raining, rain_chance, solar_savings_rm, thermal_weight, FloodRisk,
};

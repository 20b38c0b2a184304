pub mod eos;
pub mod exchange;
pub mod field;
pub mod isosurface;
pub mod utils;

/// Conversion constant between GeV and fm^-1.
pub const HBARC: f64 = 0.19733;

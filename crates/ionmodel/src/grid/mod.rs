//! Spatial and vertical discretization of the model.

mod healpix;
mod profile;

pub use healpix::{SpatialGrid, MAX_NSIDE};
pub use profile::{LayerSpec, VerticalProfile};

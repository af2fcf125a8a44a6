//! orbfit: orbital error removal for InSAR interferograms
//!
//! Inaccurate knowledge of the satellite orbit leaves a smooth, low-order
//! polynomial phase ramp across each interferogram. This library estimates
//! that surface, either per interferogram or jointly over a network of
//! interferograms sharing epochs, and subtracts it from the phase in place.

pub mod types;
pub mod io;
pub mod core;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use types::{
    CorrectionMethod, Epoch, Ifg, OrbitalError, OrbitalResult, Phase, PhaseImage, PolyDegree,
};

pub use crate::core::{
    apply_orbital_correction, build_network_design_matrix, build_pixel_design_matrix, num_params,
    OrbitalCorrector, OrbitalParams,
};

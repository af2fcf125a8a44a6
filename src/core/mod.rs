//! Core orbital correction modules

pub mod design_matrix;
pub mod network;
pub mod lstsq;
pub mod multilook;
pub mod orbital;

// Re-export main types
pub use design_matrix::{build_design_matrix, build_pixel_design_matrix, num_params};
pub use network::{build_network_design_matrix, EpochIndex};
pub use lstsq::{solve_least_squares, solve_min_norm, NETWORK_RCOND};
pub use multilook::{MultilookParams, PhaseMultilooker};
pub use orbital::{
    apply_orbital_correction, estimate_network_model, independent_correction, independent_corrections,
    network_correction, NetworkModel, OrbitalCorrector, OrbitalParams,
};

//! Helpers for interferogram metadata supplied by the calling workflow

pub mod ifg_name;

pub use ifg_name::parse_epoch_pair;

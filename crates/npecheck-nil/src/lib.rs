//! npecheck nil - position-ordered nil-chain analysis for Go function bodies

pub mod analysis;
pub mod chain;
pub mod detection;
pub mod recording;
pub mod registry;
pub mod rules;

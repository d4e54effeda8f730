//! test data shared between the ttc-split crates.

pub mod bebuffer;
pub mod ttc;

pub use bebuffer::BeBuffer;

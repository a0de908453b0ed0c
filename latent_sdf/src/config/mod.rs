//! Configuration types for latent_sdf.
//!
//! Burn-style configuration structs for the Fourier positional encoder and
//! the latent-conditioned decoder.

mod network;

pub use network::{FourierEncoderConfig, LatentSdfDecoderConfig, COORD_DIM, LATENT_DROPOUT_PROB};

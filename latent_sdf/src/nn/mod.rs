//! Neural network modules for latent-conditioned SDF decoding.
//!
//! This module provides:
//! - Encoders: random Fourier features for query coordinates
//! - Decoders: map latent codes + coordinates to field values
//! - MLP building blocks shared by the decoder

pub mod decoder;
pub mod encoder;
pub mod mlp;

pub use decoder::{DecoderTrace, LatentSdfDecoder, LayerPlan};
pub use encoder::FourierEncoder;
pub use mlp::{AffineLayer, Mode};

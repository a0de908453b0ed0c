//! # latent_sdf
//!
//! Latent-conditioned neural SDF decoding with Burn.
//!
//! This crate provides a coordinate-based decoder that maps a 3D query point,
//! optionally conditioned on a latent shape code, to a scalar field value
//! (signed distance or occupancy). The architecture is assembled from
//! configuration at construction time.
//!
//! ## Features
//!
//! - **Fourier encoder**: fixed random Fourier features for query coordinates
//! - **SDF decoder**: MLP with latent/coordinate re-injection, weight or layer
//!   normalization, softplus activation, dropout and tanh output
//! - **Checkpoints**: save/load of every parameter, including the Fourier basis
//!
//! ## Quick Start
//!
//! ```ignore
//! use latent_sdf::prelude::*;
//! use burn::backend::NdArray;
//!
//! let device = Default::default();
//! let config = LatentSdfDecoderConfig::new(256, vec![512; 7])
//!     .with_latent_in(vec![4])
//!     .with_norm_layers((0..7).collect())
//!     .with_weight_norm(true)
//!     .with_use_tanh(true);
//! let decoder = config.init::<NdArray>(&device)?;
//!
//! // rows: [latent code (256), x, y, z]
//! let sdf = decoder.forward(rows, Mode::Eval)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! [latent | xyz] ──┬── xyz ── FourierEncoder ──┐
//!                  └── latent ─────────────────┴─► concat ─► layer 0 ─► ... ─► layer L ─► [N, 1]
//!                                                              ▲              ▲
//!                                            latent / xyz re-injection (latent_in, xyz_in_all)
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `ndarray` (default): CPU backend using ndarray
//! - `wgpu`: GPU acceleration via WebGPU

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod nn;

// Re-export key types for convenience
pub use config::{FourierEncoderConfig, LatentSdfDecoderConfig};
pub use error::{LatentSdfError, Result};
pub use nn::{FourierEncoder, LatentSdfDecoder, Mode};

/// CPU backend.
#[cfg(feature = "ndarray")]
pub type CpuBackend = burn::backend::NdArray;

/// GPU backend.
#[cfg(feature = "wgpu")]
pub type GpuBackend = burn::backend::Wgpu;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::checkpoint::{checkpoint_exists, load_decoder, save_decoder};
    pub use crate::config::{FourierEncoderConfig, LatentSdfDecoderConfig};
    pub use crate::error::{LatentSdfError, Result};
    pub use crate::nn::decoder::{DecoderTrace, Injection, LayerPlan, NormKind};
    pub use crate::nn::{AffineLayer, FourierEncoder, LatentSdfDecoder, Mode};
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::prelude::*;

    type TestBackend = NdArray;

    #[test]
    fn test_public_api() {
        let _config = LatentSdfDecoderConfig::new(0, vec![8, 8]);
        let _fourier = FourierEncoderConfig::new(16);
        assert_eq!(Mode::default(), Mode::Eval);
    }

    #[test]
    fn test_coordinate_only_decoder() {
        let device = Default::default();
        let decoder = LatentSdfDecoderConfig::new(0, vec![8, 8])
            .init::<TestBackend>(&device)
            .unwrap();

        let output = decoder.forward(Tensor::zeros([4, 3], &device), Mode::Eval).unwrap();

        assert_eq!(output.dims(), [4, 1]);
        assert!(decoder.encoder().is_none());
    }
}

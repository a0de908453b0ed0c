//! Random Fourier feature encoder.

use std::f64::consts::TAU;

use burn::module::{Module, Param};
use burn::prelude::*;
use burn::tensor::Distribution;

use crate::config::FourierEncoderConfig;

/// Random Fourier feature encoding for 3D coordinates.
///
/// Projects coordinates onto a fixed Gaussian basis `B` of shape
/// `[mapping_size, input_channels]` and returns `[sin(2πxBᵀ), cos(2πxBᵀ)]`.
///
/// The basis is sampled once at construction and never trained. It is still
/// stored as a parameter so that it is part of the module record: a decoder
/// reloaded without it would see a different encoding.
#[derive(Module, Debug)]
pub struct FourierEncoder<B: Backend> {
    /// Projection basis: [mapping_size, input_channels]
    basis: Param<Tensor<B, 2>>,
}

impl<B: Backend> FourierEncoder<B> {
    /// Create a new Fourier encoder with a freshly sampled basis.
    pub fn new(config: &FourierEncoderConfig, device: &B::Device) -> Self {
        let basis = Tensor::random(
            [config.mapping_size, config.input_channels],
            Distribution::Normal(0.0, 1.0),
            device,
        )
        .mul_scalar(config.scale);

        Self::from_basis(basis)
    }

    /// Create an encoder around an explicit basis of shape
    /// `[mapping_size, input_channels]`.
    ///
    /// Encoders built from the same basis produce identical encodings.
    pub fn from_basis(basis: Tensor<B, 2>) -> Self {
        Self {
            basis: Param::from_tensor(basis).set_require_grad(false),
        }
    }

    /// Encode coordinates.
    ///
    /// Input: coordinates of shape [batch, input_channels]
    /// Output: encoded features of shape [batch, 2 * mapping_size]
    pub fn forward(&self, coords: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, _] = coords.dims();
        if self.mapping_size() == 0 {
            return Tensor::zeros([batch, 0], &coords.device());
        }

        // The basis is a constant: keep it out of the autodiff graph.
        let basis = self.basis.val().detach();

        // [batch, mapping_size]
        let proj = coords.matmul(basis.transpose()).mul_scalar(TAU);

        Tensor::cat(vec![proj.clone().sin(), proj.cos()], 1)
    }

    /// Number of projection directions.
    pub fn mapping_size(&self) -> usize {
        self.basis.dims()[0]
    }

    /// Width of the encoded coordinate.
    pub fn output_dim(&self) -> usize {
        2 * self.mapping_size()
    }

    /// The projection basis.
    pub fn basis(&self) -> Tensor<B, 2> {
        self.basis.val()
    }
}

//! MLP building blocks: affine layers with optional weight normalization,
//! softplus activation and mode-aware dropout.

use burn::module::{Module, Param};
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::Distribution;

use crate::error::{LatentSdfError, Result};

/// Above this value of `beta * x` softplus is treated as the identity.
pub const SOFTPLUS_THRESHOLD: f64 = 20.0;

/// Whether stochastic layers are active for a forward call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Dropout enabled.
    Train,
    /// Dropout disabled; evaluation is deterministic.
    #[default]
    Eval,
}

impl Mode {
    /// Returns true in training mode.
    pub fn is_training(self) -> bool {
        matches!(self, Mode::Train)
    }
}

/// Affine layer `y = x W + b`, optionally weight-normalized.
///
/// With weight normalization the stored weight is a direction and the
/// effective weight is `magnitude * direction / ‖direction‖`, where the norm
/// is taken per output unit (over the input axis) and `magnitude` holds one
/// learned scalar per output unit.
#[derive(Module, Debug)]
pub struct AffineLayer<B: Backend> {
    /// Weight (or direction under weight norm) and bias.
    linear: Linear<B>,
    /// Per-output magnitude: [1, d_output]
    magnitude: Option<Param<Tensor<B, 2>>>,
}

impl<B: Backend> AffineLayer<B> {
    /// Create a plain affine layer.
    pub fn new(d_input: usize, d_output: usize, device: &B::Device) -> Self {
        Self {
            linear: LinearConfig::new(d_input, d_output).init(device),
            magnitude: None,
        }
    }

    /// Create a weight-normalized affine layer.
    ///
    /// The magnitude starts at the norm of the initial direction, so the
    /// effective weight initially equals the plain initialization.
    pub fn weight_normalized(d_input: usize, d_output: usize, device: &B::Device) -> Self {
        let linear = LinearConfig::new(d_input, d_output).init(device);
        let magnitude = column_norm(linear.weight.val().detach());

        Self {
            linear,
            magnitude: Some(Param::from_tensor(magnitude)),
        }
    }

    /// Build a layer from explicit tensors.
    ///
    /// `weight` is `[d_input, d_output]`, `bias` is `[d_output]` and
    /// `magnitude`, when given, is `[1, d_output]` and turns `weight` into the
    /// weight-norm direction.
    pub fn from_parts(
        weight: Tensor<B, 2>,
        bias: Tensor<B, 1>,
        magnitude: Option<Tensor<B, 2>>,
    ) -> Result<Self> {
        let [_, d_output] = weight.dims();
        if bias.dims() != [d_output] {
            return Err(LatentSdfError::ShapeMismatch {
                expected: vec![d_output],
                got: bias.dims().to_vec(),
            });
        }
        if let Some(magnitude) = &magnitude {
            if magnitude.dims() != [1, d_output] {
                return Err(LatentSdfError::ShapeMismatch {
                    expected: vec![1, d_output],
                    got: magnitude.dims().to_vec(),
                });
            }
        }

        Ok(Self {
            linear: Linear {
                weight: Param::from_tensor(weight),
                bias: Some(Param::from_tensor(bias)),
            },
            magnitude: magnitude.map(Param::from_tensor),
        })
    }

    /// Returns true if the weight is reparameterized by weight normalization.
    pub fn is_weight_normalized(&self) -> bool {
        self.magnitude.is_some()
    }

    /// The weight actually applied to the input: [d_input, d_output]
    pub fn effective_weight(&self) -> Tensor<B, 2> {
        let weight = self.linear.weight.val();
        match &self.magnitude {
            Some(magnitude) => {
                let norm = column_norm(weight.clone());
                weight * (magnitude.val() / norm)
            }
            None => weight,
        }
    }

    /// Stored weight; the direction under weight normalization.
    pub fn weight(&self) -> Tensor<B, 2> {
        self.linear.weight.val()
    }

    /// Per-output magnitude, if weight-normalized.
    pub fn magnitude(&self) -> Option<Tensor<B, 2>> {
        self.magnitude.as_ref().map(Param::val)
    }

    /// Input width.
    pub fn input_dim(&self) -> usize {
        self.linear.weight.dims()[0]
    }

    /// Output width.
    pub fn output_dim(&self) -> usize {
        self.linear.weight.dims()[1]
    }

    /// Forward pass.
    ///
    /// Input shape: [batch, d_input]
    /// Output shape: [batch, d_output]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        if self.magnitude.is_none() {
            return self.linear.forward(x);
        }

        let output = x.matmul(self.effective_weight());
        match &self.linear.bias {
            Some(bias) => output + bias.val().unsqueeze(),
            None => output,
        }
    }
}

/// L2 norm of each column: [rows, cols] -> [1, cols]
fn column_norm<B: Backend>(weight: Tensor<B, 2>) -> Tensor<B, 2> {
    weight.powf_scalar(2.0).sum_dim(0).sqrt()
}

/// Softplus with sharpness `beta`: `log(1 + exp(beta * x)) / beta`.
///
/// Reverts to the identity where `beta * x > SOFTPLUS_THRESHOLD`.
pub fn softplus<B: Backend, const D: usize>(x: Tensor<B, D>, beta: f64) -> Tensor<B, D> {
    let scaled = x.clone().mul_scalar(beta);
    let linear = scaled.clone().greater_elem(SOFTPLUS_THRESHOLD);
    let smooth = scaled
        .clamp_max(SOFTPLUS_THRESHOLD)
        .exp()
        .log1p()
        .div_scalar(beta);

    smooth.mask_where(linear, x)
}

/// Inverted dropout: zero each element with probability `prob` and rescale
/// survivors by `1 / (1 - prob)`. Identity outside training mode.
pub fn dropout<B: Backend, const D: usize>(x: Tensor<B, D>, prob: f64, mode: Mode) -> Tensor<B, D> {
    if !mode.is_training() || prob <= 0.0 {
        return x;
    }
    if prob >= 1.0 {
        return x.zeros_like();
    }

    let keep = 1.0 - prob;
    let mask = x.random_like(Distribution::Bernoulli(keep));
    x.mul(mask).div_scalar(keep)
}

/// Concatenate along the feature axis, skipping zero-width operands.
pub fn concat_features<B: Backend>(left: Tensor<B, 2>, right: Tensor<B, 2>) -> Tensor<B, 2> {
    if right.dims()[1] == 0 {
        left
    } else if left.dims()[1] == 0 {
        right
    } else {
        Tensor::cat(vec![left, right], 1)
    }
}

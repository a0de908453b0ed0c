//! Latent-conditioned SDF decoder network.

use burn::module::{Ignored, Module};
use burn::nn::{LayerNorm, LayerNormConfig};
use burn::prelude::*;

use crate::config::{LatentSdfDecoderConfig, COORD_DIM, LATENT_DROPOUT_PROB};
use crate::error::{LatentSdfError, Result};
use crate::nn::encoder::FourierEncoder;
use crate::nn::mlp::{concat_features, dropout, softplus, AffineLayer, Mode};

use super::plan::{plan_layers, Injection, LayerPlan, NormKind};

/// Decoder mapping `[latent code, xyz]` rows to a scalar field value.
///
/// Architecture, per layer `i`:
/// 1. Concatenate the raw latent (if `i` is in `latent_in`) or the raw
///    coordinate (if `xyz_in_all` and `i > 0`)
/// 2. Affine transform (optionally weight-normalized)
/// 3. Output layer: optional tanh. Hidden layers: optional layer norm,
///    softplus, optional dropout
///
/// Layers are stored as parallel vectors indexed by layer position.
#[derive(Module, Debug)]
pub struct LatentSdfDecoder<B: Backend> {
    /// Fourier encoder for coordinates, if positional encoding is enabled.
    encoder: Option<FourierEncoder<B>>,
    /// Affine layers in evaluation order.
    layers: Vec<AffineLayer<B>>,
    /// Layer norm for each layer, where planned.
    norms: Vec<Option<LayerNorm<B>>>,
    /// Per-layer layout.
    plans: Ignored<Vec<LayerPlan>>,
    /// Full dimension sequence `[input, hidden.., 1]`.
    dims: Ignored<Vec<usize>>,
    /// Configuration the decoder was built from.
    config: Ignored<LatentSdfDecoderConfig>,
}

/// Decoder output together with the input seen by each affine layer.
#[derive(Debug, Clone)]
pub struct DecoderTrace<B: Backend> {
    /// Decoder output: [batch, 1]
    pub output: Tensor<B, 2>,
    /// Affine input of each layer, after injection: [batch, input_dim(i)]
    pub layer_inputs: Vec<Tensor<B, 2>>,
}

impl LatentSdfDecoderConfig {
    /// Initialize the decoder.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<LatentSdfDecoder<B>> {
        LatentSdfDecoder::new(self, device)
    }
}

impl<B: Backend> LatentSdfDecoder<B> {
    /// Create a new decoder from configuration.
    pub fn new(config: &LatentSdfDecoderConfig, device: &B::Device) -> Result<Self> {
        let plans = plan_layers(config)?;

        let encoder = config.fourier_config().map(|fourier| {
            if fourier.mapping_size == 0 {
                log::warn!("fourier_mapping_size is 0: coordinates are encoded to zero width");
            }
            FourierEncoder::new(&fourier, device)
        });

        let mut layers = Vec::with_capacity(plans.len());
        let mut norms = Vec::with_capacity(plans.len());
        for plan in &plans {
            let layer = match plan.norm {
                NormKind::WeightNorm => {
                    AffineLayer::weight_normalized(plan.input_dim, plan.output_dim, device)
                }
                NormKind::LayerNorm | NormKind::None => {
                    AffineLayer::new(plan.input_dim, plan.output_dim, device)
                }
            };
            layers.push(layer);
            norms.push(
                (plan.norm == NormKind::LayerNorm)
                    .then(|| LayerNormConfig::new(plan.output_dim).init(device)),
            );

            log::debug!(
                "layer {}: {} -> {} (inject {:?}, norm {:?}, dropout {})",
                plan.index,
                plan.input_dim,
                plan.output_dim,
                plan.injection,
                plan.norm,
                plan.dropout
            );
        }

        let decoder = Self {
            encoder,
            layers,
            norms,
            plans: Ignored(plans),
            dims: Ignored(config.layer_dims()),
            config: Ignored(config.clone()),
        };

        log::info!(
            "Built SDF decoder: dims {:?}, {} parameters",
            decoder.dims,
            decoder.num_params()
        );

        Ok(decoder)
    }

    /// Forward pass.
    ///
    /// Input: [batch, latent_size + 3] rows of latent code followed by xyz
    ///
    /// Output: [batch, 1] field values
    pub fn forward(&self, input: Tensor<B, 2>, mode: Mode) -> Result<Tensor<B, 2>> {
        self.run(input, mode, None)
    }

    /// Forward pass that also records the affine input of every layer.
    pub fn forward_traced(&self, input: Tensor<B, 2>, mode: Mode) -> Result<DecoderTrace<B>> {
        let mut layer_inputs = Vec::with_capacity(self.layers.len());
        let output = self.run(input, mode, Some(&mut layer_inputs))?;

        Ok(DecoderTrace {
            output,
            layer_inputs,
        })
    }

    /// Forward pass with the latent code and coordinates given separately.
    ///
    /// Inputs:
    /// - latent: [batch, latent_size] - latent codes
    /// - xyz: [batch, 3] - 3D coordinates
    ///
    /// Output: [batch, 1]
    pub fn forward_split(
        &self,
        latent: Tensor<B, 2>,
        xyz: Tensor<B, 2>,
        mode: Mode,
    ) -> Result<Tensor<B, 2>> {
        let [batch, latent_dim] = latent.dims();
        let [xyz_batch, xyz_dim] = xyz.dims();
        if latent_dim != self.config.latent_size {
            return Err(LatentSdfError::ShapeMismatch {
                expected: vec![batch, self.config.latent_size],
                got: vec![batch, latent_dim],
            });
        }
        if xyz_batch != batch || xyz_dim != COORD_DIM {
            return Err(LatentSdfError::ShapeMismatch {
                expected: vec![batch, COORD_DIM],
                got: vec![xyz_batch, xyz_dim],
            });
        }

        self.forward(concat_features(latent, xyz), mode)
    }

    /// Forward pass for many query points sharing one latent code each.
    ///
    /// Inputs:
    /// - latent: [batch, latent_size] - one latent code per batch element
    /// - xyz: [batch, num_points, 3] - 3D coordinates
    ///
    /// Output: [batch, num_points, 1]
    pub fn forward_batched(
        &self,
        latent: Tensor<B, 2>,
        xyz: Tensor<B, 3>,
        mode: Mode,
    ) -> Result<Tensor<B, 3>> {
        let [batch, num_points, xyz_dim] = xyz.dims();
        let [latent_batch, latent_dim] = latent.dims();
        if latent_batch != batch || latent_dim != self.config.latent_size {
            return Err(LatentSdfError::ShapeMismatch {
                expected: vec![batch, self.config.latent_size],
                got: latent.dims().to_vec(),
            });
        }

        // Expand latent for each point: [batch, num_points, latent_size]
        let latent_3d: Tensor<B, 3> = latent.unsqueeze_dim(1);
        let latent_expanded = latent_3d.repeat_dim(1, num_points);

        let latent_flat = latent_expanded.reshape([batch * num_points, self.config.latent_size]);
        let xyz_flat = xyz.reshape([batch * num_points, xyz_dim]);

        let output_flat = self.forward_split(latent_flat, xyz_flat, mode)?;

        Ok(output_flat.reshape([batch, num_points, 1]))
    }

    fn run(
        &self,
        input: Tensor<B, 2>,
        mode: Mode,
        mut trace: Option<&mut Vec<Tensor<B, 2>>>,
    ) -> Result<Tensor<B, 2>> {
        let [batch, width] = input.dims();
        let expected = self.config.latent_size + COORD_DIM;
        if width < COORD_DIM || width != expected {
            return Err(LatentSdfError::ShapeMismatch {
                expected: vec![batch, expected],
                got: vec![batch, width],
            });
        }

        let xyz = input.clone().narrow(1, width - COORD_DIM, COORD_DIM);
        let latent = (width > COORD_DIM).then(|| input.clone().narrow(1, 0, width - COORD_DIM));

        // Encoding only happens when a latent code is present; coordinate-only
        // rows are passed through unchanged.
        let (mut x, latent) = match (latent, &self.encoder) {
            (Some(latent), Some(encoder)) => {
                let latent = if self.config.latent_dropout {
                    dropout(latent, LATENT_DROPOUT_PROB, mode)
                } else {
                    latent
                };
                let encoded = encoder.forward(xyz.clone());
                (concat_features(latent.clone(), encoded), Some(latent))
            }
            (latent, _) => (input, latent),
        };

        for ((plan, layer), norm) in self.plans.iter().zip(&self.layers).zip(&self.norms) {
            x = match (plan.injection, &latent) {
                (Injection::Latent, Some(latent)) => Tensor::cat(vec![x, latent.clone()], 1),
                (Injection::Coordinate, _) => Tensor::cat(vec![x, xyz.clone()], 1),
                _ => x,
            };

            if let Some(trace) = trace.as_deref_mut() {
                trace.push(x.clone());
            }

            x = layer.forward(x);

            if plan.is_final {
                if self.config.use_tanh {
                    x = x.tanh();
                }
                continue;
            }

            if let Some(norm) = norm {
                x = norm.forward(x);
            }
            x = softplus(x, self.config.softplus_beta);
            if plan.dropout {
                x = dropout(x, self.config.dropout_prob, mode);
            }
        }

        Ok(x)
    }

    /// Per-layer layout.
    pub fn plans(&self) -> &[LayerPlan] {
        &self.plans
    }

    /// Full dimension sequence `[input, hidden.., 1]`.
    pub fn layer_dims(&self) -> &[usize] {
        &self.dims
    }

    /// Length of the dimension sequence; the output layer index is
    /// `num_layers() - 2`.
    pub fn num_layers(&self) -> usize {
        self.dims.len()
    }

    /// The affine layers in evaluation order.
    pub fn layers(&self) -> &[AffineLayer<B>] {
        &self.layers
    }

    /// Configuration the decoder was built from.
    pub fn config(&self) -> &LatentSdfDecoderConfig {
        &self.config
    }

    /// Latent code width.
    pub fn latent_size(&self) -> usize {
        self.config.latent_size
    }

    /// Width of a raw input row.
    pub fn input_dim(&self) -> usize {
        self.config.latent_size + COORD_DIM
    }

    /// The positional encoder, if enabled.
    pub fn encoder(&self) -> Option<&FourierEncoder<B>> {
        self.encoder.as_ref()
    }
}

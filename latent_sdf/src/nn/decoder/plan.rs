//! Per-layer layout derived once from a decoder configuration.

use crate::config::{LatentSdfDecoderConfig, COORD_DIM};
use crate::error::{LatentSdfError, Result};

/// What is concatenated onto the running activation before a layer's affine
/// transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Injection {
    /// Nothing.
    None,
    /// The raw latent code.
    Latent,
    /// The raw coordinate.
    Coordinate,
}

/// Normalization attached to a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormKind {
    /// Plain affine layer.
    None,
    /// Weight reparameterized as magnitude times unit direction.
    WeightNorm,
    /// Layer normalization after the affine transform.
    LayerNorm,
}

/// Layout of a single affine layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerPlan {
    /// Position in the layer sequence.
    pub index: usize,
    /// Width of the affine input, after injection.
    pub input_dim: usize,
    /// Width of the affine output.
    pub output_dim: usize,
    /// What is injected before the affine transform.
    pub injection: Injection,
    /// Normalization attached to the layer.
    pub norm: NormKind,
    /// Whether dropout follows the activation.
    pub dropout: bool,
    /// Whether this is the scalar output layer.
    pub is_final: bool,
}

impl LayerPlan {
    /// Returns true if the raw latent code is concatenated before this layer.
    pub fn reinjects_latent(&self) -> bool {
        self.injection == Injection::Latent
    }

    /// Returns true if the raw coordinate is concatenated before this layer.
    pub fn reinjects_coordinate(&self) -> bool {
        self.injection == Injection::Coordinate
    }

    /// Returns true if any normalization is attached.
    pub fn has_norm(&self) -> bool {
        self.norm != NormKind::None
    }
}

/// Derive the layer plans for a configuration.
///
/// A layer's stored output width is shrunk by whatever the next layer
/// injects, so that the next affine input is exactly `dims[i + 1]` wide.
pub fn plan_layers(config: &LatentSdfDecoderConfig) -> Result<Vec<LayerPlan>> {
    config.validate()?;

    let dims = config.layer_dims();
    let last = config.final_layer();
    let dropout_layers = config.dropout_layers.as_deref().unwrap_or(&[]);

    let injection_at = |layer: usize| {
        if config.latent_in.contains(&layer) {
            Injection::Latent
        } else if layer != 0 && config.xyz_in_all {
            Injection::Coordinate
        } else {
            Injection::None
        }
    };

    let mut plans = Vec::with_capacity(last + 1);
    for layer in 0..=last {
        let is_final = layer == last;
        let shrink = if is_final {
            0
        } else {
            match injection_at(layer + 1) {
                Injection::Latent => config.latent_size,
                Injection::Coordinate => COORD_DIM,
                Injection::None => 0,
            }
        };

        let output_dim = dims[layer + 1].checked_sub(shrink).filter(|&d| d > 0).ok_or_else(|| {
            LatentSdfError::invalid_config(format!(
                "layer {} is {} wide but the next layer injects {} columns",
                layer,
                dims[layer + 1],
                shrink
            ))
        })?;

        let listed = config.norm_layers.contains(&layer);
        let norm = match (listed, config.weight_norm) {
            (true, true) => NormKind::WeightNorm,
            (true, false) if !is_final => NormKind::LayerNorm,
            _ => NormKind::None,
        };

        plans.push(LayerPlan {
            index: layer,
            input_dim: dims[layer],
            output_dim,
            injection: injection_at(layer),
            norm,
            dropout: dropout_layers.contains(&layer) && !is_final,
            is_final,
        });
    }

    if dropout_layers.contains(&last) {
        log::warn!("dropout requested on output layer {last}; ignored");
    }
    if !config.weight_norm && config.norm_layers.contains(&last) {
        log::warn!("layer norm requested on output layer {last}; ignored");
    }

    Ok(plans)
}

//! Neural network configuration types.

use burn::config::Config;

use crate::error::LatentSdfError;

/// Width of a query coordinate (x, y, z).
pub const COORD_DIM: usize = 3;

/// Dropout probability applied to the latent code when `latent_dropout` is set.
pub const LATENT_DROPOUT_PROB: f64 = 0.2;

/// Configuration for the random Fourier feature encoder.
#[derive(Config, Debug)]
pub struct FourierEncoderConfig {
    /// Number of random projection directions. The encoding is twice as wide.
    pub mapping_size: usize,

    /// Standard deviation of the projection basis.
    #[config(default = 1.0)]
    pub scale: f64,

    /// Width of the encoded input.
    #[config(default = 3)]
    pub input_channels: usize,
}

impl FourierEncoderConfig {
    /// Width of the encoded features: one sine and one cosine per direction.
    pub fn output_dim(&self) -> usize {
        2 * self.mapping_size
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.input_channels == 0 {
            return Err(LatentSdfError::invalid_config(
                "fourier input_channels must be positive",
            ));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(LatentSdfError::invalid_config(format!(
                "fourier scale must be positive and finite, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Configuration for the latent-conditioned SDF decoder.
///
/// Layer indices in `latent_in`, `norm_layers` and `dropout_layers` refer to
/// affine layers `0..=hidden_dims.len()`, where the last index is the scalar
/// output layer.
#[derive(Config, Debug)]
pub struct LatentSdfDecoderConfig {
    /// Width of the latent code prepended to every input row (0 = unconditioned).
    pub latent_size: usize,

    /// Hidden layer widths.
    pub hidden_dims: Vec<usize>,

    /// Layers followed by dropout. `None` disables dropout entirely.
    pub dropout_layers: Option<Vec<usize>>,

    /// Dropout probability for `dropout_layers`.
    #[config(default = 0.0)]
    pub dropout_prob: f64,

    /// Layers that are normalized (layer norm, or weight norm if `weight_norm`).
    #[config(default = "vec![]")]
    pub norm_layers: Vec<usize>,

    /// Layers whose input is re-concatenated with the raw latent code.
    #[config(default = "vec![]")]
    pub latent_in: Vec<usize>,

    /// Reparameterize `norm_layers` with weight normalization instead of layer norm.
    #[config(default = false)]
    pub weight_norm: bool,

    /// Re-concatenate the raw coordinate at every non-initial layer.
    #[config(default = false)]
    pub xyz_in_all: bool,

    /// Squash the output into `[-1, 1]`.
    #[config(default = false)]
    pub use_tanh: bool,

    /// Apply dropout to the latent code (only with positional encoding).
    #[config(default = false)]
    pub latent_dropout: bool,

    /// Sharpness of the softplus activation.
    #[config(default = 1.0)]
    pub softplus_beta: f64,

    /// Encode coordinates with random Fourier features.
    #[config(default = false)]
    pub use_position_encoding: bool,

    /// Number of Fourier projection directions.
    #[config(default = 0)]
    pub fourier_mapping_size: usize,

    /// Standard deviation of the Fourier projection basis.
    #[config(default = 1.0)]
    pub fourier_scale: f64,
}

impl LatentSdfDecoderConfig {
    /// DeepSDF-style decoder: eight 512-wide layers, latent re-injected at
    /// layer 4, weight norm and dropout on every hidden layer.
    pub fn deep_sdf(latent_size: usize) -> Self {
        let hidden: Vec<usize> = (0..8).collect();
        Self::new(latent_size, vec![512; 8])
            .with_dropout_layers(Some(hidden.clone()))
            .with_dropout_prob(0.2)
            .with_norm_layers(hidden)
            .with_latent_in(vec![4])
            .with_weight_norm(true)
            .with_use_tanh(true)
    }

    /// Encoder configuration, if positional encoding is enabled.
    pub fn fourier_config(&self) -> Option<FourierEncoderConfig> {
        self.use_position_encoding.then(|| {
            FourierEncoderConfig::new(self.fourier_mapping_size).with_scale(self.fourier_scale)
        })
    }

    /// Width of the coordinate features fed to the first layer.
    pub fn coordinate_features(&self) -> usize {
        match self.fourier_config() {
            Some(fourier) => fourier.output_dim(),
            None => COORD_DIM,
        }
    }

    /// Width of the first layer's input.
    pub fn input_dim(&self) -> usize {
        self.latent_size + self.coordinate_features()
    }

    /// Width of a raw input row: latent code followed by the coordinate.
    pub fn row_dim(&self) -> usize {
        self.latent_size + COORD_DIM
    }

    /// Full dimension sequence `[input, hidden.., 1]`.
    pub fn layer_dims(&self) -> Vec<usize> {
        let mut dims = Vec::with_capacity(self.hidden_dims.len() + 2);
        dims.push(self.input_dim());
        dims.extend_from_slice(&self.hidden_dims);
        dims.push(1);
        dims
    }

    /// Index of the scalar output layer.
    pub fn final_layer(&self) -> usize {
        self.hidden_dims.len()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if let Some(i) = self.hidden_dims.iter().position(|&d| d == 0) {
            return Err(LatentSdfError::invalid_config(format!(
                "hidden layer {i} has zero width"
            )));
        }
        if !self.softplus_beta.is_finite() || self.softplus_beta <= 0.0 {
            return Err(LatentSdfError::invalid_config(format!(
                "softplus_beta must be positive and finite, got {}",
                self.softplus_beta
            )));
        }
        if !(0.0..=1.0).contains(&self.dropout_prob) {
            return Err(LatentSdfError::invalid_config(format!(
                "dropout_prob must lie in [0, 1], got {}",
                self.dropout_prob
            )));
        }

        let max = self.final_layer();
        check_indices("latent_in", &self.latent_in, max)?;
        check_indices("norm_layers", &self.norm_layers, max)?;
        if let Some(dropout_layers) = &self.dropout_layers {
            check_indices("dropout_layers", dropout_layers, max)?;
        }

        if !self.latent_in.is_empty() && self.latent_size == 0 {
            return Err(LatentSdfError::invalid_config(
                "latent_in requires a non-zero latent_size",
            ));
        }
        if self.latent_in.contains(&0) {
            return Err(LatentSdfError::invalid_config(
                "latent_in cannot contain layer 0: the first layer already sees the latent code",
            ));
        }

        if let Some(fourier) = self.fourier_config() {
            fourier.validate()?;
            // Rows without a latent code bypass the encoder in the forward pass,
            // so the first layer would be sized for the wrong input.
            if self.latent_size == 0 {
                return Err(LatentSdfError::invalid_config(
                    "position encoding is only applied when a latent code is present; \
                     use_position_encoding requires latent_size > 0",
                ));
            }
        }

        Ok(())
    }
}

fn check_indices(set: &'static str, indices: &[usize], max: usize) -> crate::error::Result<()> {
    match indices.iter().find(|&&index| index > max) {
        Some(&index) => Err(LatentSdfError::LayerIndexOutOfRange { set, index, max }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_dims_plain() {
        let config = LatentSdfDecoderConfig::new(0, vec![8, 8]);
        assert_eq!(config.layer_dims(), vec![3, 8, 8, 1]);
        assert_eq!(config.final_layer(), 2);
        assert_eq!(config.row_dim(), 3);
    }

    #[test]
    fn test_layer_dims_with_encoding() {
        let config = LatentSdfDecoderConfig::new(128, vec![256])
            .with_use_position_encoding(true)
            .with_fourier_mapping_size(64)
            .with_fourier_scale(10.0);

        // 128 (latent) + 2 * 64 (sin/cos) = 256
        assert_eq!(config.input_dim(), 256);
        assert_eq!(config.row_dim(), 131);
        assert_eq!(config.layer_dims(), vec![256, 256, 1]);
    }

    #[test]
    fn test_fourier_output_dim() {
        assert_eq!(FourierEncoderConfig::new(16).output_dim(), 32);
        assert_eq!(FourierEncoderConfig::new(0).output_dim(), 0);
    }

    #[test]
    fn test_deep_sdf_preset_is_valid() {
        let config = LatentSdfDecoderConfig::deep_sdf(256);
        assert!(config.validate().is_ok());
        assert_eq!(config.layer_dims().len(), 10);
        assert_eq!(config.input_dim(), 259);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let config = LatentSdfDecoderConfig::new(4, vec![16, 16]).with_norm_layers(vec![0, 3]);
        match config.validate() {
            Err(LatentSdfError::LayerIndexOutOfRange { set, index, max }) => {
                assert_eq!(set, "norm_layers");
                assert_eq!(index, 3);
                assert_eq!(max, 2);
            }
            other => panic!("expected LayerIndexOutOfRange, got {other:?}"),
        }

        let config = LatentSdfDecoderConfig::new(4, vec![16, 16]).with_dropout_layers(Some(vec![5]));
        assert!(matches!(
            config.validate(),
            Err(LatentSdfError::LayerIndexOutOfRange { set: "dropout_layers", .. })
        ));
    }

    #[test]
    fn test_final_layer_index_accepted() {
        let config = LatentSdfDecoderConfig::new(4, vec![16, 16])
            .with_dropout_layers(Some(vec![2]))
            .with_norm_layers(vec![2]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_latent_in_without_latent_rejected() {
        let config = LatentSdfDecoderConfig::new(0, vec![16, 16]).with_latent_in(vec![1]);
        assert!(matches!(
            config.validate(),
            Err(LatentSdfError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_latent_in_first_layer_rejected() {
        let config = LatentSdfDecoderConfig::new(8, vec![16, 16]).with_latent_in(vec![0]);
        assert!(matches!(
            config.validate(),
            Err(LatentSdfError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_encoding_without_latent_rejected() {
        let config = LatentSdfDecoderConfig::new(0, vec![16])
            .with_use_position_encoding(true)
            .with_fourier_mapping_size(8);
        assert!(matches!(
            config.validate(),
            Err(LatentSdfError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_zero_mapping_size_accepted() {
        let config = LatentSdfDecoderConfig::new(8, vec![16])
            .with_use_position_encoding(true)
            .with_fourier_mapping_size(0);
        assert!(config.validate().is_ok());
        assert_eq!(config.input_dim(), 8);
    }

    #[test]
    fn test_invalid_scalars_rejected() {
        let base = || LatentSdfDecoderConfig::new(4, vec![8]);
        assert!(base().with_softplus_beta(0.0).validate().is_err());
        assert!(base().with_softplus_beta(f64::NAN).validate().is_err());
        assert!(base().with_dropout_prob(1.5).validate().is_err());
        assert!(base().with_dropout_prob(-0.1).validate().is_err());
        assert!(LatentSdfDecoderConfig::new(4, vec![8, 0]).validate().is_err());
        assert!(base()
            .with_use_position_encoding(true)
            .with_fourier_mapping_size(4)
            .with_fourier_scale(-1.0)
            .validate()
            .is_err());
    }
}

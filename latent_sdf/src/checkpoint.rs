//! Save/load of decoder parameters.
//!
//! A checkpoint directory holds:
//! - `config.json`: the decoder configuration
//! - `decoder.mpk`: every parameter, including the Fourier basis
//!
//! The basis is random at construction, so it has to be persisted alongside
//! the trained weights for a reloaded decoder to reproduce its outputs.

use std::path::Path;

use burn::config::Config;
use burn::module::Module;
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};

use crate::config::LatentSdfDecoderConfig;
use crate::error::{LatentSdfError, Result};
use crate::nn::LatentSdfDecoder;

const CONFIG_FILE: &str = "config.json";
const RECORD_STEM: &str = "decoder";
const RECORD_FILE: &str = "decoder.mpk";

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

/// Save a decoder and the configuration it was built from to a directory.
pub fn save_decoder<B: Backend>(dir: &Path, decoder: &LatentSdfDecoder<B>) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    decoder.config().save(dir.join(CONFIG_FILE))?;

    decoder
        .clone()
        .save_file(dir.join(RECORD_STEM), &recorder())
        .map_err(|e| LatentSdfError::Record {
            message: format!("{e:?}"),
        })?;

    log::info!(
        "Saved decoder checkpoint to {:?} ({} parameters)",
        dir,
        decoder.num_params()
    );

    Ok(())
}

/// Load a decoder saved with [`save_decoder`].
///
/// Returns the decoder together with its configuration.
pub fn load_decoder<B: Backend>(
    dir: &Path,
    device: &B::Device,
) -> Result<(LatentSdfDecoder<B>, LatentSdfDecoderConfig)> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Err(LatentSdfError::InvalidData(format!(
            "no decoder config at {config_path:?}"
        )));
    }

    let config = LatentSdfDecoderConfig::load(&config_path)
        .map_err(|e| LatentSdfError::InvalidData(format!("{config_path:?}: {e:?}")))?;

    let decoder = LatentSdfDecoder::new(&config, device)?
        .load_file(dir.join(RECORD_STEM), &recorder(), device)
        .map_err(|e| LatentSdfError::Record {
            message: format!("{e:?}"),
        })?;

    log::info!("Loaded decoder checkpoint from {:?}", dir);

    Ok((decoder, config))
}

/// Check if a decoder checkpoint exists at the given path.
pub fn checkpoint_exists(dir: &Path) -> bool {
    dir.join(CONFIG_FILE).exists() && dir.join(RECORD_FILE).exists()
}

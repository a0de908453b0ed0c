//! Example: querying a latent-conditioned SDF decoder.
//!
//! This example walks through the decoder lifecycle:
//! 1. Build a Fourier-encoded decoder from configuration
//! 2. Query field values along a line for two latent codes
//! 3. Save a checkpoint and reload it
//! 4. Verify the reloaded decoder reproduces the same values
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info cargo run -p latent_sdf --example query_field
//! ```

use burn::backend::NdArray;
use burn::prelude::*;
use burn::tensor::Distribution;

use burn::tensor::DataError;
use latent_sdf::prelude::*;

type MyBackend = NdArray;

const LATENT_SIZE: usize = 32;
const NUM_SAMPLES: usize = 9;

fn main() -> latent_sdf::Result<()> {
    env_logger::init();

    let device = burn::backend::ndarray::NdArrayDevice::Cpu;

    println!("═══════════════════════════════════════════════════════════════");
    println!("          Latent SDF Decoder Query");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    // =========================================================================
    // Step 1: Build the decoder
    // =========================================================================
    let config = LatentSdfDecoderConfig::new(LATENT_SIZE, vec![128; 6])
        .with_latent_in(vec![3])
        .with_norm_layers((0..6).collect())
        .with_weight_norm(true)
        .with_xyz_in_all(true)
        .with_softplus_beta(100.0)
        .with_use_tanh(true)
        .with_use_position_encoding(true)
        .with_fourier_mapping_size(32)
        .with_fourier_scale(4.0);

    let decoder = LatentSdfDecoder::<MyBackend>::new(&config, &device)?;

    println!("  Layer dims:      {:?}", decoder.layer_dims());
    println!("  Parameters:      {}", decoder.num_params());
    for plan in decoder.plans() {
        println!(
            "  Layer {}:         {:>4} -> {:<4} inject {:?}, norm {:?}",
            plan.index, plan.input_dim, plan.output_dim, plan.injection, plan.norm
        );
    }
    println!();

    // =========================================================================
    // Step 2: Query along the x axis for two shapes
    // =========================================================================
    let xs: Vec<f32> = (0..NUM_SAMPLES)
        .map(|i| -1.0 + 2.0 * i as f32 / (NUM_SAMPLES - 1) as f32)
        .collect();
    let xyz_data: Vec<f32> = xs.iter().flat_map(|&x| [x, 0.0, 0.0]).collect();
    let xyz = Tensor::<MyBackend, 2>::from_data(
        TensorData::new(xyz_data, [NUM_SAMPLES, 3]),
        &device,
    );

    let latents = Tensor::<MyBackend, 2>::random(
        [2, LATENT_SIZE],
        Distribution::Normal(0.0, 0.01),
        &device,
    );
    let queries = xyz.unsqueeze_dim::<3>(0).repeat_dim(0, 2);
    let sdf = decoder.forward_batched(latents.clone(), queries.clone(), Mode::Eval)?;
    let values: Vec<f32> = sdf.to_data().to_vec().map_err(data_error)?;

    println!("        x   shape A   shape B");
    for (i, x) in xs.iter().enumerate() {
        println!(
            "  {:>7.3}  {:>8.4}  {:>8.4}",
            x,
            values[i],
            values[NUM_SAMPLES + i]
        );
    }
    println!();

    // =========================================================================
    // Step 3: Save and reload
    // =========================================================================
    let checkpoint_dir = std::env::temp_dir().join("latent_sdf_query_field");
    save_decoder(&checkpoint_dir, &decoder)?;
    let (reloaded, _) = load_decoder::<MyBackend>(&checkpoint_dir, &device)?;

    let reloaded_values: Vec<f32> = reloaded
        .forward_batched(latents, queries, Mode::Eval)?
        .to_data()
        .to_vec()
        .map_err(data_error)?;

    println!("  Checkpoint:      {:?}", checkpoint_dir);
    println!("  Reproducible:    {}", values == reloaded_values);

    Ok(())
}

fn data_error(e: DataError) -> LatentSdfError {
    LatentSdfError::InvalidData(format!("{e:?}"))
}

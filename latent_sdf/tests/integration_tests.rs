//! End-to-end decoder scenarios.

use burn::backend::{Autodiff, NdArray};
use burn::prelude::*;
use burn::tensor::Distribution;

use latent_sdf::{
    config::LatentSdfDecoderConfig,
    nn::decoder::{Injection, NormKind},
    LatentSdfError, Mode,
};

type TestBackend = NdArray;

fn random_rows(batch: usize, width: usize) -> Tensor<TestBackend, 2> {
    let device = burn::backend::ndarray::NdArrayDevice::Cpu;
    Tensor::random([batch, width], Distribution::Uniform(-1.0, 1.0), &device)
}

fn to_vec(t: Tensor<TestBackend, 2>) -> Vec<f32> {
    t.to_data().to_vec().unwrap()
}

#[test]
fn test_coordinate_only_network() {
    let device = burn::backend::ndarray::NdArrayDevice::Cpu;
    let config = LatentSdfDecoderConfig::new(0, vec![8, 8]);
    let decoder = config.init::<TestBackend>(&device).unwrap();

    assert_eq!(decoder.layer_dims(), &[3, 8, 8, 1]);

    let output = decoder.forward(random_rows(10, 3), Mode::Eval).unwrap();
    assert_eq!(output.dims(), [10, 1]);

    // A pure function of the coordinate: identical points give identical values.
    let point = Tensor::<TestBackend, 2>::from_data([[0.1f32, -0.2, 0.3]], &device);
    let repeated = point.repeat_dim(0, 4);
    let values = to_vec(decoder.forward(repeated, Mode::Eval).unwrap());
    assert!(values.iter().all(|&v| v == values[0]));
}

#[test]
fn test_deep_weight_normalized_network() {
    let device = burn::backend::ndarray::NdArrayDevice::Cpu;
    let config = LatentSdfDecoderConfig::new(256, vec![512; 7])
        .with_latent_in(vec![4])
        .with_weight_norm(true)
        .with_norm_layers((0..7).collect())
        .with_use_tanh(true);
    let decoder = config.init::<TestBackend>(&device).unwrap();

    let plans = decoder.plans();
    assert_eq!(plans.len(), 8);
    for plan in &plans[..7] {
        assert_eq!(plan.norm, NormKind::WeightNorm);
    }
    assert_eq!(plans[7].norm, NormKind::None);
    assert!(plans[7].is_final);
    assert_eq!(plans[3].output_dim, 512 - 256);
    assert_eq!(plans[4].injection, Injection::Latent);
    assert_eq!(plans[4].input_dim, 512);

    let input = random_rows(4, 259).mul_scalar(10.0);
    let output = decoder.forward(input, Mode::Eval).unwrap();

    assert_eq!(output.dims(), [4, 1]);
    assert!(to_vec(output).iter().all(|v| (-1.0..=1.0).contains(v)));
}

#[test]
fn test_position_encoded_network() {
    let device = burn::backend::ndarray::NdArrayDevice::Cpu;
    let config = LatentSdfDecoderConfig::new(128, vec![256, 256])
        .with_use_position_encoding(true)
        .with_fourier_mapping_size(64)
        .with_fourier_scale(10.0);
    let decoder = config.init::<TestBackend>(&device).unwrap();

    let encoder = decoder.encoder().expect("encoder enabled");
    assert_eq!(encoder.output_dim(), 128);
    assert_eq!(decoder.layer_dims()[0], 256);
    assert_eq!(decoder.plans()[0].input_dim, 256);

    let trace = decoder.forward_traced(random_rows(3, 131), Mode::Eval).unwrap();
    assert_eq!(trace.layer_inputs[0].dims(), [3, 256]);
    assert_eq!(trace.output.dims(), [3, 1]);
}

#[test]
fn test_dropout_depends_on_mode() {
    let device = burn::backend::ndarray::NdArrayDevice::Cpu;
    let config = LatentSdfDecoderConfig::new(4, vec![64, 64, 64])
        .with_dropout_layers(Some(vec![2]))
        .with_dropout_prob(0.5);
    let decoder = config.init::<TestBackend>(&device).unwrap();
    let input = random_rows(16, 7);

    let train_a = to_vec(decoder.forward(input.clone(), Mode::Train).unwrap());
    let train_b = to_vec(decoder.forward(input.clone(), Mode::Train).unwrap());
    assert_ne!(train_a, train_b);

    let eval_a = to_vec(decoder.forward(input.clone(), Mode::Eval).unwrap());
    let eval_b = to_vec(decoder.forward(input, Mode::Eval).unwrap());
    assert_eq!(eval_a, eval_b);
}

#[test]
fn test_malformed_input_rejected() {
    let device = burn::backend::ndarray::NdArrayDevice::Cpu;
    let decoder = LatentSdfDecoderConfig::new(0, vec![8, 8])
        .init::<TestBackend>(&device)
        .unwrap();

    match decoder.forward(random_rows(5, 2), Mode::Eval) {
        Err(LatentSdfError::ShapeMismatch { expected, got }) => {
            assert_eq!(expected, vec![5, 3]);
            assert_eq!(got, vec![5, 2]);
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }
}

#[test]
fn test_coordinate_reinjection_is_unchanged() {
    let device = burn::backend::ndarray::NdArrayDevice::Cpu;
    let config = LatentSdfDecoderConfig::new(6, vec![32, 32, 32, 32])
        .with_xyz_in_all(true)
        .with_norm_layers(vec![0, 1, 2, 3]);
    let decoder = config.init::<TestBackend>(&device).unwrap();
    let input = random_rows(7, 9);
    let xyz = to_vec(input.clone().narrow(1, 6, 3));

    let trace = decoder.forward_traced(input, Mode::Eval).unwrap();

    for (i, layer_input) in trace.layer_inputs.iter().enumerate().skip(1) {
        let width = layer_input.dims()[1];
        assert_eq!(width, decoder.plans()[i].input_dim);
        assert_eq!(to_vec(layer_input.clone().narrow(1, width - 3, 3)), xyz, "layer {i}");
    }
}

#[test]
fn test_deep_sdf_preset() {
    let device = burn::backend::ndarray::NdArrayDevice::Cpu;
    let config = LatentSdfDecoderConfig::deep_sdf(64);
    let decoder = config.init::<TestBackend>(&device).unwrap();
    let input = random_rows(2, 67);

    let train = decoder.forward(input.clone(), Mode::Train).unwrap();
    let eval = decoder.forward(input, Mode::Eval).unwrap();

    assert_eq!(train.dims(), [2, 1]);
    assert_eq!(eval.dims(), [2, 1]);
}

#[test]
fn test_gradients_reach_weight_norm_parameters() {
    type AdBackend = Autodiff<NdArray>;

    let device = burn::backend::ndarray::NdArrayDevice::Cpu;
    let config = LatentSdfDecoderConfig::new(4, vec![16, 16])
        .with_norm_layers(vec![0, 1])
        .with_weight_norm(true)
        .with_use_position_encoding(true)
        .with_fourier_mapping_size(8);
    let decoder = config.init::<AdBackend>(&device).unwrap();

    let input = Tensor::<AdBackend, 2>::random([8, 7], Distribution::Uniform(-1.0, 1.0), &device);
    let grads = decoder.forward(input, Mode::Train).unwrap().sum().backward();

    let first = &decoder.layers()[0];
    assert!(first.weight().grad(&grads).is_some());
    assert!(first.magnitude().unwrap().grad(&grads).is_some());
    assert!(decoder.encoder().unwrap().basis().grad(&grads).is_none());
}

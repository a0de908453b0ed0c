//! Decoder modules for mapping latent codes and coordinates to field values.

mod plan;
mod sdf;

pub use plan::{plan_layers, Injection, LayerPlan, NormKind};
pub use sdf::{DecoderTrace, LatentSdfDecoder};

//! Encoder modules for lifting coordinates into richer feature spaces.

mod fourier;

pub use fourier::FourierEncoder;

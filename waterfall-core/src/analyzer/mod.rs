pub mod fourier;
pub mod samples;
pub mod spectrum;

pub use self::fourier::{window, AnalyserHandle, AnalyserSettings, FourierAnalyzer, FourierBuilder};
pub use self::samples::{Sample, SampleBuffer};
pub use self::spectrum::{Frequency, SignalStrength, Spectrum};

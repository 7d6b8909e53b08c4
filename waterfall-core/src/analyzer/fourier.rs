//! Fourier Analysis
//!
//! Behaves like a browser's `AnalyserNode`: windowed FFT of the newest samples, magnitudes
//! smoothed over time and reported in decibels.
use super::Sample;
use crate::analyzer;
use crate::attributes::FftSize;
use std::sync;

/// Lower bound for magnitudes before conversion to decibels (-240 dB)
const MIN_MAGNITUDE: f32 = 1e-12;

/// Window functions
///
/// A window-function in this case takes a size and should return a `Vec` of that length filled
/// with the precomputed window coefficients.  The following are available by default:
///
/// * [None / Rectangle](fn.none.html)
/// * [Sine](fn.sine.html)
/// * [Hanning](fn.hanning.html)
/// * [Hamming](fn.hamming.html)
/// * [Blackman](fn.blackman.html)
/// * [Nuttall](fn.nuttall.html)
/// * [Triangular](fn.triangular.html)
pub mod window {
    /// Blackman Window
    pub fn blackman(size: usize) -> Vec<f32> {
        apodize::blackman_iter(size).map(|f| f as f32).collect()
    }

    /// Hamming Window
    pub fn hamming(size: usize) -> Vec<f32> {
        apodize::hamming_iter(size).map(|f| f as f32).collect()
    }

    /// Hanning Window
    pub fn hanning(size: usize) -> Vec<f32> {
        apodize::hanning_iter(size).map(|f| f as f32).collect()
    }

    /// No window function / Rectangle window
    pub fn none(size: usize) -> Vec<f32> {
        vec![1.0; size]
    }

    /// Nuttall Window
    pub fn nuttall(size: usize) -> Vec<f32> {
        apodize::nuttall_iter(size).map(|f| f as f32).collect()
    }

    /// Sine Window
    pub fn sine(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| (i as f32 / (size - 1) as f32 * std::f32::consts::PI).sin())
            .collect()
    }

    /// Triangular Window
    pub fn triangular(size: usize) -> Vec<f32> {
        apodize::triangular_iter(size).map(|f| f as f32).collect()
    }

    /// Get the window function for the specified name
    pub fn from_str(name: &str) -> Option<fn(usize) -> Vec<f32>> {
        match name {
            "blackman" => Some(blackman),
            "hamming" => Some(hamming),
            "hanning" => Some(hanning),
            "none" => Some(none),
            "nuttall" => Some(nuttall),
            "sine" => Some(sine),
            "triangular" => Some(triangular),
            _ => None,
        }
    }
}

/// Settings a script may change while the analyser is running
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserSettings {
    pub fft_size: FftSize,
    /// Averaging constant with the previous frame, `0.0..=1.0`
    pub smoothing: f32,
}

/// Shared handle to [`AnalyserSettings`](struct.AnalyserSettings.html)
///
/// The script owns one end and writes attribute changes, the analyzer closure owns a clone and
/// picks them up on its next run.
#[derive(Debug, Clone)]
pub struct AnalyserHandle(sync::Arc<parking_lot::Mutex<AnalyserSettings>>);

impl AnalyserHandle {
    pub fn new(settings: AnalyserSettings) -> AnalyserHandle {
        AnalyserHandle(sync::Arc::new(parking_lot::Mutex::new(settings)))
    }

    pub fn get(&self) -> AnalyserSettings {
        *self.0.lock()
    }

    pub fn set(&self, settings: AnalyserSettings) {
        *self.0.lock() = settings;
    }
}

/// Builder for FourierAnalyzer
#[derive(Debug, Default)]
pub struct FourierBuilder {
    /// Size of the fourier transform
    pub fft_size: Option<FftSize>,

    /// Smoothing constant
    pub smoothing: Option<f32>,

    /// Window Function
    ///
    /// A few window functions are defined in the [`window`](window/index.html) module.
    ///
    /// Can also be set from config as `"audio.fourier.window"`.
    pub window: Option<fn(usize) -> Vec<f32>>,

    /// Downsampling factor
    ///
    /// Can also be set from config as `"audio.fourier.downsample"`.
    pub downsample: Option<usize>,
}

impl FourierBuilder {
    /// Create a new FourierBuilder
    pub fn new() -> FourierBuilder {
        Default::default()
    }

    /// Set the size of the transform buffer
    pub fn fft_size(&mut self, size: FftSize) -> &mut FourierBuilder {
        self.fft_size = Some(size);
        self
    }

    /// Set the smoothing constant
    pub fn smoothing(&mut self, smoothing: f32) -> &mut FourierBuilder {
        self.smoothing = Some(smoothing);
        self
    }

    /// Take size and smoothing from a script's analyser settings
    pub fn settings(&mut self, settings: AnalyserSettings) -> &mut FourierBuilder {
        self.fft_size = Some(settings.fft_size);
        self.smoothing = Some(settings.smoothing);
        self
    }

    /// Set the window function
    pub fn window(&mut self, f: fn(usize) -> Vec<f32>) -> &mut FourierBuilder {
        self.window = Some(f);
        self
    }

    /// Set the downsampling factor
    pub fn downsample(&mut self, factor: usize) -> &mut FourierBuilder {
        self.downsample = Some(factor);
        self
    }

    /// Plan the fourier transform and prepare buffers
    pub fn plan(&mut self) -> FourierAnalyzer {
        let fft_size = self.fft_size.unwrap_or_default();
        let smoothing = self.smoothing.unwrap_or(0.7);
        let window = self.window.unwrap_or_else(|| {
            let name = crate::CONFIG.get_or("audio.fourier.window", "blackman".to_string());
            window::from_str(&name).unwrap_or_else(|| {
                log::warn!("Window function `{}` not found, using blackman", name);
                window::blackman
            })
        });
        let downsample = self
            .downsample
            .unwrap_or_else(|| crate::CONFIG.get_or("audio.fourier.downsample", 1))
            .max(1);

        FourierAnalyzer::new(
            AnalyserSettings {
                fft_size,
                smoothing,
            },
            window,
            downsample,
        )
    }
}

/// Fourier Analyzer
///
/// # Example
/// ```
/// # use waterfall_core::analyzer::fourier::*;
/// # use waterfall_core::attributes::FftSize;
/// let analyzer = FourierBuilder::new()
///     .fft_size(FftSize::new(512).unwrap())
///     .smoothing(0.8)
///     .window(window::blackman)
///     .downsample(1)
///     .plan();
///
/// assert_eq!(analyzer.buckets(), 256);
/// ```
#[derive(Clone)]
pub struct FourierAnalyzer {
    settings: AnalyserSettings,
    window_fn: fn(usize) -> Vec<f32>,
    window: Vec<Sample>,
    downsample: usize,

    fft: sync::Arc<dyn rustfft::Fft<Sample>>,
    buffer: Vec<rustfft::num_complex::Complex<Sample>>,

    smoothed: Vec<Sample>,
    decibels: analyzer::Spectrum<Vec<analyzer::SignalStrength>>,
}

impl std::fmt::Debug for FourierAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "FourierAnalyzer {{ fft_size: {:?}, smoothing: {:?}, downsample: {:?} }}",
            self.settings.fft_size.get(),
            self.settings.smoothing,
            self.downsample,
        )
    }
}

impl FourierAnalyzer {
    fn new(
        settings: AnalyserSettings,
        window_fn: fn(usize) -> Vec<f32>,
        downsample: usize,
    ) -> FourierAnalyzer {
        let length = settings.fft_size.get();
        let buckets = settings.fft_size.bins();

        let fa = FourierAnalyzer {
            settings,
            window_fn,
            window: window_fn(length),
            downsample,

            fft: rustfft::FftPlanner::new().plan_fft_forward(length),
            buffer: vec![rustfft::num_complex::Complex::new(0.0, 0.0); length],

            smoothed: vec![0.0; buckets],
            decibels: analyzer::Spectrum::new(vec![0.0; buckets], 0.0, 1.0),
        };

        log::debug!("FourierAnalyzer({:p}):", &fa);
        log::debug!("    Fourier Length      = {:8}", length);
        log::debug!("    Buckets             = {:8}", buckets);
        log::debug!("    Smoothing           = {:8.3}", settings.smoothing);
        log::debug!("    Downsample          = {:8}", downsample);

        fa
    }

    /// Return the number of buckets
    #[inline]
    pub fn buckets(&self) -> usize {
        self.settings.fft_size.bins()
    }

    #[inline]
    pub fn settings(&self) -> AnalyserSettings {
        self.settings
    }

    /// Apply new settings
    ///
    /// A new FFT size replans the transform and forgets the smoothing history.
    pub fn configure(&mut self, settings: AnalyserSettings) {
        if settings == self.settings {
            return;
        }

        if settings.fft_size != self.settings.fft_size {
            *self = FourierAnalyzer::new(settings, self.window_fn, self.downsample);
        } else {
            log::debug!(
                "FourierAnalyzer({:p}): Smoothing = {:.3}",
                self,
                settings.smoothing
            );
            self.settings = settings;
        }
    }

    /// Pick up changes from a script's settings handle
    pub fn follow(&mut self, handle: &AnalyserHandle) {
        self.configure(handle.get());
    }

    /// Analyze a `SampleBuffer`
    ///
    /// Returns the smoothed spectrum in decibels.  The lowest bucket is DC, the highest is half
    /// a bucket below nyquist.
    pub fn analyze(
        &mut self,
        buf: &analyzer::SampleBuffer,
    ) -> analyzer::Spectrum<&[analyzer::SignalStrength]> {
        log::trace!("FourierAnalyzer({:p}): Analyzing ...", &self);

        let length = self.window.len();

        // Mono mix of the newest samples, zero padded if the buffer is too short
        for b in self.buffer.iter_mut() {
            *b = rustfft::num_complex::Complex::new(0.0, 0.0);
        }
        for (b, ([l, r], window)) in self.buffer.iter_mut().zip(
            buf.iter(length, self.downsample)
                .zip(self.window.iter()),
        ) {
            *b = rustfft::num_complex::Complex::new((l + r) / 2.0 * window, 0.0);
        }

        self.fft.process(&mut self.buffer);

        let tau = self.settings.smoothing;
        let scale = 1.0 / length as f32;
        for ((s, db), o) in self
            .smoothed
            .iter_mut()
            .zip(self.decibels.iter_mut())
            .zip(self.buffer.iter())
        {
            *s = tau * *s + (1.0 - tau) * o.norm() * scale;
            *db = 20.0 * s.max(MIN_MAGNITUDE).log10();
        }

        let rate = buf.rate() as analyzer::Frequency / self.downsample as analyzer::Frequency;
        let bucket_width = rate / length as analyzer::Frequency;
        let buckets = self.smoothed.len();
        self.decibels
            .respan(0.0, (buckets - 1) as analyzer::Frequency * bucket_width);

        self.decibels.as_ref()
    }

    /// Spectrum of the last analysis, in decibels
    pub fn decibels(&self) -> analyzer::Spectrum<&[analyzer::SignalStrength]> {
        self.decibels.as_ref()
    }
}

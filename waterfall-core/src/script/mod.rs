//! Waterfall scripts
//!
//! A script owns the history of FFT windows and the mesh derived from it.  It is driven once per
//! frame with the latest analyser output and exposes `play`/`stop` to control the sound it
//! listens to.
pub mod spectrum_waterfall;
pub mod waterfall_display;

pub use self::spectrum_waterfall::SpectrumWaterfall;
pub use self::waterfall_display::WaterfallDisplay;

use crate::analyzer;
use crate::attributes::CommonAttributes;
use crate::mesh::Mesh;
use crate::recorder::Recorder;

/// Absolute noise floor level in dB
pub const NOISE_FLOOR: f32 = 148.0;

/// Hue rotation speed when cycling colors, in degrees per second
pub const HUE_CYCLE_SPEED: f32 = -50.0;

pub trait Script {
    fn name(&self) -> &'static str;

    /// Advance by one frame
    ///
    /// `window` is the current analyser output in dB.  Windows with a bin count that does not
    /// match the script are ignored.
    fn update(&mut self, dt: f32, window: &analyzer::Spectrum<&[analyzer::SignalStrength]>);

    fn mesh(&self) -> &Mesh;

    /// Frequency bins per FFT window
    fn bin_count(&self) -> usize;

    /// Settings handle for the analyser feeding this script
    fn analyser(&self) -> &analyzer::AnalyserHandle;

    fn attributes(&self) -> &CommonAttributes;

    /// Change attributes, resetting whatever depends on them
    fn set_attributes(&mut self, attributes: CommonAttributes);

    /// Reallocate all buffers and regenerate the geometry
    fn reset(&mut self);

    /// Start playing a sound slot
    ///
    /// Activates the script if it was inactive and stops whatever was playing before.
    fn play(&mut self, recorder: &mut dyn Recorder, slot: &str) -> crate::Result<()> {
        if !self.attributes().active {
            let mut attributes = self.attributes().clone();
            attributes.active = true;
            self.set_attributes(attributes);
        }

        recorder.stop();
        recorder.play(slot)
    }

    /// Stop the sound
    fn stop(&mut self, recorder: &mut dyn Recorder) {
        recorder.stop();
    }
}

/// Turn a window of decibels into heights
///
/// Full scale maps to `amp`, the noise floor to zero.
pub fn normalize(
    window: &analyzer::Spectrum<&[analyzer::SignalStrength]>,
    gain: f32,
    amp: f32,
    out: &mut [f32],
) {
    for (o, db) in out.iter_mut().zip(window.iter()) {
        *o = (db + NOISE_FLOOR + gain) / NOISE_FLOOR * amp;
    }
}

fn analyser_settings(attributes: &CommonAttributes) -> analyzer::AnalyserSettings {
    analyzer::AnalyserSettings {
        fft_size: attributes.fft_size,
        smoothing: attributes.smoothing,
    }
}

fn cycle_colors(attributes: &mut CommonAttributes, dt: f32) {
    if attributes.cycle_colors {
        crate::color::rotate_hue(&mut attributes.color_max, HUE_CYCLE_SPEED * dt);
        crate::color::rotate_hue(&mut attributes.color_min, HUE_CYCLE_SPEED * dt);
    }
}

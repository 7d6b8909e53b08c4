//! Raining spectrogram on a fixed grid
//!
//! X is frequency, Z is time.  Only heights and colors move, new windows enter at the front row
//! and scroll towards the back.
use crate::analyzer;
use crate::attributes::{CommonAttributes, SpectrumWaterfallAttributes};
use crate::history::{self, History};
use crate::mesh::Mesh;
use crate::script::Script;

/// Bin count the `speed` attribute is calibrated for
const REFERENCE_BINS: f32 = 256.0;

#[derive(Debug)]
pub struct SpectrumWaterfall {
    attrs: SpectrumWaterfallAttributes,
    analyser: analyzer::AnalyserHandle,
    bin_count: usize,
    history: History,
    window: Vec<f32>,
    mesh: Mesh,
}

impl SpectrumWaterfall {
    pub fn new(attrs: SpectrumWaterfallAttributes) -> SpectrumWaterfall {
        let attrs = attrs.clamped();
        let bin_count = attrs.common.fft_size.bins();
        let length = attrs.common.length;

        let mut waterfall = SpectrumWaterfall {
            analyser: analyzer::AnalyserHandle::new(super::analyser_settings(&attrs.common)),
            attrs,
            bin_count,
            history: History::new(bin_count, length),
            window: vec![0.0; bin_count],
            mesh: Mesh::new(),
        };
        waterfall.reset();
        waterfall
    }

    pub fn attrs(&self) -> &SpectrumWaterfallAttributes {
        &self.attrs
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Replace all attributes
    ///
    /// Values are clamped into their ranges first.  FFT size or length changes reset everything,
    /// extent changes only move the vertices.
    pub fn set_attrs(&mut self, attrs: SpectrumWaterfallAttributes) {
        let attrs = attrs.clamped();
        if attrs == self.attrs {
            return;
        }
        let old = std::mem::replace(&mut self.attrs, attrs);
        let new = &self.attrs;

        if super::analyser_settings(&old.common) != super::analyser_settings(&new.common) {
            self.analyser.set(super::analyser_settings(&new.common));
        }

        if old.common.fft_size != new.common.fft_size || old.common.length != new.common.length {
            self.reset();
        } else if old.scale_x != new.scale_x
            || old.speed != new.speed
            || old.start_offset != new.start_offset
        {
            self.calculate_extents();
            self.mesh.recalculate_normals();
        }
    }

    /// Add an FFT window to the history and update the heights
    fn add_window(&mut self, window: &analyzer::Spectrum<&[analyzer::SignalStrength]>) {
        super::normalize(
            window,
            self.attrs.common.gain,
            self.attrs.common.amp,
            &mut self.window,
        );
        self.history.push(&self.window);

        // First and last rows stay flat to close the mesh off
        let area = self.history.as_slice().len();
        let bins = self.bin_count;
        for (i, y) in self
            .mesh
            .positions
            .iter_mut()
            .skip(1)
            .step_by(3)
            .enumerate()
        {
            *y = if i < bins || i >= area - bins {
                0.0
            } else {
                self.history[i].max(0.0)
            };
        }
    }

    /// Scroll colors back and color the newest row by amplitude
    fn calculate_colors(&mut self) {
        let attrs = &self.attrs.common;
        let bins = self.bin_count;

        history::scroll(&mut self.mesh.colors, 4 * bins);

        for (i, rgba) in self.mesh.colors[..4 * bins].chunks_exact_mut(4).enumerate() {
            let t = (self.history[i] / attrs.amp).max(0.0).min(1.0);
            let mut color = attrs.color_min.lerp(attrs.color_max, t);

            // Force left and right most to be transparent
            if i == 0 || i == bins - 1 {
                color.a = 0.0;
            }

            color.write_to(rgba);
        }

        if attrs.fade_decay != 1.0 {
            for alpha in self.mesh.colors.iter_mut().skip(3).step_by(4) {
                *alpha *= attrs.fade_decay;
            }
        }
    }

    /// Everything but the heights
    fn calculate_extents(&mut self) {
        let bins = self.bin_count;
        let scale_x = self.attrs.scale_x / bins as f32;
        let start = self.attrs.start_offset * 2.0;
        let step = self.attrs.speed * (REFERENCE_BINS / bins as f32);

        for (i, p) in self.mesh.positions.chunks_exact_mut(3).enumerate() {
            let (x, z) = (i % bins, i / bins);

            // Frequency
            p[0] = (bins as f32 / 2.0 - x as f32) * scale_x;

            // Time
            p[2] = match z {
                0 => 0.0,
                1 => start,
                _ => start + z as f32 * step,
            };
        }
    }
}

impl super::Script for SpectrumWaterfall {
    fn name(&self) -> &'static str {
        "spectrum"
    }

    fn update(&mut self, dt: f32, window: &analyzer::Spectrum<&[analyzer::SignalStrength]>) {
        super::cycle_colors(&mut self.attrs.common, dt);

        if !self.attrs.common.active {
            return;
        }

        if window.len() != self.bin_count {
            log::trace!(
                "SpectrumWaterfall: Skipping window with {} bins (want {})",
                window.len(),
                self.bin_count
            );
            return;
        }

        self.add_window(window);
        self.calculate_colors();
        self.mesh.recalculate_normals();
    }

    fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn bin_count(&self) -> usize {
        self.bin_count
    }

    fn analyser(&self) -> &analyzer::AnalyserHandle {
        &self.analyser
    }

    fn attributes(&self) -> &CommonAttributes {
        &self.attrs.common
    }

    fn set_attributes(&mut self, attributes: CommonAttributes) {
        let attrs = SpectrumWaterfallAttributes {
            common: attributes,
            ..self.attrs.clone()
        };
        self.set_attrs(attrs);
    }

    fn reset(&mut self) {
        self.bin_count = self.attrs.common.fft_size.bins();
        let length = self.attrs.common.length;

        self.history = History::new(self.bin_count, length);
        self.window = vec![0.0; self.bin_count];
        self.mesh.rebuild(self.bin_count, length, 0.0);

        self.calculate_extents();
        self.calculate_colors();
        self.mesh.recalculate_normals();

        log::debug!(
            "SpectrumWaterfall: Reset to {} bins x {} windows",
            self.bin_count,
            length
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::FftSize;
    use crate::script::tests::window;
    use crate::script::Script;

    fn quiet() -> SpectrumWaterfallAttributes {
        let mut attrs = SpectrumWaterfallAttributes::default();
        attrs.common.cycle_colors = false;
        attrs.common.length = 8;
        attrs.common.fft_size = FftSize::new(32).unwrap();
        attrs
    }

    fn height(w: &SpectrumWaterfall, x: usize, z: usize) -> f32 {
        w.mesh().positions[3 * (x + z * w.bin_count()) + 1]
    }

    fn alpha(w: &SpectrumWaterfall, x: usize, z: usize) -> f32 {
        w.mesh().colors[4 * (x + z * w.bin_count()) + 3]
    }

    #[test]
    fn test_geometry() {
        let w = SpectrumWaterfall::new(Default::default());
        let mesh = w.mesh();

        assert_eq!(w.bin_count(), 128);
        assert_eq!(mesh.vertex_count(), 128 * 128);
        assert_eq!(mesh.indices.len(), 127 * 127 * 6);
        assert_eq!(mesh.uvs.len(), 2 * 128 * 128);
        assert_eq!(mesh.generation(), 1);
    }

    #[test]
    fn test_extents() {
        let w = SpectrumWaterfall::new(quiet());
        let p = &w.mesh().positions;
        let bins = w.bin_count();

        // 16 bins over 16 units, centered
        assert_eq!(p[0], 8.0);
        assert_eq!(p[3 * 8], 0.0);
        assert_eq!(p[3 * 15], -7.0);

        let z = |row: usize| p[3 * row * bins + 2];
        assert_eq!(z(0), 0.0);
        assert_eq!(z(1), 1.0);
        // 1.0 + 2 * speed * (256 / 16)
        assert_eq!(z(2), 33.0);
        assert_eq!(z(3), 49.0);
    }

    #[test]
    fn test_heights() {
        let mut w = SpectrumWaterfall::new(quiet());

        w.update(0.016, &window(16, -74.0).as_ref());
        // Newest row is always flat
        assert_eq!(height(&w, 5, 0), 0.0);

        w.update(0.016, &window(16, -148.0 + 37.0).as_ref());
        assert_eq!(height(&w, 5, 0), 0.0);
        assert_eq!(height(&w, 5, 1), 0.5);
        assert_eq!(w.history().window(0)[5], 0.25);

        for _ in 0..6 {
            w.update(0.016, &window(16, -200.0).as_ref());
        }
        // The loud window sits in the last row now, which is flat too
        assert_eq!(w.history().window(7)[5], 0.5);
        assert_eq!(height(&w, 5, 7), 0.0);
        // Below the noise floor is clamped to zero
        assert_eq!(height(&w, 5, 3), 0.0);
    }

    #[test]
    fn test_colors() {
        let mut w = SpectrumWaterfall::new(quiet());

        w.update(0.016, &window(16, 0.0).as_ref());

        let c = &w.mesh().colors;
        // Full scale is color_max
        assert_eq!(&c[4 * 5..4 * 5 + 3], &[1.0, 0.0, 0.0]);
        assert!((alpha(&w, 5, 0) - 0.97).abs() < 1e-6);

        // Edges are transparent
        assert_eq!(alpha(&w, 0, 0), 0.0);
        assert_eq!(alpha(&w, 15, 0), 0.0);

        w.update(0.016, &window(16, -148.0).as_ref());
        let c = &w.mesh().colors;
        // Silence is color_min, the previous row moved back and faded further
        assert_eq!(&c[4 * 5..4 * 5 + 3], &[0.0, 1.0, 0.0]);
        assert_eq!(&c[4 * (5 + 16)..4 * (5 + 16) + 3], &[1.0, 0.0, 0.0]);
        assert!((alpha(&w, 5, 1) - 0.97 * 0.97).abs() < 1e-6);
    }

    #[test]
    fn test_no_fade() {
        let mut attrs = quiet();
        attrs.common.fade_decay = 1.0;
        let mut w = SpectrumWaterfall::new(attrs);

        for _ in 0..3 {
            w.update(0.016, &window(16, 0.0).as_ref());
        }
        assert_eq!(alpha(&w, 5, 2), 1.0);
    }

    #[test]
    fn test_inactive() {
        let mut attrs = quiet();
        attrs.common.active = false;
        let mut w = SpectrumWaterfall::new(attrs);

        w.update(0.016, &window(16, 0.0).as_ref());
        assert!(w.history().as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_skip_mismatched_window() {
        let mut w = SpectrumWaterfall::new(quiet());

        w.update(0.016, &window(128, 0.0).as_ref());
        assert!(w.history().as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_cycle_colors() {
        let mut attrs = quiet();
        attrs.common.cycle_colors = true;
        let mut w = SpectrumWaterfall::new(attrs);

        w.update(0.5, &window(16, 0.0).as_ref());
        assert_ne!(w.attributes().color_max, crate::color::Color::RED);
        assert_eq!(w.attributes().color_max.a, 1.0);

        // Cycling continues while inactive
        let mut common = w.attributes().clone();
        common.active = false;
        w.set_attributes(common);
        let before = w.attributes().color_min;
        w.update(0.5, &window(16, 0.0).as_ref());
        assert_ne!(w.attributes().color_min, before);
    }

    #[test]
    fn test_attribute_changes() {
        let mut w = SpectrumWaterfall::new(quiet());
        assert_eq!(w.mesh().generation(), 1);

        // Nothing changed
        w.set_attrs(w.attrs().clone());
        assert_eq!(w.mesh().generation(), 1);

        // Extents only
        let mut attrs = w.attrs().clone();
        attrs.scale_x = 32.0;
        w.set_attrs(attrs);
        assert_eq!(w.mesh().generation(), 1);
        assert_eq!(w.mesh().positions[0], 16.0);

        // Smoothing only goes to the analyser
        let mut common = w.attributes().clone();
        common.smoothing = 0.2;
        w.set_attributes(common);
        assert_eq!(w.mesh().generation(), 1);
        assert_eq!(w.analyser().get().smoothing, 0.2);

        // FFT size resets
        let mut common = w.attributes().clone();
        common.fft_size = FftSize::new(256).unwrap();
        w.set_attributes(common);
        assert_eq!(w.mesh().generation(), 2);
        assert_eq!(w.bin_count(), 128);
        assert_eq!(w.analyser().get().fft_size.get(), 256);
        assert_eq!(w.mesh().vertex_count(), 128 * 8);

        // Length resets
        let mut common = w.attributes().clone();
        common.length = 16;
        w.set_attributes(common);
        assert_eq!(w.mesh().generation(), 3);
        assert_eq!(w.history().length(), 16);
        assert_eq!(w.mesh().indices.len(), 127 * 15 * 6);
    }

    #[test]
    fn test_zero_length() {
        let mut w = SpectrumWaterfall::new(quiet());

        let mut common = w.attributes().clone();
        common.length = 0;
        w.set_attributes(common);
        assert_eq!(w.attributes().length, SpectrumWaterfallAttributes::LENGTH_MIN);
        assert_eq!(w.history().length(), 4);
        assert_eq!(w.mesh().vertex_count(), 16 * 4);

        w.update(0.016, &window(16, 0.0).as_ref());
        assert_eq!(w.history().window(0)[5], 1.0);
    }
}

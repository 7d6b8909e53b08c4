//! Free floating waterfall trail
//!
//! Every window is spawned as a line of vertices at a configurable position and rotation.  Older
//! lines drift away with a constant velocity.
use nalgebra as na;

use crate::analyzer;
use crate::attributes::{ColorMode, CommonAttributes, WaterfallDisplayAttributes};
use crate::history::{self, History};
use crate::mesh::Mesh;
use crate::script::Script;

#[derive(Debug)]
pub struct WaterfallDisplay {
    attrs: WaterfallDisplayAttributes,
    analyser: analyzer::AnalyserHandle,
    bin_count: usize,
    history: History,
    window: Vec<f32>,
    mesh: Mesh,
}

impl WaterfallDisplay {
    pub fn new(attrs: WaterfallDisplayAttributes) -> WaterfallDisplay {
        let attrs = attrs.clamped();
        let bin_count = attrs.common.fft_size.bins();
        let length = attrs.common.length;

        let mut display = WaterfallDisplay {
            analyser: analyzer::AnalyserHandle::new(super::analyser_settings(&attrs.common)),
            attrs,
            bin_count,
            history: History::new(bin_count, length),
            window: vec![0.0; bin_count],
            mesh: Mesh::new(),
        };
        display.reset();
        display
    }

    pub fn attrs(&self) -> &WaterfallDisplayAttributes {
        &self.attrs
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Replace all attributes
    ///
    /// Values are clamped into their ranges first.  Spawn position, rotation and velocity only
    /// affect windows added afterwards.
    pub fn set_attrs(&mut self, attrs: WaterfallDisplayAttributes) {
        let attrs = attrs.clamped();
        if attrs == self.attrs {
            return;
        }
        let old = std::mem::replace(&mut self.attrs, attrs);

        let settings = super::analyser_settings(&self.attrs.common);
        if super::analyser_settings(&old.common) != settings {
            self.analyser.set(settings);
        }

        if old.common.fft_size != self.attrs.common.fft_size
            || old.common.length != self.attrs.common.length
        {
            self.reset();
        }
    }

    fn spawn_rotation(&self) -> na::UnitQuaternion<f32> {
        let [x, y, z] = self.attrs.rotation;
        na::UnitQuaternion::from_euler_angles(x.to_radians(), y.to_radians(), z.to_radians())
    }

    /// Scroll everything back by one row and spawn the new window in front
    fn add_window(&mut self, window: &analyzer::Spectrum<&[analyzer::SignalStrength]>) {
        let attrs = &self.attrs.common;
        let bins = self.bin_count;

        super::normalize(window, attrs.gain, attrs.amp, &mut self.window);
        self.history.push(&self.window);

        history::scroll(&mut self.mesh.colors, 4 * bins);
        history::scroll(&mut self.mesh.positions, 3 * bins);

        for (i, rgba) in self.mesh.colors[..4 * bins].chunks_exact_mut(4).enumerate() {
            let t = match self.attrs.color_mode {
                ColorMode::Amp => (self.window[i] / attrs.amp).max(0.0).min(1.0),
                ColorMode::Freq => i as f32 / bins as f32,
            };
            attrs.color_min.lerp(attrs.color_max, t).write_to(rgba);
        }

        let rotation = self.spawn_rotation();
        let offset = na::Vector3::from(self.attrs.position);
        let scale = self.attrs.width / bins as f32;
        let half_width = self.attrs.width / 2.0;

        for (i, p) in self.mesh.positions[..3 * bins].chunks_exact_mut(3).enumerate() {
            let v = na::Vector3::new(i as f32 * scale - half_width, self.window[i].max(0.0), 0.0);
            let v = rotation * v + offset;

            p.copy_from_slice(v.as_slice());
        }
    }

    fn fade(&mut self) {
        let decay = self.attrs.common.fade_decay;
        if decay == 1.0 {
            return;
        }

        for alpha in self.mesh.colors.iter_mut().skip(3).step_by(4) {
            *alpha *= decay;
        }
    }

    /// Move all but the newest row
    fn drift(&mut self) {
        let velocity = self.attrs.velocity;
        if velocity == [0.0; 3] {
            return;
        }

        for p in self.mesh.positions[3 * self.bin_count..].chunks_exact_mut(3) {
            p[0] += velocity[0];
            p[1] += velocity[1];
            p[2] += velocity[2];
        }
    }
}

impl super::Script for WaterfallDisplay {
    fn name(&self) -> &'static str {
        "display"
    }

    fn update(&mut self, dt: f32, window: &analyzer::Spectrum<&[analyzer::SignalStrength]>) {
        super::cycle_colors(&mut self.attrs.common, dt);

        if !self.attrs.common.active {
            return;
        }

        if window.len() != self.bin_count {
            log::trace!(
                "WaterfallDisplay: Skipping window with {} bins (want {})",
                window.len(),
                self.bin_count
            );
            return;
        }

        self.add_window(window);
        self.fade();
        self.drift();
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
        let attrs = WaterfallDisplayAttributes {
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
        self.mesh.rebuild(self.bin_count, length, 1.0);

        log::debug!(
            "WaterfallDisplay: Reset to {} bins x {} windows",
            self.bin_count,
            length
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::FftSize;
    use crate::color::Color;
    use crate::script::tests::window;
    use crate::script::Script;

    fn small() -> WaterfallDisplayAttributes {
        let mut attrs = WaterfallDisplayAttributes::default();
        attrs.common.fft_size = FftSize::new(32).unwrap();
        attrs.common.length = 4;
        attrs.width = 16.0;
        attrs
    }

    fn position(d: &WaterfallDisplay, x: usize, z: usize) -> [f32; 3] {
        let i = 3 * (x + z * d.bin_count());
        let p = &d.mesh().positions;
        [p[i], p[i + 1], p[i + 2]]
    }

    fn assert_close(a: [f32; 3], b: [f32; 3]) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-4, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_initial_state() {
        let d = WaterfallDisplay::new(small());

        assert_eq!(d.bin_count(), 16);
        assert_eq!(d.mesh().vertex_count(), 64);
        assert!(d.mesh().colors.iter().all(|c| *c == 1.0));
        assert!(d.mesh().positions.iter().all(|p| *p == 0.0));
    }

    #[test]
    fn test_spawn_positions() {
        let mut d = WaterfallDisplay::new(small());

        d.update(0.016, &window(16, -74.0).as_ref());
        assert_close(position(&d, 0, 0), [-8.0, 0.5, 0.0]);
        assert_close(position(&d, 4, 0), [-4.0, 0.5, 0.0]);

        d.update(0.016, &window(16, -148.0).as_ref());
        assert_close(position(&d, 4, 0), [-4.0, 0.0, 0.0]);
        assert_close(position(&d, 4, 1), [-4.0, 0.5, 0.0]);
        assert_close(position(&d, 4, 3), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rotation_and_offset() {
        let mut attrs = small();
        attrs.rotation = [0.0, 90.0, 0.0];
        attrs.position = [1.0, 2.0, 3.0];
        let mut d = WaterfallDisplay::new(attrs);

        d.update(0.016, &window(16, -74.0).as_ref());
        // (-4, 0.5, 0) rotated about Y lands on the Z axis
        assert_close(position(&d, 4, 0), [1.0, 2.5, 7.0]);
    }

    #[test]
    fn test_velocity() {
        let mut attrs = small();
        attrs.velocity = [0.0, 0.0, -1.0];
        let mut d = WaterfallDisplay::new(attrs);

        d.update(0.016, &window(16, -148.0).as_ref());
        d.update(0.016, &window(16, -148.0).as_ref());
        d.update(0.016, &window(16, -148.0).as_ref());

        // Newest row never moves, each older one was moved once per frame since it spawned
        assert_close(position(&d, 8, 0), [0.0, 0.0, 0.0]);
        assert_close(position(&d, 8, 1), [0.0, 0.0, -1.0]);
        assert_close(position(&d, 8, 2), [0.0, 0.0, -2.0]);
    }

    #[test]
    fn test_freq_colors() {
        let mut attrs = small();
        attrs.color_mode = ColorMode::Freq;
        attrs.common.fade_decay = 1.0;
        let mut d = WaterfallDisplay::new(attrs);

        d.update(0.016, &window(16, 0.0).as_ref());
        let c = &d.mesh().colors;
        assert_eq!(&c[0..4], &<[f32; 4]>::from(Color::GREEN));
        assert_eq!(&c[4 * 8..4 * 9], &[0.5, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn test_color_scroll_and_fade() {
        let mut d = WaterfallDisplay::new(small());

        d.update(0.016, &window(16, 0.0).as_ref());
        let c = &d.mesh().colors;
        assert_eq!(&c[4 * 3..4 * 3 + 3], &[1.0, 0.0, 0.0]);
        assert!((c[4 * 3 + 3] - 0.97).abs() < 1e-6);
        // Untouched rows fade from their initial white
        assert!((c[4 * 16 + 3] - 0.97).abs() < 1e-6);

        d.update(0.016, &window(16, -148.0).as_ref());
        let c = &d.mesh().colors;
        assert_eq!(&c[4 * 3..4 * 3 + 3], &[0.0, 1.0, 0.0]);
        assert_eq!(&c[4 * 19..4 * 19 + 3], &[1.0, 0.0, 0.0]);
        assert!((c[4 * 19 + 3] - 0.97 * 0.97).abs() < 1e-6);
    }

    #[test]
    fn test_reset_on_length() {
        let mut d = WaterfallDisplay::new(small());
        let mut attrs = d.attrs().clone();
        attrs.velocity = [1.0, 0.0, 0.0];
        d.set_attrs(attrs);
        assert_eq!(d.mesh().generation(), 1);

        let mut common = d.attributes().clone();
        common.length = 10;
        d.set_attributes(common);
        assert_eq!(d.mesh().generation(), 2);
        assert_eq!(d.mesh().vertex_count(), 160);
        assert_eq!(d.attrs().velocity, [1.0, 0.0, 0.0]);

        let mut common = d.attributes().clone();
        common.fft_size = FftSize::new(256).unwrap();
        d.set_attributes(common);
        assert_eq!(d.mesh().generation(), 3);
        assert_eq!(d.bin_count(), 128);
        assert_eq!(d.analyser().get().fft_size.get(), 256);
        assert_eq!(d.mesh().vertex_count(), 128 * 10);
        assert_eq!(d.history().as_slice().len(), 128 * 10);
    }

    #[test]
    fn test_skip_mismatched_window() {
        let mut d = WaterfallDisplay::new(small());

        d.update(0.016, &window(128, 0.0).as_ref());
        assert!(d.history().as_slice().iter().all(|v| *v == 0.0));
        assert!(d.mesh().positions.iter().all(|p| *p == 0.0));
        assert!(d.mesh().colors.iter().all(|c| *c == 1.0));
    }

    #[test]
    fn test_zero_length() {
        let mut d = WaterfallDisplay::new(small());

        let mut common = d.attributes().clone();
        common.length = 0;
        d.set_attributes(common);
        assert_eq!(d.attributes().length, WaterfallDisplayAttributes::LENGTH_MIN);
        assert_eq!(d.mesh().vertex_count(), 16);

        d.update(0.016, &window(16, -74.0).as_ref());
        assert_close(position(&d, 4, 0), [-4.0, 0.5, 0.0]);
    }
}

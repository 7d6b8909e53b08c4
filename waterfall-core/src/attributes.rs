//! Script attributes
//!
//! Every attribute has a default and, where it makes sense, a range.  Values loaded from the
//! config are clamped into their range.
use crate::color::Color;
use crate::helpers::clamp_attr;

/// Size of the FFT in samples
///
/// Always a power of two between 32 and 4096.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FftSize(usize);

impl FftSize {
    pub const MIN: FftSize = FftSize(32);
    pub const MAX: FftSize = FftSize(4096);

    pub fn new(size: usize) -> crate::Result<FftSize> {
        if size.is_power_of_two() && size >= Self::MIN.0 && size <= Self::MAX.0 {
            Ok(FftSize(size))
        } else {
            Err(crate::Error::InvalidFftSize(size))
        }
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }

    /// Number of frequency bins, half the FFT size
    #[inline]
    pub fn bins(self) -> usize {
        self.0 / 2
    }

    /// Next bigger size, saturating at 4096
    pub fn doubled(self) -> FftSize {
        FftSize((self.0 * 2).min(Self::MAX.0))
    }

    /// Next smaller size, saturating at 32
    pub fn halved(self) -> FftSize {
        FftSize((self.0 / 2).max(Self::MIN.0))
    }
}

impl Default for FftSize {
    fn default() -> FftSize {
        FftSize(256)
    }
}

/// How the waterfall display colors new points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Interpolate by the amplitude of each bin
    Amp,
    /// Interpolate by the index of each bin
    Freq,
}

impl ColorMode {
    pub fn from_str(name: &str) -> Option<ColorMode> {
        match name {
            "amp" => Some(ColorMode::Amp),
            "freq" => Some(ColorMode::Freq),
            _ => None,
        }
    }
}

impl Default for ColorMode {
    fn default() -> ColorMode {
        ColorMode::Amp
    }
}

/// Attributes both scripts have
#[derive(Debug, Clone, PartialEq)]
pub struct CommonAttributes {
    /// Currently recording FFT windows
    pub active: bool,
    pub fft_size: FftSize,
    /// Averaging constant with the last analysis frame
    pub smoothing: f32,
    /// Height of the mesh for a full scale signal
    pub amp: f32,
    /// Gain in dB applied before normalization
    pub gain: f32,
    /// Number of FFT windows kept in the history
    pub length: usize,
    /// Alpha multiplier applied every frame
    pub fade_decay: f32,
    pub color_min: Color,
    pub color_max: Color,
    /// Rotate the hue of both colors over time
    pub cycle_colors: bool,
}

impl CommonAttributes {
    fn from_config(prefix: &str, defaults: CommonAttributes, amp_max: f32, length_min: usize) -> CommonAttributes {
        let key = |name: &str| format!("{}.{}", prefix, name);

        let fft_size = crate::CONFIG.get_or(&key("fft_size"), defaults.fft_size.get());
        let fft_size = FftSize::new(fft_size).unwrap_or_else(|e| {
            log::warn!("{}, using {}", e, defaults.fft_size.get());
            defaults.fft_size
        });

        let length = crate::CONFIG.get_or(&key("length"), defaults.length);

        CommonAttributes {
            active: crate::CONFIG.get_or(&key("active"), defaults.active),
            fft_size,
            smoothing: crate::CONFIG.get_or(&key("smoothing"), defaults.smoothing),
            amp: crate::CONFIG.get_or(&key("amp"), defaults.amp),
            gain: crate::CONFIG.get_or(&key("gain"), defaults.gain),
            length,
            fade_decay: crate::CONFIG.get_or(&key("fade_decay"), defaults.fade_decay),
            color_min: crate::CONFIG
                .get_or(&key("color_min"), <[f32; 4]>::from(defaults.color_min))
                .into(),
            color_max: crate::CONFIG
                .get_or(&key("color_max"), <[f32; 4]>::from(defaults.color_max))
                .into(),
            cycle_colors: crate::CONFIG.get_or(&key("cycle_colors"), defaults.cycle_colors),
        }
        .clamped(amp_max, length_min)
    }

    /// Force every value into its allowed range
    pub fn clamped(mut self, amp_max: f32, length_min: usize) -> CommonAttributes {
        self.smoothing = clamp_attr("smoothing", self.smoothing, 0.0, 1.0);
        self.amp = clamp_attr("amp", self.amp, 0.01, amp_max);
        self.gain = clamp_attr("gain", self.gain, -48.0, 48.0);
        self.length = clamp_attr("length", self.length as f32, length_min as f32, 256.0) as usize;
        self.fade_decay = clamp_attr("fade_decay", self.fade_decay, 0.9, 1.0);
        self
    }
}

/// Attributes of the [`SpectrumWaterfall`](../script/spectrum_waterfall/struct.SpectrumWaterfall.html)
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumWaterfallAttributes {
    pub common: CommonAttributes,
    /// Mesh X axis extent
    pub scale_x: f32,
    /// Rate of Z axis movement over time
    pub speed: f32,
    /// Gap between the start vertices and the first FFT window
    pub start_offset: f32,
}

impl SpectrumWaterfallAttributes {
    pub const AMP_MAX: f32 = 4.0;
    pub const LENGTH_MIN: usize = 4;

    /// Load from the `spectrum.*` config table
    pub fn from_config() -> SpectrumWaterfallAttributes {
        let defaults = SpectrumWaterfallAttributes::default();

        SpectrumWaterfallAttributes {
            common: CommonAttributes::from_config(
                "spectrum",
                defaults.common,
                Self::AMP_MAX,
                Self::LENGTH_MIN,
            ),
            scale_x: crate::CONFIG.get_or("spectrum.scale_x", defaults.scale_x),
            speed: crate::CONFIG.get_or("spectrum.speed", defaults.speed),
            start_offset: crate::CONFIG.get_or("spectrum.start_offset", defaults.start_offset),
        }
        .clamped()
    }

    pub fn clamped(mut self) -> SpectrumWaterfallAttributes {
        self.common = self.common.clamped(Self::AMP_MAX, Self::LENGTH_MIN);
        self.scale_x = clamp_attr("scale_x", self.scale_x, 1.0, 32.0);
        self.speed = clamp_attr("speed", self.speed, 0.001, 1.0);
        self.start_offset = clamp_attr("start_offset", self.start_offset, 0.0, 1.0);
        self
    }
}

impl Default for SpectrumWaterfallAttributes {
    fn default() -> SpectrumWaterfallAttributes {
        SpectrumWaterfallAttributes {
            common: CommonAttributes {
                active: true,
                fft_size: FftSize::default(),
                smoothing: 0.7,
                amp: 1.0,
                gain: 0.0,
                length: 128,
                fade_decay: 0.97,
                color_min: Color::GREEN,
                color_max: Color::RED,
                cycle_colors: true,
            },
            scale_x: 16.0,
            speed: 1.0,
            start_offset: 0.5,
        }
    }
}

/// Attributes of the [`WaterfallDisplay`](../script/waterfall_display/struct.WaterfallDisplay.html)
#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallDisplayAttributes {
    pub common: CommonAttributes,
    /// Spawn point for new windows
    pub position: [f32; 3],
    /// Spawn rotation as euler angles in degrees
    pub rotation: [f32; 3],
    /// Static velocity of all older windows, per frame
    pub velocity: [f32; 3],
    /// Trail width extent
    pub width: f32,
    pub color_mode: ColorMode,
}

impl WaterfallDisplayAttributes {
    pub const AMP_MAX: f32 = 10.0;
    pub const LENGTH_MIN: usize = 1;

    /// Load from the `display.*` config table
    pub fn from_config() -> WaterfallDisplayAttributes {
        let defaults = WaterfallDisplayAttributes::default();

        let color_mode = crate::CONFIG.get_or("display.color_mode", "amp".to_string());
        let color_mode = ColorMode::from_str(&color_mode).unwrap_or_else(|| {
            log::warn!("Unknown color mode `{}`, using amp", color_mode);
            ColorMode::Amp
        });

        WaterfallDisplayAttributes {
            common: CommonAttributes::from_config(
                "display",
                defaults.common,
                Self::AMP_MAX,
                Self::LENGTH_MIN,
            ),
            position: crate::CONFIG.get_or("display.position", defaults.position),
            rotation: crate::CONFIG.get_or("display.rotation", defaults.rotation),
            velocity: crate::CONFIG.get_or("display.velocity", defaults.velocity),
            width: crate::CONFIG.get_or("display.width", defaults.width),
            color_mode,
        }
        .clamped()
    }

    pub fn clamped(mut self) -> WaterfallDisplayAttributes {
        self.common = self.common.clamped(Self::AMP_MAX, Self::LENGTH_MIN);
        self.width = clamp_attr("width", self.width, 0.0, 64.0);
        self
    }
}

impl Default for WaterfallDisplayAttributes {
    fn default() -> WaterfallDisplayAttributes {
        WaterfallDisplayAttributes {
            common: CommonAttributes {
                active: true,
                fft_size: FftSize::default(),
                smoothing: 0.7,
                amp: 1.0,
                gain: 0.0,
                length: 128,
                fade_decay: 0.97,
                color_min: Color::GREEN,
                color_max: Color::RED,
                cycle_colors: false,
            },
            position: [0.0; 3],
            rotation: [0.0; 3],
            velocity: [0.0; 3],
            width: 1.0,
            color_mode: ColorMode::Amp,
        }
    }
}

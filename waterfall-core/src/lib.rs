//! Audio spectrum waterfalls in Rust.
//!
//! Two scripts turn the live FFT of whatever is currently playing into a triangle mesh:
//!
//! * [`SpectrumWaterfall`](script/spectrum_waterfall/struct.SpectrumWaterfall.html) keeps its
//!   geometry fixed and scrolls heights and colors through it.
//! * [`WaterfallDisplay`](script/waterfall_display/struct.WaterfallDisplay.html) spawns a new
//!   column of points for every FFT window and lets older columns drift away.
//!
//! # Example
//! ```rust
//! use waterfall_core::script::{self, Script};
//!
//! let mut waterfall = script::SpectrumWaterfall::new(Default::default());
//! let bins = waterfall.bin_count();
//!
//! // A window of decibel values, as reported by the analyser
//! let window = waterfall_core::analyzer::Spectrum::new(vec![-60.0; bins], 0.0, 22050.0);
//!
//! for _ in 0..10 {
//!     waterfall.update(1.0 / 60.0, &window.as_ref());
//! }
//!
//! let mesh = waterfall.mesh();
//! assert_eq!(mesh.vertex_count(), bins * waterfall.attributes().length);
//! ```
pub mod analyzer;
pub mod attributes;
pub mod color;
pub mod error;
pub mod frames;
pub mod helpers;
pub mod history;
pub mod mesh;
pub mod recorder;
pub mod script;
pub mod visualizer;

#[doc(inline)]
pub use crate::error::{Error, Result};
#[doc(inline)]
pub use crate::frames::Frames;
#[doc(inline)]
pub use crate::visualizer::Visualizer;

/// `ezconf` configuration
///
/// Usually you will call [`default_config`](fn.default_config.html) in the beginning
/// which will populate this object, but you can also specify your own custom config
/// sources.
///
/// # Example
/// To make use of this config, use code similar to this:
///
/// ```rust
/// # waterfall_core::default_config();
/// let some_configurable_value = waterfall_core::CONFIG.get_or(
///     // Toml path to value
///     "foo.bar",
///     // Default value.  Type gets inferred from this
///     123,
/// );
/// ```
pub static CONFIG: ezconf::Config = ezconf::INIT;

/// Initialize config from default sources
///
/// The default sources are:
/// * `./waterfall.toml`
/// * `./config/waterfall.toml`
/// * Defaults from code
pub fn default_config() {
    CONFIG
        .init(
            [
                ezconf::Source::File("waterfall.toml"),
                ezconf::Source::File("config/waterfall.toml"),
            ]
            .iter(),
        )
        .expect("Can't load config");
}

/// Initialize logger
///
/// By default, enable debug output in debug-builds.
pub fn default_log() {
    #[cfg(not(debug_assertions))]
    env_logger::init();

    #[cfg(debug_assertions)]
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();

    color_backtrace::install();
}

pub mod cpal;
pub mod player;

use crate::analyzer;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub trait Recorder: std::fmt::Debug {
    /// Return the sample buffer where this recorder pushes data into
    fn sample_buffer<'a>(&'a self) -> &'a analyzer::SampleBuffer;

    /// Synchronize sample buffer for this time stamp
    ///
    /// Returns true as long as new samples are available
    ///
    /// Async recorders (eg. cpal) will always return true
    /// and ignore this call otherwise
    fn sync(&mut self, _time: f32) -> bool {
        true
    }

    /// Start playing the sound slot `slot`
    ///
    /// Recorders which only capture audio return
    /// [`Error::NotPlayable`](../error/enum.Error.html).
    fn play(&mut self, _slot: &str) -> crate::Result<()> {
        Err(crate::Error::NotPlayable(std::any::type_name::<Self>()))
    }

    /// Stop whatever is currently playing
    fn stop(&mut self) {}

    /// Names of all playable sound slots, sorted
    fn slots(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecorderBuilder {
    pub rate: Option<usize>,
    pub buffer_size: Option<usize>,
    pub recorder: Option<String>,
    pub slots: Option<BTreeMap<String, PathBuf>>,
}

impl RecorderBuilder {
    pub fn new() -> RecorderBuilder {
        Default::default()
    }

    /// Preferred sample rate, `0` for the device default
    pub fn rate(&mut self, rate: usize) -> &mut RecorderBuilder {
        self.rate = Some(rate);
        self
    }

    pub fn buffer_size(&mut self, buffer_size: usize) -> &mut RecorderBuilder {
        self.buffer_size = Some(buffer_size);
        self
    }

    pub fn recorder<S: Into<String>>(&mut self, rec: S) -> &mut RecorderBuilder {
        self.recorder = Some(rec.into());
        self
    }

    /// Add a sound slot for the player
    pub fn slot<S: Into<String>, P: Into<PathBuf>>(&mut self, name: S, path: P) -> &mut RecorderBuilder {
        self.slots
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), path.into());
        self
    }

    pub fn build(&mut self) -> crate::Result<Box<dyn Recorder>> {
        let rate = self
            .rate
            .unwrap_or_else(|| crate::CONFIG.get_or("audio.rate", 0));
        let buffer_size = self
            .buffer_size
            .unwrap_or_else(|| crate::CONFIG.get_or("audio.buffer", 16384));
        let recorder = self
            .recorder
            .clone()
            .unwrap_or_else(|| crate::CONFIG.get_or("audio.recorder", "player".to_string()));

        match &*recorder {
            "player" => {
                let slots = self.slots.clone().unwrap_or_else(|| {
                    crate::CONFIG.get_or("sound.slots", BTreeMap::<String, PathBuf>::new())
                });

                Ok(Box::new(
                    self::player::PlayerBuilder {
                        rate: Some(rate),
                        buffer_size: Some(buffer_size),
                        slots,
                    }
                    .create()?,
                ))
            }

            "cpal" => Ok(Box::new(
                self::cpal::CPalBuilder {
                    rate: Some(rate),
                    buffer_size: Some(buffer_size),
                }
                .create()?,
            )),

            _ => Err(crate::Error::UnknownRecorder(recorder)),
        }
    }
}

/// Pick a stream config with f32 samples at `rate`
///
/// A `rate` of 0 or one the device can't do means the default rate.  If the default config
/// isn't f32, the f32 range closest to it is used.  The default config is only returned as is
/// when the device has no f32 configs at all.
pub(crate) fn stream_config<I>(
    supported: I,
    default: ::cpal::SupportedStreamConfig,
    rate: usize,
) -> ::cpal::StreamConfig
where
    I: IntoIterator<Item = ::cpal::SupportedStreamConfigRange>,
{
    let ranges = supported
        .into_iter()
        .filter(|r| r.sample_format() == ::cpal::SampleFormat::F32)
        .collect::<Vec<_>>();

    let best_at = |wanted: ::cpal::SampleRate| {
        ranges
            .iter()
            .filter(|r| r.min_sample_rate() <= wanted && wanted <= r.max_sample_rate())
            .max_by_key(|r| r.channels().min(2))
            .map(|r| r.clone().with_sample_rate(wanted))
    };

    if rate != 0 {
        if let Some(config) = best_at(::cpal::SampleRate(rate as u32)) {
            return config.into();
        }
        log::warn!(
            "Device does not support {} Hz, using {} Hz",
            rate,
            default.sample_rate().0
        );
    }

    if default.sample_format() == ::cpal::SampleFormat::F32 {
        return default.into();
    }
    if let Some(config) = best_at(default.sample_rate()) {
        return config.into();
    }

    match ranges.iter().max_by_key(|r| r.channels().min(2)) {
        Some(range) => {
            let rate = default
                .sample_rate()
                .clamp(range.min_sample_rate(), range.max_sample_rate());
            log::warn!("Using {} Hz, closest f32 rate to the default", rate.0);
            range.clone().with_sample_rate(rate).into()
        }
        None => {
            log::warn!("Device has no f32 configs, using its default");
            default.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Capture(analyzer::SampleBuffer);

    impl Recorder for Capture {
        fn sample_buffer<'a>(&'a self) -> &'a analyzer::SampleBuffer {
            &self.0
        }
    }

    #[test]
    fn test_capture_only() {
        let mut rec = Capture(analyzer::SampleBuffer::new(16, 8000));

        assert!(rec.sync(1.0));
        assert!(rec.slots().is_empty());
        rec.stop();

        match rec.play("song") {
            Err(crate::Error::NotPlayable(name)) => assert!(name.ends_with("Capture")),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_recorder() {
        let res = RecorderBuilder::new()
            .rate(8000)
            .buffer_size(1024)
            .recorder("pulse")
            .slot("a", "a.wav")
            .build();

        match res {
            Err(crate::Error::UnknownRecorder(name)) => assert_eq!(name, "pulse"),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_stream_config() {
        let default = ::cpal::SupportedStreamConfig::new(
            2,
            ::cpal::SampleRate(48000),
            ::cpal::SupportedBufferSize::Unknown,
            ::cpal::SampleFormat::F32,
        );
        let ranges = vec![
            ::cpal::SupportedStreamConfigRange::new(
                2,
                ::cpal::SampleRate(8000),
                ::cpal::SampleRate(96000),
                ::cpal::SupportedBufferSize::Unknown,
                ::cpal::SampleFormat::F32,
            ),
            ::cpal::SupportedStreamConfigRange::new(
                1,
                ::cpal::SampleRate(8000),
                ::cpal::SampleRate(192000),
                ::cpal::SupportedBufferSize::Unknown,
                ::cpal::SampleFormat::I16,
            ),
        ];

        let config = stream_config(ranges.clone(), default.clone(), 44100);
        assert_eq!(config.sample_rate.0, 44100);
        assert_eq!(config.channels, 2);

        let config = stream_config(ranges.clone(), default.clone(), 0);
        assert_eq!(config.sample_rate.0, 48000);

        let config = stream_config(ranges, default, 192000);
        assert_eq!(config.sample_rate.0, 48000);
    }

    #[test]
    fn test_stream_config_non_f32_default() {
        let default = ::cpal::SupportedStreamConfig::new(
            1,
            ::cpal::SampleRate(48000),
            ::cpal::SupportedBufferSize::Unknown,
            ::cpal::SampleFormat::I16,
        );
        let range = |channels, max| {
            ::cpal::SupportedStreamConfigRange::new(
                channels,
                ::cpal::SampleRate(8000),
                ::cpal::SampleRate(max),
                ::cpal::SupportedBufferSize::Unknown,
                ::cpal::SampleFormat::F32,
            )
        };

        // Default rate, but from an f32 range
        let config = stream_config(vec![range(2, 96000)], default.clone(), 0);
        assert_eq!(config.sample_rate.0, 48000);
        assert_eq!(config.channels, 2);

        // Unsupported rate falls back to the default rate, still f32
        let config = stream_config(vec![range(2, 96000)], default.clone(), 192000);
        assert_eq!(config.sample_rate.0, 48000);
        assert_eq!(config.channels, 2);

        // No f32 range contains the default rate
        let config = stream_config(vec![range(2, 22050)], default.clone(), 0);
        assert_eq!(config.sample_rate.0, 22050);
        assert_eq!(config.channels, 2);

        // No f32 at all
        let config = stream_config(Vec::new(), default, 0);
        assert_eq!(config.sample_rate.0, 48000);
        assert_eq!(config.channels, 1);
    }
}

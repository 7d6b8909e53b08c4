//! Sound slot player
//!
//! Plays WAV clips on the default output device and feeds everything it plays into the sample
//! buffer, so the analyser sees exactly what is audible.
use crate::analyzer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::collections::BTreeMap;
use std::{io, path, sync, thread};

/// A decoded sound file
#[derive(Debug, Clone)]
pub struct Clip {
    rate: usize,
    frames: Vec<[analyzer::Sample; 2]>,
}

impl Clip {
    pub fn open<P: AsRef<path::Path>>(path: P) -> crate::Result<Clip> {
        let reader = hound::WavReader::open(path)?;
        Clip::from_reader(reader)
    }

    /// Decode a WAV stream into stereo frames
    ///
    /// Mono is duplicated onto both channels, anything beyond the first two channels is dropped.
    pub fn from_reader<R: io::Read>(reader: hound::WavReader<R>) -> crate::Result<Clip> {
        let spec = reader.spec();

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|s| s as f32 * scale))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let frames = samples
            .chunks_exact(channels)
            .map(|c| [c[0], *c.get(1).unwrap_or(&c[0])])
            .collect();

        Ok(Clip {
            rate: spec.sample_rate as usize,
            frames,
        })
    }

    #[inline]
    pub fn rate(&self) -> usize {
        self.rate
    }

    pub fn frames(&self) -> &[[analyzer::Sample; 2]] {
        &self.frames
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.frames.len() as f32 / self.rate as f32
    }
}

/// Position inside a playing clip
///
/// Steps through the clip by the ratio of clip and output rate, picking the nearest sample.
#[derive(Debug, Clone)]
pub struct Playhead {
    clip: sync::Arc<Clip>,
    position: f64,
    step: f64,
}

impl Playhead {
    pub fn new(clip: sync::Arc<Clip>, output_rate: usize) -> Playhead {
        Playhead {
            step: clip.rate as f64 / output_rate as f64,
            clip,
            position: 0.0,
        }
    }

    /// Fill `out` with the next frames, padding with silence after the end
    ///
    /// Returns false once the clip is over.
    pub fn fill(&mut self, out: &mut [[analyzer::Sample; 2]]) -> bool {
        let frames = &self.clip.frames;

        for o in out.iter_mut() {
            *o = match frames.get(self.position.round() as usize) {
                Some(frame) => {
                    self.position += self.step;
                    *frame
                }
                None => [0.0; 2],
            };
        }

        !self.finished()
    }

    pub fn finished(&self) -> bool {
        self.position.round() as usize >= self.clip.frames.len()
    }
}

type Current = sync::Arc<parking_lot::Mutex<Option<Playhead>>>;

/// Named clips and the one currently playing
#[derive(Debug, Default)]
pub struct Slots {
    clips: BTreeMap<String, sync::Arc<Clip>>,
    current: Current,
    output_rate: usize,
}

impl Slots {
    pub fn new(output_rate: usize) -> Slots {
        Slots {
            output_rate,
            ..Default::default()
        }
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, clip: Clip) {
        self.clips.insert(name.into(), sync::Arc::new(clip));
    }

    pub fn names(&self) -> Vec<String> {
        self.clips.keys().cloned().collect()
    }

    /// Start `name` from the beginning, replacing whatever is playing
    pub fn play(&mut self, name: &str) -> crate::Result<()> {
        let clip = self
            .clips
            .get(name)
            .ok_or_else(|| crate::Error::UnknownSlot(name.to_string()))?;

        log::debug!("Playing `{}` ({:.1}s)", name, clip.duration());
        *self.current.lock() = Some(Playhead::new(clip.clone(), self.output_rate));
        Ok(())
    }

    pub fn stop(&mut self) {
        *self.current.lock() = None;
    }

    pub fn is_playing(&self) -> bool {
        self.current.lock().is_some()
    }

    /// Render the next `out.len()` frames, ending the current clip when it runs out
    pub fn render(&self, out: &mut [[analyzer::Sample; 2]]) {
        render(&self.current, out)
    }
}

fn render(current: &Current, out: &mut [[analyzer::Sample; 2]]) {
    let mut current = current.lock();

    match current.as_mut() {
        Some(playhead) => {
            if !playhead.fill(out) {
                *current = None;
            }
        }
        None => {
            for o in out.iter_mut() {
                *o = [0.0; 2];
            }
        }
    }
}

/// Interleave stereo frames into a device buffer with `channels` channels
fn interleave(frames: &[[analyzer::Sample; 2]], data: &mut [f32], channels: usize) {
    for (out, [l, r]) in data.chunks_exact_mut(channels).zip(frames.iter()) {
        match out {
            [mono] => *mono = (l + r) / 2.0,
            [ol, or, rest @ ..] => {
                *ol = *l;
                *or = *r;
                for s in rest.iter_mut() {
                    *s = 0.0;
                }
            }
            [] => (),
        }
    }
}

#[derive(Debug, Default)]
pub struct PlayerBuilder {
    pub rate: Option<usize>,
    pub buffer_size: Option<usize>,
    pub slots: BTreeMap<String, path::PathBuf>,
}

impl PlayerBuilder {
    pub fn new() -> PlayerBuilder {
        Default::default()
    }

    pub fn rate(&mut self, rate: usize) -> &mut PlayerBuilder {
        self.rate = Some(rate);
        self
    }

    pub fn buffer_size(&mut self, buffer_size: usize) -> &mut PlayerBuilder {
        self.buffer_size = Some(buffer_size);
        self
    }

    pub fn slot<S: Into<String>, P: Into<path::PathBuf>>(&mut self, name: S, path: P) -> &mut PlayerBuilder {
        self.slots.insert(name.into(), path.into());
        self
    }

    pub fn create(&mut self) -> crate::Result<SoundPlayer> {
        SoundPlayer::new(
            self.rate.unwrap_or(0),
            self.buffer_size.unwrap_or(16384),
            &self.slots,
        )
    }

    pub fn build(&mut self) -> crate::Result<Box<dyn super::Recorder>> {
        Ok(Box::new(self.create()?))
    }
}

#[derive(Debug)]
pub struct SoundPlayer {
    buffer: analyzer::SampleBuffer,
    slots: Slots,
}

impl SoundPlayer {
    fn new(
        rate: usize,
        buffer_size: usize,
        paths: &BTreeMap<String, path::PathBuf>,
    ) -> crate::Result<SoundPlayer> {
        let current = Current::default();
        let (tx, rx) = sync::mpsc::channel();

        {
            let current = current.clone();

            thread::Builder::new()
                .name("sound-player".into())
                .spawn(move || match open_output(rate, buffer_size, current) {
                    Ok((stream, buffer)) => {
                        if tx.send(Ok(buffer)).is_err() {
                            return;
                        }
                        // The stream plays for as long as it is alive
                        let _stream = stream;
                        loop {
                            thread::park();
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e));
                    }
                })?;
        }

        let buffer = rx.recv().map_err(|_| crate::Error::Disconnected)??;

        let mut slots = Slots {
            current,
            ..Slots::new(buffer.rate())
        };
        for (name, path) in paths.iter() {
            match Clip::open(path) {
                Ok(clip) => {
                    log::debug!(
                        "Loaded slot `{}` from {:?} ({} Hz, {:.1}s)",
                        name,
                        path,
                        clip.rate(),
                        clip.duration()
                    );
                    slots.insert(name.clone(), clip);
                }
                Err(e) => log::error!("Can't load slot `{}` from {:?}: {}", name, path, e),
            }
        }

        Ok(SoundPlayer { buffer, slots })
    }
}

fn open_output(
    rate: usize,
    buffer_size: usize,
    current: Current,
) -> crate::Result<(cpal::Stream, analyzer::SampleBuffer)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(crate::Error::NoDevice("output"))?;

    let supported = device
        .supported_output_configs()
        .map(|c| c.collect::<Vec<_>>())
        .unwrap_or_default();
    let config = super::stream_config(supported, device.default_output_config()?, rate);
    let channels = config.channels as usize;

    log::debug!(
        "Output on {:?}: {} Hz, {} channels",
        device.name().unwrap_or_default(),
        config.sample_rate.0,
        channels
    );

    let buffer = analyzer::SampleBuffer::new(buffer_size, config.sample_rate.0 as usize);
    let tap = buffer.clone();
    let mut frames = Vec::new();

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            frames.resize(data.len() / channels, [0.0; 2]);
            render(&current, &mut frames);
            interleave(&frames, data, channels);
            tap.push(&frames);
        },
        |e| log::error!("Output stream error: {}", e),
        None,
    )?;
    stream.play()?;

    Ok((stream, buffer))
}

impl super::Recorder for SoundPlayer {
    fn sample_buffer<'a>(&'a self) -> &'a analyzer::SampleBuffer {
        &self.buffer
    }

    fn play(&mut self, slot: &str) -> crate::Result<()> {
        self.slots.play(slot)
    }

    fn stop(&mut self) {
        self.slots.stop();
        self.buffer.clear();
    }

    fn slots(&self) -> Vec<String> {
        self.slots.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_int(channels: u16, rate: u32, samples: &[i16]) -> Clip {
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                writer.write_sample(*s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.set_position(0);

        Clip::from_reader(hound::WavReader::new(cursor).unwrap()).unwrap()
    }

    fn ramp(len: usize) -> Clip {
        Clip {
            rate: 100,
            frames: (0..len).map(|i| [i as f32, -(i as f32)]).collect(),
        }
    }

    #[test]
    fn test_decode_mono() {
        let clip = wav_int(1, 8000, &[0, 16384, -32768]);

        assert_eq!(clip.rate(), 8000);
        assert_eq!(clip.frames(), &[[0.0, 0.0], [0.5, 0.5], [-1.0, -1.0]]);
    }

    #[test]
    fn test_decode_multichannel() {
        let clip = wav_int(3, 44100, &[16384, -16384, 100, 0, 8192, 100]);

        assert_eq!(clip.frames(), &[[0.5, -0.5], [0.0, 0.25]]);
        assert!((clip.duration() - 2.0 / 44100.0).abs() < 1e-9);
    }

    #[test]
    fn test_decode_float() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut cursor = io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in &[0.25f32, -0.75, 1.0, 0.0] {
                writer.write_sample(*s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.set_position(0);

        let clip = Clip::from_reader(hound::WavReader::new(cursor).unwrap()).unwrap();
        assert_eq!(clip.frames(), &[[0.25, -0.75], [1.0, 0.0]]);
    }

    #[test]
    fn test_playhead_same_rate() {
        let mut head = Playhead::new(sync::Arc::new(ramp(4)), 100);
        let mut out = [[9.0; 2]; 3];

        assert!(head.fill(&mut out));
        assert_eq!(out, [[0.0, 0.0], [1.0, -1.0], [2.0, -2.0]]);

        assert!(!head.fill(&mut out));
        assert_eq!(out, [[3.0, -3.0], [0.0, 0.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_playhead_resampling() {
        // Output runs at twice the clip rate, every frame is repeated
        let mut head = Playhead::new(sync::Arc::new(ramp(3)), 200);
        let mut out = [[0.0; 2]; 4];
        head.fill(&mut out);
        assert_eq!(out, [[0.0, 0.0], [1.0, -1.0], [1.0, -1.0], [2.0, -2.0]]);

        // Output at half the clip rate skips every other frame
        let mut head = Playhead::new(sync::Arc::new(ramp(6)), 50);
        let mut out = [[0.0; 2]; 3];
        assert!(!head.fill(&mut out));
        assert_eq!(out, [[0.0, 0.0], [2.0, -2.0], [4.0, -4.0]]);
    }

    #[test]
    fn test_slots() {
        let mut slots = Slots::new(100);
        slots.insert("b", ramp(2));
        slots.insert("a", ramp(8));
        assert_eq!(slots.names(), ["a", "b"]);

        match slots.play("c") {
            Err(crate::Error::UnknownSlot(name)) => assert_eq!(name, "c"),
            other => panic!("Unexpected result: {:?}", other),
        }
        assert!(!slots.is_playing());

        slots.play("b").unwrap();
        assert!(slots.is_playing());

        let mut out = [[0.0; 2]; 4];
        slots.render(&mut out);
        assert_eq!(out, [[0.0, 0.0], [1.0, -1.0], [0.0, 0.0], [0.0, 0.0]]);
        // Clips end by themselves
        assert!(!slots.is_playing());

        slots.play("a").unwrap();
        slots.stop();
        slots.render(&mut out);
        assert_eq!(out, [[0.0; 2]; 4]);
    }

    #[test]
    fn test_interleave() {
        let frames = [[1.0, -1.0], [0.5, 0.0]];

        let mut mono = [9.0; 2];
        interleave(&frames, &mut mono, 1);
        assert_eq!(mono, [0.0, 0.25]);

        let mut surround = [9.0; 8];
        interleave(&frames, &mut surround, 4);
        assert_eq!(surround, [1.0, -1.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0]);
    }
}

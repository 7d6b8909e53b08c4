//! Live input recorder
use crate::analyzer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::{sync, thread};

#[derive(Debug, Default)]
pub struct CPalBuilder {
    pub rate: Option<usize>,
    pub buffer_size: Option<usize>,
}

impl CPalBuilder {
    pub fn new() -> CPalBuilder {
        Default::default()
    }

    pub fn rate(&mut self, rate: usize) -> &mut CPalBuilder {
        self.rate = Some(rate);
        self
    }

    pub fn buffer_size(&mut self, buffer_size: usize) -> &mut CPalBuilder {
        self.buffer_size = Some(buffer_size);
        self
    }

    pub fn create(&mut self) -> crate::Result<CPalRecorder> {
        CPalRecorder::new(self.rate.unwrap_or(0), self.buffer_size.unwrap_or(16384))
    }

    pub fn build(&mut self) -> crate::Result<Box<dyn super::Recorder>> {
        Ok(Box::new(self.create()?))
    }
}

#[derive(Debug)]
pub struct CPalRecorder {
    buffer: analyzer::SampleBuffer,
}

impl CPalRecorder {
    fn new(rate: usize, buffer_size: usize) -> crate::Result<CPalRecorder> {
        let (tx, rx) = sync::mpsc::channel();

        thread::Builder::new()
            .name("cpal-recorder".into())
            .spawn(move || match open_input(rate, buffer_size) {
                Ok((stream, buffer)) => {
                    if tx.send(Ok(buffer)).is_err() {
                        return;
                    }
                    let _stream = stream;
                    loop {
                        thread::park();
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                }
            })?;

        let buffer = rx.recv().map_err(|_| crate::Error::Disconnected)??;

        Ok(CPalRecorder { buffer })
    }
}

fn open_input(
    rate: usize,
    buffer_size: usize,
) -> crate::Result<(cpal::Stream, analyzer::SampleBuffer)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(crate::Error::NoDevice("input"))?;

    let supported = device
        .supported_input_configs()
        .map(|c| c.collect::<Vec<_>>())
        .unwrap_or_default();
    let config = super::stream_config(supported, device.default_input_config()?, rate);
    let channels = config.channels as usize;

    log::debug!(
        "Recording from {:?}: {} Hz, {} channels",
        device.name().unwrap_or_default(),
        config.sample_rate.0,
        channels
    );

    let buffer = analyzer::SampleBuffer::new(buffer_size, config.sample_rate.0 as usize);
    let buf = buffer.clone();
    let mut chunk_buffer = Vec::new();

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            chunk_buffer.clear();
            chunk_buffer.extend(
                data.chunks_exact(channels)
                    .map(|c| [c[0], *c.get(1).unwrap_or(&c[0])]),
            );
            buf.push(&chunk_buffer);
        },
        |e| log::error!("Input stream error: {}", e),
        None,
    )?;
    stream.play()?;

    Ok((stream, buffer))
}

impl super::Recorder for CPalRecorder {
    fn sample_buffer<'a>(&'a self) -> &'a analyzer::SampleBuffer {
        &self.buffer
    }
}

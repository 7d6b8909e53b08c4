use crate::{analyzer, recorder};
use std::time;

/// Timing of a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Seconds since the first frame
    pub time: f32,
    /// Seconds since the previous frame
    pub delta: f32,
    pub frame: usize,
}

#[derive(Debug)]
pub struct Frames<R, A>
where
    R: Clone + Send + 'static,
    A: FnMut(&mut R, &analyzer::SampleBuffer) + Send + 'static,
{
    info: triple_buffer::Output<R>,
    analyzer: Option<(A, triple_buffer::Input<R>)>,
    recorder: Box<dyn recorder::Recorder>,
    start_time: Option<time::Instant>,
    last_time: f32,
    frame: usize,
}

impl<R, A> Frames<R, A>
where
    R: Clone + Send + 'static,
    A: FnMut(&mut R, &analyzer::SampleBuffer) + Send + 'static,
{
    pub fn from_vis(vis: crate::Visualizer<R, A>) -> crate::Result<Frames<R, A>> {
        let recorder = match vis.recorder {
            Some(r) => r,
            None => recorder::RecorderBuilder::new().build()?,
        };

        let (inp, outp) = triple_buffer::TripleBuffer::new(&vis.initial).split();
        let mut f = Frames {
            info: outp,
            analyzer: Some((vis.analyzer, inp)),
            recorder,
            start_time: None,
            last_time: 0.0,
            frame: 0,
        };

        let num = vis
            .async_analyzer
            .unwrap_or_else(|| crate::CONFIG.get_or("audio.async_analyzer", 0));
        if num != 0 {
            f.detach_analyzer(num)?;
        }

        Ok(f)
    }

    /// Move the analyzer onto its own thread, running `num` times per second
    pub fn detach_analyzer(&mut self, num: usize) -> crate::Result<()> {
        let (mut analyzer, mut info) = match self.analyzer.take() {
            Some(a) => a,
            None => {
                log::warn!("Analyzer is already detached");
                return Ok(());
            }
        };
        let buffer = self.recorder.sample_buffer().clone();

        let conv_time = time::Duration::from_nanos(1_000_000_000 / num as u64);

        std::thread::Builder::new()
            .name("analyzer".into())
            .spawn(move || {
                let mut start = time::Instant::now();
                loop {
                    analyzer(info.input_buffer(), &buffer);
                    info.publish();

                    let now = time::Instant::now();
                    let duration = now - start;
                    log::trace!("Conversion Time: {:?}", duration);
                    start = now;

                    if duration < conv_time {
                        std::thread::sleep(conv_time - duration);
                    }
                }
            })?;

        log::debug!("Analyzer detached at {} Hz", num);
        Ok(())
    }

    /// Advance to the next frame
    ///
    /// Runs the analyzer unless it is detached.  Returns `None` once the recorder ran out of
    /// samples.
    pub fn next_frame(&mut self) -> Option<Frame> {
        let start_time = *self.start_time.get_or_insert_with(time::Instant::now);
        let time = crate::helpers::time(start_time);

        if !self.recorder.sync(time) {
            return None;
        }

        if let Some((ref mut analyzer, ref mut info)) = self.analyzer {
            analyzer(info.input_buffer(), self.recorder.sample_buffer());
            info.publish();
        }

        let frame = Frame {
            time,
            delta: time - self.last_time,
            frame: self.frame,
        };
        self.last_time = time;
        self.frame += 1;

        Some(frame)
    }

    /// Access the latest analysis result
    pub fn info<F, O>(&mut self, f: F) -> O
    where
        F: FnOnce(&R) -> O,
    {
        f(self.info.read())
    }

    pub fn recorder(&self) -> &dyn recorder::Recorder {
        &*self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut dyn recorder::Recorder {
        &mut *self.recorder
    }

    pub fn iter<'a>(&'a mut self) -> FramesIter<'a, R, A> {
        FramesIter { frames: self }
    }
}

#[derive(Debug)]
pub struct FramesIter<'a, R, A>
where
    R: Clone + Send + 'static,
    A: FnMut(&mut R, &analyzer::SampleBuffer) + Send + 'static,
{
    frames: &'a mut Frames<R, A>,
}

impl<'a, R, A> Iterator for FramesIter<'a, R, A>
where
    R: Clone + Send + 'static,
    A: FnMut(&mut R, &analyzer::SampleBuffer) + Send + 'static,
{
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        self.frames.next_frame()
    }
}

use crate::analyzer;
use crate::recorder;

/// Frame driver setup
///
/// `initial` is the analysis result before the first frame, `analyzer` refreshes it from the
/// sample buffer.
#[derive(Debug)]
pub struct Visualizer<R, A>
where
    R: Clone + Send + 'static,
    A: FnMut(&mut R, &analyzer::SampleBuffer) + Send + 'static,
{
    pub initial: R,
    pub analyzer: A,
    pub recorder: Option<Box<dyn recorder::Recorder>>,
    pub async_analyzer: Option<usize>,
}

impl<R, A> Visualizer<R, A>
where
    R: Clone + Send + 'static,
    A: FnMut(&mut R, &analyzer::SampleBuffer) + Send + 'static,
{
    pub fn new(initial: R, analyzer: A) -> Visualizer<R, A> {
        Visualizer {
            initial,
            analyzer,
            recorder: None,
            async_analyzer: None,
        }
    }

    pub fn recorder(mut self, r: Box<dyn recorder::Recorder>) -> Visualizer<R, A> {
        self.recorder = Some(r);
        self
    }

    /// Run the analyzer on its own thread, `num` times per second
    ///
    /// `0` keeps it on the frame thread.
    pub fn async_analyzer(mut self, num: usize) -> Visualizer<R, A> {
        self.async_analyzer = Some(num);
        self
    }

    pub fn frames(self) -> crate::Result<crate::Frames<R, A>> {
        crate::Frames::from_vis(self)
    }
}

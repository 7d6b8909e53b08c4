//! Sample Buffer
use std::collections;
use std::sync;

pub type Sample = f32;

type _SampleBuf = sync::Arc<parking_lot::Mutex<collections::VecDeque<[Sample; 2]>>>;

/// Shared ring of the most recent stereo samples
///
/// Recorders push into it from their audio thread, the analyser reads the tail.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    buf: _SampleBuf,
    rate: usize,
}

impl SampleBuffer {
    pub fn new(size: usize, rate: usize) -> SampleBuffer {
        let buf = collections::VecDeque::from(vec![[0.0; 2]; size]);

        SampleBuffer {
            buf: sync::Arc::new(parking_lot::Mutex::new(buf)),
            rate,
        }
    }

    #[inline]
    pub fn rate(&self) -> usize {
        self.rate
    }

    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    pub fn push(&self, new: &[[Sample; 2]]) {
        let mut lock = self.buf.lock();

        #[cfg(debug_assertions)]
        let debug_size = lock.len();

        for sample in new.iter() {
            if lock.pop_front().is_none() {
                break;
            }
            lock.push_back(*sample);
        }

        #[cfg(debug_assertions)]
        assert_eq!(debug_size, lock.len(), "Sample buffer size differs!");
    }

    /// Overwrite the whole buffer with silence
    pub fn clear(&self) {
        for s in self.buf.lock().iter_mut() {
            *s = [0.0; 2];
        }
    }

    /// Iterate over the last `size` samples, taking every `downsample`th one
    ///
    /// Yields fewer samples if the buffer is too short.
    pub fn iter<'a>(&'a self, size: usize, downsample: usize) -> SampleIterator<'a> {
        let lock = self.buf.lock();

        SampleIterator {
            index: lock.len().saturating_sub(size * downsample),
            buf: lock,
            downsample,
        }
    }
}

pub struct SampleIterator<'a> {
    buf: parking_lot::MutexGuard<'a, collections::VecDeque<[Sample; 2]>>,
    index: usize,
    downsample: usize,
}

impl Iterator for SampleIterator<'_> {
    type Item = [f32; 2];

    fn next(&mut self) -> Option<Self::Item> {
        let res = self.buf.get(self.index).cloned();
        self.index += self.downsample;
        res
    }
}

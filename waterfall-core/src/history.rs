//! History of FFT windows

/// Move everything in `buf` back by `stride` elements
///
/// The last `stride` elements fall off the end, the first `stride` elements keep their old
/// values and are expected to be overwritten by the caller.
pub fn scroll<T: Copy>(buf: &mut [T], stride: usize) {
    if stride >= buf.len() {
        return;
    }
    let keep = buf.len() - stride;
    buf.copy_within(0..keep, stride);
}

/// A `bins x length` grid of FFT windows
///
/// Row 0 is the newest window, row `length - 1` the oldest.
#[derive(Debug, Clone)]
pub struct History {
    bins: usize,
    length: usize,
    data: Vec<f32>,
}

impl History {
    pub fn new(bins: usize, length: usize) -> History {
        History {
            bins,
            length,
            data: vec![0.0; bins * length],
        }
    }

    #[inline]
    pub fn bins(&self) -> usize {
        self.bins
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Push a new window, dropping the oldest one
    pub fn push(&mut self, window: &[f32]) {
        assert_eq!(window.len(), self.bins, "Window has the wrong number of bins!");

        scroll(&mut self.data, self.bins);
        self.data[..self.bins].copy_from_slice(window);
    }

    /// Window `age` frames back
    pub fn window(&self, age: usize) -> &[f32] {
        &self.data[age * self.bins..(age + 1) * self.bins]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl std::ops::Index<usize> for History {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll() {
        let mut buf = [1, 2, 3, 4, 5, 6];
        scroll(&mut buf, 2);
        assert_eq!(buf, [1, 2, 1, 2, 3, 4]);

        let mut buf = [1, 2, 3];
        scroll(&mut buf, 3);
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn test_fifo() {
        let mut history = History::new(4, 3);

        for i in 0..5 {
            let w = [i as f32; 4];
            history.push(&w);
        }

        assert_eq!(history.window(0), &[4.0; 4]);
        assert_eq!(history.window(1), &[3.0; 4]);
        assert_eq!(history.window(2), &[2.0; 4]);
        assert_eq!(history.as_slice().len(), 12);
    }

    #[test]
    fn test_one_window_per_push() {
        let mut history = History::new(3, 4);
        history.push(&[1.0, 2.0, 3.0]);

        assert_eq!(history.window(0), &[1.0, 2.0, 3.0]);
        for age in 1..4 {
            assert_eq!(history.window(age), &[0.0; 3]);
        }

        history.push(&[4.0, 5.0, 6.0]);
        assert_eq!(history.window(1), &[1.0, 2.0, 3.0]);
        assert_eq!(history.window(2), &[0.0; 3]);
        assert_eq!(history[3], 1.0);
    }

    #[test]
    #[should_panic]
    fn test_wrong_size() {
        let mut history = History::new(3, 4);
        history.push(&[1.0, 2.0]);
    }
}

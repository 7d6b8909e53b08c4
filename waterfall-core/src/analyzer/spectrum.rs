//! Spectrum Storage Type

/// Type Alias for Frequencies
pub type Frequency = f32;

/// Type Alias for Signal Strengths
pub type SignalStrength = f32;

/// Trait for types that can be used as storage for a spectrum
pub trait Storage: std::ops::Deref<Target = [SignalStrength]> {}

/// Trait for types that can be used as mutable storage for a spectrum
pub trait StorageMut: std::ops::Deref<Target = [SignalStrength]> + std::ops::DerefMut {}

impl<T> Storage for T where T: std::ops::Deref<Target = [SignalStrength]> {}

impl<T> StorageMut for T where T: Storage + std::ops::DerefMut {}

/// FFT window with the frequency range it covers
#[derive(Debug, Clone)]
pub struct Spectrum<S: Storage> {
    buckets: S,
    lowest: Frequency,
    highest: Frequency,
}

impl<S: Storage> std::ops::Index<usize> for Spectrum<S> {
    type Output = SignalStrength;

    fn index(&self, index: usize) -> &Self::Output {
        &self.buckets[index]
    }
}

impl<S: StorageMut> std::ops::IndexMut<usize> for Spectrum<S> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.buckets[index]
    }
}

impl<S: Storage> Spectrum<S> {
    /// Create a new spectrum
    ///
    /// Takes a storage buffer which is potentially prefilled with spectral data,
    /// the frequency associated with the lowest bucket and the frequency associated
    /// with the highest bucket.
    ///
    /// # Example
    /// ```
    /// # use waterfall_core::analyzer;
    /// let spectrum = analyzer::Spectrum::new(vec![-148.0; 128], 0.0, 23812.5);
    /// assert_eq!(spectrum.len(), 128);
    /// ```
    pub fn new(data: S, low: Frequency, high: Frequency) -> Spectrum<S> {
        Spectrum {
            buckets: data,
            lowest: low,
            highest: high,
        }
    }

    /// Change the frequency range after the buckets were refilled
    pub(crate) fn respan(&mut self, low: Frequency, high: Frequency) {
        self.lowest = low;
        self.highest = high;
    }

    pub fn iter<'a>(&'a self) -> std::slice::Iter<'a, SignalStrength> {
        self.buckets.iter()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn as_ref<'a>(&'a self) -> Spectrum<&'a [SignalStrength]> {
        Spectrum {
            buckets: &self.buckets,
            lowest: self.lowest,
            highest: self.highest,
        }
    }
}

impl<S: StorageMut> Spectrum<S> {
    pub fn iter_mut<'a>(&'a mut self) -> std::slice::IterMut<'a, SignalStrength> {
        self.buckets.iter_mut()
    }

    /// Fill this spectrum with values from another one of the same size
    pub fn fill_from<S2: Storage>(&mut self, other: &Spectrum<S2>) {
        assert_eq!(self.len(), other.len(), "Spectrums have different sizes!");

        self.lowest = other.lowest;
        self.highest = other.highest;

        for (s, o) in self.iter_mut().zip(other.iter()) {
            *s = *o;
        }
    }
}

impl Spectrum<Vec<SignalStrength>> {
    /// Copy another spectrum into this one, reallocating if the sizes differ
    pub fn assign_from<S2: Storage>(&mut self, other: &Spectrum<S2>) {
        if self.len() == other.len() {
            self.fill_from(other);
        } else {
            *self = Spectrum::new(other.iter().cloned().collect(), other.lowest, other.highest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign() {
        let mut a = Spectrum::new(vec![0.0; 16], 0.0, 100.0);
        let b = Spectrum::new(vec![1.0; 16], 0.0, 200.0);
        a.assign_from(&b);
        assert_eq!(a.highest, 200.0);
        assert!(a.iter().all(|v| *v == 1.0));

        let c = Spectrum::new(vec![2.0; 64], 0.0, 400.0);
        a.assign_from(&c.as_ref());
        assert_eq!(a.len(), 64);
        assert_eq!(a.highest, 400.0);
        assert_eq!(a[63], 2.0);
    }

    #[test]
    #[should_panic]
    fn test_fill_different_size() {
        let mut a = Spectrum::new(vec![0.0; 16], 0.0, 100.0);
        a.fill_from(&Spectrum::new(vec![0.0; 8], 0.0, 100.0));
    }
}

//! Combinatorial addressing over N finite dimensions.
//!
//! A [`Tuplator`] converts between a flat index in `[0, size())` and a
//! per-dimension index tuple by mixed-radix arithmetic, with dimension 0 the
//! fastest-varying digit. Iterating flat indices 0..size() therefore visits
//! every point of the Cartesian product exactly once, which is what the
//! general partition uses to enumerate reachable buckets.
//!
//! Misuse (an out-of-range flat index, a wrong-length output buffer, a zero
//! dimension size) is a programming error and panics rather than being
//! silently clamped.

#[derive(Clone, Debug)]
pub struct Tuplator {
    dimension_sizes: Vec<usize>,
    size: usize,
}

#[derive(Default)]
pub struct TuplatorBuilder {
    dimension_sizes: Vec<usize>,
}

impl TuplatorBuilder {
    /// Appends one dimension. `size` must be positive.
    #[must_use]
    pub fn add_dimension(mut self, size: usize) -> Self {
        assert!(size > 0, "dimension size must be positive");
        self.dimension_sizes.push(size);
        self
    }

    #[must_use]
    pub fn build(self) -> Tuplator {
        let size = self.dimension_sizes.iter().product();
        Tuplator {
            dimension_sizes: self.dimension_sizes,
            size,
        }
    }
}

impl Tuplator {
    #[must_use]
    pub fn builder() -> TuplatorBuilder {
        TuplatorBuilder::default()
    }

    /// The number of dimensions added.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimension_sizes.len()
    }

    /// The size of the Cartesian product (1 for zero dimensions).
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Decomposes `flat_index` into per-dimension indices, dimension 0 first
    /// and fastest-varying.
    pub fn fill_tuple(&self, flat_index: usize, tuple: &mut [usize]) {
        assert!(
            flat_index < self.size,
            "flat index {flat_index} out of range for size {}",
            self.size
        );
        assert_eq!(
            tuple.len(),
            self.dimension_sizes.len(),
            "tuple buffer length does not match dimension count"
        );
        let mut remainder = flat_index;
        for (digit, dimension_size) in tuple.iter_mut().zip(&self.dimension_sizes) {
            *digit = remainder % dimension_size;
            remainder /= dimension_size;
        }
    }
}

//! Level slicing for the bottom-up merge loop.
//!
//! A bottom-up merge sort wants power-of-two sized sub-ranges, but the input
//! length rarely cooperates. Instead of padding, the iterator scales the
//! nominal power-of-two slice back onto the real length with a fixed-point
//! remainder, so every level tiles `[0, size)` exactly with slices whose
//! lengths differ by at most one.

/// Half-open index interval `[start, end)` into the slice being sorted.
///
/// A plain value; it never borrows or owns the underlying storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    #[inline]
    pub(crate) fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub(crate) fn len(self) -> usize {
        self.end - self.start
    }
}

/// Largest power of two that is `<= x`.
#[inline]
fn floor_power_of_two(x: usize) -> usize {
    debug_assert!(x != 0);
    1 << (usize::BITS - 1 - x.leading_zeros())
}

/// Produces the sub-ranges merged at each level of the sort.
///
/// `decimal` is the integer part of the cursor and `numerator / denominator`
/// the fractional part; stepping accumulates the remainder so that slice
/// lengths alternate between `len()` and `len() + 1`.
pub(crate) struct LevelIter {
    size: usize,
    decimal: usize,
    numerator: usize,
    denominator: usize,
    decimal_step: usize,
    numerator_step: usize,
}

impl LevelIter {
    pub(crate) fn new(size: usize, min_level: usize) -> Self {
        let denominator = floor_power_of_two(size) / min_level;

        Self {
            size,
            decimal: 0,
            numerator: 0,
            denominator,
            decimal_step: size / denominator,
            numerator_step: size % denominator,
        }
    }

    /// Rewinds the cursor to the start of the array for another sweep.
    pub(crate) fn begin(&mut self) {
        self.decimal = 0;
        self.numerator = 0;
    }

    pub(crate) fn next_range(&mut self) -> Range {
        let start = self.decimal;

        self.decimal += self.decimal_step;
        self.numerator += self.numerator_step;
        if self.numerator >= self.denominator {
            self.numerator -= self.denominator;
            self.decimal += 1;
        }

        Range::new(start, self.decimal)
    }

    pub(crate) fn finished(&self) -> bool {
        self.decimal >= self.size
    }

    /// Doubles the nominal slice length. Returns `false` once a single slice
    /// would cover the whole array, meaning the sort is complete.
    pub(crate) fn next_level(&mut self) -> bool {
        self.decimal_step += self.decimal_step;
        self.numerator_step += self.numerator_step;
        if self.numerator_step >= self.denominator {
            self.numerator_step -= self.denominator;
            self.decimal_step += 1;
        }

        self.decimal_step < self.size
    }

    /// Nominal slice length at the current level; actual slices may be one
    /// element longer.
    pub(crate) fn len(&self) -> usize {
        self.decimal_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_power_of_two_values() {
        assert_eq!(floor_power_of_two(1), 1);
        assert_eq!(floor_power_of_two(2), 2);
        assert_eq!(floor_power_of_two(3), 2);
        assert_eq!(floor_power_of_two(4), 4);
        assert_eq!(floor_power_of_two(1023), 512);
        assert_eq!(floor_power_of_two(1024), 1024);
    }

    #[test]
    fn levels_tile_the_array() {
        for size in 4..=600usize {
            let mut iter = LevelIter::new(size, 4);

            loop {
                let nominal = iter.len();
                let mut covered = 0;

                iter.begin();
                while !iter.finished() {
                    let range = iter.next_range();
                    assert_eq!(range.start, covered);
                    assert!(range.len() == nominal || range.len() == nominal + 1);
                    covered = range.end;
                }
                assert_eq!(covered, size);

                if !iter.next_level() {
                    break;
                }
                assert!(iter.len() >= nominal * 2);
            }

            // The final level would have covered everything in one slice.
            assert!(iter.len() >= size / 2);
        }
    }

    #[test]
    fn range_count_is_even_per_level() {
        // Pairs of ranges are merged together, so each sweep must produce an
        // even number of them until the sort is done.
        for size in 8..=300usize {
            let mut iter = LevelIter::new(size, 4);
            loop {
                let mut count = 0;
                iter.begin();
                while !iter.finished() {
                    iter.next_range();
                    count += 1;
                }
                assert_eq!(count % 2, 0, "size {size} level {}", iter.len());

                if !iter.next_level() {
                    break;
                }
            }
        }
    }
}

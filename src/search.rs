//! Searches and small slice shuffles used by the merge machinery.

use crate::levels::Range;

/// Index of the first element in `range` that is not less than `value`
/// (lower bound).
pub(crate) fn binary_first<T, F>(v: &[T], value: &T, range: Range, is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    range.start + v[range.start..range.end].partition_point(|elem| is_less(elem, value))
}

/// Index one past the last element in `range` that is not greater than
/// `value` (upper bound).
pub(crate) fn binary_last<T, F>(v: &[T], value: &T, range: Range, is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    range.start + v[range.start..range.end].partition_point(|elem| !is_less(value, elem))
}

// The find_* variants below combine a strided linear scan with a binary
// search over the bracketed stretch. Callers pass `unique`, an estimate of
// how many hits remain in the range, which sets the stride; the result is
// always identical to the corresponding plain binary search, only cheaper
// when the estimate is roughly right.

/// Lower bound of `value` in `range`, scanning forward.
pub(crate) fn find_first_forward<T, F>(
    v: &[T],
    value: &T,
    range: Range,
    is_less: &mut F,
    unique: usize,
) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    if range.len() == 0 {
        return range.start;
    }
    let skip = usize::max(range.len() / unique, 1);

    let mut index = range.start + skip;
    while is_less(&v[index - 1], value) {
        if index >= range.end - skip {
            return binary_first(v, value, Range::new(index, range.end), is_less);
        }
        index += skip;
    }

    binary_first(v, value, Range::new(index - skip, index), is_less)
}

/// Upper bound of `value` in `range`, scanning forward.
pub(crate) fn find_last_forward<T, F>(
    v: &[T],
    value: &T,
    range: Range,
    is_less: &mut F,
    unique: usize,
) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    if range.len() == 0 {
        return range.start;
    }
    let skip = usize::max(range.len() / unique, 1);

    let mut index = range.start + skip;
    while !is_less(value, &v[index - 1]) {
        if index >= range.end - skip {
            return binary_last(v, value, Range::new(index, range.end), is_less);
        }
        index += skip;
    }

    binary_last(v, value, Range::new(index - skip, index), is_less)
}

/// Lower bound of `value` in `range`, scanning backward.
pub(crate) fn find_first_backward<T, F>(
    v: &[T],
    value: &T,
    range: Range,
    is_less: &mut F,
    unique: usize,
) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    if range.len() == 0 {
        return range.start;
    }
    let skip = usize::max(range.len() / unique, 1);

    let mut index = range.end - skip;
    while index > range.start && !is_less(&v[index - 1], value) {
        if index < range.start + skip {
            return binary_first(v, value, Range::new(range.start, index), is_less);
        }
        index -= skip;
    }

    binary_first(v, value, Range::new(index, index + skip), is_less)
}

/// Upper bound of `value` in `range`, scanning backward.
pub(crate) fn find_last_backward<T, F>(
    v: &[T],
    value: &T,
    range: Range,
    is_less: &mut F,
    unique: usize,
) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    if range.len() == 0 {
        return range.start;
    }
    let skip = usize::max(range.len() / unique, 1);

    let mut index = range.end - skip;
    while index > range.start && is_less(value, &v[index - 1]) {
        if index < range.start + skip {
            return binary_last(v, value, Range::new(range.start, index), is_less);
        }
        index -= skip;
    }

    binary_last(v, value, Range::new(index, index + skip), is_less)
}

/// Rotates `range` left by `amount`; `[0 1 2 3]` rotated by 1 becomes
/// `[1 2 3 0]`. Requires `amount <= range.len()`.
#[inline]
pub(crate) fn rotate<T>(v: &mut [T], amount: usize, range: Range) {
    v[range.start..range.end].rotate_left(amount);
}

/// Swaps two equal-length, non-overlapping runs element by element.
pub(crate) fn block_swap<T>(v: &mut [T], start1: usize, start2: usize, block_size: usize) {
    for i in 0..block_size {
        v.swap(start1 + i, start2 + i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn less(a: &i32, b: &i32) -> bool {
        a < b
    }

    #[test]
    fn binary_bounds() {
        let v = [1, 2, 2, 2, 5, 7, 7, 9];
        let range = Range::new(0, v.len());

        assert_eq!(binary_first(&v, &2, range, &mut less), 1);
        assert_eq!(binary_last(&v, &2, range, &mut less), 4);
        assert_eq!(binary_first(&v, &0, range, &mut less), 0);
        assert_eq!(binary_last(&v, &9, range, &mut less), 8);
        assert_eq!(binary_first(&v, &10, range, &mut less), 8);

        // Sub-range offsets are absolute indices.
        assert_eq!(binary_first(&v, &7, Range::new(4, 8), &mut less), 5);
        assert_eq!(binary_last(&v, &7, Range::new(4, 8), &mut less), 7);
    }

    #[test]
    fn find_matches_binary_search() {
        // Whatever the unique estimate, the accelerated searches must agree
        // with the plain bounds.
        let v: Vec<i32> = (0..200).map(|i| (i / 3) * 2).collect();
        let range = Range::new(0, v.len());

        for value in -1..140 {
            let first = binary_first(&v, &value, range, &mut less);
            let last = binary_last(&v, &value, range, &mut less);

            for unique in [1, 2, 3, 7, 50, 200, 1000] {
                assert_eq!(find_first_forward(&v, &value, range, &mut less, unique), first);
                assert_eq!(find_first_backward(&v, &value, range, &mut less, unique), first);
                assert_eq!(find_last_forward(&v, &value, range, &mut less, unique), last);
                assert_eq!(find_last_backward(&v, &value, range, &mut less, unique), last);
            }
        }
    }

    #[test]
    fn empty_range_returns_start() {
        let v = [3, 1];
        let empty = Range::new(1, 1);
        assert_eq!(find_first_forward(&v, &2, empty, &mut less, 1), 1);
        assert_eq!(find_last_backward(&v, &2, empty, &mut less, 1), 1);
    }

    #[test]
    fn rotate_and_block_swap() {
        let mut v = [0, 1, 2, 3, 4, 5];
        rotate(&mut v, 2, Range::new(0, 4));
        assert_eq!(v, [2, 3, 0, 1, 4, 5]);

        let mut v = [0, 1, 2, 3, 4, 5];
        block_swap(&mut v, 0, 3, 3);
        assert_eq!(v, [3, 4, 5, 0, 1, 2]);
    }
}

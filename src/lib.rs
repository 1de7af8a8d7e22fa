//! A stable, in-place block merge sort.
//!
//! The algorithm is a bottom-up merge sort that never allocates: it merges
//! through a fixed 512-element cache while sub-ranges fit, and above that it
//! "borrows" up to 2·√n unique values from the input itself to act as block
//! tags and scratch space, restoring them once each merge level completes.
//! Worst case is O(n log n) comparisons and moves with O(1) auxiliary memory.
//!
//! Inputs without enough unique values to lend a buffer fall back to a
//! rotation-based merge whose extra work is bounded by exactly that lack of
//! unique values, so the overall bound holds for any input.

use std::cmp::Ordering;
use std::mem::{self, MaybeUninit};

mod levels;
mod merge;
mod search;
mod smallsort;

use levels::{LevelIter, Range};
use merge::{merge_external, merge_four, merge_in_place, merge_internal};
use search::{
    binary_first, block_swap, find_first_backward, find_first_forward, find_last_backward,
    find_last_forward, rotate,
};
use smallsort::{insertion_sort, network_sort, tiny_sort};

/// Number of elements the scratch cache can hold.
///
/// A tuning constant, not a correctness parameter: the algorithm stays
/// correct for any value including zero, which would simply disable the fast
/// paths. Making it huge defeats the point of a low-memory sort.
const CACHE_SIZE: usize = 512;

/// Sorts the slice.
///
/// This sort is stable (i.e., does not reorder equal elements), in-place
/// (i.e., does not allocate), and *O*(*n* \* log(*n*)) worst-case.
///
/// # Examples
///
/// ```
/// let mut v = [-5, 4, 1, -3, 2];
///
/// block_sort::sort(&mut v);
/// assert_eq!(v, [-5, -3, 1, 2, 4]);
/// ```
#[inline(always)]
pub fn sort<T>(v: &mut [T])
where
    T: Ord,
{
    stable_sort(v, &mut |a, b| a.lt(b));
}

/// Sorts the slice with a comparator function.
///
/// This sort is stable (i.e., does not reorder equal elements), in-place
/// (i.e., does not allocate), and *O*(*n* \* log(*n*)) worst-case.
///
/// The comparator function must define a total ordering for the elements in
/// the slice; if it does not, the order of the elements is unspecified.
/// If the comparator panics, the slice is left as some permutation of its
/// input, but not necessarily sorted.
///
/// # Examples
///
/// ```
/// let mut v = [5, 4, 1, 3, 2];
/// block_sort::sort_by(&mut v, |a, b| a.cmp(b));
/// assert_eq!(v, [1, 2, 3, 4, 5]);
///
/// // reverse sorting
/// block_sort::sort_by(&mut v, |a, b| b.cmp(a));
/// assert_eq!(v, [5, 4, 3, 2, 1]);
/// ```
#[inline(always)]
pub fn sort_by<T, F>(v: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    stable_sort(v, &mut |a, b| compare(a, b) == Ordering::Less);
}

/// Sorts the slice with a key extraction function.
///
/// The key function is called on every comparison, exactly like projecting
/// before comparing by hand; keys are not cached, since caching would
/// allocate.
///
/// # Examples
///
/// ```
/// let mut v = [-5i32, 4, 1, -3, 2];
///
/// block_sort::sort_by_key(&mut v, |k| k.abs());
/// assert_eq!(v, [1, 2, -3, 4, -5]);
/// ```
#[inline(always)]
pub fn sort_by_key<T, K, F>(v: &mut [T], mut key: F)
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    stable_sort(v, &mut |a, b| key(a).lt(&key(b)));
}

// --- IMPL ---

fn stable_sort<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    // Sorting has no meaningful behavior on zero-sized types.
    if mem::size_of::<T>() == 0 {
        return;
    }

    let size = v.len();
    if size < 4 {
        tiny_sort(v, is_less);
        return;
    }

    // Level 0: sort groups of 4 to 8 elements with the stabilised networks.
    let mut iterator = LevelIter::new(size, 4);
    while !iterator.finished() {
        let range = iterator.next_range();
        network_sort(&mut v[range.start..range.end], is_less);
    }
    if size < 8 {
        return;
    }

    let mut cache: [MaybeUninit<T>; CACHE_SIZE] = unsafe { MaybeUninit::uninit().assume_init() };

    // Merge the higher levels, which are 8-15, 16-31, 32-63 elements and so
    // on, switching strategy on whether a sub-range still fits the cache.
    // `<` rather than `<=` because actual ranges can be one element longer
    // than the nominal length.
    loop {
        if iterator.len() < CACHE_SIZE {
            if (iterator.len() + 1) * 4 <= CACHE_SIZE && iterator.len() * 4 <= size {
                merge_level_quads(v, &mut iterator, &mut cache, is_less);
                // Two levels were merged in one sweep; skip the second.
                iterator.next_level();
            } else {
                merge_level_pairs(v, &mut iterator, &mut cache, is_less);
            }
        } else {
            merge_level_blocks(v, &mut iterator, &mut cache, is_less);
        }

        if !iterator.next_level() {
            break;
        }
    }
}

/// One merge level where each A fits the cache: merge every adjacent (A, B)
/// pair through the cache, skipping pairs that a rotation or nothing at all
/// already fixes.
fn merge_level_pairs<T, F>(
    v: &mut [T],
    iterator: &mut LevelIter,
    cache: &mut [MaybeUninit<T>],
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    iterator.begin();
    while !iterator.finished() {
        let a = iterator.next_range();
        let b = iterator.next_range();

        if is_less(&v[b.end - 1], &v[a.start]) {
            // The two runs are in reverse order, a rotation is the merge.
            rotate(v, a.len(), Range::new(a.start, b.end));
        } else if is_less(&v[b.start], &v[a.end - 1]) {
            merge_external(v, a, b, cache, is_less);
        }
        // Otherwise the pair is already in order.
    }
}

/// One double merge level: four consecutive ranges fit the cache together,
/// so A1|B1 and A2|B2 are merged into the cache and the two halves merged
/// back, finishing two levels per sweep.
fn merge_level_quads<T, F>(
    v: &mut [T],
    iterator: &mut LevelIter,
    cache: &mut [MaybeUninit<T>],
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    iterator.begin();
    while !iterator.finished() {
        let a1 = iterator.next_range();
        let b1 = iterator.next_range();
        let a2 = iterator.next_range();
        let b2 = iterator.next_range();

        merge_four(v, a1, b1, a2, b2, cache, is_less);
    }
}

/// An intended extraction of `count` unique values found around index
/// `from`, to be collected at index `to`, within the (A, B) pair spanning
/// `range`.
#[derive(Copy, Clone)]
struct Pull {
    from: usize,
    to: usize,
    count: usize,
    range: Range,
}

impl Pull {
    const EMPTY: Pull = Pull {
        from: 0,
        to: 0,
        count: 0,
        range: Range { start: 0, end: 0 },
    };
}

/// One merge level too large for the cache. The in-place strategy:
///
/// 1. pull out up to two internal buffers of √A unique values each
/// 2. per (A, B) pair: break A into blocks, tag each block's head with a
///    buffer1 value, roll the A blocks through B and drop them where they
///    belong, merging each dropped block with the B values after it
/// 3. insertion sort the scrambled second buffer
/// 4. redistribute both buffers back into the array
fn merge_level_blocks<T, F>(
    v: &mut [T],
    iterator: &mut LevelIter,
    cache: &mut [MaybeUninit<T>],
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    let mut block_size = (iterator.len() as f64).sqrt() as usize;
    let mut buffer_size = iterator.len() / block_size + 1;

    let mut buffer1 = Range::new(0, 0);
    let mut buffer2 = Range::new(0, 0);
    let mut pull = [Pull::EMPTY; 2];
    let mut pull_index = 0;

    // Ideally one contiguous stretch of 2·buffer_size unique values supplies
    // both buffers. If every A block fits the cache the second buffer is
    // never needed; if a sub-range cannot hold both, find them separately.
    let mut find = buffer_size + buffer_size;
    let mut find_separately = false;

    if block_size <= CACHE_SIZE {
        find = buffer_size;
    } else if find > iterator.len() {
        find = buffer_size;
        find_separately = true;
    }

    // Scan the level's sub-ranges for unique values: forward through each A
    // (values would be pulled to A's start) and backward through each B
    // (pulled to B's end). Falling short of even one buffer of buffer_size
    // values leaves the largest group found as buffer1 and downgrades every
    // merge of this level to the rotation-based one.
    iterator.begin();
    'scan: while !iterator.finished() {
        let a = iterator.next_range();
        let b = iterator.next_range();

        let mut last = a.start;
        let mut count = 1;
        while count < find {
            let next = find_last_forward(
                v,
                &v[last],
                Range::new(last + 1, a.end),
                is_less,
                find - count,
            );
            if next == a.end {
                break;
            }
            last = next;
            count += 1;
        }
        let index = last;

        if count >= buffer_size {
            pull[pull_index] = Pull {
                range: Range::new(a.start, b.end),
                count,
                from: index,
                to: a.start,
            };
            pull_index = 1;

            if count == buffer_size + buffer_size {
                // One stretch large enough to hold both buffers at once.
                buffer1 = Range::new(a.start, a.start + buffer_size);
                buffer2 = Range::new(a.start + buffer_size, a.start + count);
                break 'scan;
            } else if find == buffer_size + buffer_size {
                // Enough for the first buffer; keep looking for the second.
                buffer1 = Range::new(a.start, a.start + count);
                find = buffer_size;
            } else if block_size <= CACHE_SIZE {
                // The one and only buffer needed is complete.
                buffer1 = Range::new(a.start, a.start + count);
                break 'scan;
            } else if find_separately {
                // Found the first of two separate buffers.
                buffer1 = Range::new(a.start, a.start + count);
                find_separately = false;
            } else {
                buffer2 = Range::new(a.start, a.start + count);
                break 'scan;
            }
        } else if pull_index == 0 && count > buffer1.len() {
            // Remember the largest group seen so far as the fallback.
            buffer1 = Range::new(a.start, a.start + count);
            pull[0] = Pull {
                range: Range::new(a.start, b.end),
                count,
                from: index,
                to: a.start,
            };
        }

        let mut last = b.end - 1;
        let mut count = 1;
        while count < find {
            let next = find_first_backward(
                v,
                &v[last],
                Range::new(b.start, last),
                is_less,
                find - count,
            );
            if next == b.start {
                break;
            }
            last = next - 1;
            count += 1;
        }
        let index = last;

        if count >= buffer_size {
            pull[pull_index] = Pull {
                range: Range::new(a.start, b.end),
                count,
                from: index,
                to: b.end,
            };
            pull_index = 1;

            if count == buffer_size + buffer_size {
                buffer1 = Range::new(b.end - count, b.end - buffer_size);
                buffer2 = Range::new(b.end - buffer_size, b.end);
                break 'scan;
            } else if find == buffer_size + buffer_size {
                buffer1 = Range::new(b.end - count, b.end);
                find = buffer_size;
            } else if block_size <= CACHE_SIZE {
                buffer1 = Range::new(b.end - count, b.end);
                break 'scan;
            } else if find_separately {
                buffer1 = Range::new(b.end - count, b.end);
                find_separately = false;
            } else {
                // If the first buffer came out of the A side of this same
                // pair, its redistribution must stop short of this one.
                if pull[0].range.start == a.start {
                    let claimed = pull[1].count;
                    pull[0].range.end -= claimed;
                }
                buffer2 = Range::new(b.end - count, b.end);
                break 'scan;
            }
        } else if pull_index == 0 && count > buffer1.len() {
            buffer1 = Range::new(b.end - count, b.end);
            pull[0] = Pull {
                range: Range::new(a.start, b.end),
                count,
                from: index,
                to: b.end,
            };
        }
    }

    // Chain rotations to collect each pull's unique values into one
    // contiguous run at its target end.
    for p in pull.iter_mut() {
        let length = p.count;

        if p.to < p.from {
            // Pulling out to the left, toward the start of an A sub-range.
            let mut index = p.from;
            let mut count = 1;
            while count < length {
                index = find_first_backward(
                    v,
                    &v[index - 1],
                    Range::new(p.to, p.from - (count - 1)),
                    is_less,
                    length - count,
                );
                let range = Range::new(index + 1, p.from + 1);
                rotate(v, range.len() - count, range);
                p.from = index + count;
                count += 1;
            }
        } else if p.to > p.from {
            // Pulling out to the right, toward the end of a B sub-range.
            let mut index = p.from + 1;
            let mut count = 1;
            while count < length {
                index = find_last_forward(
                    v,
                    &v[index],
                    Range::new(index, p.to),
                    is_less,
                    length - count,
                );
                let range = Range::new(p.from, index - 1);
                rotate(v, count, range);
                p.from = index - 1 - count;
                count += 1;
            }
        }
    }

    // Adjust to the buffer actually obtained. buffer1 must be able to tag
    // every evenly sized A block, which the recomputed block size ensures.
    buffer_size = buffer1.len();
    block_size = iterator.len() / buffer_size + 1;
    debug_assert!((iterator.len() + 1) / block_size <= buffer_size);

    iterator.begin();
    'pairs: while !iterator.finished() {
        let mut a = iterator.next_range();
        let mut b = iterator.next_range();

        // Strip off any part of this pair the internal buffers occupy.
        let start = a.start;
        for p in &pull {
            if start == p.range.start {
                if p.from > p.to {
                    a.start += p.count;
                    // The buffer can swallow the whole sub-range when the
                    // sub-ranges are tiny; then there is nothing to merge.
                    if a.len() == 0 {
                        continue 'pairs;
                    }
                } else if p.from < p.to {
                    b.end -= p.count;
                    if b.len() == 0 {
                        continue 'pairs;
                    }
                }
            }
        }

        if is_less(&v[b.end - 1], &v[a.start]) {
            // The two runs are in reverse order, a rotation is the merge.
            rotate(v, a.len(), Range::new(a.start, b.end));
        } else if is_less(&v[a.end], &v[a.end - 1]) {
            // B is known non-empty here, so v[a.end] is its first element.
            debug_assert!(a.end == b.start && b.len() > 0);
            merge_pair_with_blocks(v, a, b, buffer1, buffer2, block_size, cache, is_less);
        }
        // Otherwise already in order.
    }

    // buffer2 holds its original values in scrambled order. It comes back
    // mostly sorted, which is why insertion sort restores it cheapest.
    insertion_sort(&mut v[buffer2.start..buffer2.end], is_less);

    // Redistribute the pulled values by the inverse of the extraction,
    // rotating each value to its sorted spot. The unique estimate halves as
    // the remaining buffer shrinks.
    for p in &pull {
        let mut unique = p.count * 2;

        if p.from > p.to {
            // Values were pulled to the left; scatter them back rightward.
            let mut buffer = Range::new(p.range.start, p.range.start + p.count);
            while buffer.len() > 0 {
                let index = find_first_forward(
                    v,
                    &v[buffer.start],
                    Range::new(buffer.end, p.range.end),
                    is_less,
                    unique,
                );
                let amount = index - buffer.end;
                rotate(v, buffer.len(), Range::new(buffer.start, index));
                buffer.start += amount + 1;
                buffer.end += amount;
                unique -= 2;
            }
        } else if p.from < p.to {
            // Values were pulled to the right; scatter them back leftward.
            let mut buffer = Range::new(p.range.end - p.count, p.range.end);
            while buffer.len() > 0 {
                let index = find_last_backward(
                    v,
                    &v[buffer.end - 1],
                    Range::new(p.range.start, buffer.start),
                    is_less,
                    unique,
                );
                let amount = buffer.start - index;
                rotate(v, amount, Range::new(index, buffer.end));
                buffer.start -= amount;
                buffer.end -= amount + 1;
                unique -= 2;
            }
        }
    }
}

/// Merges one (A, B) pair by rolling tagged A blocks through B.
///
/// A is split into `block_size` blocks with one uneven block at the front.
/// Each full block's head is swapped with the next buffer1 value; since A is
/// sorted and the tags are distinct, tag order mirrors block order, which
/// lets the minimum remaining block be found by comparing heads. Blocks roll
/// rightward past B blocks until their content belongs behind the last B
/// block passed, then get dropped into place; each drop merges the
/// previously dropped block with the B values that accumulated after it.
fn merge_pair_with_blocks<T, F>(
    v: &mut [T],
    a: Range,
    b: Range,
    buffer1: Range,
    buffer2: Range,
    block_size: usize,
    cache: &mut [MaybeUninit<T>],
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    let mut block_a = Range::new(a.start, a.end);
    let first_a = Range::new(a.start, a.start + block_a.len() % block_size);

    // Tag the head of every full A block.
    let mut tag = buffer1.start;
    let mut head = first_a.end;
    while head < block_a.end {
        v.swap(tag, head);
        tag += 1;
        head += block_size;
    }

    let mut last_a = first_a;
    let mut last_b = Range::new(0, 0);
    let mut block_b = Range::new(b.start, b.start + usize::min(block_size, b.len()));
    block_a.start += first_a.len();
    let mut index_a = buffer1.start;

    // When the uneven first block is too big for the cache it is merged out
    // of buffer2 instead, so park it there up front.
    if last_a.len() > CACHE_SIZE && buffer2.len() > 0 {
        block_swap(v, last_a.start, buffer2.start, last_a.len());
    }

    if block_a.len() > 0 {
        loop {
            // Drop the minimum A block once its head belongs before the end
            // of the last dropped B block, or once B has run out.
            if (last_b.len() > 0 && !is_less(&v[last_b.end - 1], &v[index_a]))
                || block_b.len() == 0
            {
                // Where the last B block splits around the incoming A block.
                let b_split = binary_first(v, &v[index_a], last_b, is_less);
                let b_remaining = last_b.end - b_split;

                // Find the minimum A block; the tags are distinct, so the
                // head comparison is exact.
                let mut min_a = block_a.start;
                let mut find_a = min_a + block_size;
                while find_a < block_a.end {
                    if is_less(&v[find_a], &v[min_a]) {
                        min_a = find_a;
                    }
                    find_a += block_size;
                }
                block_swap(v, block_a.start, min_a, block_size);

                // Give the dropped block its head back from buffer1.
                v.swap(block_a.start, index_a);
                index_a += 1;

                // Merge the previously dropped A block with the B values
                // that collected behind it.
                merge_step(
                    v,
                    last_a,
                    Range::new(last_a.end, b_split),
                    buffer2,
                    cache,
                    is_less,
                );

                if buffer2.len() > 0 && block_size > CACHE_SIZE {
                    // Park the dropped block in buffer2 for its own merge
                    // later; its old slots then hold scratch values, so the
                    // split-off B tail can be block swapped into place
                    // instead of rotated.
                    block_swap(v, block_a.start, buffer2.start, block_size);
                    block_swap(
                        v,
                        b_split,
                        block_a.start + block_size - b_remaining,
                        b_remaining,
                    );
                } else {
                    rotate(
                        v,
                        block_a.start - b_split,
                        Range::new(b_split, block_a.start + block_size),
                    );
                }

                last_a = Range::new(
                    block_a.start - b_remaining,
                    block_a.start - b_remaining + block_size,
                );
                last_b = Range::new(last_a.end, last_a.end + b_remaining);

                block_a.start += block_size;
                if block_a.len() == 0 {
                    break;
                }
            } else if block_b.len() < block_size {
                // The final, unevenly sized B block goes in front of the
                // remaining A blocks whole, by rotation.
                rotate(
                    v,
                    block_b.start - block_a.start,
                    Range::new(block_a.start, block_b.end),
                );

                last_b = Range::new(block_a.start, block_a.start + block_b.len());
                block_a.start += block_b.len();
                block_a.end += block_b.len();
                block_b.end = block_b.start;
            } else {
                // Roll the leftmost A block past the next B block.
                block_swap(v, block_a.start, block_b.start, block_size);
                last_b = Range::new(block_a.start, block_a.start + block_size);

                block_a.start += block_size;
                block_a.end += block_size;
                block_b.start += block_size;

                if block_b.end > b.end - block_size {
                    block_b.end = b.end;
                } else {
                    block_b.end += block_size;
                }
            }
        }
    }

    // Merge the final A block with what remains of B.
    merge_step(
        v,
        last_a,
        Range::new(last_a.end, b.end),
        buffer2,
        cache,
        is_less,
    );
}

/// The three-way merge choice for one dropped A block and the B values after
/// it: through the cache if the block fits, else by swapping through
/// buffer2, else strictly in place.
fn merge_step<T, F>(
    v: &mut [T],
    a: Range,
    b: Range,
    buffer2: Range,
    cache: &mut [MaybeUninit<T>],
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    if a.len() <= CACHE_SIZE {
        merge_external(v, a, b, cache, is_less);
    } else if buffer2.len() > 0 {
        merge_internal(v, a, b, buffer2, is_less);
    } else {
        merge_in_place(v, a, b, is_less);
    }
}

//! The four merge strategies.
//!
//! All of them merge two adjacent sorted runs A and B (`B.start == A.end`)
//! and all of them resolve equal keys in favour of A, which is what keeps the
//! sort stable. They differ in what scratch space they use:
//!
//! - [`merge_external`]: A is moved into the fixed cache, the merge writes
//!   straight back into the array.
//! - [`merge_four`]: two whole pairs are merged into the cache and the two
//!   merged halves are merged back out, covering two levels at once.
//! - [`merge_internal`]: A has been block swapped into an internal buffer of
//!   unique values; merging swaps instead of copying, so the buffer keeps its
//!   contents (scrambled) and nothing is ever outside the array.
//! - [`merge_in_place`]: rotation based, no scratch at all.
//!
//! The two cache variants are the only places elements ever leave the array.
//! While elements sit in the cache the array has an uninitialized gap; a
//! guard tracks the parked elements and moves them back on unwind, so a
//! panicking comparator always leaves the slice holding every element
//! exactly once. Everything else in the crate is safe swap and rotation
//! code.

use std::mem::{self, MaybeUninit};
use std::ptr;

use crate::levels::Range;
use crate::search::{binary_first, binary_last, rotate};

/// When dropped, moves the `len` elements at `src` into the gap at `dest`.
struct MergeHole<T> {
    src: *mut T,
    dest: *mut T,
    len: usize,
}

impl<T> Drop for MergeHole<T> {
    fn drop(&mut self) {
        // SAFETY: the owner keeps `src` and `dest` valid for `len` elements
        // and non-overlapping for as long as the guard is alive.
        unsafe { ptr::copy_nonoverlapping(self.src, self.dest, self.len) };
    }
}

/// Merges `v[a]` with `v[b]` by first moving the elements of A into the
/// cache, then merging back into `v[a.start..b.end]`.
///
/// If `is_less` panics mid-merge, the unconsumed cached elements are moved
/// back into the gap, so `v` still holds every element exactly once.
pub(crate) fn merge_external<T, F>(
    v: &mut [T],
    a: Range,
    b: Range,
    cache: &mut [MaybeUninit<T>],
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    assert!(a.end == b.start && b.end <= v.len() && a.len() <= cache.len());

    let arr = v.as_mut_ptr();
    let cache_ptr = cache.as_mut_ptr() as *mut T;

    // SAFETY: the asserts above bound every offset; `arr` and `cache_ptr`
    // point to disjoint allocations. Elements are moved array -> cache ->
    // array, each exactly once; the gap in `v[a]` always consists of the
    // `hole.len` slots starting at `hole.dest`, matching the elements still
    // parked at `hole.src`.
    unsafe {
        ptr::copy_nonoverlapping(arr.add(a.start), cache_ptr, a.len());

        let mut hole = MergeHole {
            src: cache_ptr,
            dest: arr.add(a.start),
            len: a.len(),
        };

        let mut b_index = b.start;
        while hole.len > 0 && b_index < b.end {
            // Equal keys take the cached run; it is the left-hand side.
            if !is_less(&*arr.add(b_index), &*hole.src) {
                ptr::copy_nonoverlapping(hole.src, hole.dest, 1);
                hole.src = hole.src.add(1);
                hole.len -= 1;
            } else {
                ptr::copy_nonoverlapping(arr.add(b_index), hole.dest, 1);
                b_index += 1;
            }
            hole.dest = hole.dest.add(1);
        }
        // `hole` drops here and moves whatever is left of A into the gap.
    }
}

/// Restores elements parked in the cache should a comparison panic while the
/// array still has gaps. `holes` are array ranges, `filled` cache ranges;
/// both sides always cover the same element count and the cache ranges are
/// written back in order. Each `(start, len)` pair is in elements.
struct CacheHole<T> {
    v: *mut T,
    cache: *mut T,
    holes: [(usize, usize); 2],
    filled: [(usize, usize); 2],
}

impl<T> Drop for CacheHole<T> {
    fn drop(&mut self) {
        let mut src = 0;
        let mut dst = 0;
        while src < 2 && dst < 2 {
            let (fill_start, fill_len) = self.filled[src];
            if fill_len == 0 {
                src += 1;
                continue;
            }
            let (hole_start, hole_len) = self.holes[dst];
            if hole_len == 0 {
                dst += 1;
                continue;
            }

            let n = usize::min(fill_len, hole_len);
            // SAFETY: same contract as MergeHole; the owner keeps both sides
            // in bounds and the regions disjoint.
            unsafe {
                ptr::copy_nonoverlapping(self.cache.add(fill_start), self.v.add(hole_start), n);
            }
            self.filled[src] = (fill_start + n, fill_len - n);
            self.holes[dst] = (hole_start + n, hole_len - n);
        }
    }
}

/// Merges `v[a]` and `v[b]` into the cache starting at `dst`, growing the
/// guard's hole ranges as elements leave the array: the consumed A prefix
/// extends `holes[0]`, the consumed B prefix `holes[1]`, and `filled[0]`
/// tracks the cache prefix. A and B must be non-empty.
unsafe fn merge_runs_into_cache<T, F>(
    hole: &mut CacheHole<T>,
    a: Range,
    b: Range,
    dst: usize,
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    let v = hole.v;
    let cache = hole.cache;

    let mut a_index = a.start;
    let mut b_index = b.start;
    let mut out = dst;

    loop {
        if !is_less(&*v.add(b_index), &*v.add(a_index)) {
            ptr::copy_nonoverlapping(v.add(a_index), cache.add(out), 1);
            a_index += 1;
            out += 1;
            hole.holes[0].1 += 1;
            hole.filled[0].1 += 1;

            if a_index == a.end {
                let rest = b.end - b_index;
                ptr::copy_nonoverlapping(v.add(b_index), cache.add(out), rest);
                hole.holes[1].1 += rest;
                hole.filled[0].1 += rest;
                break;
            }
        } else {
            ptr::copy_nonoverlapping(v.add(b_index), cache.add(out), 1);
            b_index += 1;
            out += 1;
            hole.holes[1].1 += 1;
            hole.filled[0].1 += 1;

            if b_index == b.end {
                let rest = a.end - a_index;
                ptr::copy_nonoverlapping(v.add(a_index), cache.add(out), rest);
                hole.holes[0].1 += rest;
                hole.filled[0].1 += rest;
                break;
            }
        }
    }
}

/// Merges the cache runs `a` and `b` (cache index ranges) back into the
/// array starting at `dst`, shrinking the guard's state as the gap fills.
/// On entry the guard must describe a single hole at `dst` covering
/// `a.len() + b.len()` slots. A and B must be non-empty.
unsafe fn merge_cache_into_array<T, F>(
    hole: &mut CacheHole<T>,
    a: Range,
    b: Range,
    dst: usize,
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    let v = hole.v;
    let cache = hole.cache;

    // Refine the single filled range into the two runs being consumed.
    hole.filled = [(a.start, a.len()), (b.start, b.len())];

    let mut a_index = a.start;
    let mut b_index = b.start;
    let mut out = dst;

    loop {
        if !is_less(&*cache.add(b_index), &*cache.add(a_index)) {
            ptr::copy_nonoverlapping(cache.add(a_index), v.add(out), 1);
            a_index += 1;
            hole.filled[0] = (a_index, a.end - a_index);
        } else {
            ptr::copy_nonoverlapping(cache.add(b_index), v.add(out), 1);
            b_index += 1;
            hole.filled[1] = (b_index, b.end - b_index);
        }
        out += 1;
        hole.holes[0].0 += 1;
        hole.holes[0].1 -= 1;

        if a_index == a.end {
            let rest = b.end - b_index;
            ptr::copy_nonoverlapping(cache.add(b_index), v.add(out), rest);
            break;
        }
        if b_index == b.end {
            let rest = a.end - a_index;
            ptr::copy_nonoverlapping(cache.add(a_index), v.add(out), rest);
            break;
        }
    }
}

/// Merges the two adjacent pairs `a1|b1` and `a2|b2` through the cache: each
/// pair is merged into the cache, then the two merged halves are merged back
/// into `v[a1.start..b2.end]`. Covers two merge levels in one pass.
///
/// Each of the three merges short-circuits the same way: runs in reverse
/// order are copied swapped (a rotation for free), runs already in order are
/// copied through unchanged, and if all four runs form one sorted sequence
/// nothing is touched at all.
pub(crate) fn merge_four<T, F>(
    v: &mut [T],
    a1: Range,
    b1: Range,
    a2: Range,
    b2: Range,
    cache: &mut [MaybeUninit<T>],
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    assert!(
        a1.end == b1.start
            && b1.end == a2.start
            && a2.end == b2.start
            && b2.end <= v.len()
            && a1.len() > 0
            && b1.len() > 0
            && a2.len() > 0
            && b2.len() > 0
    );
    let l1 = a1.len() + b1.len();
    let l2 = a2.len() + b2.len();
    assert!(l1 + l2 <= cache.len());

    let arr = v.as_mut_ptr();
    let cache_ptr = cache.as_mut_ptr() as *mut T;

    // SAFETY: offsets are bounded by the asserts above. All element moves go
    // array -> cache -> array; the guard's hole/filled ranges are updated in
    // step with every move, before the next comparison can run.
    unsafe {
        let mut hole = CacheHole {
            v: arr,
            cache: cache_ptr,
            holes: [(a1.start, 0), (b1.start, 0)],
            filled: [(0, 0), (0, 0)],
        };

        // First pair into cache[..l1].
        if is_less(&*arr.add(b1.end - 1), &*arr.add(a1.start)) {
            // The runs are in reverse order, copying them swapped is already
            // the merge.
            ptr::copy_nonoverlapping(arr.add(a1.start), cache_ptr.add(b1.len()), a1.len());
            ptr::copy_nonoverlapping(arr.add(b1.start), cache_ptr, b1.len());
        } else if is_less(&*arr.add(b1.start), &*arr.add(a1.end - 1)) {
            merge_runs_into_cache(&mut hole, a1, b1, 0, is_less);
        } else {
            // A1|B1 is already sorted. If A2|B2 is too and the two halves
            // are in order, the whole quad is done.
            if !is_less(&*arr.add(b2.start), &*arr.add(a2.end - 1))
                && !is_less(&*arr.add(a2.start), &*arr.add(b1.end - 1))
            {
                mem::forget(hole);
                return;
            }
            ptr::copy_nonoverlapping(arr.add(a1.start), cache_ptr, a1.len());
            ptr::copy_nonoverlapping(arr.add(b1.start), cache_ptr.add(a1.len()), b1.len());
        }
        hole.holes = [(a1.start, l1), (b2.start, 0)];
        hole.filled = [(0, l1), (0, 0)];

        // Second pair into cache[l1..l1 + l2].
        if is_less(&*arr.add(b2.end - 1), &*arr.add(a2.start)) {
            ptr::copy_nonoverlapping(arr.add(a2.start), cache_ptr.add(l1 + b2.len()), a2.len());
            ptr::copy_nonoverlapping(arr.add(b2.start), cache_ptr.add(l1), b2.len());
        } else if is_less(&*arr.add(b2.start), &*arr.add(a2.end - 1)) {
            merge_runs_into_cache(&mut hole, a2, b2, l1, is_less);
        } else {
            ptr::copy_nonoverlapping(arr.add(a2.start), cache_ptr.add(l1), a2.len());
            ptr::copy_nonoverlapping(arr.add(b2.start), cache_ptr.add(l1 + a2.len()), b2.len());
        }
        hole.holes = [(a1.start, l1 + l2), (0, 0)];
        hole.filled = [(0, l1 + l2), (0, 0)];

        // Both merged halves now live in the cache; merge them back.
        let a3 = Range::new(0, l1);
        let b3 = Range::new(l1, l1 + l2);

        if is_less(&*cache_ptr.add(b3.end - 1), &*cache_ptr.add(a3.start)) {
            ptr::copy_nonoverlapping(cache_ptr.add(a3.start), arr.add(a1.start + l2), l1);
            ptr::copy_nonoverlapping(cache_ptr.add(b3.start), arr.add(a1.start), l2);
        } else if is_less(&*cache_ptr.add(b3.start), &*cache_ptr.add(a3.end - 1)) {
            merge_cache_into_array(&mut hole, a3, b3, a1.start, is_less);
        } else {
            ptr::copy_nonoverlapping(cache_ptr.add(a3.start), arr.add(a1.start), l1);
            ptr::copy_nonoverlapping(cache_ptr.add(b3.start), arr.add(a1.start + l1), l2);
        }

        // Every gap has been filled; the guard must not fire.
        mem::forget(hole);
    }
}

/// Merges `v[a]` with `v[b]` in place, with the elements of A block swapped
/// into `buffer` beforehand. Merging swaps instead of copying, so `buffer`
/// ends up holding its previous contents in some scrambled order.
pub(crate) fn merge_internal<T, F>(
    v: &mut [T],
    a: Range,
    b: Range,
    buffer: Range,
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    debug_assert!(a.end == b.start && buffer.len() >= a.len());

    let a_len = a.len();
    let mut a_count = 0;
    let mut b_index = b.start;
    let mut insert = a.start;

    if a_len > 0 && b.len() > 0 {
        loop {
            if !is_less(&v[b_index], &v[buffer.start + a_count]) {
                v.swap(insert, buffer.start + a_count);
                a_count += 1;
                insert += 1;
                if a_count == a_len {
                    break;
                }
            } else {
                v.swap(insert, b_index);
                b_index += 1;
                insert += 1;
                if b_index == b.end {
                    break;
                }
            }
        }
    }

    // Swap the rest of the buffered run into the gap it left behind.
    for i in a_count..a_len {
        v.swap(buffer.start + i, insert + i - a_count);
    }
}

/// Merges `v[a]` with `v[b]` using binary searches and rotations only.
///
/// Quadratic in general, but it is only ever invoked when the input did not
/// contain enough unique values to extract a buffer, which caps both the
/// number of rotations and the rotated lengths; per merge level that works
/// out to O(n) overall.
pub(crate) fn merge_in_place<T, F>(v: &mut [T], mut a: Range, mut b: Range, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    if a.len() == 0 || b.len() == 0 {
        return;
    }

    loop {
        // Find the first spot in B that takes the head of A, rotate the
        // whole of A there, then trim off the part of A that is now placed.
        let mid = binary_first(v, &v[a.start], b, is_less);

        let amount = mid - a.end;
        rotate(v, a.len(), Range::new(a.start, mid));
        if b.end == mid {
            break;
        }

        b.start = mid;
        a = Range::new(a.start + amount, b.start);
        a.start = binary_last(v, &v[a.start], a, is_less);
        if a.len() == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CACHE: usize = 64;

    fn with_cache(f: impl FnOnce(&mut [MaybeUninit<(u32, u32)>])) {
        let mut cache: [MaybeUninit<(u32, u32)>; CACHE] =
            unsafe { MaybeUninit::uninit().assume_init() };
        f(&mut cache);
    }

    // Tag every element with its input position so the checks below catch
    // stability bugs, not just ordering bugs.
    fn tagged(vals: &[u32]) -> Vec<(u32, u32)> {
        vals.iter()
            .enumerate()
            .map(|(i, &value)| (value, i as u32))
            .collect()
    }

    fn is_less(a: &(u32, u32), b: &(u32, u32)) -> bool {
        a.0 < b.0
    }

    fn expected(v: &[(u32, u32)]) -> Vec<(u32, u32)> {
        let mut want = v.to_vec();
        want.sort();
        want
    }

    #[test]
    fn external_merge() {
        let mut v = tagged(&[1, 3, 3, 7, 0, 3, 5, 9, 9]);
        let want = expected(&v);
        with_cache(|cache| {
            merge_external(
                &mut v,
                Range::new(0, 4),
                Range::new(4, 9),
                cache,
                &mut is_less,
            );
        });
        assert_eq!(v, want);
    }

    #[test]
    fn four_way_merge() {
        // One case per short-circuit: interleaved, reversed, pre-sorted.
        let cases: [&[u32]; 4] = [
            &[2, 6, 1, 8, 3, 3, 0, 9],
            &[7, 8, 5, 6, 3, 4, 1, 2],
            &[1, 2, 3, 4, 5, 6, 7, 8],
            &[4, 4, 4, 4, 4, 4, 4, 4],
        ];

        for vals in cases {
            let mut v = tagged(vals);
            let want = expected(&v);
            with_cache(|cache| {
                merge_four(
                    &mut v,
                    Range::new(0, 2),
                    Range::new(2, 4),
                    Range::new(4, 6),
                    Range::new(6, 8),
                    cache,
                    &mut is_less,
                );
            });
            assert_eq!(v, want, "input {vals:?}");
        }
    }

    #[test]
    fn internal_merge_restores_buffer() {
        // Layout: [buffer][A][B]; the driver block swaps A's payload into
        // the buffer slots before merging, leaving the buffer's unique
        // values parked in the A slots.
        let mut v: Vec<(u32, u32)> = vec![
            (100, 0),
            (101, 0),
            (102, 0),
            (1, 1),
            (4, 2),
            (6, 3),
            (2, 11),
            (4, 12),
            (9, 13),
        ];
        for i in 0..3 {
            v.swap(i, i + 3);
        }

        merge_internal(
            &mut v,
            Range::new(3, 6),
            Range::new(6, 9),
            Range::new(0, 3),
            &mut is_less,
        );

        // Merged output, with the equal 4s keeping the A element first.
        assert_eq!(
            v[3..9],
            [(1, 1), (2, 11), (4, 2), (4, 12), (6, 3), (9, 13)]
        );

        // The buffer values all survived, scrambled within their slots.
        let mut buf: Vec<u32> = v[0..3].iter().map(|e| e.0).collect();
        buf.sort();
        assert_eq!(buf, [100, 101, 102]);
    }

    #[test]
    fn in_place_merge() {
        let mut v = tagged(&[2, 2, 5, 8, 1, 2, 8, 8]);
        let want = expected(&v);
        merge_in_place(&mut v, Range::new(0, 4), Range::new(4, 8), &mut is_less);
        assert_eq!(v, want);

        // Degenerate runs.
        let mut v = tagged(&[1, 2, 3]);
        merge_in_place(&mut v, Range::new(0, 3), Range::new(3, 3), &mut is_less);
        assert_eq!(v, tagged(&[1, 2, 3]));
    }
}

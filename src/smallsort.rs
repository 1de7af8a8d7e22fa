//! Fixed-size base cases for the bottom merge level.

/// Compare-exchange sequences of the optimal sorting networks for 4 to 8
/// elements, from the classic published tables.
const NETWORK_4: &[[u8; 2]] = &[[0, 1], [2, 3], [0, 2], [1, 3], [1, 2]];

const NETWORK_5: &[[u8; 2]] = &[
    [0, 1],
    [3, 4],
    [2, 4],
    [2, 3],
    [1, 4],
    [0, 3],
    [0, 2],
    [1, 3],
    [1, 2],
];

const NETWORK_6: &[[u8; 2]] = &[
    [1, 2],
    [4, 5],
    [0, 2],
    [3, 5],
    [0, 1],
    [3, 4],
    [2, 5],
    [0, 3],
    [1, 4],
    [2, 4],
    [1, 3],
    [2, 3],
];

const NETWORK_7: &[[u8; 2]] = &[
    [1, 2],
    [3, 4],
    [5, 6],
    [0, 2],
    [3, 5],
    [4, 6],
    [0, 1],
    [4, 5],
    [2, 6],
    [0, 4],
    [1, 5],
    [0, 3],
    [2, 5],
    [1, 3],
    [2, 4],
    [2, 3],
];

const NETWORK_8: &[[u8; 2]] = &[
    [0, 1],
    [2, 3],
    [4, 5],
    [6, 7],
    [0, 2],
    [1, 3],
    [4, 6],
    [5, 7],
    [1, 2],
    [5, 6],
    [0, 4],
    [3, 7],
    [1, 5],
    [2, 6],
    [1, 4],
    [3, 6],
    [2, 4],
    [3, 5],
    [3, 4],
];

/// Sorts a slice of 4 to 8 elements with a compare-exchange network.
///
/// The networks are unstable on their own, so each element's starting
/// position is tracked in a shadow array and used as a tie break: a swap
/// happens if the right element is strictly smaller, or if the two compare
/// equal but the right one started out earlier. The net effect is stable.
pub(crate) fn network_sort<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let network = match v.len() {
        4 => NETWORK_4,
        5 => NETWORK_5,
        6 => NETWORK_6,
        7 => NETWORK_7,
        8 => NETWORK_8,
        _ => unreachable!("network_sort called with length outside 4..=8"),
    };

    let mut order = [0u8, 1, 2, 3, 4, 5, 6, 7];
    for &[x, y] in network {
        let (x, y) = (usize::from(x), usize::from(y));

        if is_less(&v[y], &v[x]) || (order[x] > order[y] && !is_less(&v[x], &v[y])) {
            v.swap(x, y);
            order.swap(x, y);
        }
    }
}

/// Stable sort for fewer than four elements.
pub(crate) fn tiny_sort<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    match v.len() {
        3 => {
            if is_less(&v[1], &v[0]) {
                v.swap(0, 1);
            }
            if is_less(&v[2], &v[1]) {
                v.swap(1, 2);
                if is_less(&v[1], &v[0]) {
                    v.swap(0, 1);
                }
            }
        }
        2 => {
            if is_less(&v[1], &v[0]) {
                v.swap(0, 1);
            }
        }
        _ => {}
    }
}

/// Plain insertion sort. Only used to restore the scratch buffer at the end
/// of a merge level, where the data comes back mostly sorted already and
/// heavier algorithms consistently lose.
pub(crate) fn insertion_sort<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    for i in 1..v.len() {
        let mut j = i;
        while j > 0 && is_less(&v[j], &v[j - 1]) {
            v.swap(j, j - 1);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_stable_sorted(len: usize) {
        // Run every length-`len` string over three values through the
        // sorter, tagged with the original index, and demand a fully sorted
        // (value, index) sequence afterwards.
        let values = 3usize;
        let total = values.pow(len as u32);

        for mut pattern in 0..total {
            let mut v: Vec<(usize, usize)> = (0..len)
                .map(|i| {
                    let value = pattern % values;
                    pattern /= values;
                    (value, i)
                })
                .collect();

            let mut is_less = |a: &(usize, usize), b: &(usize, usize)| a.0 < b.0;
            if len < 4 {
                tiny_sort(&mut v, &mut is_less);
            } else {
                network_sort(&mut v, &mut is_less);
            }

            assert!(v.windows(2).all(|w| w[0] <= w[1]), "len {len}: {v:?}");
        }
    }

    #[test]
    fn tiny_sizes() {
        for len in 0..4 {
            check_stable_sorted(len);
        }
    }

    #[test]
    fn network_sizes() {
        for len in 4..=8 {
            check_stable_sorted(len);
        }
    }

    #[test]
    fn insertion_sort_sorts() {
        let mut v = vec![5, 3, 9, 1, 1, 7, 0];
        insertion_sort(&mut v, &mut |a: &i32, b: &i32| a < b);
        assert_eq!(v, [0, 1, 1, 3, 5, 7, 9]);
    }
}

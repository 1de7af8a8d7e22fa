use std::cmp::Ordering;

use sort_test_tools::{instantiate_sort_tests, Sort};

struct SortImpl {}

impl Sort for SortImpl {
    fn name() -> String {
        "rust_block_sort_stable".into()
    }

    fn sort<T>(arr: &mut [T])
    where
        T: Ord,
    {
        block_sort::sort(arr);
    }

    fn sort_by<T, F>(arr: &mut [T], compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        block_sort::sort_by(arr, compare);
    }
}

instantiate_sort_tests!(SortImpl);

// --- Targeted scenarios beyond the shared suite ---

use sort_test_tools::patterns;

#[test]
fn empty_and_singleton() {
    let mut v: [i32; 0] = [];
    block_sort::sort(&mut v);
    assert_eq!(v, []);

    let mut v = [42];
    block_sort::sort(&mut v);
    assert_eq!(v, [42]);
}

#[test]
fn reversed_decade() {
    let mut v = [9, 8, 7, 6, 5, 4, 3, 2, 1, 0];
    block_sort::sort(&mut v);
    assert_eq!(v, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn all_equal_keeps_order() {
    let mut v: Vec<(i32, usize)> = (0..8).map(|i| (5, i)).collect();
    block_sort::sort_by(&mut v, |a, b| a.0.cmp(&b.0));

    assert_eq!(v.iter().map(|e| e.0).collect::<Vec<_>>(), vec![5; 8]);
    assert!(v.iter().map(|e| e.1).eq(0..8));
}

#[test]
fn mixed_small_stable() {
    let vals = [3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5];
    let mut v: Vec<(i32, usize)> = vals.iter().copied().zip(0..).collect();
    block_sort::sort_by(&mut v, |a, b| a.0.cmp(&b.0));

    let sorted_vals: Vec<i32> = v.iter().map(|e| e.0).collect();
    assert_eq!(sorted_vals, [1, 1, 2, 3, 3, 4, 5, 5, 5, 6, 9]);

    // The first 1 came from index 1, the second from index 3; same pattern
    // for every other equal group.
    assert_eq!(v[0], (1, 1));
    assert_eq!(v[1], (1, 3));
    assert_eq!(v[2], (2, 6));
    assert_eq!(v[3], (3, 0));
    assert_eq!(v[4], (3, 9));
    assert_eq!(v[5], (4, 2));
    assert_eq!(v[6], (5, 4));
    assert_eq!(v[7], (5, 8));
    assert_eq!(v[8], (5, 10));
}

#[test]
fn ten_thousand_uniform_is_a_sorted_permutation() {
    let input = patterns::random_uniform(10_000, 0..=100);

    let mut histogram_before = [0u32; 101];
    for &val in &input {
        histogram_before[val as usize] += 1;
    }

    let mut v = input;
    block_sort::sort(&mut v);

    assert!(v.windows(2).all(|w| w[0] <= w[1]));

    let mut histogram_after = [0u32; 101];
    for &val in &v {
        histogram_after[val as usize] += 1;
    }
    assert_eq!(histogram_before, histogram_after);
}

#[test]
fn sort_by_key_projects() {
    #[derive(Debug, PartialEq)]
    struct Task {
        priority: u8,
        id: u32,
    }

    let mut tasks: Vec<Task> = [3u8, 1, 2, 1, 3, 2, 1]
        .iter()
        .enumerate()
        .map(|(id, &priority)| Task {
            priority,
            id: id as u32,
        })
        .collect();

    block_sort::sort_by_key(&mut tasks, |t| t.priority);

    let order: Vec<(u8, u32)> = tasks.iter().map(|t| (t.priority, t.id)).collect();
    assert_eq!(
        order,
        [(1, 1), (1, 3), (1, 6), (2, 2), (2, 5), (3, 0), (3, 4)]
    );
}

#[test]
fn reverse_comparator() {
    let mut v = patterns::random(1_000);
    block_sort::sort_by(&mut v, |a, b| b.cmp(a));
    assert!(v.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn block_path_with_few_uniques() {
    // Large enough to leave the cache regime, with so few distinct values
    // that buffer extraction must fall back to the rotation merge.
    for distinct in [1, 2, 3, 17] {
        let mut v = patterns::random_uniform(40_000, 0..distinct);
        let mut expected = v.clone();
        expected.sort();

        block_sort::sort(&mut v);
        assert_eq!(v, expected, "distinct values: {distinct}");
    }
}

#[test]
fn block_path_stability() {
    // Crosses the cache boundary with duplicate-heavy keys; occurrence
    // numbers expose any reordering of equal elements.
    let keys = patterns::random_uniform(50_000, 0..=31);

    let mut counts = [0u32; 32];
    let mut v: Vec<(i32, u32)> = keys
        .into_iter()
        .map(|k| {
            counts[k as usize] += 1;
            (k, counts[k as usize])
        })
        .collect();

    block_sort::sort_by(&mut v, |a, b| a.0.cmp(&b.0));

    assert!(v.windows(2).all(|w| w[0] <= w[1]));
}

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Narrow keys plus the input position; sorting by key only must keep the
    // positions of equal keys in order.
    let mut v: Vec<(u8, usize)> = data
        .iter()
        .enumerate()
        .map(|(i, &byte)| (byte & 0x7, i))
        .collect();

    block_sort::sort_by(&mut v, |a, b| a.0.cmp(&b.0));

    assert!(v.windows(2).all(|w| w[0] <= w[1]));
});

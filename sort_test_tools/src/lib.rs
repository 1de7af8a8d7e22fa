pub trait Sort {
    fn name() -> String;

    fn sort<T>(arr: &mut [T])
    where
        T: Ord;

    fn sort_by<T, F>(arr: &mut [T], compare: F)
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering;
}

pub mod patterns;

/// Generates one `#[test]` per suite function in [`tests`] for the given
/// `Sort` implementation.
#[macro_export]
macro_rules! instantiate_sort_tests {
    ($sort_impl:ty) => {
        $crate::_instantiate_sort_tests_gen!(
            $sort_impl,
            basic,
            fixed_seed,
            random,
            random_type_u64,
            random_type_u128,
            random_d2,
            random_d4,
            random_d16,
            random_d256,
            random_narrow,
            random_s50,
            random_s95,
            all_equal,
            ascending,
            descending,
            saw_ascending,
            saw_descending,
            saw_mixed,
            pipe_organ,
            random_str,
            random_large_val,
            dyn_val,
            stability,
            stability_with_patterns,
            observable_is_less,
            observable_is_less_mut_ptr,
            comp_panic,
            double_sort,
            deterministic,
            every_len
        );
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! _instantiate_sort_tests_gen {
    ($sort_impl:ty, $($test_fn:ident),+) => {
        $(
            #[test]
            fn $test_fn() {
                $crate::tests::$test_fn::<$sort_impl>();
            }
        )+
    };
}

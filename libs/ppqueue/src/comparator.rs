/// A strict weak ordering over `T`.
///
/// `less(a, b)` reports that `a` has a lower priority than `b`. The heap keeps the element that
/// is not less than any other at its root.
pub trait Comparator<T> {
    fn less(&self, a: &T, b: &T) -> bool;
}

/// Orders by [`Ord`], largest first (max-heap). This is the default comparator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascending;

impl<T: Ord> Comparator<T> for Ascending {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// Orders by [`Ord`], smallest first (min-heap).
#[derive(Debug, Clone, Copy, Default)]
pub struct Descending;

impl<T: Ord> Comparator<T> for Descending {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        b < a
    }
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::{Ascending, Comparator, Descending};

    #[test]
    fn ascending_prefers_larger() {
        assert!(Ascending.less(&1, &2));
        assert!(!Ascending.less(&2, &1));
        assert!(!Ascending.less(&2, &2));
    }

    #[test]
    fn descending_prefers_smaller() {
        assert!(Descending.less(&2, &1));
        assert!(!Descending.less(&1, &2));
        assert!(!Descending.less(&1, &1));
    }

    /// Closures work as comparators, here ordering strings by length.
    #[test]
    fn closure_comparator() {
        let by_len = |a: &&str, b: &&str| a.len() < b.len();
        assert!(by_len.less(&"ab", &"abc"));
        assert!(!by_len.less(&"abcd", &"abc"));
    }
}

//! Element ordering seam.

use std::cmp::Ordering;

/// Comparison strategy for stored elements.
///
/// The engine never calls `Ord` on elements directly; it routes every
/// comparison through a `Comparator`, which is how adapter layers (maps
/// keyed on one field of a pair, case-insensitive sets and the like)
/// configure ordering without wrapping the element type. Comparators may
/// carry state; the engine stores the instance it was constructed with.
pub trait Comparator<T> {
    /// Compare two elements.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// The default comparator: the element type's own `Ord`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<T: Ord> Comparator<T> for NaturalOrder {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_order() {
        assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
        assert_eq!(NaturalOrder.compare(&2, &2), Ordering::Equal);
        assert_eq!(NaturalOrder.compare(&3, &2), Ordering::Greater);
    }

    #[test]
    fn closure_comparator() {
        let reversed = |a: &u32, b: &u32| b.cmp(a);
        assert_eq!(reversed.compare(&1, &2), Ordering::Greater);
    }
}

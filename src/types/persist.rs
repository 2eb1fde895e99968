//! Element persistence contract for re-attached segments.

/// Marker for element types whose byte image remains meaningful after a
/// segment is unmapped and re-mapped by another process.
///
/// A resumed engine trusts the bytes it finds in every live slot; `Persist`
/// is the caller's promise that this trust is warranted. The promise has
/// two parts:
///
/// - the type is plain data at rest: `#[repr(C)]` (or a primitive), no
///   references, no pointers into this process, no heap ownership;
/// - any state that *cannot* be trusted across a remap is re-established
///   by [`Persist::resume`], which the engine invokes once per live
///   element while attaching to an existing segment.
///
/// For ordinary plain-data types the default no-op `resume` is correct,
/// and impls are provided for the primitive types, arrays and small
/// tuples of them.
///
/// # Safety
///
/// Implementors must guarantee that any byte pattern the type previously
/// produced in place is a valid value of the type once `resume` has run,
/// and that dropping such a value is sound.
pub unsafe trait Persist: Sized {
    /// Re-establish any state that cannot survive a bare remap.
    ///
    /// Called exactly once per live element when an engine attaches to an
    /// existing segment, before the element becomes reachable through any
    /// lookup or iterator.
    fn resume(&mut self) {}
}

macro_rules! impl_persist {
    ($($t:ty),* $(,)?) => {
        $(
            unsafe impl Persist for $t {}
        )*
    };
}

impl_persist!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
);

unsafe impl<T: Persist, const N: usize> Persist for [T; N] {
    fn resume(&mut self) {
        for item in self.iter_mut() {
            item.resume();
        }
    }
}

unsafe impl<A: Persist, B: Persist> Persist for (A, B) {
    fn resume(&mut self) {
        self.0.resume();
        self.1.resume();
    }
}

unsafe impl<A: Persist, B: Persist, C: Persist> Persist for (A, B, C) {
    fn resume(&mut self) {
        self.0.resume();
        self.1.resume();
        self.2.resume();
    }
}

unsafe impl<A: Persist, B: Persist, C: Persist, D: Persist> Persist for (A, B, C, D) {
    fn resume(&mut self) {
        self.0.resume();
        self.1.resume();
        self.2.resume();
        self.3.resume();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(PartialEq, Eq, Debug)]
    struct Counter {
        value: u32,
        resumed: u32,
    }

    unsafe impl Persist for Counter {
        fn resume(&mut self) {
            self.resumed += 1;
        }
    }

    #[test]
    fn default_resume_is_noop() {
        let mut v = 42u64;
        v.resume();
        assert_eq!(v, 42);
    }

    #[test]
    fn compound_resume_recurses() {
        let mut pair = (
            Counter {
                value: 1,
                resumed: 0,
            },
            Counter {
                value: 2,
                resumed: 0,
            },
        );
        pair.resume();
        assert_eq!(pair.0.resumed, 1);
        assert_eq!(pair.1.resumed, 1);
    }
}

// TODO - maybe use const generics instead when available
/// Defines a bounded newtype over an integer, the way the teacher's `clamp!`
/// macro did — but this compiler is a strict front-end, not a lenient MIDI
/// reader: out-of-range values are a hard error (one of the spec's Kinds),
/// never a silent clamp. So `ranged!` trades `clamp()` for `new(value, line)
/// -> LibResult<Self>`.
///
/// Example: `ranged!(Articulation, u8, 0, 61, BadOp, pub(crate));`
/// Where:
/// - `Articulation` is the name of the struct that will be created.
/// - `u8` is the underlying data type.
/// - `0` / `61` are the inclusive bounds.
/// - `BadOp` is the `LibError` variant raised when the value is out of range.
/// - `pub(crate)` is the visibility of the struct.
macro_rules! ranged {
    ($symbol:ident, $inner_type:ty, $min:expr, $max:expr, $err_kind:ident, $visibility:vis) => {
        #[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Hash)]
        $visibility struct $symbol($inner_type);

        impl $symbol {
            /// Validates `value` against the range, failing with
            /// [`crate::error::LibError::$err_kind`] when it's out of bounds.
            #[allow(dead_code)]
            $visibility fn new(value: $inner_type, line: Option<u32>) -> crate::error::LibResult<Self> {
                #[allow(unused_comparisons)]
                if value < $min || value > $max {
                    crate::error::$err_kind { line }.fail()
                } else {
                    Ok(Self(value))
                }
            }

            /// Builds a value already known (by the caller) to be in range.
            /// Used for values reconstructed from already-validated storage.
            #[allow(dead_code)]
            $visibility fn new_unchecked(value: $inner_type) -> Self {
                debug_assert!(value >= $min && value <= $max);
                Self(value)
            }

            /// Returns the inner value.
            #[allow(dead_code)]
            $visibility fn get(&self) -> $inner_type {
                self.0
            }
        }

        impl std::fmt::Display for $symbol {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn ranged_accepts_in_bounds_and_rejects_out_of_bounds() {
        ranged!(Foo, u8, 1, 16, BadOp, pub(crate));
        assert_eq!(Foo::new(6, None).unwrap().get(), 6);
        assert!(Foo::new(0, Some(3)).is_err());
        let err = Foo::new(200, Some(3)).unwrap_err();
        assert_eq!(err.kind_name(), "BadOp");
    }
}

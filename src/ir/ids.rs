//! Identifier wrappers for registers and subroutines.

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(u32);

        impl $name {
            /// Creates an identifier from a raw value.
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Returns the raw identifier value.
            pub const fn value(self) -> u32 {
                self.0
            }
        }
    };
}

// Registers are numbered per type within one subroutine.
define_id!(RegisterId);
define_id!(SubId);

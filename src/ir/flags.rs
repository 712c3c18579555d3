//! Bit-set flag types for subroutines, targets, and arguments.

macro_rules! define_flags {
    ($(#[$meta:meta])* $name:ident { $($(#[$flag_meta:meta])* $flag:ident = $bit:expr,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(u16);

        impl $name {
            $($(#[$flag_meta])* pub const $flag: Self = Self(1 << $bit);)*

            /// Returns the empty set.
            pub const fn empty() -> Self {
                Self(0)
            }

            /// Returns the raw bits.
            pub const fn bits(self) -> u16 {
                self.0
            }

            /// Returns `true` when no flag is set.
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Returns `true` when every flag in `other` is set.
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Sets every flag in `other`.
            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            /// Clears every flag in `other`.
            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

define_flags!(
    /// Subroutine flags set by `.sub name :flag ...`.
    SubFlags {
        ANON = 0,
        INIT = 1,
        LOAD = 2,
        MAIN = 3,
        METHOD = 4,
        LEX = 5,
        MULTI = 6,
        POSTCOMP = 7,
        IMMEDIATE = 8,
    }
);

define_flags!(
    /// Flags on parameters, result targets, and `.local` declarations.
    TargetFlags {
        OPTIONAL = 0,
        OPT_FLAG = 1,
        SLURPY = 2,
        /// Parsed on arguments; kept here so a target can forward it.
        FLAT = 3,
        NAMED = 4,
        UNIQUE_REG = 5,
        INVOCANT = 6,
    }
);

define_flags!(
    /// Flags on call and return arguments.
    ArgFlags {
        FLAT = 0,
        NAMED = 1,
    }
);

//! Opaque ID newtypes shared by every backend.
//!
//! The code generator never touches backend-native objects. It holds these
//! `Copy` handles and hands them back to the backend that issued them.
//! Each ID is a `u32` index into the issuing backend's arena.

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an ID from a raw index.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// The raw index.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// The index as `usize`, for indexing into `Vec`s.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Handle to an SSA value (constant, parameter or instruction result).
    ValueId
);

define_id!(
    /// Handle to a basic block.
    BlockId
);

define_id!(
    /// Handle to a declared function.
    FunctionId
);

define_id!(
    /// Handle to a debug scope (file, subprogram or lexical block).
    ScopeId
);

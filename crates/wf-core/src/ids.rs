use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier used across the model and the flowsheet graph.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        // index+1 must be nonzero
        Self(NonZeroU32::new(index + 1).expect("index+1 is nonzero"))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Index as `usize`, for slicing into arenas.
    pub fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Typed wrapper over [`Id`] so a variable handle cannot be passed where a
/// constraint handle is expected.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Id);

        impl $name {
            pub fn from_index(index: u32) -> Self {
                Self(Id::from_index(index))
            }

            pub fn index(self) -> u32 {
                self.0.index()
            }

            pub fn slot(self) -> usize {
                self.0.slot()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "({})"), self.index())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.index())
            }
        }
    };
}

define_id!(
    /// Handle to a model variable.
    VarId,
    "VarId"
);
define_id!(
    /// Handle to a model constraint.
    ConId,
    "ConId"
);
define_id!(
    /// Handle to a named model expression.
    ExprId,
    "ExprId"
);
define_id!(
    /// Handle to a unit block in the flowsheet graph.
    BlockId,
    "BlockId"
);
define_id!(PortId, "PortId");
define_id!(ArcId, "ArcId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            let id = Id::from_index(i);
            assert_eq!(id.index(), i);
            assert_eq!(VarId::from_index(i).slot(), i as usize);
        }
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<VarId>(),
            core::mem::size_of::<Option<VarId>>()
        );
    }

    #[test]
    fn typed_ids_debug_with_tag() {
        assert_eq!(format!("{:?}", BlockId::from_index(3)), "BlockId(3)");
        assert_eq!(format!("{}", ArcId::from_index(7)), "7");
    }
}

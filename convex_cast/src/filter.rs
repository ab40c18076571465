use num_traits::{One, PrimInt};
use rapier3d::prelude::{Group, InteractionGroups};

/// Trait implemented by collision-layer flag enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
/// You choose the backing integer type via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A plain bitmask container used for collision masks and groups.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn from_flags<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
        let mut flags = Self::new(T::zero());
        flags.add_many(tags);
        flags
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    pub fn has_any<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return false;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) != T::zero()
    }

    /// True if the two bitmasks share at least one bit.
    pub fn intersects(&self, other: &Self) -> bool {
        (self.bits & other.bits) != T::zero()
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// Example:
/// ```rust
/// convex_cast::define_bitmask_flags!(TriggerLayer, u32, {
///     Water,
///     Lava,
///     Checkpoint,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::filter::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

define_bitmask_flags!(CollisionLayer, u32, {
    Default,
    Static,
    Dynamic,
    Projectile,
});

/// Collision filter carried by a cast: which layers the swept shape belongs to
/// (`group`) and which layers it may hit (`mask`).
///
/// A collider with memberships `m` and filter `f` is considered only when
/// `m & mask != 0` and `group & f != 0`. Bits are passed through unchanged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CastFilter {
    pub mask: BitmaskFlags<u32>,
    pub group: BitmaskFlags<u32>,
}

impl CastFilter {
    /// Hit every layer, cast from the `Default` layer.
    pub const ALL: Self = Self {
        mask: BitmaskFlags { bits: u32::MAX },
        group: BitmaskFlags { bits: 1 },
    };

    pub fn new(mask: u32, group: u32) -> Self {
        Self {
            mask: BitmaskFlags::new(mask),
            group: BitmaskFlags::new(group),
        }
    }

    pub fn with_layers(mask: &[CollisionLayer], group: &[CollisionLayer]) -> Self {
        Self {
            mask: BitmaskFlags::from_flags(mask),
            group: BitmaskFlags::from_flags(group),
        }
    }

    /// Does a collider with the given memberships/filter pass this cast filter?
    pub fn accepts(&self, memberships: u32, filter: u32) -> bool {
        self.mask.intersects(&BitmaskFlags::new(memberships))
            && self.group.intersects(&BitmaskFlags::new(filter))
    }

    /// Rapier interaction groups for the swept shape: memberships = `group`,
    /// filter = `mask`.
    pub fn interaction_groups(&self) -> InteractionGroups {
        InteractionGroups::all()
            .with_memberships(Group::from_bits_truncate(self.group.bits))
            .with_filter(Group::from_bits_truncate(self.mask.bits))
    }
}

impl Default for CastFilter {
    fn default() -> Self {
        Self::ALL
    }
}

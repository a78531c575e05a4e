use num_traits::{One, PrimInt};
use serde::{Deserialize, Serialize};

/// Trait implemented by flag enums declared with [`define_bitmask_flags!`].
///
/// The enum's discriminant (via `#[repr(u8)]`) is the bit index inside `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must stay below the bit width of `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// Compact set of boolean state bits (actor movement flags, shadow render flags,
/// archetype capabilities).
///
/// Serializes as the bare integer so persisted snapshots stay small.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn of<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
        let bits = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        Self { bits }
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    /// Adds or removes `tag` depending on `enabled`.
    pub fn set<U: FlagBitmask<Storage = T>>(&mut self, tag: U, enabled: bool) {
        if enabled {
            self.add(tag);
        } else {
            self.remove(tag);
        }
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn clear(&mut self) {
        self.bits = T::zero();
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// Example:
/// ```text
/// define_bitmask_flags!(ShadowFlag, u32, {
///     Invulnerable,
///     NoGravity,
///     Attacking,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($(#[$meta:meta])* $name:ident, $storage:ty, { $($(#[$vmeta:meta])* $variant:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    define_bitmask_flags!(TestFlag, u16, { Alpha, Beta, Gamma });

    #[test]
    fn set_toggles_a_single_bit() {
        let mut flags = BitmaskFlags::<u16>::default();
        flags.set(TestFlag::Beta, true);
        assert!(flags.has(TestFlag::Beta));
        assert!(!flags.has(TestFlag::Alpha));
        assert_eq!(flags.bits, 0b010);

        flags.set(TestFlag::Beta, false);
        assert_eq!(flags.bits, 0);
    }

    #[test]
    fn of_combines_masks() {
        let flags = BitmaskFlags::of(&[TestFlag::Alpha, TestFlag::Gamma]);
        assert_eq!(flags.bits, 0b101);
        assert!(flags.has(TestFlag::Gamma));
    }

    #[test]
    fn serializes_as_plain_integer() {
        let flags = BitmaskFlags::of(&[TestFlag::Alpha, TestFlag::Beta]);
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, "3");
        let back: BitmaskFlags<u16> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }
}

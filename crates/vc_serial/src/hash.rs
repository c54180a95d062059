//! Hash containers used by the registry tables.
//!
//! Every table hashes with `foldhash` under one fixed seed, so iteration
//! order and lookups are the same in every run and `TypeRegistry::empty`
//! can stay `const`.

use core::any::TypeId;
use core::hash::BuildHasher;

use foldhash::fast::{FixedState, FoldHasher};

const REGISTRY_STATE: FixedState = FixedState::with_seed(0x5EED_0FC0_DEC7_AB1E);

/// Seeded `foldhash` state shared by every registry table.
#[derive(Copy, Clone, Default, Debug)]
pub(crate) struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FoldHasher<'static>;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        REGISTRY_STATE.build_hasher()
    }
}

pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;
pub(crate) type HashSet<K> = hashbrown::HashSet<K, FixedHashState>;

/// The codec table, keyed by [`TypeId`].
pub(crate) type TypeIdMap<V> = HashMap<TypeId, V>;

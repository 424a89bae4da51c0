//! Collection types and entity id aliases used throughout the crate.
//!
//! Topology construction spends most of its time deduplicating canonical
//! node-index tuples, so the maps here use a fast non-cryptographic hasher.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Index of a node into the mesh coordinate sequence.
pub type NodeId = usize;

/// Index of a cell (tetrahedron) into the mesh connectivity sequence.
pub type CellId = usize;

/// Dense id of a unique face, assigned in first-occurrence order.
pub type FaceId = usize;

/// Dense id of a unique edge, assigned in first-occurrence order.
pub type EdgeId = usize;

/// Canonical face key: the three node ids of a triangle in ascending order.
///
/// Two faces are the same face iff their keys are equal, which is what makes
/// the key usable for deduplication.
pub type FaceKey = [NodeId; 3];

/// Canonical edge key: the two node ids of an edge in ascending order.
pub type EdgeKey = [NodeId; 2];

/// Local index of a face within a cell (0..4) or an edge within a face (0..3).
///
/// A tetrahedron has 4 faces and a triangle 3 edges, so a `u8` is plenty and
/// keeps `(CellId, LocalIndex)` pairs compact in adjacency tables.
pub type LocalIndex = u8;

/// Hash map with the `rustc_hash::FxHasher` for internal, trusted keys.
///
/// Roughly 2-3x faster than `std::collections::HashMap` on the small
/// integer-tuple keys used for sub-simplex deduplication. Not DoS-resistant;
/// never expose it to attacker-controlled keys.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Hash set counterpart of [`FastHashMap`].
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-size-optimized vector that stays on the stack for up to `N` elements.
///
/// The main use is the face-to-cells adjacency, where a face is incident to
/// one or two cells and a heap allocation per face would dominate.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Creates a [`FastHashMap`] with at least the given capacity.
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, rustc_hash::FxBuildHasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_collections_basic_operations() {
        let mut map: FastHashMap<FaceKey, FaceId> = FastHashMap::default();
        map.insert([0, 1, 2], 0);
        map.insert([1, 2, 3], 1);
        assert_eq!(map.get(&[0, 1, 2]), Some(&0));
        assert_eq!(map.len(), 2);

        let mut set: FastHashSet<NodeId> = FastHashSet::default();
        set.insert(7);
        assert!(set.contains(&7));
        assert!(!set.contains(&8));
    }

    #[test]
    fn small_buffer_stays_inline_for_face_adjacency() {
        let mut buffer: SmallBuffer<(CellId, LocalIndex), 2> = SmallBuffer::new();
        buffer.push((0, 3));
        buffer.push((1, 0));
        assert_eq!(buffer.len(), 2);
        assert!(!buffer.spilled());
    }

    #[test]
    fn capacity_helper_reserves() {
        let map = fast_hash_map_with_capacity::<EdgeKey, EdgeId>(100);
        assert!(map.capacity() >= 100);
    }
}

//! Mesh data and the shared, content-addressed mesh cache
//!
//! Instances at positions that hash to the same baked alternate share a
//! single mesh. The cache is keyed by `(crop block, dead, variant index)`,
//! where a variant index of [`UNKNOWN_VARIANT`] means the alternate count was
//! not known yet when the mesh was first requested. Dead and live plants of
//! the same crop block resolve different shapes, so they never share a key.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::core::BlockPos;
use crate::math::hash::hash3_mod;
use crate::world::BlockId;

/// Variant index used before the alternate count is known
pub const UNKNOWN_VARIANT: i32 = -1;

/// Vertical offset applied to every generated crop mesh (one voxel sixteenth)
pub const CROP_MESH_OFFSET: Vec3 = Vec3::new(0.0, -1.0 / 16.0, 0.0);

/// Triangle mesh in block-local space
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset;
        }
    }

    pub fn translated(mut self, offset: Vec3) -> Self {
        self.translate(offset);
        self
    }
}

/// Shared, immutable mesh
pub type MeshHandle = Arc<Mesh>;

/// Cache key for a placed crop mesh
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshKey {
    pub block: BlockId,
    /// Whether the mesh was built from the dead variant
    pub dead: bool,
    pub variant: i32,
}

impl MeshKey {
    pub fn new(block: BlockId, dead: bool, variant: i32) -> Self {
        Self { block, dead, variant }
    }

    /// Key for `pos` given a known alternate count (or none)
    pub fn for_position(block: BlockId, dead: bool, pos: BlockPos, alternates: Option<usize>) -> Self {
        match alternates {
            Some(count) if count > 0 => Self::new(block, dead, select_variant(pos, count) as i32),
            _ => Self::new(block, dead, UNKNOWN_VARIANT),
        }
    }
}

/// Baked alternate index for a position
pub fn select_variant(pos: BlockPos, alternates: usize) -> usize {
    hash3_mod(pos.x, pos.y, pos.z, alternates)
}

/// Host-owned cache of placed crop meshes.
pub trait MeshCache {
    fn get(&mut self, key: &MeshKey) -> Option<MeshHandle>;

    /// Store a mesh, returning the shared handle
    fn insert(&mut self, key: MeshKey, mesh: Mesh) -> MeshHandle;

    /// Drop every entry, returning how many were released
    fn clear(&mut self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up `key`, building and storing the mesh on a miss
    fn get_or_build(
        &mut self,
        key: MeshKey,
        build: &mut dyn FnMut() -> Option<Mesh>,
    ) -> Option<MeshHandle> {
        if let Some(mesh) = self.get(&key) {
            return Some(mesh);
        }
        let mesh = build()?;
        Some(self.insert(key, mesh))
    }
}

/// Mesh map with optional least-recently-used eviction.
///
/// Unbounded by default. With a capacity limit the oldest unused entry is
/// released when the cache is full; handles already given out stay valid.
#[derive(Debug)]
pub struct SharedMeshCache<K = MeshKey> {
    meshes: HashMap<K, MeshHandle>,
    /// Oldest first, newest last
    access_order: Vec<K>,
    max_entries: Option<usize>,
}

impl<K> Default for SharedMeshCache<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self {
            meshes: HashMap::new(),
            access_order: Vec::new(),
            max_entries: None,
        }
    }
}

impl<K> SharedMeshCache<K>
where
    K: Clone + Eq + Hash,
{
    /// Create an unbounded cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that evicts the least recently used entry once full
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of meshes held (at least 1)
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            meshes: HashMap::with_capacity(max_entries),
            access_order: Vec::with_capacity(max_entries),
            max_entries: Some(max_entries.max(1)),
        }
    }

    /// Get a mesh from the cache, marking it as recently used
    ///
    /// # Arguments
    /// * `key` - Cache key of the mesh
    ///
    /// # Returns
    /// A shared handle if the mesh is cached, None otherwise
    pub fn get(&mut self, key: &K) -> Option<MeshHandle> {
        let mesh = self.meshes.get(key).cloned()?;
        self.touch(key);
        Some(mesh)
    }

    /// Check if a mesh is cached without updating the access order
    pub fn contains(&self, key: &K) -> bool {
        self.meshes.contains_key(key)
    }

    /// Insert a mesh into the cache
    ///
    /// If the key is already present the entry is replaced. Otherwise, when
    /// the cache is full, least recently used entries are evicted first.
    ///
    /// # Arguments
    /// * `key` - Cache key of the mesh
    /// * `mesh` - Mesh to store
    ///
    /// # Returns
    /// The shared handle now stored under `key`
    pub fn insert(&mut self, key: K, mesh: Mesh) -> MeshHandle {
        let handle = Arc::new(mesh);
        if self.meshes.contains_key(&key) {
            self.remove_from_access_order(&key);
        } else if let Some(max) = self.max_entries {
            while self.meshes.len() >= max {
                if self.evict_oldest().is_none() {
                    break;
                }
            }
        }
        self.meshes.insert(key.clone(), Arc::clone(&handle));
        self.access_order.push(key);
        handle
    }

    /// Look up `key`, building and storing the mesh on a miss
    ///
    /// # Arguments
    /// * `key` - Cache key of the mesh
    /// * `build` - Called only on a miss; `None` means the mesh cannot be built
    ///
    /// # Returns
    /// The cached or freshly built handle, or None if the build failed
    pub fn get_or_build(&mut self, key: K, build: impl FnOnce() -> Option<Mesh>) -> Option<MeshHandle> {
        if let Some(mesh) = self.get(&key) {
            return Some(mesh);
        }
        let mesh = build()?;
        Some(self.insert(key, mesh))
    }

    /// Remove a mesh from the cache
    ///
    /// # Arguments
    /// * `key` - Cache key of the mesh
    ///
    /// # Returns
    /// The removed handle if it was cached. Clones held elsewhere stay valid.
    pub fn remove(&mut self, key: &K) -> Option<MeshHandle> {
        self.remove_from_access_order(key);
        self.meshes.remove(key)
    }

    /// Evict the least recently used entry
    ///
    /// # Returns
    /// The evicted handle, or None if the cache was empty
    pub fn evict_oldest(&mut self) -> Option<MeshHandle> {
        let key = self.access_order.first().cloned()?;
        self.remove(&key)
    }

    /// Drop every entry
    ///
    /// # Returns
    /// Number of meshes released
    pub fn clear(&mut self) -> usize {
        let released = self.meshes.len();
        self.meshes.clear();
        self.access_order.clear();
        released
    }

    /// Number of cached meshes
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    fn touch(&mut self, key: &K) {
        self.remove_from_access_order(key);
        self.access_order.push(key.clone());
    }

    fn remove_from_access_order(&mut self, key: &K) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
    }
}

impl MeshCache for SharedMeshCache<MeshKey> {
    fn get(&mut self, key: &MeshKey) -> Option<MeshHandle> {
        SharedMeshCache::get(self, key)
    }

    fn insert(&mut self, key: MeshKey, mesh: Mesh) -> MeshHandle {
        SharedMeshCache::insert(self, key, mesh)
    }

    fn clear(&mut self) -> usize {
        SharedMeshCache::clear(self)
    }

    fn len(&self) -> usize {
        SharedMeshCache::len(self)
    }
}

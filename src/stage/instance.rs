//! Per-position state of a staged crop prop
//!
//! A `PlantInstance` owns its persisted state (type, stage, dead) and the
//! derived data built from it: the resolved variant config, the learned
//! alternate count and the current mesh handle. Collaborators are passed in
//! per call through [`StageEnv`] and [`MeshEnv`]; nothing is held globally.
//!
//! Ticking only updates state and invalidates the mesh. The mesh is rebuilt
//! lazily the next time it is requested.

use crate::climate::{CalendarClock, ClimateSampler};
use crate::core::{BlockPos, Error, Result};
use crate::math::hash::hash3_mod;
use crate::world::{AttributeTree, AttributeValue, BlockDef, BlockId, BlockRegistry, RotationAxes};

use super::config::{VariantConfig, VariantTable};
use super::mesh::{Mesh, MeshCache, MeshHandle, MeshKey, CROP_MESH_OFFSET, select_variant};
use super::schedule::{evaluate_vitality, target_stage};
use super::texture::{InstanceTextures, TextureAtlas, Tesselator};

/// Persisted attribute keys
pub const ATTR_CODE: &str = "code";
pub const ATTR_STAGE: &str = "stage";
pub const ATTR_DEAD: &str = "dead";

/// Code of the crop block whose shape a plant at `stage` borrows
pub fn crop_block_code(plant_type: &str, stage: u32) -> String {
    format!("crop-{}-{}", plant_type, stage)
}

/// Persisted state of one instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlantInstanceState {
    pub plant_type: Option<String>,
    pub stage: u32,
    pub dead: bool,
}

impl Default for PlantInstanceState {
    fn default() -> Self {
        Self {
            plant_type: None,
            stage: 1,
            dead: false,
        }
    }
}

impl PlantInstanceState {
    pub fn new(plant_type: impl Into<String>) -> Self {
        Self {
            plant_type: Some(plant_type.into()),
            ..Self::default()
        }
    }

    /// Write `code`, `stage` and `dead`. A missing type removes `code`.
    pub fn write_attributes(&self, tree: &mut AttributeTree) {
        match &self.plant_type {
            Some(t) => tree.set_string(ATTR_CODE, t.clone()),
            None => {
                tree.remove(ATTR_CODE);
            }
        }
        tree.set_int(ATTR_STAGE, self.stage.min(i32::MAX as u32) as i32);
        tree.set_bool(ATTR_DEAD, self.dead);
    }

    /// Read state back. Missing keys take their defaults; stage is floored
    /// at 1.
    pub fn read_attributes(tree: &AttributeTree) -> Self {
        Self {
            plant_type: tree.get_string(ATTR_CODE).map(str::to_string),
            stage: tree.get_int_or(ATTR_STAGE, 1).max(1) as u32,
            dead: tree.get_bool_or(ATTR_DEAD, false),
        }
    }

    /// Like [`Self::read_attributes`], but a present key holding the wrong
    /// value type is an error.
    pub fn try_read_attributes(tree: &AttributeTree) -> Result<Self> {
        let checks = [
            (ATTR_CODE, tree.get(ATTR_CODE).is_none_or(|v| matches!(v, AttributeValue::String(_)))),
            (ATTR_STAGE, tree.get(ATTR_STAGE).is_none_or(|v| matches!(v, AttributeValue::Int(_)))),
            (ATTR_DEAD, tree.get(ATTR_DEAD).is_none_or(|v| matches!(v, AttributeValue::Bool(_)))),
        ];
        if let Some((key, _)) = checks.iter().find(|(_, ok)| !ok) {
            return Err(Error::Attribute(format!("'{}' holds the wrong value type", key)));
        }
        Ok(Self::read_attributes(tree))
    }

    /// Identity of the variant the derived data was built for
    fn variant_identity(&self) -> Option<(String, u32, bool)> {
        self.plant_type.clone().map(|t| (t, self.stage, self.dead))
    }
}

/// Alternate count learned while building a mesh, valid for one
/// (type, stage, dead) identity.
#[derive(Clone, Debug, Default, PartialEq)]
struct DerivedVariant {
    identity: Option<(String, u32, bool)>,
    alternates: Option<usize>,
}

impl DerivedVariant {
    fn sync(&mut self, identity: Option<(String, u32, bool)>) {
        if self.identity != identity {
            self.identity = identity;
            self.alternates = None;
        }
    }
}

/// What a tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No plant type set
    Inert,
    /// No variant config could be resolved; state untouched
    Unresolved,
    /// Climate had no reading for this position
    NoObservation,
    /// Stage and liveness unchanged
    Unchanged,
    Transitioned {
        from: u32,
        to: u32,
        died: bool,
        revived: bool,
    },
}

impl TickOutcome {
    pub fn is_transition(&self) -> bool {
        matches!(self, Self::Transitioned { .. })
    }
}

/// Calendar, climate and variant table for a tick
#[derive(Clone, Copy)]
pub struct StageEnv<'a> {
    pub calendar: &'a dyn CalendarClock,
    pub climate: &'a dyn ClimateSampler,
    pub variants: &'a VariantTable,
}

/// Services needed to produce a mesh
pub struct MeshEnv<'a> {
    pub blocks: &'a BlockRegistry,
    pub tesselator: &'a mut dyn Tesselator,
    pub atlas: &'a mut dyn TextureAtlas,
    pub cache: &'a mut dyn MeshCache,
}

/// A placed crop prop.
#[derive(Clone, Debug)]
pub struct PlantInstance {
    pos: BlockPos,
    state: PlantInstanceState,
    config: Option<VariantConfig>,
    derived: DerivedVariant,
    mesh: Option<MeshHandle>,
    mesh_stale: bool,
    dirty: bool,
}

impl PlantInstance {
    /// Uninitialized instance with no type
    pub fn new(pos: BlockPos) -> Self {
        Self::with_state(pos, PlantInstanceState::default())
    }

    /// Instance with the given state. Stage is floored at 1, matching what
    /// a persisted state reads back as.
    pub fn with_state(pos: BlockPos, mut state: PlantInstanceState) -> Self {
        state.stage = state.stage.max(1);
        Self {
            pos,
            state,
            config: None,
            derived: DerivedVariant::default(),
            mesh: None,
            mesh_stale: true,
            dirty: false,
        }
    }

    /// Instance restored from persisted attributes
    pub fn from_attributes(pos: BlockPos, tree: &AttributeTree) -> Self {
        Self::with_state(pos, PlantInstanceState::read_attributes(tree))
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn state(&self) -> &PlantInstanceState {
        &self.state
    }

    pub fn plant_type(&self) -> Option<&str> {
        self.state.plant_type.as_deref()
    }

    pub fn stage(&self) -> u32 {
        self.state.stage
    }

    pub fn is_dead(&self) -> bool {
        self.state.dead
    }

    /// Resolved variant config, if any
    pub fn config(&self) -> Option<&VariantConfig> {
        self.config.as_ref()
    }

    /// Alternate count learned from the last mesh build
    pub fn known_alternates(&self) -> Option<usize> {
        self.derived.alternates
    }

    pub fn current_mesh(&self) -> Option<&MeshHandle> {
        self.mesh.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return and clear the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Bring a loaded instance up to date: resolve its config and tick once.
    pub fn initialize(&mut self, env: &StageEnv) -> TickOutcome {
        if self.state.plant_type.is_none() {
            return TickOutcome::Inert;
        }
        self.load_config(env.variants);
        self.invalidate_mesh();
        self.tick(env)
    }

    /// Called when the plant is first placed. `requested_type` comes from
    /// the placing item; `None` keeps the current type.
    pub fn on_placed(&mut self, requested_type: Option<&str>, env: &StageEnv) -> TickOutcome {
        if let Some(t) = requested_type {
            self.state.plant_type = Some(t.to_string());
        }
        self.load_config(env.variants);
        self.invalidate_mesh();
        self.dirty = self.dirty || self.state.plant_type.is_some();
        self.tick(env)
    }

    /// Change the plant type, reloading config and mesh
    pub fn set_plant_type(&mut self, plant_type: Option<&str>, variants: &VariantTable) -> bool {
        let plant_type = plant_type.map(str::to_string);
        if plant_type == self.state.plant_type {
            return false;
        }
        self.state.plant_type = plant_type;
        self.config = None;
        self.load_config(variants);
        self.invalidate_mesh();
        self.dirty = true;
        true
    }

    /// Resolve the config for the current state. On failure the previous
    /// config is kept.
    pub fn load_config(&mut self, variants: &VariantTable) -> bool {
        let Some(plant_type) = self.state.plant_type.as_deref() else {
            return false;
        };
        match variants.resolve(plant_type, self.state.dead, self.state.stage) {
            Ok(config) => {
                self.config = Some(config);
                self.derived.sync(self.state.variant_identity());
                true
            }
            Err(e) => {
                log::warn!("Plant at {:?}: {}", self.pos, e);
                false
            }
        }
    }

    /// Advance stage and liveness from the calendar and climate.
    pub fn tick(&mut self, env: &StageEnv) -> TickOutcome {
        let Some(plant_type) = self.state.plant_type.clone() else {
            return TickOutcome::Inert;
        };
        if self.config.is_none() {
            if !self.load_config(env.variants) {
                return TickOutcome::Unresolved;
            }
            self.invalidate_mesh();
        }
        let Some(config) = self.config.as_ref() else {
            return TickOutcome::Unresolved;
        };

        let next = target_stage(env.calendar.year_rel(), config);
        let Some(temperature) = env.climate.temperature_at(self.pos, env.calendar.total_days()) else {
            return TickOutcome::NoObservation;
        };
        let change = evaluate_vitality(self.state.dead, temperature);
        if next == self.state.stage && !change.any() {
            return TickOutcome::Unchanged;
        }

        let dead = change.apply(self.state.dead);
        let config = match env.variants.resolve(&plant_type, dead, next) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Plant at {:?} cannot transition: {}", self.pos, e);
                return TickOutcome::Unresolved;
            }
        };

        let from = self.state.stage;
        self.state.stage = next;
        self.state.dead = dead;
        self.config = Some(config);
        self.derived.sync(self.state.variant_identity());
        self.invalidate_mesh();
        self.dirty = true;

        log::debug!(
            "Plant {} at {:?}: stage {} -> {} (t={:.1}, dead={})",
            plant_type, self.pos, from, next, temperature, dead
        );
        TickOutcome::Transitioned {
            from,
            to: next,
            died: change.died,
            revived: change.revived,
        }
    }

    pub fn to_attributes(&self, tree: &mut AttributeTree) {
        self.state.write_attributes(tree);
    }

    /// Apply persisted state, reloading config and mesh when the variant
    /// identity changed.
    pub fn apply_attributes(&mut self, tree: &AttributeTree, variants: &VariantTable) -> bool {
        let incoming = PlantInstanceState::read_attributes(tree);
        if incoming == self.state {
            return false;
        }
        self.state = incoming;
        self.load_config(variants);
        self.invalidate_mesh();
        true
    }

    /// Mark the mesh for rebuild. The old handle stays available until a
    /// new mesh is built.
    pub fn invalidate_mesh(&mut self) {
        self.mesh_stale = true;
    }

    /// Cache key the current mesh is stored under
    pub fn mesh_key(&self, blocks: &BlockRegistry) -> Option<MeshKey> {
        let block = self.crop_block(blocks)?;
        Some(self.key_for(block))
    }

    /// Current mesh, rebuilding it if stale. Returns the last good mesh
    /// when a rebuild fails.
    pub fn mesh(&mut self, env: &mut MeshEnv) -> Option<MeshHandle> {
        if self.mesh_stale || self.mesh.is_none() {
            match self.load_mesh(env) {
                Some(mesh) => {
                    self.mesh = Some(mesh);
                    self.mesh_stale = false;
                }
                None => log::warn!("Plant at {:?}: no mesh for {:?}", self.pos, self.state),
            }
        }
        self.mesh.clone()
    }

    /// Localized name key of the placed block
    pub fn placed_name_key(&self) -> Option<String> {
        let plant_type = self.state.plant_type.as_deref()?;
        Some(format!("block-{}", crop_block_code(plant_type, self.state.stage)))
    }

    /// Rotation index among `count` orientations, or `None` when the crop
    /// block does not randomize rotations.
    pub fn rotation_index(&self, blocks: &BlockRegistry, count: usize) -> Option<usize> {
        let def = blocks.get(self.crop_block(blocks)?)?;
        let allowed = self.config.as_ref().is_none_or(|c| c.randomize_rotations);
        if !def.randomize_rotations || !allowed {
            return None;
        }
        let y = match def.random_rotation_axes {
            RotationAxes::Xyz => self.pos.y,
            RotationAxes::Y => 0,
        };
        Some(hash3_mod(-self.pos.x, y, self.pos.z, count))
    }

    fn crop_block(&self, blocks: &BlockRegistry) -> Option<BlockId> {
        let plant_type = self.state.plant_type.as_deref()?;
        blocks.id(&crop_block_code(plant_type, self.state.stage))
    }

    fn key_for(&self, block: BlockId) -> MeshKey {
        MeshKey::for_position(block, self.state.dead, self.pos, self.derived.alternates)
    }

    fn load_mesh(&mut self, env: &mut MeshEnv) -> Option<MeshHandle> {
        let blocks = env.blocks;
        let block = self.crop_block(blocks)?;
        let def = blocks.get(block)?;

        if let Some(mesh) = env.cache.get(&self.key_for(block)) {
            return Some(mesh);
        }

        // building may learn the alternate count, which changes the key
        let mesh = self.generate_mesh(block, def, &mut *env.tesselator, &mut *env.atlas)?;
        let key = self.key_for(block);
        log::trace!("Cached plant mesh {:?}", key);
        Some(env.cache.insert(key, mesh))
    }

    fn generate_mesh(
        &mut self,
        block: BlockId,
        def: &BlockDef,
        tesselator: &mut dyn Tesselator,
        atlas: &mut dyn TextureAtlas,
    ) -> Option<Mesh> {
        let config = self.config.as_ref()?;
        let shape = match (&config.shape, &def.shape) {
            (Some(shape), _) => shape.clone(),
            (None, Some(shape)) if shape.has_alternates() => shape.clone(),
            (None, _) => {
                let mesh = tesselator.default_block_mesh(block)?;
                return Some(mesh.translated(CROP_MESH_OFFSET));
            }
        };

        let shape = match shape.baked_alternates() {
            Some(baked) => {
                let index = select_variant(self.pos, baked.len());
                self.derived.alternates = Some(baked.len());
                baked.into_iter().nth(index)?
            }
            None => shape,
        };

        let shape_textures = tesselator.shape_textures(&shape).unwrap_or_default();
        let mut textures = InstanceTextures::new(atlas, config.textures.as_ref(), &shape_textures);
        let mesh = tesselator.tesselate(&shape, &mut textures)?;
        Some(mesh.translated(CROP_MESH_OFFSET))
    }
}

/// Restore an instance and run its load-time initialization
pub fn load_instance(pos: BlockPos, tree: &AttributeTree, env: &StageEnv) -> (PlantInstance, TickOutcome) {
    let mut instance = PlantInstance::from_attributes(pos, tree);
    let outcome = instance.initialize(env);
    (instance, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use crate::climate::GameCalendar;
    use crate::stage::mesh::{SharedMeshCache, UNKNOWN_VARIANT};
    use crate::stage::texture::{AtlasPosition, TextureSource};
    use crate::world::{BlockDef, CompositeShape};
    use glam::Vec3;

    /// Emits one triangle per tesselation and counts calls
    #[derive(Default)]
    struct CountingTesselator {
        tesselations: usize,
        shapes: Vec<String>,
        resolved: Vec<bool>,
    }

    impl Tesselator for CountingTesselator {
        fn default_block_mesh(&mut self, _block: BlockId) -> Option<Mesh> {
            self.tesselations += 1;
            Some(Mesh { positions: vec![Vec3::ZERO], ..Default::default() })
        }

        fn shape_textures(&mut self, _shape: &CompositeShape) -> Option<BTreeMap<String, String>> {
            Some([("stem".to_string(), "crop/generic/stem".to_string())].into_iter().collect())
        }

        fn tesselate(&mut self, shape: &CompositeShape, textures: &mut dyn TextureSource) -> Option<Mesh> {
            self.tesselations += 1;
            self.shapes.push(shape.base.clone());
            self.resolved.push(textures.resolve("stem").is_some());
            Some(Mesh {
                positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
                indices: vec![0, 1, 2],
                ..Default::default()
            })
        }
    }

    struct FixedAtlas;

    impl TextureAtlas for FixedAtlas {
        fn size(&self) -> (u32, u32) {
            (64, 64)
        }

        fn get_or_insert(&mut self, _path: &str) -> Option<AtlasPosition> {
            Some(AtlasPosition::default())
        }
    }

    fn blocks() -> BlockRegistry {
        let mut r = BlockRegistry::new();
        for stage in 1..=4 {
            let shape = CompositeShape::new(format!("crop/flax/{}", stage))
                .with_alternates([format!("crop/flax/{}-b", stage), format!("crop/flax/{}-c", stage)]);
            r.register(
                BlockDef::new(crop_block_code("flax", stage))
                    .with_shape(shape)
                    .with_random_rotations(RotationAxes::Y),
            )
            .unwrap();
        }
        r.register(BlockDef::new(crop_block_code("rye", 1))).unwrap();
        r
    }

    fn variants() -> VariantTable {
        let mut t = VariantTable::new();
        t.insert("flax", VariantConfig::new(1.0, 7.0, 4)).unwrap();
        t.insert("rye", VariantConfig::new(1.0, 7.0, 1)).unwrap();
        t.insert(
            "dead",
            VariantConfig::new(1.0, 13.0, 1)
                .with_shape(CompositeShape::new("crop/dead/{type}"))
                .with_texture("stem", "crop/dead/{type}-stem"),
        )
        .unwrap();
        t
    }

    /// Calendar at a year fraction with constant temperature
    fn env_at<'a>(
        calendar: &'a GameCalendar,
        climate: &'a dyn ClimateSampler,
        table: &'a VariantTable,
    ) -> StageEnv<'a> {
        StageEnv { calendar, climate, variants: table }
    }

    fn warm(_: BlockPos, _: f64) -> Option<f32> {
        Some(20.0)
    }

    fn freezing(_: BlockPos, _: f64) -> Option<f32> {
        Some(-10.0)
    }

    fn mild(_: BlockPos, _: f64) -> Option<f32> {
        Some(5.0)
    }

    fn no_reading(_: BlockPos, _: f64) -> Option<f32> {
        None
    }

    #[test]
    fn test_attribute_roundtrip() {
        let mut tree = AttributeTree::new();
        let state = PlantInstanceState { plant_type: Some("flax".into()), stage: 3, dead: true };
        state.write_attributes(&mut tree);
        assert_eq!(tree.get_string("code"), Some("flax"));
        assert_eq!(tree.get_int("stage"), Some(3));
        assert_eq!(tree.get_bool("dead"), Some(true));
        assert_eq!(PlantInstanceState::read_attributes(&tree), state);
    }

    #[test]
    fn test_attribute_defaults() {
        let s = PlantInstanceState::read_attributes(&AttributeTree::new());
        assert_eq!(s, PlantInstanceState::default());

        let mut tree = AttributeTree::new();
        tree.set_int("stage", -4);
        assert_eq!(PlantInstanceState::read_attributes(&tree).stage, 1);

        // untyped instance drops a stale code
        tree.set_string("code", "flax");
        PlantInstanceState::default().write_attributes(&mut tree);
        assert!(!tree.contains("code"));
    }

    #[test]
    fn test_strict_attribute_read() {
        let mut tree = AttributeTree::new();
        assert!(PlantInstanceState::try_read_attributes(&tree).is_ok());
        tree.set_string("stage", "three");
        assert!(matches!(PlantInstanceState::try_read_attributes(&tree), Err(Error::Attribute(_))));
        // the lenient reader falls back to the default
        assert_eq!(PlantInstanceState::read_attributes(&tree).stage, 1);
    }

    #[test]
    fn test_tick_advances_stage() {
        let table = variants();
        let cal = GameCalendar::at_year_rel(4.0 / 12.0, 9);
        let env = env_at(&cal, &warm, &table);
        let mut p = PlantInstance::with_state(BlockPos::new(3, 70, 3), PlantInstanceState::new("flax"));
        assert!(p.load_config(&table));

        let out = p.tick(&env);
        assert_eq!(out, TickOutcome::Transitioned { from: 1, to: 2, died: false, revived: false });
        assert_eq!(p.stage(), 2);
        assert!(p.take_dirty());
        assert!(!p.is_dirty());

        assert_eq!(p.tick(&env), TickOutcome::Unchanged);
        assert!(!p.is_dirty());
    }

    #[test]
    fn test_death_and_revival() {
        let table = variants();
        let cal = GameCalendar::at_year_rel(0.0, 9);
        let mut p = PlantInstance::with_state(BlockPos::ZERO, PlantInstanceState::new("flax"));
        p.load_config(&table);

        let out = p.tick(&env_at(&cal, &freezing, &table));
        assert_eq!(out, TickOutcome::Transitioned { from: 1, to: 1, died: true, revived: false });
        assert!(p.is_dead());
        assert_eq!(p.config().unwrap().shape.as_ref().unwrap().base, "crop/dead/flax");

        // inside the band nothing changes
        assert_eq!(p.tick(&env_at(&cal, &mild, &table)), TickOutcome::Unchanged);
        assert!(p.is_dead());

        let out = p.tick(&env_at(&cal, &warm, &table));
        assert!(matches!(out, TickOutcome::Transitioned { revived: true, .. }));
        assert!(!p.is_dead());
        assert!(p.config().unwrap().shape.is_none());
    }

    #[test]
    fn test_tick_without_type_or_reading() {
        let table = variants();
        let cal = GameCalendar::at_year_rel(0.5, 9);
        let mut untyped = PlantInstance::new(BlockPos::ZERO);
        assert_eq!(untyped.tick(&env_at(&cal, &warm, &table)), TickOutcome::Inert);

        let mut p = PlantInstance::with_state(BlockPos::ZERO, PlantInstanceState::new("flax"));
        p.load_config(&table);
        assert_eq!(p.tick(&env_at(&cal, &no_reading, &table)), TickOutcome::NoObservation);
        assert_eq!(p.stage(), 1);
        assert!(!p.is_dirty());
    }

    #[test]
    fn test_missing_dead_variant_keeps_state() {
        let mut table = VariantTable::new();
        table.insert("flax", VariantConfig::new(1.0, 7.0, 4)).unwrap();
        let cal = GameCalendar::at_year_rel(0.0, 9);
        let mut p = PlantInstance::with_state(BlockPos::ZERO, PlantInstanceState::new("flax"));
        p.load_config(&table);

        assert_eq!(p.tick(&env_at(&cal, &freezing, &table)), TickOutcome::Unresolved);
        assert!(!p.is_dead());
        assert!(p.config().is_some());
    }

    #[test]
    fn test_tick_retries_unresolved_config() {
        let empty = VariantTable::new();
        let table = variants();
        let cal = GameCalendar::at_year_rel(4.0 / 12.0, 9);
        let mut p = PlantInstance::new(BlockPos::new(2, 64, 2));
        assert_eq!(p.on_placed(Some("flax"), &env_at(&cal, &warm, &empty)), TickOutcome::Unresolved);
        assert!(p.config().is_none());

        let out = p.tick(&env_at(&cal, &warm, &table));
        assert_eq!(out, TickOutcome::Transitioned { from: 1, to: 2, died: false, revived: false });
        assert_eq!(p.stage(), 2);
        assert!(p.config().is_some());
    }

    #[test]
    fn test_zero_stage_state_is_floored() {
        let state = PlantInstanceState { plant_type: Some("flax".into()), stage: 0, dead: false };
        let p = PlantInstance::with_state(BlockPos::ZERO, state);
        assert_eq!(p.stage(), 1);

        let mut tree = AttributeTree::new();
        p.to_attributes(&mut tree);
        assert_eq!(tree.get_int("stage"), Some(1));
        assert_eq!(PlantInstance::from_attributes(BlockPos::ZERO, &tree).state(), p.state());
    }

    #[test]
    fn test_untyped_placement_not_dirty() {
        let table = variants();
        let cal = GameCalendar::at_year_rel(0.5, 9);
        let mut p = PlantInstance::new(BlockPos::ZERO);
        assert_eq!(p.on_placed(None, &env_at(&cal, &warm, &table)), TickOutcome::Inert);
        assert!(!p.is_dirty());
    }

    #[test]
    fn test_unknown_type_is_unresolved() {
        let table = variants();
        let cal = GameCalendar::at_year_rel(0.5, 9);
        let mut p = PlantInstance::with_state(BlockPos::ZERO, PlantInstanceState::new("barley"));
        assert_eq!(p.initialize(&env_at(&cal, &warm, &table)), TickOutcome::Unresolved);
        assert!(p.config().is_none());
    }

    #[test]
    fn test_on_placed_sets_type_and_ticks() {
        let table = variants();
        let cal = GameCalendar::at_year_rel(0.9, 9);
        let mut p = PlantInstance::new(BlockPos::new(1, 2, 3));
        let out = p.on_placed(Some("flax"), &env_at(&cal, &warm, &table));
        assert_eq!(p.plant_type(), Some("flax"));
        assert_eq!(out, TickOutcome::Transitioned { from: 1, to: 4, died: false, revived: false });
        assert!(p.is_dirty());
        assert_eq!(p.placed_name_key().as_deref(), Some("block-crop-flax-4"));
    }

    #[test]
    fn test_load_instance_initializes() {
        let table = variants();
        let cal = GameCalendar::at_year_rel(4.0 / 12.0, 9);
        let mut tree = AttributeTree::new();
        PlantInstanceState::new("flax").write_attributes(&mut tree);

        let (p, out) = load_instance(BlockPos::ZERO, &tree, &env_at(&cal, &warm, &table));
        assert!(out.is_transition());
        assert_eq!(p.stage(), 2);
    }

    #[test]
    fn test_apply_attributes_reloads_only_on_change() {
        let table = variants();
        let mut p = PlantInstance::with_state(BlockPos::ZERO, PlantInstanceState::new("flax"));
        p.load_config(&table);

        let mut tree = AttributeTree::new();
        p.to_attributes(&mut tree);
        assert!(!p.apply_attributes(&tree, &table));

        tree.set_bool("dead", true);
        assert!(p.apply_attributes(&tree, &table));
        assert!(p.is_dead());
        assert_eq!(p.config().unwrap().shape.as_ref().unwrap().base, "crop/dead/flax");
    }

    #[test]
    fn test_set_plant_type() {
        let table = variants();
        let mut p = PlantInstance::with_state(BlockPos::ZERO, PlantInstanceState::new("flax"));
        assert!(!p.set_plant_type(Some("flax"), &table));
        assert!(p.set_plant_type(Some("rye"), &table));
        assert_eq!(p.config().unwrap().stages, 1);
        assert!(p.is_dirty());
    }

    fn mesh_of(p: &mut PlantInstance, blocks: &BlockRegistry, tess: &mut CountingTesselator, cache: &mut SharedMeshCache) -> Option<MeshHandle> {
        let mut atlas = FixedAtlas;
        let mut env = MeshEnv { blocks, tesselator: tess, atlas: &mut atlas, cache };
        p.mesh(&mut env)
    }

    #[test]
    fn test_mesh_learns_alternates_and_offsets() {
        let table = variants();
        let blocks = blocks();
        let mut tess = CountingTesselator::default();
        let mut cache: SharedMeshCache = SharedMeshCache::new();
        let pos = BlockPos::new(1, 2, 3);
        let mut p = PlantInstance::with_state(pos, PlantInstanceState::new("flax"));
        p.load_config(&table);

        let block = blocks.id("crop-flax-1").unwrap();
        assert_eq!(p.mesh_key(&blocks), Some(MeshKey::new(block, false, UNKNOWN_VARIANT)));

        let mesh = mesh_of(&mut p, &blocks, &mut tess, &mut cache).unwrap();
        assert_eq!(mesh.positions[1], Vec3::new(1.0, -1.0 / 16.0, 0.0));
        assert_eq!(p.known_alternates(), Some(3));
        // murmur3(1, 2, 3) as i32 rem_euclid 3 = 1
        assert_eq!(p.mesh_key(&blocks), Some(MeshKey::new(block, false, 1)));
        assert_eq!(tess.shapes, vec!["crop/flax/1-b".to_string()]);
        assert_eq!(tess.resolved, vec![true]);

        // cached handle is reused without rebuilding
        let again = mesh_of(&mut p, &blocks, &mut tess, &mut cache).unwrap();
        assert!(Arc::ptr_eq(&mesh, &again));
        assert_eq!(tess.tesselations, 1);
    }

    #[test]
    fn test_mesh_shared_between_equal_variants() {
        let table = variants();
        let blocks = blocks();
        let mut tess = CountingTesselator::default();
        let mut cache: SharedMeshCache = SharedMeshCache::new();

        let origin = BlockPos::new(1, 2, 3);
        let target = select_variant(origin, 3);
        let twin = (0..64)
            .map(|x| BlockPos::new(x, 10, 0))
            .find(|p| *p != origin && select_variant(*p, 3) == target)
            .unwrap();

        let mut a = PlantInstance::with_state(origin, PlantInstanceState::new("flax"));
        let mut b = PlantInstance::with_state(twin, PlantInstanceState::new("flax"));
        a.load_config(&table);
        b.load_config(&table);

        let ma = mesh_of(&mut a, &blocks, &mut tess, &mut cache).unwrap();
        // b still looks up the unknown key and builds, then stores under the shared key
        let mb = mesh_of(&mut b, &blocks, &mut tess, &mut cache).unwrap();
        assert_eq!(a.mesh_key(&blocks), b.mesh_key(&blocks));
        assert_eq!(*ma, *mb);
        assert_eq!(cache.len(), 1);

        // once known, a fresh lookup hits the shared entry
        b.invalidate_mesh();
        let mb2 = mesh_of(&mut b, &blocks, &mut tess, &mut cache).unwrap();
        assert!(Arc::ptr_eq(&mb, &mb2));
        assert_eq!(tess.tesselations, 2);
    }

    #[test]
    fn test_mesh_default_block_and_dead_override() {
        let table = variants();
        let blocks = blocks();
        let mut tess = CountingTesselator::default();
        let mut cache: SharedMeshCache = SharedMeshCache::new();

        // rye's crop block has no shape alternates: default block mesh
        let mut rye = PlantInstance::with_state(BlockPos::ZERO, PlantInstanceState::new("rye"));
        rye.load_config(&table);
        let mesh = mesh_of(&mut rye, &blocks, &mut tess, &mut cache).unwrap();
        assert_eq!(mesh.positions[0].y, -1.0 / 16.0);
        assert_eq!(rye.known_alternates(), None);

        // dead flax uses the dead variant's own shape
        let state = PlantInstanceState { plant_type: Some("flax".into()), stage: 2, dead: true };
        let mut dead = PlantInstance::with_state(BlockPos::ZERO, state);
        dead.load_config(&table);
        mesh_of(&mut dead, &blocks, &mut tess, &mut cache).unwrap();
        assert_eq!(tess.shapes.last().map(String::as_str), Some("crop/dead/flax"));
    }

    #[test]
    fn test_dead_and_live_meshes_cached_apart() {
        let table = variants();
        let blocks = blocks();
        let mut tess = CountingTesselator::default();
        let mut cache: SharedMeshCache = SharedMeshCache::new();
        let pos = BlockPos::new(1, 2, 3);

        let state = PlantInstanceState { plant_type: Some("flax".into()), stage: 1, dead: true };
        let mut dead = PlantInstance::with_state(pos, state);
        dead.load_config(&table);
        let dead_mesh = mesh_of(&mut dead, &blocks, &mut tess, &mut cache).unwrap();
        assert_eq!(dead.known_alternates(), None);

        let mut live = PlantInstance::with_state(pos, PlantInstanceState::new("flax"));
        live.load_config(&table);
        let live_mesh = mesh_of(&mut live, &blocks, &mut tess, &mut cache).unwrap();
        assert!(!Arc::ptr_eq(&dead_mesh, &live_mesh));
        assert_eq!(live.known_alternates(), Some(3));
        assert_eq!(tess.shapes, vec!["crop/dead/flax".to_string(), "crop/flax/1-b".to_string()]);
        assert_ne!(dead.mesh_key(&blocks), live.mesh_key(&blocks));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_death_rebuilds_mesh() {
        let table = variants();
        let blocks = blocks();
        let mut tess = CountingTesselator::default();
        let mut cache: SharedMeshCache = SharedMeshCache::new();
        let cal = GameCalendar::at_year_rel(0.0, 9);

        let mut rye = PlantInstance::with_state(BlockPos::ZERO, PlantInstanceState::new("rye"));
        rye.load_config(&table);
        let alive = mesh_of(&mut rye, &blocks, &mut tess, &mut cache).unwrap();

        let out = rye.tick(&env_at(&cal, &freezing, &table));
        assert!(matches!(out, TickOutcome::Transitioned { died: true, .. }));
        let withered = mesh_of(&mut rye, &blocks, &mut tess, &mut cache).unwrap();
        assert!(!Arc::ptr_eq(&alive, &withered));
        assert_eq!(tess.shapes.last().map(String::as_str), Some("crop/dead/rye"));
        assert_eq!(tess.tesselations, 2);
    }

    #[test]
    fn test_stale_mesh_kept_when_rebuild_fails() {
        let table = variants();
        let blocks = blocks();
        let mut tess = CountingTesselator::default();
        let mut cache: SharedMeshCache = SharedMeshCache::new();
        let mut p = PlantInstance::with_state(BlockPos::ZERO, PlantInstanceState::new("flax"));
        p.load_config(&table);
        let first = mesh_of(&mut p, &blocks, &mut tess, &mut cache).unwrap();

        // stage 9 has no crop block
        let mut tree = AttributeTree::new();
        PlantInstanceState { plant_type: Some("flax".into()), stage: 9, dead: false }.write_attributes(&mut tree);
        assert!(p.apply_attributes(&tree, &table));
        let kept = mesh_of(&mut p, &blocks, &mut tess, &mut cache).unwrap();
        assert!(Arc::ptr_eq(&first, &kept));
    }

    #[test]
    fn test_rotation_index() {
        let table = variants();
        let blocks = blocks();
        let mut p = PlantInstance::with_state(BlockPos::new(5, 64, -7), PlantInstanceState::new("flax"));
        p.load_config(&table);
        let r = p.rotation_index(&blocks, 4).unwrap();
        assert_eq!(r, hash3_mod(-5, 0, -7, 4));

        let rye = PlantInstance::with_state(BlockPos::ZERO, PlantInstanceState::new("rye"));
        assert_eq!(rye.rotation_index(&blocks, 4), None);
    }
}

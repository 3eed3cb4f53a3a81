//! Collection of placed plant instances keyed by position

use std::collections::HashMap;

use crate::core::{BlockPos, Result};
use crate::world::AttributeTree;

use super::instance::{PlantInstance, PlantInstanceState, StageEnv, TickOutcome};

/// Tally of one `tick_all` pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldTickSummary {
    pub ticked: usize,
    pub transitioned: usize,
    pub died: usize,
    pub revived: usize,
    pub unresolved: usize,
    pub no_observation: usize,
}

impl FieldTickSummary {
    fn record(&mut self, outcome: TickOutcome) {
        self.ticked += 1;
        match outcome {
            TickOutcome::Transitioned { died, revived, .. } => {
                self.transitioned += 1;
                self.died += died as usize;
                self.revived += revived as usize;
            }
            TickOutcome::Unresolved => self.unresolved += 1,
            TickOutcome::NoObservation => self.no_observation += 1,
            TickOutcome::Inert | TickOutcome::Unchanged => {}
        }
    }
}

/// Every crop prop in a loaded region. Instances are independent; the
/// field only routes calls and collects persistence requests.
#[derive(Debug, Default)]
pub struct PlantField {
    instances: HashMap<BlockPos, PlantInstance>,
}

impl PlantField {
    /// Create an empty field
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a new plant, replacing any instance already at `pos`
    ///
    /// # Arguments
    /// * `pos` - Block position of the plant
    /// * `plant_type` - Type from the placing item; `None` places an inert plant
    /// * `env` - Calendar, climate and variant table for the first tick
    ///
    /// # Returns
    /// Outcome of the placement tick
    pub fn place(&mut self, pos: BlockPos, plant_type: Option<&str>, env: &StageEnv) -> TickOutcome {
        let mut instance = PlantInstance::new(pos);
        let outcome = instance.on_placed(plant_type, env);
        self.instances.insert(pos, instance);
        outcome
    }

    /// Restore a persisted plant and initialize it
    ///
    /// # Arguments
    /// * `pos` - Block position of the plant
    /// * `tree` - Persisted `code`, `stage` and `dead` attributes
    /// * `env` - Calendar, climate and variant table for the load tick
    ///
    /// # Returns
    /// Outcome of the load tick, or `Error::Attribute` if a key holds the
    /// wrong value type. Nothing is inserted on error.
    pub fn load(&mut self, pos: BlockPos, tree: &AttributeTree, env: &StageEnv) -> Result<TickOutcome> {
        let state = PlantInstanceState::try_read_attributes(tree)?;
        let mut instance = PlantInstance::with_state(pos, state);
        let outcome = instance.initialize(env);
        self.instances.insert(pos, instance);
        Ok(outcome)
    }

    /// Remove the plant at `pos`
    ///
    /// # Returns
    /// The removed instance, or None if no plant was there
    pub fn remove(&mut self, pos: BlockPos) -> Option<PlantInstance> {
        self.instances.remove(&pos)
    }

    /// Get the plant at `pos`
    pub fn get(&self, pos: BlockPos) -> Option<&PlantInstance> {
        self.instances.get(&pos)
    }

    /// Get the plant at `pos` mutably
    pub fn get_mut(&mut self, pos: BlockPos) -> Option<&mut PlantInstance> {
        self.instances.get_mut(&pos)
    }

    /// Number of placed plants
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Iterate over plants in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &PlantInstance> {
        self.instances.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlantInstance> {
        self.instances.values_mut()
    }

    /// Tick every instance once
    ///
    /// # Arguments
    /// * `env` - Calendar, climate and variant table shared by all plants
    ///
    /// # Returns
    /// Tally of the outcomes
    pub fn tick_all(&mut self, env: &StageEnv) -> FieldTickSummary {
        let mut summary = FieldTickSummary::default();
        for instance in self.instances.values_mut() {
            summary.record(instance.tick(env));
        }
        if summary.transitioned > 0 {
            log::debug!(
                "Field tick: {} of {} plants changed ({} died, {} revived)",
                summary.transitioned, summary.ticked, summary.died, summary.revived
            );
        }
        summary
    }

    /// Collect and clear the dirty flags
    ///
    /// # Returns
    /// Positions whose persisted state changed since the last call, sorted
    /// by (x, y, z)
    pub fn take_dirty(&mut self) -> Vec<BlockPos> {
        let mut dirty: Vec<BlockPos> = self
            .instances
            .values_mut()
            .filter_map(|p| p.take_dirty().then(|| p.pos()))
            .collect();
        dirty.sort_by_key(|p| (p.x, p.y, p.z));
        dirty
    }

    /// Persisted attributes of the plant at `pos`
    ///
    /// # Returns
    /// A fresh tree holding `code`, `stage` and `dead`, or None if no plant
    /// is there
    pub fn save(&self, pos: BlockPos) -> Option<AttributeTree> {
        let instance = self.instances.get(&pos)?;
        let mut tree = AttributeTree::new();
        instance.to_attributes(&mut tree);
        Some(tree)
    }
}

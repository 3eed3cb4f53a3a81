//! Generator lookup by block code

use std::collections::HashMap;

use crate::core::{BlockPos, Error, Result};
use crate::math::random::RandomSource;
use crate::world::{BlockRegistry, WorldAccessor};
use super::fern::FernTreeGenerator;
use super::params::GrowthParameters;
use super::{GrowthReport, TreeGenerator};

/// Generators keyed by the code world generation asks for.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: HashMap<String, Box<dyn TreeGenerator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator, returning any generator it replaced
    pub fn register(
        &mut self,
        code: impl Into<String>,
        generator: Box<dyn TreeGenerator>,
    ) -> Option<Box<dyn TreeGenerator>> {
        self.generators.insert(code.into(), generator)
    }

    /// Register a fern generator for every type whose trunk block exists.
    /// Returns the codes registered.
    pub fn register_ferns(&mut self, blocks: &BlockRegistry, fern_types: &[&str]) -> Vec<String> {
        let mut codes = Vec::new();
        for fern_type in fern_types {
            let generator = FernTreeGenerator::from_registry(blocks, fern_type);
            if generator.parts().trunk.is_none() {
                log::warn!("Fern type '{}' has no trunk block, not registering", fern_type);
                continue;
            }
            let code = generator.code();
            self.register(code.clone(), Box::new(generator));
            codes.push(code);
        }
        codes
    }

    pub fn contains(&self, code: &str) -> bool {
        self.generators.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&dyn TreeGenerator> {
        self.generators.get(code).map(|g| g.as_ref())
    }

    /// Run the generator registered under `code`
    pub fn grow(
        &self,
        code: &str,
        world: &mut dyn WorldAccessor,
        origin: BlockPos,
        params: &GrowthParameters,
        rng: &mut dyn RandomSource,
    ) -> Result<GrowthReport> {
        let generator = self
            .get(code)
            .ok_or_else(|| Error::UnknownGenerator(code.to_string()))?;
        Ok(generator.grow_tree(world, origin, params, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::fern::part_code;
    use crate::world::{BlockDef, BlockLayer, VoxelWorld};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn blocks() -> BlockRegistry {
        let mut r = BlockRegistry::new();
        r.register(BlockDef::new("soil").with_fertility(60)).unwrap();
        for part in ["trunk", "trunk-top-medium", "trunk-top-old", "foliage"] {
            r.register(BlockDef::new(part_code("normal", part)).with_replaceable(100)).unwrap();
        }
        // "dwarf" only has foliage
        r.register(BlockDef::new(part_code("dwarf", "foliage")).with_replaceable(100)).unwrap();
        r
    }

    #[test]
    fn test_register_ferns_requires_trunk() {
        let mut reg = GeneratorRegistry::new();
        let codes = reg.register_ferns(&blocks(), &["normal", "dwarf"]);
        assert_eq!(codes, vec!["fern-normal-trunk".to_string()]);
        assert!(reg.contains("fern-normal-trunk"));
        assert!(!reg.contains("fern-dwarf-trunk"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_grow_by_code() {
        let b = blocks();
        let mut reg = GeneratorRegistry::new();
        reg.register_ferns(&b, &["normal"]);

        let soil = b.id("soil").unwrap();
        let foliage = b.id("fern-normal-foliage").unwrap();
        let mut world = VoxelWorld::new(b);
        world.fill_layer(BlockPos::new(-8, 0, -8), BlockPos::new(8, 0, 8), 0, soil);

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let report = reg
            .grow("fern-normal-trunk", &mut world, BlockPos::ZERO, &GrowthParameters::default(), &mut rng)
            .unwrap();
        assert!(!report.stacks.is_empty());
        let first = &report.stacks[0];
        let top = first.base + glam::IVec3::new(0, first.plan.height() - 1, 0);
        assert_eq!(world.block(top, BlockLayer::Solid), foliage);
    }

    #[test]
    fn test_unknown_code() {
        let reg = GeneratorRegistry::new();
        let mut world = VoxelWorld::new(BlockRegistry::new());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = reg.grow("oak", &mut world, BlockPos::ZERO, &GrowthParameters::default(), &mut rng);
        assert!(matches!(err, Err(Error::UnknownGenerator(_))));
    }
}

//! Fern patch and crop prop simulation
//!
//! Grows a few fern patches on flat soil, places a row of crop props and
//! runs the calendar forward, logging stage and liveness transitions.
//!
//! Usage:
//!     simulate_ferns [OPTIONS]
//!
//! Options:
//!     --seed <SEED>           Seed for growth RNG and climate (default: 12345)
//!     --days <N>              Days to simulate (default: 108, one year)
//!     --size <SIZE>           Fern size multiplier (default: 1.0)
//!     --variants <PATH>       Crop prop variant table JSON (default: built in)
//!     -h, --help              Show this help message

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Instant;

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use verdure::climate::{ClimateParams, GameCalendar, SeasonalClimate};
use verdure::core::{logging, BlockPos, Result};
use verdure::growth::{GeneratorRegistry, GrowthParameters};
use verdure::stage::{
    AtlasPosition, CropPropBlock, Mesh, MeshEnv, PlantField, SharedMeshCache, StageEnv,
    Tesselator, TextureAtlas, TextureSource, VariantTable,
};
use verdure::world::{BlockDef, BlockId, BlockRegistry, CompositeShape, RotationAxes, VoxelWorld};

const GROUND_Y: i32 = 110;
const FERN_TYPE: &str = "normal";
const CROP_TYPES: [&str; 2] = ["flax", "rye"];

const DEFAULT_VARIANTS: &str = r#"{
    "types": {
        "flax": {
            "month_start": 3, "month_end": 9, "stages": 4,
            "textures": { "leaves": "crop/{type}/leaves{stage}" }
        },
        "rye": {
            "month_start": 4, "month_end": 10, "stages": 3,
            "shape": { "base": "crop/{type}/stage{stage}", "alternates": ["crop/{type}/stage{stage}-tall"] }
        },
        "dead": {
            "month_start": 1, "month_end": 13, "stages": 1,
            "shape": { "base": "crop/dead/{type}" }
        }
    }
}"#;

fn print_help() {
    eprintln!("simulate_ferns - Fern growth and crop prop staging demo");
    eprintln!();
    eprintln!("Usage: simulate_ferns [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    --seed <SEED>           Seed for growth RNG and climate (default: 12345)");
    eprintln!("    --days <N>              Days to simulate (default: 108, one year)");
    eprintln!("    --size <SIZE>           Fern size multiplier (default: 1.0)");
    eprintln!("    --variants <PATH>       Crop prop variant table JSON (default: built in)");
    eprintln!("    -h, --help              Show this help message");
    eprintln!();
    eprintln!("Example:");
    eprintln!("    RUST_LOG=verdure::stage=debug simulate_ferns --seed 7 --days 216");
}

#[derive(Debug)]
struct Args {
    seed: u64,
    days: u32,
    size: f32,
    variants: Option<PathBuf>,
}

fn parse_args() -> std::result::Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut seed: u64 = 12345;
    let mut days: u32 = 108;
    let mut size: f32 = 1.0;
    let mut variants: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "--seed" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --seed")?;
                seed = value.parse().map_err(|_| format!("Invalid seed: {}", value))?;
            }
            "--days" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --days")?;
                days = value.parse().map_err(|_| format!("Invalid days: {}", value))?;
            }
            "--size" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --size")?;
                size = value.parse().map_err(|_| format!("Invalid size: {}", value))?;
            }
            "--variants" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --variants")?;
                variants = Some(PathBuf::from(value));
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    Ok(Args { seed, days, size, variants })
}

fn build_blocks() -> Result<BlockRegistry> {
    let mut blocks = BlockRegistry::new();
    blocks.register(BlockDef::new("soil").with_fertility(60))?;
    blocks.register(BlockDef::new("water").liquid().with_replaceable(9500))?;
    for part in ["trunk", "trunk-top-young", "trunk-top-medium", "trunk-top-old", "foliage"] {
        blocks.register(BlockDef::new(format!("fern-{}-{}", FERN_TYPE, part)).with_replaceable(100))?;
    }
    for stage in 1..=4 {
        let shape = CompositeShape::new(format!("crop/flax/stage{}", stage))
            .with_alternates([format!("crop/flax/stage{}-b", stage), format!("crop/flax/stage{}-c", stage)]);
        blocks.register(
            BlockDef::new(format!("crop-flax-{}", stage))
                .with_shape(shape)
                .with_random_rotations(RotationAxes::Y),
        )?;
    }
    for stage in 1..=3 {
        blocks.register(BlockDef::new(format!("crop-rye-{}", stage)))?;
    }
    blocks.register(BlockDef::new("cropprop").with_shape(CompositeShape::new("block/cropprop")))?;
    Ok(blocks)
}

/// Crossed quads for every shape; textures resolved for the single code
/// "all".
#[derive(Default)]
struct CrossTesselator {
    meshes_built: usize,
}

impl CrossTesselator {
    fn cross(uv: AtlasPosition) -> Mesh {
        let quads = [
            [Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, 1.0, 0.0)],
            [Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 1.0), Vec3::new(1.0, 1.0, 0.0)],
        ];
        let corners = [
            Vec2::new(uv.u0, uv.v1),
            Vec2::new(uv.u1, uv.v1),
            Vec2::new(uv.u1, uv.v0),
            Vec2::new(uv.u0, uv.v0),
        ];
        let mut mesh = Mesh::new();
        for quad in quads {
            let first = mesh.positions.len() as u32;
            mesh.positions.extend(quad);
            mesh.uvs.extend(corners);
            mesh.indices.extend([first, first + 1, first + 2, first, first + 2, first + 3]);
        }
        mesh
    }
}

impl Tesselator for CrossTesselator {
    fn default_block_mesh(&mut self, _block: BlockId) -> Option<Mesh> {
        self.meshes_built += 1;
        Some(Self::cross(AtlasPosition { u1: 1.0, v1: 1.0, ..Default::default() }))
    }

    fn shape_textures(&mut self, shape: &CompositeShape) -> Option<BTreeMap<String, String>> {
        Some([("all".to_string(), shape.base.clone())].into_iter().collect())
    }

    fn tesselate(&mut self, _shape: &CompositeShape, textures: &mut dyn TextureSource) -> Option<Mesh> {
        self.meshes_built += 1;
        let uv = textures.resolve("all")?;
        Some(Self::cross(uv))
    }
}

/// Fixed 16x16 grid of texture slots
#[derive(Default)]
struct GridAtlas {
    slots: Vec<String>,
}

impl TextureAtlas for GridAtlas {
    fn size(&self) -> (u32, u32) {
        (256, 256)
    }

    fn get_or_insert(&mut self, path: &str) -> Option<AtlasPosition> {
        let index = match self.slots.iter().position(|p| p == path) {
            Some(i) => i,
            None if self.slots.len() < 256 => {
                self.slots.push(path.to_string());
                self.slots.len() - 1
            }
            None => return None,
        };
        let (col, row) = ((index % 16) as f32, (index / 16) as f32);
        Some(AtlasPosition {
            page: 0,
            u0: col / 16.0,
            v0: row / 16.0,
            u1: (col + 1.0) / 16.0,
            v1: (row + 1.0) / 16.0,
        })
    }
}

fn run(args: &Args) -> Result<()> {
    let blocks = build_blocks()?;
    let variants = match &args.variants {
        Some(path) => VariantTable::open_sync(path)?,
        None => VariantTable::from_json(DEFAULT_VARIANTS)?,
    };

    let soil = blocks.require("soil")?;
    let cropprop = blocks.require("cropprop")?;
    let mut generators = GeneratorRegistry::new();
    let codes = generators.register_ferns(&blocks, &[FERN_TYPE]);

    let mut world = VoxelWorld::new(blocks.clone());
    world.fill_layer(BlockPos::new(-32, 0, -32), BlockPos::new(32, 0, 32), GROUND_Y, soil);
    world.take_modified();

    // Ferns
    let start = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let params = GrowthParameters::default().with_size(args.size);
    let mut stacks = 0;
    for (i, origin) in [(-16, -16), (16, -16), (-16, 16), (16, 16)].into_iter().enumerate() {
        for code in &codes {
            let report = generators.grow(
                code,
                &mut world,
                BlockPos::new(origin.0, GROUND_Y, origin.1),
                &params,
                &mut rng,
            )?;
            log::info!(
                "Patch {}: {} stacks from {} attempts ({} blocks)",
                i, report.stacks.len(), report.attempted, report.blocks_planned()
            );
            stacks += report.stacks.len();
        }
    }
    log::info!(
        "Grew {} fern stacks, {} blocks written in {:.2}ms",
        stacks,
        world.take_modified().len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    // Crop props
    let climate = SeasonalClimate::new(ClimateParams {
        seed: args.seed as u32,
        ..ClimateParams::default()
    });
    let mut calendar = GameCalendar::default();
    let mut field = PlantField::new();
    {
        let env = StageEnv { calendar: &calendar, climate: &climate, variants: &variants };
        for x in -6i32..=6 {
            let plant_type = CROP_TYPES[(x.rem_euclid(2)) as usize];
            field.place(BlockPos::new(x * 2, GROUND_Y + 1, 0), Some(plant_type), &env);
        }
    }
    field.take_dirty();

    let mut transitions = 0;
    for _ in 0..args.days {
        calendar.advance_days(1.0);
        let env = StageEnv { calendar: &calendar, climate: &climate, variants: &variants };
        let summary = field.tick_all(&env);
        transitions += summary.transitioned;
        let changed = field.take_dirty();
        if !changed.is_empty() {
            log::info!(
                "Year {} month {} day {}: {} plants changed ({} died, {} revived)",
                calendar.year(), calendar.month(), calendar.day_of_month(),
                changed.len(), summary.died, summary.revived
            );
        }
    }

    // Meshes
    let mut tesselator = CrossTesselator::default();
    let mut atlas = GridAtlas::default();
    let mut cache: SharedMeshCache = SharedMeshCache::new();
    let mut meshed = 0;
    for instance in field.iter_mut() {
        let mut env = MeshEnv {
            blocks: &blocks,
            tesselator: &mut tesselator,
            atlas: &mut atlas,
            cache: &mut cache,
        };
        if instance.mesh(&mut env).is_some() {
            meshed += 1;
        }
    }

    let mut prop_block = CropPropBlock::new(cropprop, "cropprop", CompositeShape::new("block/cropprop"));
    for plant_type in CROP_TYPES {
        prop_block.inventory_mesh(Some(plant_type), &mut tesselator, &mut atlas);
    }

    println!();
    println!("Summary:");
    println!("  Fern stacks: {}", stacks);
    println!("  Crop props: {} ({} transitions over {} days)", field.len(), transitions, args.days);
    for instance in field.iter().filter(|p| p.pos().x == 0) {
        println!(
            "  Sample at {}: {} stage {}{}",
            instance.pos(),
            instance.plant_type().unwrap_or("?"),
            instance.stage(),
            if instance.is_dead() { " (dead)" } else { "" }
        );
    }
    println!("  Meshed: {} instances, {} shared meshes, {} tesselations", meshed, cache.len(), tesselator.meshes_built);
    println!("  Atlas slots used: {}", atlas.slots.len());
    println!("  Inventory meshes released: {}", prop_block.unload());

    Ok(())
}

fn main() {
    logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    println!("Fern Simulation");
    println!("===============");
    println!("Seed: {}", args.seed);
    println!("Days: {}", args.days);
    println!("Fern size: {}", args.size);
    println!();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::entity::Planet;
use super::math::{distance, Vec2, WorldRng};

const PLANET_NAMES: [&str; 20] = [
    "Aurelia", "Brisk", "Caldera", "Dunmere", "Eskar", "Fenwick", "Gallow", "Halcyon",
    "Ivel", "Jorun", "Kestrel", "Lumen", "Morrow", "Nadir", "Oberon", "Pyra", "Quill",
    "Rysa", "Solace", "Tethys",
];

const ADJECTIVES: [&str; 10] = [
    "windswept", "frozen", "sun-scorched", "quiet", "storm-wracked", "verdant", "ashen",
    "glittering", "fog-bound", "ancient",
];

const TERRAINS: [&str; 10] = [
    "basalt plains",
    "shallow seas",
    "crystal dunes",
    "sprawling jungle",
    "salt flats",
    "canyon mazes",
    "drifting ice",
    "sulphur vents",
    "terraced hills",
    "abandoned cities",
];

const CLOSERS: [&str; 6] = [
    "Few ships stop here.",
    "Traders speak of it fondly.",
    "Its nights last for weeks.",
    "The old survey maps disagree about it.",
    "Something hums beneath the surface.",
    "Pilots report strange lights at dusk.",
];

const FEATURES: [&str; 8] = [
    "rings",
    "twin moons",
    "aurora",
    "craters",
    "storm bands",
    "ice caps",
    "volcanoes",
    "ocean",
];

/// Upper bound on `planet_count_max`.
pub const MAX_PLANET_COUNT: u32 = 1024;

const FEATURE_CHANCE: f32 = 0.35;
const MAX_FEATURES: usize = 3;

const PALETTE: [[u8; 4]; 8] = [
    [196, 112, 78, 255],
    [88, 146, 206, 255],
    [142, 190, 104, 255],
    [214, 186, 110, 255],
    [168, 120, 198, 255],
    [120, 200, 196, 255],
    [206, 94, 120, 255],
    [160, 160, 170, 255],
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub planet_count_min: u32,
    pub planet_count_max: u32,
    pub planet_radius_min: f32,
    pub planet_radius_max: f32,
    /// Extra gap required between planet rims.
    pub separation_margin: f32,
    /// Minimum distance from the start point to any planet centre.
    pub start_clearance: f32,
    pub max_placement_attempts: u32,
    pub seed: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            planet_count_min: 10,
            planet_count_max: 16,
            planet_radius_min: 40.0,
            planet_radius_max: 110.0,
            separation_margin: 80.0,
            start_clearance: 320.0,
            max_placement_attempts: 200,
            seed: 0x5eed_cafe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("world dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },
    #[error("planet count range is inverted: {min}..={max}")]
    InvalidCountRange { min: u32, max: u32 },
    #[error("planet count {max} exceeds the limit of {limit}")]
    TooManyPlanets { max: u32, limit: u32 },
    #[error("planet radius range must be positive and ordered, got {min}..{max}")]
    InvalidRadiusRange { min: f32, max: f32 },
}

impl GenerationConfig {
    pub fn validate(&self, width: f32, height: f32) -> Result<(), GenerationError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(GenerationError::InvalidDimensions { width, height });
        }
        if self.planet_count_min > self.planet_count_max {
            return Err(GenerationError::InvalidCountRange {
                min: self.planet_count_min,
                max: self.planet_count_max,
            });
        }
        if self.planet_count_max > MAX_PLANET_COUNT {
            return Err(GenerationError::TooManyPlanets {
                max: self.planet_count_max,
                limit: MAX_PLANET_COUNT,
            });
        }
        let radius_ok = self.planet_radius_min.is_finite()
            && self.planet_radius_max.is_finite()
            && self.planet_radius_min > 0.0
            && self.planet_radius_min <= self.planet_radius_max;
        if !radius_ok {
            return Err(GenerationError::InvalidRadiusRange {
                min: self.planet_radius_min,
                max: self.planet_radius_max,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPlanets {
    pub planets: Vec<Planet>,
    pub requested: u32,
    pub dropped: u32,
}

/// Scatters planets over a `width` x `height` world. Each planet gets a
/// bounded number of placement attempts; one that finds no free slot is
/// dropped and the rest of the world is still generated.
pub fn generate_planets(
    config: &GenerationConfig,
    width: f32,
    height: f32,
    start: Vec2,
    rng: &mut WorldRng,
) -> Result<GeneratedPlanets, GenerationError> {
    config.validate(width, height)?;

    let requested = rng.range_inclusive_u32(config.planet_count_min, config.planet_count_max);
    let mut planets: Vec<Planet> = Vec::with_capacity(requested as usize);
    let mut dropped = 0u32;

    for slot in 0..requested {
        match place_planet(config, width, height, start, &planets, rng) {
            Some((position, radius)) => {
                let planet = describe_planet(position, radius, &planets, rng);
                debug!(
                    slot,
                    name = %planet.name,
                    x = position.x,
                    y = position.y,
                    radius,
                    "planet_placed"
                );
                planets.push(planet);
            }
            None => {
                dropped = dropped.saturating_add(1);
                warn!(
                    slot,
                    attempts = config.max_placement_attempts,
                    "planet_placement_exhausted"
                );
            }
        }
    }

    info!(
        requested,
        placed = planets.len(),
        dropped,
        seed = config.seed,
        "planets_generated"
    );
    Ok(GeneratedPlanets {
        planets,
        requested,
        dropped,
    })
}

fn place_planet(
    config: &GenerationConfig,
    width: f32,
    height: f32,
    start: Vec2,
    placed: &[Planet],
    rng: &mut WorldRng,
) -> Option<(Vec2, f32)> {
    for _ in 0..config.max_placement_attempts {
        let radius = rng.range_f32(config.planet_radius_min, config.planet_radius_max);
        if radius * 2.0 > width || radius * 2.0 > height {
            continue;
        }
        let position = Vec2::new(
            rng.range_f32(radius, width - radius),
            rng.range_f32(radius, height - radius),
        );
        if distance(position, start) < config.start_clearance + radius {
            continue;
        }
        let clear_of_others = placed.iter().all(|other| {
            distance(position, other.position) >= radius + other.radius + config.separation_margin
        });
        if clear_of_others {
            return Some((position, radius));
        }
    }
    None
}

fn describe_planet(position: Vec2, radius: f32, placed: &[Planet], rng: &mut WorldRng) -> Planet {
    let name = unique_name(placed, rng);
    let adjective = rng.pick(&ADJECTIVES).copied().unwrap_or("quiet");
    let terrain = rng.pick(&TERRAINS).copied().unwrap_or("basalt plains");
    let closer = rng.pick(&CLOSERS).copied().unwrap_or("");
    let description = format!("{name} is a {adjective} world of {terrain}. {closer}")
        .trim_end()
        .to_string();

    let mut features = Vec::new();
    for feature in FEATURES {
        if features.len() >= MAX_FEATURES {
            break;
        }
        if rng.chance(FEATURE_CHANCE) {
            features.push(feature.to_string());
        }
    }

    Planet {
        position,
        radius,
        color: rng.pick(&PALETTE).copied().unwrap_or([160, 160, 170, 255]),
        name,
        description,
        features,
    }
}

fn unique_name(placed: &[Planet], rng: &mut WorldRng) -> String {
    let base = rng.pick(&PLANET_NAMES).copied().unwrap_or("Unnamed");
    let taken = |candidate: &str| placed.iter().any(|planet| planet.name == candidate);
    if !taken(base) {
        return base.to_string();
    }
    (2u32..)
        .map(|suffix| format!("{base} {suffix}"))
        .find(|candidate| !taken(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

use engine::{LoopConfig, WorldConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{resolve_config, ConfigError};

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) world: WorldConfig,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!("=== Planetfall Startup ===");

    let config = resolve_config()?;
    info!(
        seed = config.world.generation.seed,
        world_width = config.world.width,
        world_height = config.world.height,
        planets_min = config.world.generation.planet_count_min,
        planets_max = config.world.generation.planet_count_max,
        drifters = config.world.drifters,
        target_tps = config.loop_settings.target_tps,
        "config_resolved"
    );

    Ok(AppWiring {
        loop_config: config.loop_config(),
        world: config.world,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

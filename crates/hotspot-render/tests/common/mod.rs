use hotspot_core::HeatmapConfig;
use hotspot_render::{FixedContainer, HeatmapEngine};
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hotspot_render=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Small config with a wide plateau so point centers hit full intensity.
pub fn config(page_size: u32) -> HeatmapConfig {
    let mut config = HeatmapConfig::default();
    config.radius = 3;
    config.height = 4;
    config.node_blur = 0.5;
    config.pagination.page_size = page_size;
    config
}

pub fn engine(width: u32, height: u32, page_size: u32) -> (HeatmapEngine, FixedContainer) {
    init_tracing();
    let mut container = FixedContainer::new(width, height);
    let engine = HeatmapEngine::new(config(page_size), &mut container).expect("engine init");
    (engine, container)
}

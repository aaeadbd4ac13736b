use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub layout: LayoutSettings,
    pub cache: CacheConfig,
}

/// Force-layout tuning. Everything the simulation depends on lives here so
/// callers control iteration count and canvas bounds instead of constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSettings {
    pub iterations: u32,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub repulsion: f64,
    pub attraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub capacity: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            iterations: 60,
            canvas_width: 1200.0,
            canvas_height: 800.0,
            repulsion: 8000.0,
            attraction: 0.02,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutSettings::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            layout: LayoutSettings {
                iterations: env_or("WALLGRAPH_LAYOUT_ITERATIONS", defaults.layout.iterations),
                canvas_width: env_or("WALLGRAPH_CANVAS_WIDTH", defaults.layout.canvas_width),
                canvas_height: env_or("WALLGRAPH_CANVAS_HEIGHT", defaults.layout.canvas_height),
                repulsion: env_or("WALLGRAPH_REPULSION", defaults.layout.repulsion),
                attraction: env_or("WALLGRAPH_ATTRACTION", defaults.layout.attraction),
            },
            cache: CacheConfig {
                capacity: env_or("WALLGRAPH_CACHE_CAPACITY", defaults.cache.capacity),
            },
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

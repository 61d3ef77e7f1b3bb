pub mod algo;
pub mod config;
pub mod engine;
pub mod error;
pub mod ops;

#[cfg(feature = "plugin")]
pub mod commands;

#[cfg(feature = "mcp")]
pub mod mcp;

#[cfg(feature = "plugin")]
use nu_plugin::{Plugin, PluginCommand};

#[cfg(feature = "plugin")]
pub struct NearDupPlugin;

#[cfg(feature = "plugin")]
impl Plugin for NearDupPlugin {
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").into()
    }

    fn commands(&self) -> Vec<Box<dyn PluginCommand<Plugin = Self>>> {
        vec![
            Box::new(commands::Dedup),
            Box::new(commands::Score),
            Box::new(commands::Similarity),
            Box::new(commands::Summary),
        ]
    }
}

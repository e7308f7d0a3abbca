//! Command implementations

pub mod deploy;
pub mod plan;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ConfigStore;
use crate::domain::{FleetConfig, Topology, Variant};
use crate::infra::YamlConfigStore;

/// A loaded fleet file and the topology it describes.
pub struct LoadedFleet {
    pub path: PathBuf,
    pub config: FleetConfig,
    pub topology: Topology,
}

/// Load the fleet file and check it can run `variant`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, or does not
/// describe a valid topology for `variant`.
pub fn load_fleet(explicit: Option<PathBuf>, variant: Variant) -> Result<LoadedFleet> {
    let store = YamlConfigStore::resolve(explicit);
    let config = store.load()?;
    let path = store.path().to_path_buf();
    let topology = Topology::from_config(&config)
        .with_context(|| format!("invalid fleet in {}", path.display()))?;
    topology
        .supports(variant)
        .with_context(|| format!("cannot run {variant:?} variant from {}", path.display()))?;
    Ok(LoadedFleet {
        path,
        config,
        topology,
    })
}

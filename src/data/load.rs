use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::airports::{AirportDataset, parse_airports};
use super::topojson::{WorldMap, parse_world};

const COUNTRIES_OBJECT: &str = "countries";

pub struct Datasets {
    pub airports: AirportDataset,
    pub world: WorldMap,
}

pub fn load_datasets(airports_path: &Path, world_path: &Path) -> Result<Datasets> {
    let airports_raw = fs::read_to_string(airports_path)
        .with_context(|| format!("failed to read airport dataset {}", airports_path.display()))?;
    let airports = parse_airports(&airports_raw)
        .with_context(|| format!("failed to parse airport dataset {}", airports_path.display()))?;

    let world_raw = fs::read_to_string(world_path)
        .with_context(|| format!("failed to read world map {}", world_path.display()))?;
    let world = parse_world(&world_raw, COUNTRIES_OBJECT)
        .with_context(|| format!("failed to parse world map {}", world_path.display()))?;

    info!(
        airports = airports.airports.len(),
        routes = airports.routes.len(),
        countries = world.countries.len(),
        border_arcs = world.borders.0.len(),
        "datasets loaded"
    );

    Ok(Datasets { airports, world })
}

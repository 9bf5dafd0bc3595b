use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
struct RawAirport {
    name: String,
    longitude: f64,
    latitude: f64,
    #[serde(default)]
    passengers: f64,
}

/// Link endpoints are either positional indices into `nodes` or airport names.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RawNodeRef {
    Index(usize),
    Name(String),
}

#[derive(Clone, Debug, Deserialize)]
struct RawLink {
    source: RawNodeRef,
    target: RawNodeRef,
}

#[derive(Clone, Debug, Deserialize)]
struct RawAirportDataset {
    nodes: Vec<RawAirport>,
    #[serde(default)]
    links: Vec<RawLink>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AirportRecord {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub passengers: f64,
}

#[derive(Clone, Debug)]
pub struct AirportDataset {
    pub airports: Vec<AirportRecord>,
    pub routes: Vec<(usize, usize)>,
}

pub(super) fn parse_airports(raw: &str) -> Result<AirportDataset> {
    let parsed: RawAirportDataset =
        serde_json::from_str(raw).context("invalid airport dataset JSON")?;

    if parsed.nodes.is_empty() {
        return Err(anyhow!("airport dataset contains no nodes"));
    }

    let index_by_name = parsed
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.name.as_str(), index))
        .collect::<HashMap<_, _>>();

    let resolve = |reference: &RawNodeRef, link_index: usize, end: &str| -> Result<usize> {
        match reference {
            RawNodeRef::Index(index) if *index < parsed.nodes.len() => Ok(*index),
            RawNodeRef::Index(index) => Err(anyhow!(
                "link {link_index} {end} index {index} is out of range ({} nodes)",
                parsed.nodes.len()
            )),
            RawNodeRef::Name(name) => index_by_name
                .get(name.as_str())
                .copied()
                .ok_or_else(|| anyhow!("link {link_index} {end} refers to unknown airport {name:?}")),
        }
    };

    let mut routes = Vec::with_capacity(parsed.links.len());
    for (link_index, link) in parsed.links.iter().enumerate() {
        let source = resolve(&link.source, link_index, "source")?;
        let target = resolve(&link.target, link_index, "target")?;
        routes.push((source, target));
    }

    let airports = parsed
        .nodes
        .into_iter()
        .map(|node| AirportRecord {
            name: node.name,
            longitude: node.longitude,
            latitude: node.latitude,
            passengers: node.passengers,
        })
        .collect();

    Ok(AirportDataset { airports, routes })
}

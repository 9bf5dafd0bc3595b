use std::fmt;

use eframe::egui::{Pos2, Vec2};

use crate::data::AirportDataset;
use crate::scale::{LinearScale, extent};

pub const RADIUS_RANGE: [f64; 2] = [5.0, 10.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct AirportNode {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub passengers: f64,
    pub radius: f32,
    pub position: Pos2,
    pub velocity: Vec2,
    /// Fixed position overriding the simulation; set while dragged or in map mode.
    pub pin: Option<Pos2>,
    pub rendered: Pos2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AirportLink {
    pub source: NodeId,
    pub target: NodeId,
}

#[derive(Clone, Debug, Default)]
pub struct NodeStore {
    nodes: Vec<AirportNode>,
}

impl NodeStore {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&AirportNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut AirportNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AirportNode> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AirportNode> {
        self.nodes.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn as_mut_slice(&mut self) -> &mut [AirportNode] {
        &mut self.nodes
    }

    pub fn resolve(&self, link: AirportLink) -> Option<(&AirportNode, &AirportNode)> {
        Some((self.get(link.source)?, self.get(link.target)?))
    }
}

#[derive(Clone, Debug, Default)]
pub struct AirportNetwork {
    pub nodes: NodeStore,
    pub links: Vec<AirportLink>,
}

impl AirportNetwork {
    pub fn from_dataset(dataset: &AirportDataset) -> Self {
        let passengers = extent(dataset.airports.iter().map(|airport| airport.passengers))
            .unwrap_or([0.0, 0.0]);
        let radius_scale = LinearScale::new(passengers, RADIUS_RANGE);

        let nodes = dataset
            .airports
            .iter()
            .map(|airport| AirportNode {
                name: airport.name.clone(),
                longitude: airport.longitude,
                latitude: airport.latitude,
                passengers: airport.passengers,
                radius: radius_scale.apply(airport.passengers) as f32,
                position: Pos2::ZERO,
                velocity: Vec2::ZERO,
                pin: None,
                rendered: Pos2::ZERO,
            })
            .collect();

        let links = dataset
            .routes
            .iter()
            .map(|&(source, target)| AirportLink {
                source: NodeId(source),
                target: NodeId(target),
            })
            .collect();

        Self {
            nodes: NodeStore { nodes },
            links,
        }
    }
}

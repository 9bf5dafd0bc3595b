use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result, anyhow};
use geo_types::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    arcs: Vec<Vec<Vec<f64>>>,
    objects: HashMap<String, GeometryObject>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct GeometryObject {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    arcs: Value,
    #[serde(default)]
    geometries: Vec<GeometryObject>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

impl GeometryObject {
    fn name(&self) -> String {
        self.properties
            .as_ref()
            .and_then(|properties| properties.get("name"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or_else(|| match &self.id {
                Some(Value::String(id)) => Some(id.clone()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct CountryFeature {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Clone, Debug)]
pub struct WorldMap {
    pub countries: Vec<CountryFeature>,
    pub borders: MultiLineString<f64>,
}

pub(super) fn parse_world(raw: &str, object_name: &str) -> Result<WorldMap> {
    let topology: Topology = serde_json::from_str(raw).context("invalid TopoJSON document")?;
    let object = topology
        .objects
        .get(object_name)
        .ok_or_else(|| anyhow!("TopoJSON has no {object_name:?} object"))?;

    let arcs = decode_arcs(&topology.arcs, topology.transform);

    let mut countries = Vec::new();
    collect_features(&arcs, object, &mut countries)?;

    let mut arc_order = Vec::new();
    let mut seen = HashSet::new();
    collect_arc_indices(object, &mut arc_order, &mut seen)?;
    let borders = arc_order
        .into_iter()
        .filter_map(|index| arcs.get(index))
        .filter(|arc| arc.len() >= 2)
        .map(|arc| LineString::new(arc.clone()))
        .collect::<Vec<_>>();

    Ok(WorldMap {
        countries,
        borders: MultiLineString::new(borders),
    })
}

fn decode_arcs(raw_arcs: &[Vec<Vec<f64>>], transform: Option<Transform>) -> Vec<Vec<Coord<f64>>> {
    raw_arcs
        .iter()
        .map(|arc| {
            let mut x = 0.0;
            let mut y = 0.0;
            arc.iter()
                .filter(|position| position.len() >= 2)
                .map(|position| match transform {
                    Some(transform) => {
                        x += position[0];
                        y += position[1];
                        Coord {
                            x: x * transform.scale[0] + transform.translate[0],
                            y: y * transform.scale[1] + transform.translate[1],
                        }
                    }
                    None => Coord {
                        x: position[0],
                        y: position[1],
                    },
                })
                .collect()
        })
        .collect()
}

/// Negative indices refer to the reversed arc `!index`.
fn arc_slot(index: i64) -> (usize, bool) {
    if index < 0 {
        ((!index) as usize, true)
    } else {
        (index as usize, false)
    }
}

fn stitch_ring(arcs: &[Vec<Coord<f64>>], indices: &[i64]) -> Result<LineString<f64>> {
    let mut points: Vec<Coord<f64>> = Vec::new();
    for &index in indices {
        let (slot, reversed) = arc_slot(index);
        let arc = arcs
            .get(slot)
            .ok_or_else(|| anyhow!("arc index {index} is out of range ({} arcs)", arcs.len()))?;

        // Consecutive arcs share their joining point.
        points.pop();
        if reversed {
            points.extend(arc.iter().rev().copied());
        } else {
            points.extend(arc.iter().copied());
        }
    }

    if let Some(&first) = points.first() {
        while points.len() < 4 {
            points.push(first);
        }
    }

    Ok(LineString::new(points))
}

fn polygon_from_rings(arcs: &[Vec<Coord<f64>>], rings: &[Vec<i64>]) -> Result<Option<Polygon<f64>>> {
    let mut rings = rings
        .iter()
        .map(|ring| stitch_ring(arcs, ring))
        .collect::<Result<Vec<_>>>()?
        .into_iter();

    let Some(exterior) = rings.next() else {
        return Ok(None);
    };

    Ok(Some(Polygon::new(exterior, rings.collect())))
}

fn collect_features(
    arcs: &[Vec<Coord<f64>>],
    object: &GeometryObject,
    features: &mut Vec<CountryFeature>,
) -> Result<()> {
    let polygons = match object.kind.as_deref() {
        Some("GeometryCollection") => {
            for geometry in &object.geometries {
                collect_features(arcs, geometry, features)?;
            }
            return Ok(());
        }
        Some("Polygon") => {
            let rings: Vec<Vec<i64>> =
                serde_json::from_value(object.arcs.clone()).context("invalid Polygon arcs")?;
            polygon_from_rings(arcs, &rings)?.into_iter().collect::<Vec<_>>()
        }
        Some("MultiPolygon") => {
            let polygons: Vec<Vec<Vec<i64>>> = serde_json::from_value(object.arcs.clone())
                .context("invalid MultiPolygon arcs")?;
            let mut collected = Vec::with_capacity(polygons.len());
            for rings in &polygons {
                if let Some(polygon) = polygon_from_rings(arcs, rings)? {
                    collected.push(polygon);
                }
            }
            collected
        }
        // Null placeholders and non-areal geometries carry no country outline.
        _ => return Ok(()),
    };

    features.push(CountryFeature {
        name: object.name(),
        geometry: MultiPolygon::new(polygons),
    });
    Ok(())
}

fn collect_arc_indices(
    object: &GeometryObject,
    order: &mut Vec<usize>,
    seen: &mut HashSet<usize>,
) -> Result<()> {
    match object.kind.as_deref() {
        Some("GeometryCollection") => {
            for geometry in &object.geometries {
                collect_arc_indices(geometry, order, seen)?;
            }
        }
        Some("LineString") => {
            let line: Vec<i64> = serde_json::from_value(object.arcs.clone())
                .context("invalid LineString arcs")?;
            push_arc_indices(&line, order, seen);
        }
        Some("MultiLineString") | Some("Polygon") => {
            let lines: Vec<Vec<i64>> =
                serde_json::from_value(object.arcs.clone()).context("invalid arcs")?;
            for line in &lines {
                push_arc_indices(line, order, seen);
            }
        }
        Some("MultiPolygon") => {
            let polygons: Vec<Vec<Vec<i64>>> = serde_json::from_value(object.arcs.clone())
                .context("invalid MultiPolygon arcs")?;
            for ring in polygons.iter().flatten() {
                push_arc_indices(ring, order, seen);
            }
        }
        _ => {}
    }
    Ok(())
}

fn push_arc_indices(indices: &[i64], order: &mut Vec<usize>, seen: &mut HashSet<usize>) {
    for &index in indices {
        let (slot, _) = arc_slot(index);
        if seen.insert(slot) {
            order.push(slot);
        }
    }
}

use eframe::egui::{Pos2, pos2};
use geo::Contains;
use geo_types::{Coord, LineString, MultiPolygon, Point};

use crate::data::WorldMap;

use super::Mercator;

pub struct ProjectedWorld {
    pub countries: Vec<ProjectedCountry>,
    pub borders: Vec<Vec<Pos2>>,
    projection: Mercator,
}

pub struct ProjectedCountry {
    pub name: String,
    pub rings: Vec<Vec<Pos2>>,
    // Unprojected, for hit testing in degrees.
    geometry: MultiPolygon<f64>,
}

fn to_pos(coord: Coord<f64>) -> Pos2 {
    pos2(coord.x as f32, coord.y as f32)
}

fn project_line(projection: &Mercator, line: &LineString<f64>) -> Vec<Pos2> {
    line.0
        .iter()
        .map(|coord| to_pos(projection.project_clipped(coord.x, coord.y)))
        .collect()
}

impl ProjectedWorld {
    pub fn new(world: &WorldMap, projection: &Mercator) -> Self {
        let countries = world
            .countries
            .iter()
            .map(|country| ProjectedCountry {
                name: country.name.clone(),
                geometry: country.geometry.clone(),
                rings: country
                    .geometry
                    .0
                    .iter()
                    .flat_map(|polygon| {
                        std::iter::once(polygon.exterior()).chain(polygon.interiors().iter())
                    })
                    .map(|ring| project_line(projection, ring))
                    .filter(|ring| ring.len() >= 3)
                    .collect(),
            })
            .collect();

        let borders = world
            .borders
            .0
            .iter()
            .map(|line| project_line(projection, line))
            .filter(|line| line.len() >= 2)
            .collect();

        Self {
            countries,
            borders,
            projection: *projection,
        }
    }

    pub fn country_at(&self, point: Pos2) -> Option<usize> {
        let location = Point::from(self.projection.invert(Coord {
            x: f64::from(point.x),
            y: f64::from(point.y),
        }));
        self.countries
            .iter()
            .position(|country| country.geometry.contains(&location))
    }

    pub fn rasterize_land(&self, width: usize, height: usize) -> Vec<bool> {
        let mut mask = vec![false; width * height];
        let mut crossings = Vec::new();

        for country in &self.countries {
            for row in 0..height {
                let y = row as f32 + 0.5;
                crossings.clear();
                for ring in &country.rings {
                    collect_crossings(ring, y, &mut crossings);
                }
                crossings.sort_by(f32::total_cmp);

                for span in crossings.chunks_exact(2) {
                    let start = (span[0] - 0.5).ceil().max(0.0) as usize;
                    let end = ((span[1] - 0.5).floor() + 1.0).clamp(0.0, width as f32) as usize;
                    if end <= start {
                        continue;
                    }
                    for cell in &mut mask[row * width + start..row * width + end] {
                        *cell = true;
                    }
                }
            }
        }

        mask
    }
}

fn ring_edges(ring: &[Pos2]) -> impl Iterator<Item = (Pos2, Pos2)> + '_ {
    ring.iter()
        .copied()
        .zip(ring.iter().copied().cycle().skip(1))
        .take(ring.len())
}

fn collect_crossings(ring: &[Pos2], y: f32, crossings: &mut Vec<f32>) {
    for (a, b) in ring_edges(ring) {
        if (a.y > y) != (b.y > y) {
            let t = (y - a.y) / (b.y - a.y);
            crossings.push(a.x + t * (b.x - a.x));
        }
    }
}

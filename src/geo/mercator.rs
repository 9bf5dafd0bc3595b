use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use geo_types::Coord;

// Keeps the poles finite; the full world is the square [-π, π]².
const CLIP_LIMIT: f64 = PI;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mercator {
    scale: f64,
    translate: [f64; 2],
}

impl Default for Mercator {
    fn default() -> Self {
        Self::new(961.0 / TAU, [480.0, 250.0])
    }
}

fn raw(longitude: f64, latitude: f64) -> (f64, f64) {
    let lambda = longitude.to_radians();
    let phi = latitude.to_radians();
    (lambda, (FRAC_PI_4 + phi / 2.0).tan().ln())
}

impl Mercator {
    pub fn new(scale: f64, translate: [f64; 2]) -> Self {
        Self { scale, translate }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> [f64; 2] {
        self.translate
    }

    pub fn fit_extent(
        extent: [[f64; 2]; 2],
        coords: impl IntoIterator<Item = Coord<f64>>,
    ) -> Option<Self> {
        let [[x0, y0], [x1, y1]] = extent;
        let mut min = [f64::INFINITY, f64::INFINITY];
        let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];

        for coord in coords {
            let (x, y) = raw(coord.x, coord.y);
            if x.is_nan() || y.is_nan() {
                continue;
            }
            let y = -y.clamp(-CLIP_LIMIT, CLIP_LIMIT);
            min[0] = min[0].min(x);
            min[1] = min[1].min(y);
            max[0] = max[0].max(x);
            max[1] = max[1].max(y);
        }

        if !min.iter().chain(max.iter()).all(|value| value.is_finite()) {
            return None;
        }

        let width = x1 - x0;
        let height = y1 - y0;
        let span_x = max[0] - min[0];
        let span_y = max[1] - min[1];
        let k = match (span_x > 0.0, span_y > 0.0) {
            (true, true) => (width / span_x).min(height / span_y),
            (true, false) => width / span_x,
            (false, true) => height / span_y,
            (false, false) => return None,
        };

        Some(Self {
            scale: k,
            translate: [
                x0 + (width - k * (max[0] + min[0])) / 2.0,
                y0 + (height - k * (max[1] + min[1])) / 2.0,
            ],
        })
    }

    pub fn project(&self, longitude: f64, latitude: f64) -> Coord<f64> {
        let (x, y) = raw(longitude, latitude);
        self.place(x, y)
    }

    pub fn project_clipped(&self, longitude: f64, latitude: f64) -> Coord<f64> {
        let (x, y) = raw(longitude, latitude);
        self.place(x, y.clamp(-CLIP_LIMIT, CLIP_LIMIT))
    }

    pub fn invert(&self, point: Coord<f64>) -> Coord<f64> {
        let x = (point.x - self.translate[0]) / self.scale;
        let y = (self.translate[1] - point.y) / self.scale;
        Coord {
            x: x.to_degrees(),
            y: (2.0 * y.exp().atan() - FRAC_PI_2).to_degrees(),
        }
    }

    fn place(&self, x: f64, y: f64) -> Coord<f64> {
        Coord {
            x: self.translate[0] + self.scale * x,
            y: self.translate[1] - self.scale * y,
        }
    }
}

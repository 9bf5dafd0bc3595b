use eframe::egui::{Pos2, Vec2, vec2};

use crate::network::AirportNode;

use super::quadtree::QuadNode;

pub(super) struct Jiggle {
    state: u64,
}

impl Jiggle {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 4_294_967_296;

    pub(super) fn new() -> Self {
        Self { state: 1 }
    }

    pub(super) fn next(&mut self) -> f32 {
        self.state = (Self::A * self.state + Self::C) % Self::M;
        let unit = self.state as f64 / Self::M as f64;
        ((unit - 0.5) * 1e-6) as f32
    }

    fn separate(&mut self, mut delta: Vec2) -> Vec2 {
        if delta.x == 0.0 {
            delta.x = self.next();
        }
        if delta.y == 0.0 {
            delta.y = self.next();
        }
        delta
    }
}

#[derive(Clone, Copy, Debug)]
pub(super) struct LinkSpring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) strength: f32,
    pub(super) bias: f32,
}

pub(super) fn apply_center(nodes: &mut [AirportNode], center: Pos2, strength: f32) {
    if nodes.is_empty() {
        return;
    }

    let mut sum = Vec2::ZERO;
    for node in nodes.iter() {
        sum += node.position.to_vec2();
    }
    let shift = (sum / nodes.len() as f32 - center.to_vec2()) * strength;
    for node in nodes.iter_mut() {
        node.position -= shift;
    }
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) alpha: f32,
    pub(super) theta_sq: f32,
    pub(super) distance_min_sq: f32,
}

fn softened(distance_sq: f32, distance_min_sq: f32) -> f32 {
    if distance_sq < distance_min_sq {
        (distance_min_sq * distance_sq).sqrt()
    } else {
        distance_sq
    }
}

fn accumulate_charge(
    quad: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    jiggle: &mut Jiggle,
    velocity: &mut Vec2,
) {
    if quad.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if quad.is_leaf() {
        for &other in &quad.indices {
            if other == index {
                continue;
            }
            let delta = jiggle.separate(positions[other] - point);
            let distance_sq = softened(delta.length_sq(), params.distance_min_sq);
            *velocity += delta * (params.strength * params.alpha / distance_sq);
        }
        return;
    }

    let delta = quad.center_of_mass - point;
    let distance_sq = delta.length_sq();
    let side = quad.bounds.side_length();
    let far_enough = !quad.bounds.contains(point) && side * side / params.theta_sq < distance_sq;

    if far_enough {
        let distance_sq = softened(distance_sq, params.distance_min_sq);
        *velocity += delta * (params.strength * quad.mass * params.alpha / distance_sq);
        return;
    }

    for child in quad.children.iter().flatten() {
        accumulate_charge(child, index, positions, params, jiggle, velocity);
    }
}

pub(super) fn apply_many_body(
    nodes: &mut [AirportNode],
    positions: &mut Vec<Vec2>,
    radii: &mut Vec<f32>,
    params: ChargeParams,
    jiggle: &mut Jiggle,
) {
    positions.clear();
    positions.extend(nodes.iter().map(|node| node.position.to_vec2()));
    radii.clear();
    radii.resize(nodes.len(), 0.0);

    let Some(tree) = QuadNode::build(positions, radii) else {
        return;
    };

    for (index, node) in nodes.iter_mut().enumerate() {
        accumulate_charge(&tree, index, positions, params, jiggle, &mut node.velocity);
    }
}

pub(super) fn apply_collide(
    nodes: &mut [AirportNode],
    positions: &mut Vec<Vec2>,
    radii: &mut Vec<f32>,
    strength: f32,
    iterations: usize,
    jiggle: &mut Jiggle,
) {
    let mut candidates = Vec::new();

    for _ in 0..iterations {
        positions.clear();
        positions.extend(
            nodes
                .iter()
                .map(|node| node.position.to_vec2() + node.velocity),
        );
        radii.clear();
        radii.extend(nodes.iter().map(|node| node.radius));

        let Some(tree) = QuadNode::build(positions, radii) else {
            return;
        };

        for index in 0..nodes.len() {
            let radius = nodes[index].radius;
            let radius_sq = radius * radius;
            let predicted = positions[index];

            candidates.clear();
            tree.visit_near(predicted, radius, &mut |other| {
                if other > index {
                    candidates.push(other);
                }
            });

            for &other in &candidates {
                let other_node = &nodes[other];
                let combined = radius + other_node.radius;
                let delta =
                    predicted - other_node.position.to_vec2() - other_node.velocity;
                if delta.length_sq() >= combined * combined {
                    continue;
                }

                let delta = jiggle.separate(delta);
                let distance = delta.length();
                let push = delta * ((combined - distance) / distance * strength);
                let other_radius_sq = other_node.radius * other_node.radius;
                let weight = other_radius_sq / (radius_sq + other_radius_sq);

                nodes[index].velocity += push * weight;
                nodes[other].velocity -= push * (1.0 - weight);
            }
        }
    }
}

pub(super) fn apply_links(
    nodes: &mut [AirportNode],
    springs: &[LinkSpring],
    distance: f32,
    alpha: f32,
    jiggle: &mut Jiggle,
) {
    for spring in springs {
        let (Some(source), Some(target)) = (nodes.get(spring.source), nodes.get(spring.target))
        else {
            continue;
        };

        let delta = (target.position.to_vec2() + target.velocity)
            - (source.position.to_vec2() + source.velocity);
        let delta = jiggle.separate(delta);
        let length = delta.length();
        let correction = delta * ((length - distance) / length * alpha * spring.strength);

        nodes[spring.target].velocity -= correction * spring.bias;
        nodes[spring.source].velocity += correction * (1.0 - spring.bias);
    }
}

/// Per-link strength and bias from endpoint degrees, so hubs move less.
pub(super) fn link_springs(node_count: usize, links: &[(usize, usize)]) -> Vec<LinkSpring> {
    let mut degree = vec![0usize; node_count];
    for &(source, target) in links {
        if source < node_count && target < node_count {
            degree[source] += 1;
            degree[target] += 1;
        }
    }

    links
        .iter()
        .filter(|&&(source, target)| source < node_count && target < node_count)
        .map(|&(source, target)| {
            let source_degree = degree[source] as f32;
            let target_degree = degree[target] as f32;
            LinkSpring {
                source,
                target,
                strength: 1.0 / source_degree.min(target_degree),
                bias: source_degree / (source_degree + target_degree),
            }
        })
        .collect()
}

pub(super) fn phyllotaxis(index: usize) -> Pos2 {
    const INITIAL_RADIUS: f32 = 10.0;
    let angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
    let turn = index as f32 * angle;
    Pos2::ZERO + vec2(radius * turn.cos(), radius * turn.sin())
}

mod forces;
mod quadtree;

use eframe::egui::{Pos2, Vec2};
use tracing::debug;

use crate::network::{AirportLink, AirportNode};
use forces::{
    ChargeParams, Jiggle, LinkSpring, apply_center, apply_collide, apply_links, apply_many_body,
    link_springs, phyllotaxis,
};

const ALPHA_MIN: f32 = 0.001;
const ALPHA_TICKS_TO_MIN: f32 = 300.0;
const VELOCITY_DECAY: f32 = 0.4;
const CHARGE_STRENGTH: f32 = -10.0;
const BARNES_HUT_THETA: f32 = 0.9;
const COLLIDE_STRENGTH: f32 = 1.0;
const COLLIDE_ITERATIONS: usize = 3;
const LINK_DISTANCE: f32 = 30.0;

pub struct Simulation {
    alpha: f32,
    alpha_min: f32,
    alpha_decay: f32,
    alpha_target: f32,
    velocity_decay: f32,
    center: Pos2,
    springs: Vec<LinkSpring>,
    running: bool,
    jiggle: Jiggle,
    scratch_positions: Vec<Vec2>,
    scratch_radii: Vec<f32>,
}

impl Simulation {
    pub fn new(nodes: &mut [AirportNode], links: &[AirportLink], center: Pos2) -> Self {
        for (index, node) in nodes.iter_mut().enumerate() {
            node.position = phyllotaxis(index);
            node.velocity = Vec2::ZERO;
        }

        let edges = links
            .iter()
            .map(|link| (link.source.index(), link.target.index()))
            .collect::<Vec<_>>();

        Self {
            alpha: 1.0,
            alpha_min: ALPHA_MIN,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / ALPHA_TICKS_TO_MIN),
            alpha_target: 0.0,
            velocity_decay: 1.0 - VELOCITY_DECAY,
            center,
            springs: link_springs(nodes.len(), &edges),
            running: true,
            jiggle: Jiggle::new(),
            scratch_positions: Vec::new(),
            scratch_radii: Vec::new(),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_alpha_target(&mut self, alpha_target: f32) {
        self.alpha_target = alpha_target.clamp(0.0, 1.0);
    }

    pub fn restart(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn step(&mut self, nodes: &mut [AirportNode]) -> bool {
        if !self.running {
            return false;
        }

        self.tick(nodes);
        if self.alpha < self.alpha_min {
            self.running = false;
            debug!(alpha = self.alpha, "simulation settled");
        }
        true
    }

    pub fn tick(&mut self, nodes: &mut [AirportNode]) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        apply_center(nodes, self.center, 1.0);
        apply_many_body(
            nodes,
            &mut self.scratch_positions,
            &mut self.scratch_radii,
            ChargeParams {
                strength: CHARGE_STRENGTH,
                alpha,
                theta_sq: BARNES_HUT_THETA * BARNES_HUT_THETA,
                distance_min_sq: 1.0,
            },
            &mut self.jiggle,
        );
        apply_collide(
            nodes,
            &mut self.scratch_positions,
            &mut self.scratch_radii,
            COLLIDE_STRENGTH,
            COLLIDE_ITERATIONS,
            &mut self.jiggle,
        );
        apply_links(nodes, &self.springs, LINK_DISTANCE, alpha, &mut self.jiggle);

        for node in nodes.iter_mut() {
            match node.pin {
                Some(pin) => {
                    node.position = pin;
                    node.velocity = Vec2::ZERO;
                }
                None => {
                    node.velocity *= self.velocity_decay;
                    node.position += node.velocity;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{AirportNetwork, NodeId};
    use crate::network::tests::dataset;

    fn triangle() -> AirportNetwork {
        AirportNetwork::from_dataset(&dataset(
            &[
                ("A", 0.0, 0.0, 100.0),
                ("B", 1.0, 1.0, 500.0),
                ("C", 2.0, 2.0, 900.0),
            ],
            &[(0, 1), (1, 2), (2, 0)],
        ))
    }

    #[test]
    fn cools_down_and_stops_on_its_own() {
        let mut network = triangle();
        let mut simulation =
            Simulation::new(network.nodes.as_mut_slice(), &network.links, Pos2::new(450.0, 300.0));

        let mut ticks = 0;
        while simulation.step(network.nodes.as_mut_slice()) {
            ticks += 1;
            assert!(ticks < 1000, "simulation never settled");
        }

        assert!(!simulation.is_running());
        assert!(simulation.alpha() < ALPHA_MIN);
        // d3's default decay reaches alpha_min after about 300 ticks.
        assert!((290..=310).contains(&ticks));
    }

    #[test]
    fn settled_layout_is_centred_and_links_near_rest_length() {
        let mut network = triangle();
        let center = Pos2::new(450.0, 300.0);
        let mut simulation = Simulation::new(network.nodes.as_mut_slice(), &network.links, center);
        while simulation.step(network.nodes.as_mut_slice()) {}

        let mean = network
            .nodes
            .iter()
            .fold(Vec2::ZERO, |sum, node| sum + node.position.to_vec2())
            / network.nodes.len() as f32;
        assert!((mean - center.to_vec2()).length() < 1.0);

        for link in &network.links {
            let (source, target) = network.nodes.resolve(*link).unwrap();
            let length = source.position.distance(target.position);
            assert!(length > 15.0 && length < 60.0, "link length {length}");
        }
    }

    #[test]
    fn pinned_nodes_stay_on_their_pin() {
        let mut network = triangle();
        let mut simulation =
            Simulation::new(network.nodes.as_mut_slice(), &network.links, Pos2::new(450.0, 300.0));
        let pin = Pos2::new(10.0, 20.0);
        network.nodes.as_mut_slice()[0].pin = Some(pin);

        for _ in 0..5 {
            simulation.tick(network.nodes.as_mut_slice());
        }
        assert_eq!(network.nodes.get(NodeId(0)).unwrap().position, pin);
        assert_eq!(network.nodes.get(NodeId(0)).unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn stopped_simulation_does_not_move_nodes() {
        let mut network = triangle();
        let mut simulation =
            Simulation::new(network.nodes.as_mut_slice(), &network.links, Pos2::new(450.0, 300.0));
        simulation.stop();
        let before = network.nodes.get(NodeId(1)).unwrap().position;
        assert!(!simulation.step(network.nodes.as_mut_slice()));
        assert_eq!(network.nodes.get(NodeId(1)).unwrap().position, before);
    }

    #[test]
    fn warm_alpha_target_keeps_it_running() {
        let mut network = triangle();
        let mut simulation =
            Simulation::new(network.nodes.as_mut_slice(), &network.links, Pos2::new(450.0, 300.0));
        simulation.set_alpha_target(0.3);
        for _ in 0..2000 {
            assert!(simulation.step(network.nodes.as_mut_slice()));
        }
        assert!((simulation.alpha() - 0.3).abs() < 1e-3);
    }
}

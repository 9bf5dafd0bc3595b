mod transition;

use std::collections::BTreeSet;

use eframe::egui::{Pos2, Vec2, pos2, vec2};
use tracing::{debug, info, warn};

use crate::geo::Mercator;
use crate::network::{AirportLink, AirportNetwork, AirportNode, NodeId, NodeStore};
use crate::physics::Simulation;
pub use transition::{TRANSITION_SECONDS, TransitionToken};
use transition::{Fade, Tween};

pub const VIEWPORT: Vec2 = vec2(900.0, 600.0);

const DRAG_ALPHA_TARGET: f32 = 0.3;
const RESUME_ALPHA: f32 = 0.2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutMode {
    #[default]
    Force,
    Map,
}

impl LayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Force => "Force",
            Self::Map => "Map",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayoutEvent {
    ModeSelected(LayoutMode),
    DragStarted(NodeId),
    Dragged(NodeId, Pos2),
    DragEnded(NodeId),
    Frame,
}

#[derive(Clone, Copy, Debug)]
struct ScheduledResume {
    token: TransitionToken,
    due: f64,
}

pub struct LayoutController {
    mode: LayoutMode,
    network: AirportNetwork,
    simulation: Simulation,
    projection: Mercator,
    viewport: Vec2,
    token: TransitionToken,
    tween: Option<Tween>,
    country_fade: Fade,
    scheduled: Vec<ScheduledResume>,
    dragging: BTreeSet<NodeId>,
}

fn clamp_into(position: Pos2, radius: f32, viewport: Vec2) -> Pos2 {
    pos2(
        position.x.min(viewport.x - radius).max(radius),
        position.y.min(viewport.y - radius).max(radius),
    )
}

impl LayoutController {
    pub fn new(mut network: AirportNetwork, projection: Mercator) -> Self {
        let viewport = VIEWPORT;
        let center = (viewport * 0.5).to_pos2();
        if network.nodes.is_empty() {
            warn!("airport network has no nodes");
        }
        let simulation = Simulation::new(network.nodes.as_mut_slice(), &network.links, center);
        for node in network.nodes.iter_mut() {
            node.rendered = clamp_into(node.position, node.radius, viewport);
        }

        Self {
            mode: LayoutMode::Force,
            network,
            simulation,
            projection,
            viewport,
            token: TransitionToken::default(),
            tween: None,
            country_fade: Fade::hidden(),
            scheduled: Vec::new(),
            dragging: BTreeSet::new(),
        }
    }

    /// Returns whether another frame is needed.
    pub fn handle(&mut self, event: LayoutEvent, now: f64) -> bool {
        match event {
            LayoutEvent::ModeSelected(mode) => {
                self.set_mode(mode, now);
                true
            }
            LayoutEvent::DragStarted(id) => self.drag_start(id),
            LayoutEvent::Dragged(id, pointer) => self.drag(id, pointer),
            LayoutEvent::DragEnded(id) => self.drag_end(id),
            LayoutEvent::Frame => self.advance(now),
        }
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    #[cfg(test)]
    pub fn token(&self) -> TransitionToken {
        self.token
    }

    pub fn nodes(&self) -> &NodeStore {
        &self.network.nodes
    }

    pub fn links(&self) -> &[AirportLink] {
        &self.network.links
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn projection(&self) -> &Mercator {
        &self.projection
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn country_opacity(&self, now: f64) -> f32 {
        self.country_fade.value(now)
    }

    pub fn link_endpoints(&self, link: AirportLink) -> Option<(Pos2, Pos2)> {
        let (source, target) = self.network.nodes.resolve(link)?;
        Some((source.rendered, target.rendered))
    }

    pub fn node_at(&self, point: Pos2) -> Option<NodeId> {
        self.network
            .nodes
            .ids()
            .zip(self.network.nodes.iter())
            .filter(|(_, node)| node.rendered.distance(point) <= node.radius)
            .last()
            .map(|(id, _)| id)
    }

    pub fn set_mode(&mut self, mode: LayoutMode, now: f64) {
        self.mode = mode;
        self.token = self.token.next();
        info!(mode = mode.label(), token = self.token.raw(), "layout mode selected");

        let from = self
            .network
            .nodes
            .iter()
            .map(|node| node.rendered)
            .collect::<Vec<_>>();

        let to = match mode {
            LayoutMode::Map => {
                self.release_drags();
                self.simulation.stop();
                self.country_fade = self.country_fade.retarget(1.0, now, TRANSITION_SECONDS);

                let projection = self.projection;
                self.network
                    .nodes
                    .iter_mut()
                    .map(|node| {
                        let projected = projection.project(node.longitude, node.latitude);
                        let pin = pos2(projected.x as f32, projected.y as f32);
                        node.pin = Some(pin);
                        pin
                    })
                    .collect::<Vec<_>>()
            }
            LayoutMode::Force => {
                let viewport = self.viewport;
                let targets = self
                    .network
                    .nodes
                    .iter_mut()
                    .map(|node| {
                        node.pin = None;
                        clamp_into(node.position, node.radius, viewport)
                    })
                    .collect::<Vec<_>>();

                self.scheduled.push(ScheduledResume {
                    token: self.token,
                    due: now + TRANSITION_SECONDS,
                });
                targets
            }
        };

        self.tween = Some(Tween::new(now, TRANSITION_SECONDS, from, to));
    }

    pub fn drag_start(&mut self, id: NodeId) -> bool {
        if self.mode != LayoutMode::Force {
            return false;
        }
        let Some(node) = self.network.nodes.get_mut(id) else {
            return false;
        };

        node.pin = Some(node.position);
        if self.dragging.is_empty() {
            self.simulation.set_alpha_target(DRAG_ALPHA_TARGET);
            self.simulation.restart();
        }
        self.dragging.insert(id);
        debug!(node = %id, "drag started");
        true
    }

    pub fn drag(&mut self, id: NodeId, pointer: Pos2) -> bool {
        if self.mode != LayoutMode::Force || !self.dragging.contains(&id) {
            return false;
        }
        let Some(node) = self.network.nodes.get_mut(id) else {
            return false;
        };

        node.pin = Some(pointer);
        true
    }

    pub fn drag_end(&mut self, id: NodeId) -> bool {
        if !self.dragging.remove(&id) {
            return false;
        }

        if self.dragging.is_empty() {
            self.simulation.set_alpha_target(0.0);
        }
        if let Some(node) = self.network.nodes.get_mut(id) {
            node.pin = None;
        }
        debug!(node = %id, "drag ended");
        true
    }

    fn release_drags(&mut self) {
        if self.dragging.is_empty() {
            return;
        }

        debug!(count = self.dragging.len(), "cancelling drags for map layout");
        self.dragging.clear();
        self.simulation.set_alpha_target(0.0);
    }

    fn run_scheduled(&mut self, now: f64) {
        let current = self.token;
        let mut index = 0;
        while index < self.scheduled.len() {
            let scheduled = self.scheduled[index];
            if scheduled.due > now {
                index += 1;
                continue;
            }

            self.scheduled.swap_remove(index);
            if scheduled.token != current {
                debug!(
                    token = scheduled.token.raw(),
                    current = current.raw(),
                    "discarding stale layout resume"
                );
                continue;
            }

            self.simulation.set_alpha(RESUME_ALPHA);
            self.simulation.restart();
            self.country_fade = self
                .country_fade
                .retarget(0.0, scheduled.due, TRANSITION_SECONDS);
            debug!(token = scheduled.token.raw(), "force layout resumed");
        }
    }

    fn resting_position(mode: LayoutMode, node: &AirportNode, viewport: Vec2) -> Pos2 {
        match (mode, node.pin) {
            (LayoutMode::Map, Some(pin)) => pin,
            (LayoutMode::Force, Some(pin)) => clamp_into(pin, node.radius, viewport),
            _ => clamp_into(node.position, node.radius, viewport),
        }
    }

    pub fn advance(&mut self, now: f64) -> bool {
        self.run_scheduled(now);
        let ticked = self.simulation.step(self.network.nodes.as_mut_slice());

        if self.tween.as_ref().is_some_and(|tween| tween.is_finished(now)) {
            self.tween = None;
        }

        let mode = self.mode;
        let viewport = self.viewport;
        let tween = self.tween.as_ref();
        for (index, node) in self.network.nodes.iter_mut().enumerate() {
            // A dragged node follows the pointer, not the transition.
            let dragged = mode == LayoutMode::Force && node.pin.is_some();
            node.rendered = tween
                .filter(|_| !dragged)
                .and_then(|tween| tween.sample(index, now))
                .unwrap_or_else(|| Self::resting_position(mode, node, viewport));
        }

        ticked
            || self.tween.is_some()
            || !self.scheduled.is_empty()
            || !self.country_fade.is_finished(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::tests::dataset;

    const EPSILON: f32 = 1e-3;

    fn projection() -> Mercator {
        Mercator::new(600.0 / std::f64::consts::TAU, [450.0, 300.0])
    }

    fn controller() -> LayoutController {
        let network = AirportNetwork::from_dataset(&dataset(
            &[
                ("Null Island", 0.0, 0.0, 100.0),
                ("Amsterdam", 4.76, 52.31, 900.0),
                ("Sydney", 151.18, -33.95, 500.0),
            ],
            &[(0, 1), (1, 2)],
        ));
        LayoutController::new(network, projection())
    }

    fn projected(node: &AirportNode) -> Pos2 {
        let point = projection().project(node.longitude, node.latitude);
        pos2(point.x as f32, point.y as f32)
    }

    fn settle(controller: &mut LayoutController, mut now: f64, until: f64) -> f64 {
        while now < until {
            now += 1.0 / 60.0;
            controller.advance(now);
        }
        now
    }

    fn assert_links_follow_nodes(controller: &LayoutController) {
        for &link in controller.links() {
            let (start, end) = controller.link_endpoints(link).unwrap();
            let (source, target) = controller.nodes().resolve(link).unwrap();
            assert_eq!(start, source.rendered);
            assert_eq!(end, target.rendered);
        }
    }

    #[test]
    fn map_mode_pins_and_renders_every_node_at_its_projection() {
        let mut controller = controller();
        settle(&mut controller, 0.0, 1.0);

        controller.set_mode(LayoutMode::Map, 1.0);
        assert!(!controller.simulation().is_running());
        for node in controller.nodes().iter() {
            assert_eq!(node.pin, Some(projected(node)));
        }

        settle(&mut controller, 1.0, 1.0 + TRANSITION_SECONDS + 0.1);
        for node in controller.nodes().iter() {
            assert!(node.rendered.distance(projected(node)) < EPSILON);
        }
    }

    #[test]
    fn origin_airport_lands_on_the_projection_translate() {
        let mut controller = controller();
        controller.set_mode(LayoutMode::Map, 0.0);
        settle(&mut controller, 0.0, 1.0);

        let origin = controller.nodes().get(NodeId(0)).unwrap();
        let [tx, ty] = controller.projection().translate();
        assert!((origin.rendered.x - tx as f32).abs() < EPSILON);
        assert!((origin.rendered.y - ty as f32).abs() < EPSILON);
    }

    #[test]
    fn force_mode_clears_pins_and_resumes_after_the_transition() {
        let mut controller = controller();
        controller.set_mode(LayoutMode::Map, 0.0);
        let now = settle(&mut controller, 0.0, 1.0);

        controller.set_mode(LayoutMode::Force, now);
        assert!(controller.nodes().iter().all(|node| node.pin.is_none()));
        assert!(!controller.simulation().is_running());

        controller.advance(now + TRANSITION_SECONDS / 2.0);
        assert!(!controller.simulation().is_running());

        controller.advance(now + TRANSITION_SECONDS);
        assert!(controller.simulation().is_running());

        settle(&mut controller, now + TRANSITION_SECONDS, now + 20.0);
        assert!(controller.nodes().iter().all(|node| node.pin.is_none()));
        assert!(!controller.simulation().is_running());
    }

    #[test]
    fn force_transition_returns_to_the_free_positions() {
        let mut controller = controller();
        let now = settle(&mut controller, 0.0, 1.0);
        let free = controller
            .nodes()
            .iter()
            .map(|node| clamp_into(node.position, node.radius, VIEWPORT))
            .collect::<Vec<_>>();

        controller.set_mode(LayoutMode::Map, now);
        controller.set_mode(LayoutMode::Force, now + 0.2);
        controller.advance(now + 0.2 + TRANSITION_SECONDS - 0.001);
        // The simulation is still paused, so the free positions have not moved.
        for (node, free) in controller.nodes().iter().zip(&free) {
            assert!(node.rendered.distance(*free) < 0.5);
        }
    }

    #[test]
    fn map_round_trip_reproduces_the_same_pins() {
        let mut controller = controller();
        controller.set_mode(LayoutMode::Map, 0.0);
        let first = controller.nodes().iter().map(|node| node.pin).collect::<Vec<_>>();

        let now = settle(&mut controller, 0.0, 1.0);
        controller.set_mode(LayoutMode::Force, now);
        let now = settle(&mut controller, now, now + 3.0);
        controller.set_mode(LayoutMode::Map, now);

        let second = controller.nodes().iter().map(|node| node.pin).collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn link_endpoints_track_rendered_nodes_every_frame() {
        let mut controller = controller();
        let mut now = 0.0;
        for step in 0..120 {
            if step == 30 {
                controller.handle(LayoutEvent::ModeSelected(LayoutMode::Map), now);
            }
            if step == 60 {
                controller.handle(LayoutEvent::ModeSelected(LayoutMode::Force), now);
            }
            now += 1.0 / 60.0;
            controller.handle(LayoutEvent::Frame, now);
            assert_links_follow_nodes(&controller);
        }
    }

    #[test]
    fn stale_resume_is_discarded_after_a_quick_toggle() {
        let mut controller = controller();
        controller.set_mode(LayoutMode::Map, 0.0);
        controller.set_mode(LayoutMode::Force, 0.1);
        controller.set_mode(LayoutMode::Map, 0.2);

        settle(&mut controller, 0.2, 2.0);
        assert_eq!(controller.mode(), LayoutMode::Map);
        assert!(!controller.simulation().is_running());
        assert!(controller.nodes().iter().all(|node| node.pin.is_some()));
        assert!((controller.country_opacity(2.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn reselecting_the_active_mode_replays_the_transition() {
        let mut controller = controller();
        controller.set_mode(LayoutMode::Map, 0.0);
        let token = controller.token();
        controller.set_mode(LayoutMode::Map, 0.1);
        assert!(controller.token() > token);
        assert!(controller.handle(LayoutEvent::Frame, 0.2));
    }

    #[test]
    fn countries_fade_in_for_the_map_and_out_after_returning() {
        let mut controller = controller();
        assert_eq!(controller.country_opacity(0.0), 0.0);

        controller.set_mode(LayoutMode::Map, 0.0);
        assert!((controller.country_opacity(TRANSITION_SECONDS) - 1.0).abs() < EPSILON);

        controller.set_mode(LayoutMode::Force, 1.0);
        controller.advance(1.0 + TRANSITION_SECONDS / 2.0);
        assert!((controller.country_opacity(1.0 + TRANSITION_SECONDS / 2.0) - 1.0).abs() < EPSILON);

        controller.advance(1.0 + TRANSITION_SECONDS);
        let end = 1.0 + 2.0 * TRANSITION_SECONDS;
        assert!(controller.country_opacity(end).abs() < EPSILON);
    }

    #[test]
    fn dragged_node_follows_the_pointer_and_is_released() {
        let mut controller = controller();
        let now = settle(&mut controller, 0.0, 6.0);
        assert!(!controller.simulation().is_running());

        let id = NodeId(1);
        assert!(controller.handle(LayoutEvent::DragStarted(id), now));
        assert!(controller.simulation().is_running());
        assert_eq!(controller.simulation().alpha_target(), DRAG_ALPHA_TARGET);
        let node = controller.nodes().get(id).unwrap();
        assert_eq!(node.pin, Some(node.position));

        for pointer in [pos2(100.0, 120.0), pos2(140.0, 160.0), pos2(200.0, 80.0)] {
            controller.handle(LayoutEvent::Dragged(id, pointer), now);
            assert_eq!(controller.nodes().get(id).unwrap().pin, Some(pointer));
            controller.advance(now + 0.016);
            assert_eq!(controller.nodes().get(id).unwrap().position, pointer);
        }

        controller.handle(LayoutEvent::DragEnded(id), now);
        assert_eq!(controller.nodes().get(id).unwrap().pin, None);
        assert_eq!(controller.simulation().alpha_target(), 0.0);
    }

    #[test]
    fn overlapping_drags_keep_the_simulation_warm_until_the_last_ends() {
        let mut controller = controller();
        assert!(controller.drag_start(NodeId(0)));
        assert!(controller.drag_start(NodeId(2)));

        controller.drag_end(NodeId(0));
        assert_eq!(controller.simulation().alpha_target(), DRAG_ALPHA_TARGET);
        assert!(controller.nodes().get(NodeId(2)).unwrap().pin.is_some());

        controller.drag_end(NodeId(2));
        assert_eq!(controller.simulation().alpha_target(), 0.0);
    }

    #[test]
    fn dragging_is_ignored_in_map_mode() {
        let mut controller = controller();
        controller.set_mode(LayoutMode::Map, 0.0);
        let pin = controller.nodes().get(NodeId(1)).unwrap().pin;

        assert!(!controller.drag_start(NodeId(1)));
        assert!(!controller.drag(NodeId(1), pos2(5.0, 5.0)));
        assert!(!controller.drag_end(NodeId(1)));
        assert_eq!(controller.nodes().get(NodeId(1)).unwrap().pin, pin);
    }

    #[test]
    fn dragged_node_leaves_the_return_transition() {
        let mut controller = controller();
        controller.set_mode(LayoutMode::Map, 0.0);
        settle(&mut controller, 0.0, 1.0);
        controller.set_mode(LayoutMode::Force, 1.0);

        let id = NodeId(1);
        let pointer = pos2(100.0, 100.0);
        assert!(controller.handle(LayoutEvent::DragStarted(id), 1.05));
        assert!(controller.handle(LayoutEvent::Dragged(id, pointer), 1.05));
        controller.advance(1.1);

        assert_eq!(controller.nodes().get(id).unwrap().rendered, pointer);
        // The rest are still mid-transition.
        let other = controller.nodes().get(NodeId(2)).unwrap();
        assert_ne!(other.rendered, clamp_into(other.position, other.radius, VIEWPORT));
        assert_links_follow_nodes(&controller);
    }

    #[test]
    fn rejected_drags_do_not_ask_for_a_frame() {
        let mut controller = controller();
        assert!(!controller.handle(LayoutEvent::DragEnded(NodeId(0)), 0.0));
        assert!(!controller.handle(LayoutEvent::Dragged(NodeId(0), pos2(5.0, 5.0)), 0.0));

        controller.set_mode(LayoutMode::Map, 0.0);
        assert!(!controller.handle(LayoutEvent::DragStarted(NodeId(0)), 0.1));
        assert!(controller.handle(LayoutEvent::ModeSelected(LayoutMode::Force), 0.2));
    }

    #[test]
    fn switching_to_map_cancels_an_active_drag() {
        let mut controller = controller();
        controller.drag_start(NodeId(1));
        controller.set_mode(LayoutMode::Map, 0.0);
        let pin = controller.nodes().get(NodeId(1)).unwrap().pin;

        assert!(!controller.drag(NodeId(1), pos2(5.0, 5.0)));
        assert!(!controller.drag_end(NodeId(1)));
        assert_eq!(controller.nodes().get(NodeId(1)).unwrap().pin, pin);
    }

    #[test]
    fn force_layout_keeps_circles_inside_the_viewport() {
        let mut controller = controller();
        settle(&mut controller, 0.0, 2.0);
        for node in controller.nodes().iter() {
            assert!(node.rendered.x >= node.radius && node.rendered.x <= VIEWPORT.x - node.radius);
            assert!(node.rendered.y >= node.radius && node.rendered.y <= VIEWPORT.y - node.radius);
        }
    }

    #[test]
    fn hit_testing_uses_rendered_circles() {
        let mut controller = controller();
        controller.set_mode(LayoutMode::Map, 0.0);
        settle(&mut controller, 0.0, 1.0);

        let amsterdam = controller.nodes().get(NodeId(1)).unwrap().rendered;
        assert_eq!(controller.node_at(amsterdam + vec2(2.0, 0.0)), Some(NodeId(1)));
        assert_eq!(controller.node_at(pos2(-50.0, -50.0)), None);
    }
}

use eframe::egui::{PointerButton, Pos2, Rect, Response};

use crate::layout::{LayoutEvent, LayoutMode};
use crate::network::NodeId;

use super::super::ViewModel;
use super::super::render_utils::screen_to_viewport;

impl ViewModel {
    pub(in crate::app) fn handle_node_drag(&mut self, response: &Response, rect: Rect, now: f64) {
        if response.drag_started_by(PointerButton::Primary)
            && self.controller.mode() == LayoutMode::Force
            && let Some(pointer) = response.interact_pointer_pos()
            && let Some(id) = self.controller.node_at(screen_to_viewport(rect, pointer))
        {
            self.dragging = Some(id);
            self.controller.handle(LayoutEvent::DragStarted(id), now);
        }

        let Some(id) = self.dragging else {
            return;
        };

        if response.dragged()
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.controller
                .handle(LayoutEvent::Dragged(id, screen_to_viewport(rect, pointer)), now);
        }

        if response.drag_stopped() {
            self.dragging = None;
            self.controller.handle(LayoutEvent::DragEnded(id), now);
        }
    }

    pub(in crate::app) fn hovered_node(&self, pointer: Option<Pos2>) -> Option<NodeId> {
        self.dragging
            .or_else(|| pointer.and_then(|point| self.controller.node_at(point)))
    }

    /// Countries only respond once the map has mostly faded in.
    pub(in crate::app) fn hovered_country(&self, pointer: Option<Pos2>, opacity: f32) -> Option<usize> {
        if opacity < 0.5 {
            return None;
        }
        pointer.and_then(|point| self.world.country_at(point))
    }
}

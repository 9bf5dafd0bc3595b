use eframe::egui::{
    self, Align2, Color32, Context, CursorIcon, FontId, Painter, Rect, Sense, Shape, Stroke,
    TextureOptions, Ui, pos2, vec2,
};
use geo_types::Coord;

use crate::layout::{LayoutEvent, LayoutMode};
use crate::util::format_count;

use super::super::ViewModel;
use super::super::render_utils::{
    BORDER, LAND, LINK, NODE, NODE_HOVERED, draw_background, land_image, screen_to_viewport,
    viewport_to_screen, with_opacity,
};

impl ViewModel {
    fn ensure_land_texture(&mut self, ctx: &Context) -> egui::TextureId {
        let viewport = self.controller.viewport();
        let world = &self.world;
        self.land_texture
            .get_or_insert_with(|| {
                let mask = world.rasterize_land(viewport.x as usize, viewport.y as usize);
                ctx.load_texture("land-mask", land_image(&mask, viewport), TextureOptions::LINEAR)
            })
            .id()
    }

    fn draw_countries(
        &mut self,
        ctx: &Context,
        painter: &Painter,
        rect: Rect,
        opacity: f32,
        hovered_country: Option<usize>,
    ) {
        let texture = self.ensure_land_texture(ctx);
        painter.image(
            texture,
            rect,
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            with_opacity(LAND, opacity),
        );

        let border = Stroke::new(0.6, with_opacity(BORDER, opacity * 0.7));
        for line in &self.world.borders {
            let points = line
                .iter()
                .map(|&point| viewport_to_screen(rect, point))
                .collect::<Vec<_>>();
            painter.add(Shape::line(points, border));
        }

        if let Some(country) = hovered_country.and_then(|index| self.world.countries.get(index)) {
            let outline = Stroke::new(1.4, with_opacity(Color32::from_rgb(245, 206, 93), opacity));
            for ring in &country.rings {
                let points = ring
                    .iter()
                    .map(|&point| viewport_to_screen(rect, point))
                    .collect::<Vec<_>>();
                painter.add(Shape::closed_line(points, outline));
            }
        }
    }

    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui, now: f64) {
        let viewport = self.controller.viewport();
        let available = ui.available_rect_before_wrap();
        let rect = Rect::from_center_size(available.center(), viewport);
        let response = ui.allocate_rect(rect, Sense::click_and_drag());

        self.handle_node_drag(&response, rect, now);
        let animating = self.controller.handle(LayoutEvent::Frame, now);

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        let pointer = response.hover_pos().map(|pointer| screen_to_viewport(rect, pointer));
        let hovered_node = self.hovered_node(pointer);
        let opacity = self.controller.country_opacity(now);
        let hovered_country = if hovered_node.is_none() {
            self.hovered_country(pointer, opacity)
        } else {
            None
        };

        if opacity > 0.0 {
            self.draw_countries(ui.ctx(), &painter, rect, opacity, hovered_country);
        }

        let link_stroke = Stroke::new(1.0, with_opacity(LINK, 0.8));
        for link in self.controller.links() {
            if let Some((start, end)) = self.controller.link_endpoints(*link) {
                painter.line_segment(
                    [viewport_to_screen(rect, start), viewport_to_screen(rect, end)],
                    link_stroke,
                );
            }
        }

        let node_stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190));
        for (id, node) in self.controller.nodes().ids().zip(self.controller.nodes().iter()) {
            let position = viewport_to_screen(rect, node.rendered);
            let color = if hovered_node == Some(id) {
                NODE_HOVERED
            } else {
                NODE
            };
            painter.circle_filled(position, node.radius, color);
            painter.circle_stroke(position, node.radius, node_stroke);
        }

        let panel_text = if let Some(node) = hovered_node.and_then(|id| self.controller.nodes().get(id)) {
            Some(format!(
                "{}  |  {} passengers",
                node.name,
                format_count(node.passengers)
            ))
        } else if let Some(country) = hovered_country.and_then(|index| self.world.countries.get(index))
        {
            let location = pointer.map(|point| {
                self.controller.projection().invert(Coord {
                    x: f64::from(point.x),
                    y: f64::from(point.y),
                })
            });
            Some(match location {
                Some(location) => format!(
                    "{}  |  {:.1}°, {:.1}°",
                    country.name, location.y, location.x
                ),
                None => country.name.clone(),
            })
        } else {
            None
        };

        if let Some(panel_text) = panel_text {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if self.dragging.is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if hovered_node.is_some() && self.controller.mode() == LayoutMode::Force {
            ui.ctx().set_cursor_icon(CursorIcon::Grab);
        }

        if animating || self.dragging.is_some() {
            ui.ctx().request_repaint();
        }
    }
}

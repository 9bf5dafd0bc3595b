use eframe::egui::{self, Align, Context, Layout};
use tracing::{info, warn};

use crate::data::Datasets;
use crate::geo::{Mercator, ProjectedWorld};
use crate::layout::{LayoutController, LayoutEvent, LayoutMode, VIEWPORT};
use crate::network::AirportNetwork;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(datasets: Datasets) -> Self {
        let extent = [[0.0, 0.0], [f64::from(VIEWPORT.x), f64::from(VIEWPORT.y)]];
        let coords = datasets
            .world
            .countries
            .iter()
            .flat_map(|country| country.geometry.0.iter())
            .flat_map(|polygon| polygon.exterior().0.iter().copied());
        let projection = Mercator::fit_extent(extent, coords).unwrap_or_else(|| {
            warn!("world map has no usable coordinates, using the default projection");
            Mercator::default()
        });
        info!(
            scale = projection.scale(),
            translate = ?projection.translate(),
            "map projection fitted"
        );

        let network = AirportNetwork::from_dataset(&datasets.airports);
        let world = ProjectedWorld::new(&datasets.world, &projection);

        Self {
            controller: LayoutController::new(network, projection),
            world,
            land_texture: None,
            dragging: None,
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        let now = ctx.input(|input| input.time);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("airport-atlas");
                    ui.separator();

                    let current = self.controller.mode();
                    let mut selected = current;
                    for mode in [LayoutMode::Force, LayoutMode::Map] {
                        ui.radio_value(&mut selected, mode, mode.label());
                    }
                    if selected != current {
                        self.dragging = None;
                        self.controller.handle(LayoutEvent::ModeSelected(selected), now);
                    }

                    ui.separator();
                    ui.label(format!("airports: {}", self.controller.nodes().len()));
                    ui.label(format!("routes: {}", self.controller.links().len()));
                    ui.label(format!("countries: {}", self.world.countries.len()));

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let simulation = self.controller.simulation();
                        if simulation.is_running() {
                            ui.label(format!(
                                "alpha {:.3} → {:.2}",
                                simulation.alpha(),
                                simulation.alpha_target()
                            ));
                        } else {
                            ui.label("settled");
                        }
                    });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| self.draw_canvas(ui, now));
    }
}

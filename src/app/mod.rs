use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, TextureHandle};
use tracing::{error, info};

use crate::data::{Datasets, load_datasets};
use crate::geo::ProjectedWorld;
use crate::layout::LayoutController;
use crate::network::NodeId;

mod graph;
mod render_utils;
mod ui;

pub struct AtlasApp {
    airports_path: PathBuf,
    world_path: PathBuf,
    state: AppState,
}

enum AppState {
    Loading { rx: Receiver<Result<Datasets, String>> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    controller: LayoutController,
    world: ProjectedWorld,
    land_texture: Option<TextureHandle>,
    dragging: Option<NodeId>,
}

impl AtlasApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, airports_path: PathBuf, world_path: PathBuf) -> Self {
        let state = Self::start_load(airports_path.clone(), world_path.clone());
        Self {
            airports_path,
            world_path,
            state,
        }
    }

    fn spawn_load(airports_path: PathBuf, world_path: PathBuf) -> Receiver<Result<Datasets, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_datasets(&airports_path, &world_path).map_err(|error| {
                let message = format!("{error:#}");
                error!(error = %message, "failed to load datasets");
                message
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(airports_path: PathBuf, world_path: PathBuf) -> AppState {
        info!(
            airports = %airports_path.display(),
            world = %world_path.display(),
            "loading datasets"
        );
        AppState::Loading {
            rx: Self::spawn_load(airports_path, world_path),
        }
    }
}

impl eframe::App for AtlasApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(datasets) => AppState::Ready(Box::new(ViewModel::new(datasets))),
                            Err(error) => AppState::Error(error),
                        });
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading airports and world map...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load datasets");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition =
                            Some(Self::start_load(self.airports_path.clone(), self.world_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => model.show(ctx),
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}

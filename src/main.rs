mod app;
mod data;
mod geo;
mod layout;
mod network;
mod physics;
mod scale;
mod util;

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Airport nodes and routes as JSON.
    #[arg(long, default_value = "airports.json")]
    airports: PathBuf,
    /// TopoJSON world map with a `countries` object.
    #[arg(long, default_value = "world-110.json")]
    world: PathBuf,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([940.0, 680.0]),
        ..Default::default()
    };

    eframe::run_native(
        "airport-atlas",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::AtlasApp::new(
                cc,
                args.airports.clone(),
                args.world.clone(),
            )))
        }),
    )
}

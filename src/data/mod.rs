mod airports;
mod load;
mod topojson;

pub use airports::{AirportDataset, AirportRecord};
pub use load::{Datasets, load_datasets};
pub use topojson::{CountryFeature, WorldMap};

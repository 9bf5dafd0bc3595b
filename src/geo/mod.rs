mod mercator;
mod path;

pub use mercator::Mercator;
pub use path::ProjectedWorld;

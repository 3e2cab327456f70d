mod extrude;
mod revolve;

pub use extrude::{extrusion_offsets, Extrude};
pub use revolve::Revolve;

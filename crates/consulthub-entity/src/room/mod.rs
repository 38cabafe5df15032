//! Topic rooms.

pub mod model;

pub use model::Room;

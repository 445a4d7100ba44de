pub mod index;

pub use index::{PropertyIndex, PropertyState};

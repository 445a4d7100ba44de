pub mod cross_property;

pub use cross_property::merge;

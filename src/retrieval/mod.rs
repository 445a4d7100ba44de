pub mod algorithm;
pub mod engine;
pub mod heap;

pub use algorithm::Algorithm;
pub use engine::{execute, Filter};
pub use heap::{Scored, TopKHeap};

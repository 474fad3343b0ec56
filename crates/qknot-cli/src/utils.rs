pub mod progress;
pub mod solver;

pub mod solver;

pub use solver::{Solver, Strategy};

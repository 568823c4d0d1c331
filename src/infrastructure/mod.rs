pub mod base64;
pub mod graph;
pub mod persistence;
pub mod serialization;
pub mod stopwatch;
pub mod symmetry;

pub mod analysis;
pub mod attractors;
pub mod benchmark_file;
pub mod error;
pub mod generator;
pub mod network;
pub mod report;
pub mod runner;
pub mod sampling;

pub mod config;
pub mod error;
pub mod hydro;
pub mod run;
pub mod solver;

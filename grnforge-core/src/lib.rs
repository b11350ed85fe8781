pub mod analysis;
pub mod binding;
pub mod error;
pub mod loader;
pub mod logger;
pub mod numerical;
pub mod simulation;

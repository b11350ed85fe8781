pub mod engine_config;
pub mod environment;
pub mod file_formats;
pub mod genotype;

pub mod builder;
pub mod engine;
pub mod events;
pub mod growth;
pub mod occupancy;
pub mod propensity;
pub mod reactions;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

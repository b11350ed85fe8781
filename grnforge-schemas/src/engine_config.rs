//! The immutable configuration object handed to the simulation engine at construction.
//!
//! Every constant the engine consumes lives here; there are no process-wide tables.
//! All groups implement `Default`, and every field may be omitted from a YAML file.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub binding: BindingParams,
    pub timing: TimingParams,
    pub chromatin: ChromatinRates,
    pub growth: GrowthParams,
    pub numerical: NumericalParams,
    pub initial: InitialConditions,
}

/// Parameters of the binding-site scanner and the promoter occupancy model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingParams {
    /// Length of the element a TF recognises.
    pub tf_element_len: usize,
    /// Bases blocked on each side of a bound TF.
    pub hind_length: usize,
    /// Minimum number of matching bases for a window to count as a binding site.
    pub min_matches: usize,
    /// Factor applied to a site's Kd for every mismatch.
    pub mismatch_penalty: f64,
    /// Lower bound on the number of bound activators that licenses transcription.
    pub min_occupancy_floor: usize,
}

impl Default for BindingParams {
    fn default() -> Self {
        Self {
            tf_element_len: 8,
            hind_length: 3,
            min_matches: 6,
            mismatch_penalty: 10.0,
            min_occupancy_floor: 1,
        }
    }
}

impl BindingParams {
    /// Minimum distance between the starts of two sites that can be occupied together.
    pub fn exclusion_span(&self) -> usize {
        self.tf_element_len + 2 * self.hind_length
    }
}

/// Durations, in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingParams {
    /// The fixed developmental horizon of a single run.
    pub development_time: f64,
    /// Growth before this time is excluded from the reported average.
    pub burn_in_duration: f64,
    pub transcription_time: f64,
    /// Delay between an mRNA reaching the cytoplasm and producing protein.
    pub translation_time: f64,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            development_time: 120.0,
            burn_in_duration: 10.0,
            transcription_time: 1.0,
            translation_time: 0.5,
        }
    }
}

/// Rates of the stochastic reaction channels that do not come from the genotype, per minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromatinRates {
    /// Nucleosome removal when the promoter is licensed by activators.
    pub acetylation: f64,
    pub base_acetylation: f64,
    /// Nucleosome return when a repressor is bound.
    pub deacetylation: f64,
    pub base_deacetylation: f64,
    pub pic_assembly: f64,
    pub transcription_init: f64,
    /// Nuclear export, per nuclear mRNA.
    pub mrna_transport: f64,
}

impl Default for ChromatinRates {
    fn default() -> Self {
        Self {
            acetylation: 0.15,
            base_acetylation: 0.03,
            deacetylation: 0.92,
            base_deacetylation: 0.03,
            pic_assembly: 0.0667,
            transcription_init: 6.75,
            mrna_transport: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParams {
    pub max_growth_rate: f64,
    /// Effector level at which the growth ramp saturates.
    pub saturation_level: f64,
    /// Cost per protein translated per minute.
    pub translation_cost: f64,
    /// Constant growth-rate cost per extra gene copy.
    pub extra_copy_penalty: f64,
    pub growth_rate_scaling: f64,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            max_growth_rate: 1.0,
            saturation_level: 10000.0,
            translation_cost: 2.0e-6,
            extra_copy_penalty: 0.0,
            growth_rate_scaling: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericalParams {
    /// Amount a colliding event time is pushed forward per attempt.
    pub time_offset: f64,
    /// Two event times closer than this are treated as colliding.
    pub collision_epsilon: f64,
    pub max_nudges: usize,
    pub rtsafe_tolerance: f64,
    pub rtsafe_max_iterations: usize,
    /// Negative time steps no larger than this are rounding noise.
    pub rounding_tolerance: f64,
    /// Time step substituted for rounding noise.
    pub dt_floor: f64,
}

impl Default for NumericalParams {
    fn default() -> Self {
        Self {
            time_offset: 0.01,
            collision_epsilon: 1.0e-6,
            max_nudges: 1000,
            rtsafe_tolerance: 1.0e-6,
            rtsafe_max_iterations: 100,
            rounding_tolerance: 1.0e-6,
            dt_floor: 1.0e-9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialConditions {
    /// Starting level of every gene-encoded protein, split evenly between gene copies.
    pub protein_number: f64,
    pub cytoplasmic_mrna: u32,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            protein_number: 50.0,
            cytoplasmic_mrna: 1,
        }
    }
}

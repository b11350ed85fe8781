use super::events::FixedEventQueues;
use crate::error::GrnforgeError;
use grnforge_schemas::{
    engine_config::EngineConfig,
    environment::{Environment, SignalPhase},
    genotype::{GeneId, Genotype},
};
use serde::{Deserialize, Serialize};

/// Chromatin state of a promoter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChromatinState {
    NucleosomePresent,
    NucleosomeAbsentNoPic,
    PicAssembled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromatinTransition {
    Acetylation,
    Deacetylation,
    PicAssembly,
    PicDisassembly,
}

impl ChromatinState {
    /// The state reached by `transition`, or `None` if it cannot fire from here.
    pub fn apply(self, transition: ChromatinTransition) -> Option<ChromatinState> {
        use ChromatinState::*;
        use ChromatinTransition::*;
        match (self, transition) {
            (NucleosomePresent, Acetylation) => Some(NucleosomeAbsentNoPic),
            (NucleosomeAbsentNoPic, Deacetylation) => Some(NucleosomePresent),
            (NucleosomeAbsentNoPic, PicAssembly) => Some(PicAssembled),
            (PicAssembled, PicDisassembly) => Some(NucleosomeAbsentNoPic),
            _ => None,
        }
    }
}

/// mRNA molecules of one gene, by stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrnaCounts {
    /// Still being transcribed.
    pub transcribing: u32,
    /// Finished, waiting for export.
    pub nuclear: u32,
    /// In the cytoplasm, still loading ribosomes.
    pub translation_delay: u32,
    /// In the cytoplasm and producing protein.
    pub cytoplasmic: u32,
}

impl MrnaCounts {
    pub fn total(&self) -> u32 {
        self.transcribing + self.nuclear + self.translation_delay + self.cytoplasmic
    }

    /// mRNAs exposed to cytoplasmic decay.
    pub fn in_cytoplasm(&self) -> u32 {
        self.translation_delay + self.cytoplasmic
    }
}

/// Parameters of `dP/dt = decay * (steady_state - P)` for one gene's protein.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProteinKinetics {
    pub decay: f64,
    pub steady_state: f64,
}

impl ProteinKinetics {
    pub fn level_after(&self, start: f64, dt: f64) -> f64 {
        self.steady_state + (start - self.steady_state) * (-self.decay * dt).exp()
    }
}

/// A point of a recorded trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub time: f64,
    pub phase: SignalPhase,
    /// Natural log of cell size, i.e. the growth integrated so far.
    pub log_cell_size: f64,
    pub instantaneous_growth: f64,
    pub effector_level: f64,
    pub protein_pool: Vec<f64>,
    pub mrna_total: u32,
}

/// Dynamic state of a single simulated cell.
#[derive(Debug, Clone)]
pub struct CellState {
    pub time: f64,
    pub mrna: Vec<MrnaCounts>,
    /// Protein made by each gene copy.
    pub gene_protein: Vec<f64>,
    /// Protein per species, summed over gene copies. The signal TF is set by the environment.
    pub protein_pool: Vec<f64>,
    pub chromatin: Vec<ChromatinState>,
    pub kinetics: Vec<ProteinKinetics>,
    pub cumulative_growth: f64,
    pub growth_after_burn_in: f64,
    pub burn_in_reached: bool,
    pub instantaneous_growth: f64,
    pub signal_phase: SignalPhase,
    pub events: FixedEventQueues,
}

impl CellState {
    pub fn new(genotype: &Genotype, environment: &Environment, config: &EngineConfig) -> Self {
        let n_genes = genotype.genes.len();
        let mut copies = vec![0usize; genotype.proteins.len()];
        for gene in &genotype.genes {
            copies[gene.protein] += 1;
        }
        let gene_protein = genotype
            .genes
            .iter()
            .map(|g| config.initial.protein_number / copies[g.protein] as f64)
            .collect();

        let mut state = Self {
            time: 0.0,
            mrna: vec![
                MrnaCounts {
                    cytoplasmic: config.initial.cytoplasmic_mrna,
                    ..MrnaCounts::default()
                };
                n_genes
            ],
            gene_protein,
            protein_pool: vec![0.0; genotype.proteins.len()],
            chromatin: vec![ChromatinState::NucleosomePresent; n_genes],
            kinetics: vec![ProteinKinetics::default(); n_genes],
            cumulative_growth: 0.0,
            growth_after_burn_in: 0.0,
            burn_in_reached: config.timing.burn_in_duration <= 0.0,
            instantaneous_growth: 0.0,
            signal_phase: environment.initial_phase,
            events: FixedEventQueues::new(&config.numerical),
        };
        for gene in 0..n_genes {
            state.update_kinetics(genotype, gene);
        }
        state.pool_proteins(genotype);
        state.set_signal(genotype, environment, environment.initial_phase);
        state
    }

    /// Refreshes the protein relaxation parameters after the number of translating
    /// mRNAs of `gene` changed.
    pub fn update_kinetics(&mut self, genotype: &Genotype, gene: GeneId) {
        let k = &genotype.genes[gene].kinetics;
        let synthesis = k.translation * self.mrna[gene].cytoplasmic as f64;
        self.kinetics[gene] = ProteinKinetics {
            decay: k.protein_decay,
            steady_state: synthesis / k.protein_decay,
        };
    }

    /// Sums gene-copy protein into the per-species pool.
    pub fn pool_proteins(&mut self, genotype: &Genotype) {
        for (protein, level) in self.protein_pool.iter_mut().enumerate() {
            if protein == genotype.signal_protein {
                continue;
            }
            *level = genotype
                .genes_encoding(protein)
                .map(|g| self.gene_protein[g])
                .sum();
        }
    }

    pub fn set_signal(&mut self, genotype: &Genotype, environment: &Environment, phase: SignalPhase) {
        self.signal_phase = phase;
        self.protein_pool[genotype.signal_protein] = environment.phase(phase).signal_strength;
    }

    pub fn transition(&mut self, gene: GeneId, transition: ChromatinTransition) -> Result<(), GrnforgeError> {
        let from = self.chromatin[gene];
        self.chromatin[gene] = from
            .apply(transition)
            .ok_or(GrnforgeError::IllegalTransition { gene, from, transition })?;
        Ok(())
    }

    pub fn effector_level(&self, genotype: &Genotype) -> f64 {
        self.protein_pool[genotype.effector_protein]
    }

    pub fn sample(&self, genotype: &Genotype) -> TrajectorySample {
        TrajectorySample {
            time: self.time,
            phase: self.signal_phase,
            log_cell_size: self.cumulative_growth,
            instantaneous_growth: self.instantaneous_growth,
            effector_level: self.effector_level(genotype),
            protein_pool: self.protein_pool.clone(),
            mrna_total: self.mrna.iter().map(|m| m.total()).sum(),
        }
    }
}

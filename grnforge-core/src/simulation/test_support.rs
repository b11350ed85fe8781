use super::state::CellState;
use grnforge_schemas::{
    engine_config::EngineConfig,
    environment::{EffectorEffect, Environment, PhaseSpec, SignalPhase},
    genotype::{BindingSite, Gene, GeneKinetics, Genotype, Protein, TfRole},
};

pub fn site(tf_id: usize, position: usize, kd: f64, n_hindered: usize) -> BindingSite {
    BindingSite { tf_id, kd, mismatches: 0, position, n_hindered }
}

pub fn gene(name: &str, protein: usize, cisreg: &str, sites: Vec<BindingSite>) -> Gene {
    let max_hindered_sites = sites.iter().map(|s| s.n_hindered).max().unwrap_or(0);
    Gene {
        name: name.to_string(),
        protein,
        cisreg: cisreg.to_string(),
        kinetics: GeneKinetics {
            mrna_decay: 0.1,
            protein_decay: 0.05,
            translation: 5.0,
            pic_disassembly: 0.3,
        },
        min_act_to_transc: 1,
        binding_sites: sites,
        max_hindered_sites,
    }
}

/// Signal TF (0) activates a TF gene (encoding 1) and, together with it, an effector gene
/// (encoding 2). A repressor (3) is encoded by a third gene regulated by the signal.
pub fn small_network() -> Genotype {
    let protein = |name: &str, role| Protein { name: name.to_string(), role, consensus: String::new(), kd: 20.0 };
    Genotype {
        proteins: vec![
            protein("signal", TfRole::Activator),
            protein("tf", TfRole::Activator),
            protein("effector", TfRole::NonTf),
            protein("repressor", TfRole::Repressor),
        ],
        genes: vec![
            gene("tf", 1, "promoter-a", vec![site(0, 10, 20.0, 0), site(0, 40, 40.0, 0)]),
            gene(
                "effector",
                2,
                "promoter-b",
                vec![site(1, 5, 20.0, 0), site(0, 12, 20.0, 1), site(3, 30, 20.0, 0)],
            ),
            gene("repressor", 3, "promoter-c", vec![site(0, 50, 20.0, 0)]),
        ],
        signal_protein: 0,
        effector_protein: 2,
    }
}

pub fn environment() -> Environment {
    Environment {
        name: "alternating".to_string(),
        initial_phase: SignalPhase::A,
        phase_a: PhaseSpec { duration: 30.0, signal_strength: 1000.0, effector_effect: EffectorEffect::Beneficial },
        phase_b: PhaseSpec { duration: 30.0, signal_strength: 10.0, effector_effect: EffectorEffect::Deleterious },
        occurrence: 1.0,
    }
}

pub fn cell(genotype: &Genotype, config: &EngineConfig) -> CellState {
    CellState::new(genotype, &environment(), config)
}

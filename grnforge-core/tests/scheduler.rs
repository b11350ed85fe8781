use grnforge_core::simulation::{
    builder::SimulationBuilder,
    engine::{RunOutcome, RunStatus},
    events::FixedEventKind,
};
use grnforge_core::error::GrnforgeError;
use grnforge_schemas::{
    engine_config::EngineConfig,
    environment::{EffectorEffect, Environment, PhaseSpec, SignalPhase},
    genotype::{BindingSite, Gene, GeneKinetics, Genotype, Protein, TfRole},
};

fn protein(name: &str, role: TfRole) -> Protein {
    Protein { name: name.to_string(), role, consensus: String::new(), kd: 50.0 }
}

fn gene(name: &str, protein: usize, cisreg: &str, binding_sites: Vec<BindingSite>) -> Gene {
    Gene {
        name: name.to_string(),
        protein,
        cisreg: cisreg.to_string(),
        kinetics: GeneKinetics { mrna_decay: 0.2, protein_decay: 0.1, translation: 4.0, pic_disassembly: 0.5 },
        min_act_to_transc: 1,
        binding_sites,
        max_hindered_sites: 0,
    }
}

fn site(tf_id: usize, position: usize) -> BindingSite {
    BindingSite { tf_id, kd: 50.0, mismatches: 0, position, n_hindered: 0 }
}

/// The signal activates the effector gene directly and through a TF gene.
fn feed_forward() -> Genotype {
    Genotype {
        proteins: vec![
            protein("signal", TfRole::Activator),
            protein("tf", TfRole::Activator),
            protein("effector", TfRole::NonTf),
        ],
        genes: vec![
            gene("tf", 1, "upstream-tf", vec![site(0, 10)]),
            gene("effector", 2, "upstream-effector", vec![site(0, 4), site(1, 40)]),
        ],
        signal_protein: 0,
        effector_protein: 2,
    }
}

fn alternating() -> Environment {
    Environment {
        name: "alternating".to_string(),
        initial_phase: SignalPhase::A,
        phase_a: PhaseSpec { duration: 25.0, signal_strength: 500.0, effector_effect: EffectorEffect::Beneficial },
        phase_b: PhaseSpec { duration: 25.0, signal_strength: 0.0, effector_effect: EffectorEffect::Deleterious },
        occurrence: 1.0,
    }
}

fn config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.growth.saturation_level = 400.0;
    config
}

fn run(genotype: &Genotype, config: &EngineConfig, seed: u64) -> RunOutcome {
    SimulationBuilder::new()
        .with_genotype(genotype)
        .with_environment(&alternating())
        .with_config(config)
        .with_seed(seed)
        .build()
        .unwrap()
        .run()
        .unwrap()
}

#[test]
fn cell_without_genes_is_unresponsive() {
    let genotype = Genotype {
        proteins: vec![protein("signal", TfRole::Activator), protein("effector", TfRole::NonTf)],
        genes: vec![],
        signal_protein: 0,
        effector_protein: 1,
    };
    let outcome = run(&genotype, &config(), 3);
    assert_eq!(outcome.status, RunStatus::Unresponsive);
    assert_eq!(outcome.average_growth_rate, 0.0);
    assert_eq!(outcome.final_time, 0.0);
}

#[test]
fn unregulated_silent_cell_is_unresponsive() {
    let mut genotype = feed_forward();
    for g in &mut genotype.genes {
        g.binding_sites.clear();
    }
    let mut config = config();
    config.chromatin.base_acetylation = 0.0;
    config.initial.cytoplasmic_mrna = 0;

    let outcome = run(&genotype, &config, 3);
    assert_eq!(outcome.status, RunStatus::Unresponsive);
    assert_eq!(outcome.average_growth_rate, 0.0);
    assert_eq!(outcome.gillespie_events, 0);
}

#[test]
fn run_reaches_the_development_horizon() {
    let genotype = feed_forward();
    let config = config();
    let outcome = run(&genotype, &config, 11);

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.final_time, config.timing.development_time);
    assert!(outcome.gillespie_events > 0);
    // four signal toggles and the end of burn-in, at least
    assert!(outcome.fixed_events >= 5);
    assert!(outcome.average_growth_rate.is_finite() && outcome.average_growth_rate >= 0.0);
    assert!(outcome.integrated_growth >= outcome.growth_after_burn_in);
    let expected = outcome.growth_after_burn_in / (config.timing.development_time - config.timing.burn_in_duration);
    assert!((outcome.average_growth_rate - expected).abs() < 1e-12);
}

#[test]
fn runs_are_reproducible_for_a_seed() {
    let genotype = feed_forward();
    let config = config();
    let a = run(&genotype, &config, 2024);
    let b = run(&genotype, &config, 2024);
    assert_eq!(a.status, b.status);
    assert_eq!(a.gillespie_events, b.gillespie_events);
    assert_eq!(a.fixed_events, b.fixed_events);
    assert_eq!(a.integrated_growth.to_bits(), b.integrated_growth.to_bits());
}

#[test]
fn trajectory_is_sampled_on_schedule() {
    let genotype = feed_forward();
    let config = config();
    let env = alternating();
    let mut engine = SimulationBuilder::new()
        .with_genotype(&genotype)
        .with_environment(&env)
        .with_config(&config)
        .with_seed(7)
        .with_trajectory_sampling(10.0)
        .build()
        .unwrap();
    let outcome = engine.run().unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    // t = 0, every 10 minutes up to 110, and the horizon
    assert_eq!(outcome.trajectory.len(), 13);
    assert_eq!(outcome.trajectory[0].time, 0.0);
    assert_eq!(outcome.trajectory[12].time, config.timing.development_time);
    for pair in outcome.trajectory.windows(2) {
        assert!(pair[1].time >= pair[0].time);
        assert!(pair[1].log_cell_size >= pair[0].log_cell_size);
    }
    let first = &outcome.trajectory[0];
    assert_eq!(first.phase, SignalPhase::A);
    assert_eq!(first.protein_pool[0], 500.0);
    let in_phase_b = outcome.trajectory.iter().find(|s| s.time > 25.0 && s.time < 50.0).unwrap();
    assert_eq!(in_phase_b.phase, SignalPhase::B);
    assert_eq!(in_phase_b.protein_pool[0], 0.0);
}

#[test]
fn protein_levels_stay_finite_and_non_negative() {
    let genotype = feed_forward();
    let config = config();
    let env = alternating();
    for seed in 0..5 {
        let mut engine = SimulationBuilder::new()
            .with_genotype(&genotype)
            .with_environment(&env)
            .with_config(&config)
            .with_seed(seed)
            .build()
            .unwrap();
        let outcome = engine.run().unwrap();
        assert_eq!(outcome.status, RunStatus::Completed, "seed {}", seed);
        let state = engine.state();
        assert!(state.gene_protein.iter().all(|p| p.is_finite() && *p >= 0.0));
        for kind in FixedEventKind::ALL {
            let times: Vec<f64> = state.events.iter(kind).map(|e| e.time).collect();
            assert!(times.windows(2).all(|w| w[0] <= w[1]));
            assert!(times.iter().all(|t| *t >= state.time));
        }
    }
}

#[test]
fn event_collision_marks_the_run_abnormal() {
    let genotype = feed_forward();
    let mut config = config();
    config.numerical.max_nudges = 0;
    let env = alternating();
    // the second sampling point lands on the t = 25 phase switch
    let outcome = SimulationBuilder::new()
        .with_genotype(&genotype)
        .with_environment(&env)
        .with_config(&config)
        .with_seed(5)
        .with_trajectory_sampling(12.5)
        .build()
        .unwrap()
        .run()
        .unwrap();

    match &outcome.status {
        RunStatus::Abnormal { reason } => assert!(reason.contains("SamplingPoint"), "{}", reason),
        other => panic!("expected an abnormal run, got {:?}", other),
    }
    assert_eq!(outcome.average_growth_rate, 0.0);
    assert!(outcome.final_time <= 25.0);
}

#[test]
fn overflowing_occupancy_marks_the_run_abnormal() {
    let mut genotype = feed_forward();
    genotype.genes[1].binding_sites = vec![
        BindingSite { tf_id: 0, kd: 1e-200, mismatches: 0, position: 4, n_hindered: 0 },
        BindingSite { tf_id: 0, kd: 1e-200, mismatches: 0, position: 40, n_hindered: 0 },
    ];
    let outcome = run(&genotype, &config(), 3);
    assert!(matches!(outcome.status, RunStatus::Abnormal { .. }), "{:?}", outcome.status);
    assert_eq!(outcome.average_growth_rate, 0.0);
}

#[cfg(target_os = "linux")]
#[test]
fn trajectory_write_failures_are_returned() {
    let genotype = feed_forward();
    let config = config();
    let env = alternating();
    let mut engine = SimulationBuilder::new()
        .with_genotype(&genotype)
        .with_environment(&env)
        .with_config(&config)
        .with_seed(5)
        .with_trajectory_sampling(10.0)
        .with_trajectory_logging_to_file("/dev/full")
        .build()
        .unwrap();

    let err = engine.run().unwrap_err();
    assert!(matches!(err, GrnforgeError::LoggingError(_)));
    assert!(!err.is_numerical());
}


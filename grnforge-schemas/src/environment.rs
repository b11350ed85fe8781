use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalPhase {
    A,
    B,
}

impl SignalPhase {
    pub fn other(self) -> Self {
        match self {
            SignalPhase::A => SignalPhase::B,
            SignalPhase::B => SignalPhase::A,
        }
    }
}

/// How the effector protein affects growth while a phase is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectorEffect {
    /// Growth rises linearly with effector level up to the saturation level.
    Beneficial,
    /// Growth falls linearly with effector level, reaching zero at the saturation level.
    Deleterious,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpec {
    /// Minutes the phase lasts before the environment switches to the other phase.
    pub duration: f64,
    /// Number of signal TF molecules present while the phase is active.
    pub signal_strength: f64,
    pub effector_effect: EffectorEffect,
}

/// A signal schedule that alternates between phases A and B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub initial_phase: SignalPhase,
    pub phase_a: PhaseSpec,
    pub phase_b: PhaseSpec,
    /// Relative weight of this environment when combining growth rates into fitness.
    #[serde(default = "default_occurrence")]
    pub occurrence: f64,
}

fn default_occurrence() -> f64 {
    1.0
}

impl Environment {
    pub fn phase(&self, phase: SignalPhase) -> &PhaseSpec {
        match phase {
            SignalPhase::A => &self.phase_a,
            SignalPhase::B => &self.phase_b,
        }
    }
}

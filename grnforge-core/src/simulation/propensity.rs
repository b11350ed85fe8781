//! Propensities of the stochastic reaction channels.
//!
//! Occupancy-dependent rates follow the promoter's chromatin state: only the channels
//! that can fire from the current state are nonzero. Transport and decay depend only on
//! mRNA counts.

use super::{
    occupancy::{tf_distribution, PromoterOccupancy},
    state::{CellState, ChromatinState},
};
use grnforge_schemas::{
    engine_config::EngineConfig,
    genotype::{GeneId, Genotype},
};
use rand::Rng;

/// Declaration order is the order channels are walked when sampling a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionChannel {
    Transport,
    MrnaDecay,
    PicDisassembly,
    Acetylation,
    Deacetylation,
    PicAssembly,
    TranscriptionInit,
}

impl ReactionChannel {
    pub const ALL: [ReactionChannel; 7] = [
        ReactionChannel::Transport,
        ReactionChannel::MrnaDecay,
        ReactionChannel::PicDisassembly,
        ReactionChannel::Acetylation,
        ReactionChannel::Deacetylation,
        ReactionChannel::PicAssembly,
        ReactionChannel::TranscriptionInit,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// The chromatin state a channel requires, or `None` for state-independent channels.
    pub fn licensed_in(self) -> Option<ChromatinState> {
        match self {
            ReactionChannel::Transport | ReactionChannel::MrnaDecay => None,
            ReactionChannel::Acetylation => Some(ChromatinState::NucleosomePresent),
            ReactionChannel::Deacetylation | ReactionChannel::PicAssembly => {
                Some(ChromatinState::NucleosomeAbsentNoPic)
            }
            ReactionChannel::PicDisassembly | ReactionChannel::TranscriptionInit => {
                Some(ChromatinState::PicAssembled)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ChannelRates {
    per_gene: Vec<f64>,
    total: f64,
}

#[derive(Debug, Clone)]
pub struct PropensityTable {
    channels: [ChannelRates; 7],
    occupancy: Vec<PromoterOccupancy>,
    clusters: Vec<Vec<GeneId>>,
    subtotal: f64,
}

impl PropensityTable {
    pub fn new(genotype: &Genotype) -> Self {
        let n_genes = genotype.genes.len();
        let mut channels: [ChannelRates; 7] = Default::default();
        for channel in channels.iter_mut() {
            channel.per_gene = vec![0.0; n_genes];
        }
        Self {
            channels,
            occupancy: vec![PromoterOccupancy::default(); n_genes],
            clusters: genotype.cisreg_clusters(),
            subtotal: 0.0,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }

    pub fn rate(&self, channel: ReactionChannel, gene: GeneId) -> f64 {
        self.channels[channel.index()].per_gene[gene]
    }

    pub fn channel_total(&self, channel: ReactionChannel) -> f64 {
        self.channels[channel.index()].total
    }

    pub fn occupancy(&self, gene: GeneId) -> PromoterOccupancy {
        self.occupancy[gene]
    }

    /// Recomputes promoter occupancy from the current protein pool and every rate from
    /// scratch. Occupancy is computed once per cis-regulatory cluster.
    pub fn calc_all_rates(&mut self, genotype: &Genotype, state: &CellState, config: &EngineConfig) {
        let floor = config.binding.min_occupancy_floor;
        for cluster in &self.clusters {
            let lead = &genotype.genes[cluster[0]];
            let distribution = tf_distribution(
                &lead.binding_sites,
                lead.max_hindered_sites,
                &genotype.proteins,
                &state.protein_pool,
            );
            for &gene in cluster {
                self.occupancy[gene] = distribution.occupancy(genotype.genes[gene].min_act_to_transc, floor);
            }
        }

        for gene in 0..genotype.genes.len() {
            let rates = self.gene_rates(genotype, state, config, gene);
            for channel in ReactionChannel::ALL {
                self.channels[channel.index()].per_gene[gene] = rates[channel.index()];
            }
        }
        for channel in self.channels.iter_mut() {
            channel.total = channel.per_gene.iter().sum();
        }
        self.subtotal = self.channels.iter().map(|c| c.total).sum();
    }

    fn gene_rates(&self, genotype: &Genotype, state: &CellState, config: &EngineConfig, gene: GeneId) -> [f64; 7] {
        let rates_cfg = &config.chromatin;
        let kinetics = &genotype.genes[gene].kinetics;
        let mrna = &state.mrna[gene];
        let PromoterOccupancy { p_act, p_rep } = self.occupancy[gene];

        let mut rates = [0.0; 7];
        rates[ReactionChannel::Transport.index()] = rates_cfg.mrna_transport * mrna.nuclear as f64;
        rates[ReactionChannel::MrnaDecay.index()] = kinetics.mrna_decay * mrna.in_cytoplasm() as f64;
        match state.chromatin[gene] {
            ChromatinState::NucleosomePresent => {
                rates[ReactionChannel::Acetylation.index()] =
                    p_act * rates_cfg.acetylation + (1.0 - p_act) * rates_cfg.base_acetylation;
            }
            ChromatinState::NucleosomeAbsentNoPic => {
                rates[ReactionChannel::Deacetylation.index()] =
                    p_rep * rates_cfg.deacetylation + (1.0 - p_rep) * rates_cfg.base_deacetylation;
                rates[ReactionChannel::PicAssembly.index()] = p_act * rates_cfg.pic_assembly;
            }
            ChromatinState::PicAssembled => {
                rates[ReactionChannel::PicDisassembly.index()] = kinetics.pic_disassembly;
                rates[ReactionChannel::TranscriptionInit.index()] = rates_cfg.transcription_init;
            }
        }
        rates
    }

    /// Picks the channel of the next reaction in proportion to its total propensity.
    pub fn pick_channel<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ReactionChannel> {
        let totals: Vec<f64> = ReactionChannel::ALL.iter().map(|&c| self.channel_total(c)).collect();
        pick_weighted(&totals, rng).map(|i| ReactionChannel::ALL[i])
    }

    /// Picks the gene a reaction of `channel` happens in.
    pub fn pick_gene<R: Rng + ?Sized>(&self, channel: ReactionChannel, rng: &mut R) -> Option<GeneId> {
        pick_weighted(&self.channels[channel.index()].per_gene, rng)
    }
}

/// Cumulative weighted sampling. Draws `x ~ U(0, total)` and walks the weights until the
/// remainder is non-positive; a draw that lands on a zero weight is repeated. Returns
/// `None` when no weight is positive.
pub fn pick_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let last_positive = weights.iter().rposition(|&w| w > 0.0)?;
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    loop {
        let mut x = rng.gen::<f64>() * total;
        let mut chosen = last_positive;
        for (i, &w) in weights.iter().enumerate() {
            x -= w.max(0.0);
            if x <= 0.0 {
                chosen = i;
                break;
            }
        }
        if weights[chosen] > 0.0 {
            return Some(chosen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::test_support::{cell, small_network};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn rates_only_for_the_current_chromatin_state() {
        let genotype = small_network();
        let config = EngineConfig::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let mut state = cell(&genotype, &config);
        let mut table = PropensityTable::new(&genotype);
        let states = [
            ChromatinState::NucleosomePresent,
            ChromatinState::NucleosomeAbsentNoPic,
            ChromatinState::PicAssembled,
        ];

        for _ in 0..50 {
            for gene in 0..genotype.genes.len() {
                state.chromatin[gene] = states[rng.gen_range(0..3)];
                state.mrna[gene].nuclear = rng.gen_range(0..3);
            }
            table.calc_all_rates(&genotype, &state, &config);
            for gene in 0..genotype.genes.len() {
                for channel in ReactionChannel::ALL {
                    if let Some(required) = channel.licensed_in() {
                        if required != state.chromatin[gene] {
                            assert_eq!(table.rate(channel, gene), 0.0, "{:?} on gene {}", channel, gene);
                        }
                    }
                }
            }
            let sum: f64 = ReactionChannel::ALL.iter().map(|&c| table.channel_total(c)).sum();
            assert!((sum - table.subtotal()).abs() < 1e-9);
        }
    }

    #[test]
    fn genes_sharing_a_promoter_share_occupancy() {
        let mut genotype = small_network();
        let mut copy = genotype.genes[1].clone();
        copy.name = "effector-copy".to_string();
        copy.binding_sites.clear(); // a cluster member's own sites are not consulted
        genotype.genes.push(copy);
        let config = EngineConfig::default();
        let state = cell(&genotype, &config);
        let mut table = PropensityTable::new(&genotype);
        table.calc_all_rates(&genotype, &state, &config);
        assert!(table.occupancy(1).p_act > 0.0);
        assert_eq!(table.occupancy(1), table.occupancy(3));
    }

    #[test]
    fn weighted_pick_never_lands_on_zero_weight() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let weights = [0.0, 2.0, 0.0, 1.0, 0.0];
        let mut counts = [0usize; 5];
        for _ in 0..3000 {
            counts[pick_weighted(&weights, &mut rng).unwrap()] += 1;
        }
        assert_eq!(counts[0] + counts[2] + counts[4], 0);
        // roughly two to one
        assert!(counts[1] > counts[3]);
        assert!(pick_weighted(&[0.0, 0.0], &mut rng).is_none());
        assert!(pick_weighted(&[], &mut rng).is_none());
    }
}

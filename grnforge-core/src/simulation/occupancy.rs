//! Promoter occupancy by transcription factors under steric hindrance.
//!
//! Sites are visited in position order. After visiting site `m`, a record holds the
//! summed statistical weight of every allowed configuration of sites `0..=m`, split by
//! the number of repressors and activators bound. Binding site `m` is compatible with
//! every configuration of sites `0..m - n_hindered`, so the new record is the previous
//! one (site `m` empty) plus the record from `n_hindered + 1` sites back, shifted by one
//! bound TF and scaled by the site's weight. Only the last `max_hindered + 1` records
//! are kept, in a ring indexed by site number.

use grnforge_schemas::genotype::{BindingSite, Protein, TfRole};

/// Weights of all occupancy configurations of a promoter, indexed by
/// (repressors bound, activators bound).
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyDistribution {
    max_rep: usize,
    max_act: usize,
    weights: Vec<f64>,
    n_sites: usize,
}

/// The quantities the propensity table needs from a promoter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PromoterOccupancy {
    /// Probability that enough activators are bound to license transcription.
    pub p_act: f64,
    /// Probability that at least one repressor is bound.
    pub p_rep: f64,
}

impl OccupancyDistribution {
    fn empty(max_rep: usize, max_act: usize, n_sites: usize) -> Self {
        let mut weights = vec![0.0; (max_rep + 1) * (max_act + 1)];
        weights[0] = 1.0;
        Self { max_rep, max_act, weights, n_sites }
    }

    fn cols(&self) -> usize {
        self.max_act + 1
    }

    pub fn weight(&self, repressors: usize, activators: usize) -> f64 {
        if repressors > self.max_rep || activators > self.max_act {
            return 0.0;
        }
        self.weights[repressors * self.cols() + activators]
    }

    pub fn max_repressors(&self) -> usize {
        self.max_rep
    }

    pub fn max_activators(&self) -> usize {
        self.max_act
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Probability that at least `max(min_act_to_transc, floor)` activators are bound.
    /// A promoter without binding sites is never licensed.
    pub fn p_act(&self, min_act_to_transc: usize, floor: usize) -> f64 {
        if self.n_sites == 0 {
            return 0.0;
        }
        let threshold = min_act_to_transc.max(floor);
        if threshold > self.max_act {
            return 0.0;
        }
        let cols = self.cols();
        let licensed: f64 = self
            .weights
            .chunks(cols)
            .map(|row| row[threshold..].iter().sum::<f64>())
            .sum();
        self.normalized(licensed)
    }

    /// `part / total`, or NaN once the weights have overflowed.
    fn normalized(&self, part: f64) -> f64 {
        let total = self.total();
        if !total.is_finite() || !part.is_finite() {
            return f64::NAN;
        }
        part / total
    }

    pub fn p_rep(&self) -> f64 {
        if self.n_sites == 0 || self.max_rep == 0 {
            return 0.0;
        }
        let repressed: f64 = self.weights[self.cols()..].iter().sum();
        self.normalized(repressed)
    }

    pub fn occupancy(&self, min_act_to_transc: usize, floor: usize) -> PromoterOccupancy {
        PromoterOccupancy {
            p_act: self.p_act(min_act_to_transc, floor),
            p_rep: self.p_rep(),
        }
    }
}

/// Computes the occupancy distribution of a promoter from its position-sorted sites and
/// the current pooled protein numbers. `max_hindered` is the largest `n_hindered` among
/// the sites and sizes the ring of records.
pub fn tf_distribution(
    sites: &[BindingSite],
    max_hindered: usize,
    proteins: &[Protein],
    protein_numbers: &[f64],
) -> OccupancyDistribution {
    let role_of = |site: &BindingSite| proteins.get(site.tf_id).map_or(TfRole::NonTf, |p| p.role);
    let max_act = sites.iter().filter(|s| role_of(s) == TfRole::Activator).count();
    let max_rep = sites.iter().filter(|s| role_of(s) == TfRole::Repressor).count();
    let base = OccupancyDistribution::empty(max_rep, max_act, sites.len());
    if sites.is_empty() {
        return base;
    }

    let ring_len = max_hindered + 1;
    let cols = max_act + 1;
    let mut ring: Vec<Vec<f64>> = vec![base.weights.clone(); ring_len];
    let mut scratch = base.weights.clone();

    for (m, site) in sites.iter().enumerate() {
        let previous = if m == 0 { &base.weights } else { &ring[(m - 1) % ring_len] };
        scratch.copy_from_slice(previous);

        let role = role_of(site);
        let number = protein_numbers.get(site.tf_id).copied().unwrap_or(0.0);
        let weight = if site.kd > 0.0 { number / site.kd } else { 0.0 };

        if role.is_tf() && weight > 0.0 {
            // configurations of the sites that remain free when site m is bound
            let compatible = if m > site.n_hindered {
                &ring[(m - 1 - site.n_hindered) % ring_len]
            } else {
                &base.weights
            };
            // the site itself is excluded from `compatible`, so its class count is below the maximum
            match role {
                TfRole::Activator => {
                    for rep in 0..=max_rep {
                        for act in 0..max_act {
                            scratch[rep * cols + act + 1] += weight * compatible[rep * cols + act];
                        }
                    }
                }
                TfRole::Repressor => {
                    for rep in 0..max_rep {
                        for act in 0..=max_act {
                            scratch[(rep + 1) * cols + act] += weight * compatible[rep * cols + act];
                        }
                    }
                }
                TfRole::NonTf => {}
            }
        }
        ring[m % ring_len].copy_from_slice(&scratch);
    }

    OccupancyDistribution {
        max_rep,
        max_act,
        weights: ring[(sites.len() - 1) % ring_len].clone(),
        n_sites: sites.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::assign_hindrance;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn protein(role: TfRole) -> Protein {
        Protein { name: format!("{:?}", role), role, consensus: String::new(), kd: 1.0 }
    }

    fn site(tf_id: usize, position: usize, kd: f64) -> BindingSite {
        BindingSite { tf_id, kd, mismatches: 0, position, n_hindered: 0 }
    }

    /// Enumerates every subset of sites directly.
    fn brute_force(
        sites: &[BindingSite],
        proteins: &[Protein],
        numbers: &[f64],
        span: usize,
    ) -> Vec<Vec<f64>> {
        let n_act = sites.iter().filter(|s| proteins[s.tf_id].role == TfRole::Activator).count();
        let n_rep = sites.iter().filter(|s| proteins[s.tf_id].role == TfRole::Repressor).count();
        let mut table = vec![vec![0.0; n_act + 1]; n_rep + 1];
        for mask in 0u32..(1 << sites.len()) {
            let bound: Vec<&BindingSite> =
                sites.iter().enumerate().filter(|(i, _)| mask & (1 << i) != 0).map(|(_, s)| s).collect();
            let clash = bound.iter().enumerate().any(|(i, a)| {
                bound[i + 1..].iter().any(|b| a.position.abs_diff(b.position) < span)
            });
            if clash {
                continue;
            }
            let mut weight = 1.0;
            let (mut rep, mut act) = (0, 0);
            for s in &bound {
                weight *= numbers[s.tf_id] / s.kd;
                match proteins[s.tf_id].role {
                    TfRole::Activator => act += 1,
                    TfRole::Repressor => rep += 1,
                    TfRole::NonTf => unreachable!(),
                }
            }
            table[rep][act] += weight;
        }
        table
    }

    #[test]
    fn matches_brute_force_enumeration() {
        let proteins = vec![protein(TfRole::Activator), protein(TfRole::Repressor), protein(TfRole::Activator)];
        let span = 14;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        for _ in 0..200 {
            let n = rng.gen_range(1..=6);
            let mut sites: Vec<BindingSite> = (0..n)
                .map(|_| site(rng.gen_range(0..3), rng.gen_range(0..60), rng.gen_range(0.5..20.0)))
                .collect();
            sites.sort_by_key(|s| s.position);
            let max_hindered = assign_hindrance(&mut sites, span);
            let numbers: Vec<f64> = (0..3).map(|_| rng.gen_range(0.0..30.0)).collect();

            let dist = tf_distribution(&sites, max_hindered, &proteins, &numbers);
            let expected = brute_force(&sites, &proteins, &numbers, span);
            let mut expected_total = 0.0;
            for (rep, row) in expected.iter().enumerate() {
                for (act, &w) in row.iter().enumerate() {
                    expected_total += w;
                    let got = dist.weight(rep, act);
                    assert!((got - w).abs() <= 1e-9 * w.max(1.0), "cell ({}, {}): {} vs {}", rep, act, got, w);
                }
            }
            assert!((dist.total() - expected_total).abs() <= 1e-9 * expected_total);
        }
    }

    #[test]
    fn longer_hindrance_never_adds_configurations() {
        let proteins = vec![protein(TfRole::Activator), protein(TfRole::Repressor)];
        let positions = [0, 3, 9, 12, 20, 26, 31, 45];
        let mut last = f64::INFINITY;
        for hind_length in 0..8 {
            let mut sites: Vec<BindingSite> =
                positions.iter().enumerate().map(|(i, &p)| site(i % 2, p, 1.0)).collect();
            let max_hindered = assign_hindrance(&mut sites, 8 + 2 * hind_length);
            // unit weights make the total the number of allowed configurations
            let combinations = tf_distribution(&sites, max_hindered, &proteins, &[1.0, 1.0]).total();
            assert!(combinations <= last);
            last = combinations;
        }
    }

    #[test]
    fn single_activator_without_protein_never_licenses() {
        let proteins = vec![protein(TfRole::Activator)];
        let sites = vec![site(0, 10, 5.0)];
        let dist = tf_distribution(&sites, 0, &proteins, &[0.0]);
        assert_eq!(dist.p_act(1, 1), 0.0);
    }

    #[test]
    fn single_activator_occupancy_is_hyperbolic() {
        let proteins = vec![protein(TfRole::Activator)];
        let sites = vec![site(0, 10, 5.0)];
        let dist = tf_distribution(&sites, 0, &proteins, &[15.0]);
        // P = w / (1 + w) with w = 15 / 5
        assert!((dist.p_act(1, 1) - 0.75).abs() < 1e-12);
        assert_eq!(dist.p_rep(), 0.0);
    }

    #[test]
    fn promoter_without_sites_is_inert() {
        let dist = tf_distribution(&[], 0, &[], &[]);
        assert_eq!(dist.total(), 1.0);
        assert_eq!(dist.p_act(0, 0), 0.0);
        assert_eq!(dist.p_rep(), 0.0);
    }

    #[test]
    fn and_gate_needs_two_activators() {
        let proteins = vec![protein(TfRole::Activator)];
        let mut sites = vec![site(0, 0, 1.0), site(0, 30, 1.0)];
        let max_hindered = assign_hindrance(&mut sites, 14);
        let dist = tf_distribution(&sites, max_hindered, &proteins, &[1.0]);
        assert_eq!((dist.max_repressors(), dist.max_activators()), (0, 2));
        // four configurations of weight one, only the doubly bound one licenses
        assert!((dist.p_act(2, 1) - 0.25).abs() < 1e-12);
        assert!((dist.p_act(1, 1) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn overlapping_repressor_competes_with_activator() {
        let proteins = vec![protein(TfRole::Activator), protein(TfRole::Repressor)];
        let mut sites = vec![site(0, 0, 1.0), site(1, 4, 1.0)];
        let max_hindered = assign_hindrance(&mut sites, 14);
        let dist = tf_distribution(&sites, max_hindered, &proteins, &[1.0, 1.0]);
        assert_eq!((dist.max_repressors(), dist.max_activators()), (1, 1));
        assert_eq!(dist.weight(1, 1), 0.0);
        assert!((dist.p_act(1, 1) - 1.0 / 3.0).abs() < 1e-12);
        assert!((dist.p_rep() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn overflowing_weights_give_no_probability() {
        let proteins = vec![protein(TfRole::Activator)];
        let mut sites = vec![site(0, 0, 1e-200), site(0, 30, 1e-200)];
        let max_hindered = assign_hindrance(&mut sites, 14);
        let dist = tf_distribution(&sites, max_hindered, &proteins, &[1e200]);
        assert!(!dist.total().is_finite());
        assert!(dist.p_act(1, 1).is_nan());
        assert!(dist.p_act(2, 1).is_nan());
    }
}

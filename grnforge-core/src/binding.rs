//! Locates transcription-factor binding sites on cis-regulatory sequences.

use grnforge_schemas::{
    engine_config::BindingParams,
    genotype::{BindingSite, Gene, Genotype, Protein, TfRole},
};

/// Sizes of the largest sets of sites that can all be occupied at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnhinderedCounts {
    pub activator: usize,
    pub repressor: usize,
    pub total: usize,
}

fn count_matches(window: &[u8], consensus: &[u8]) -> usize {
    window
        .iter()
        .zip(consensus)
        .filter(|(a, b)| a.eq_ignore_ascii_case(b))
        .count()
}

/// Scans `cisreg` on both strands for every TF in `proteins`.
///
/// The returned sites are sorted by position and carry their hindrance counts.
pub fn scan_binding_sites(cisreg: &str, proteins: &[Protein], params: &BindingParams) -> Vec<BindingSite> {
    let seq = cisreg.as_bytes();
    let len = params.tf_element_len;
    let mut sites = Vec::new();
    if len == 0 || seq.len() < len {
        return sites;
    }

    for (tf_id, protein) in proteins.iter().enumerate() {
        if !protein.role.is_tf() || protein.consensus.len() != len {
            continue;
        }
        let forward = protein.consensus.as_bytes();
        let reverse = protein.consensus_rc();
        let reverse = reverse.as_bytes();

        for (position, window) in seq.windows(len).enumerate() {
            let matches = count_matches(window, forward).max(count_matches(window, reverse));
            if matches >= params.min_matches {
                let mismatches = (len - matches) as u32;
                sites.push(BindingSite {
                    tf_id,
                    kd: protein.kd * params.mismatch_penalty.powi(mismatches as i32),
                    mismatches,
                    position,
                    n_hindered: 0,
                });
            }
        }
    }

    sites.sort_by_key(|s| s.position);
    assign_hindrance(&mut sites, params.exclusion_span());
    sites
}

/// Sets `n_hindered` on position-sorted sites and returns the largest count.
pub fn assign_hindrance(sites: &mut [BindingSite], span: usize) -> usize {
    let mut max_hindered = 0;
    for m in 0..sites.len() {
        let pos = sites[m].position;
        let hindered = sites[..m]
            .iter()
            .rev()
            .take_while(|s| pos - s.position < span)
            .count();
        sites[m].n_hindered = hindered;
        max_hindered = max_hindered.max(hindered);
    }
    max_hindered
}

/// Greedy interval selection over position-sorted sites, per TF class.
pub fn max_unhindered_sites(sites: &[BindingSite], proteins: &[Protein], span: usize) -> UnhinderedCounts {
    let greedy = |keep: &dyn Fn(TfRole) -> bool| {
        let mut count = 0;
        let mut last: Option<usize> = None;
        for site in sites {
            let role = proteins.get(site.tf_id).map_or(TfRole::NonTf, |p| p.role);
            if !keep(role) {
                continue;
            }
            if last.map_or(true, |l| site.position - l >= span) {
                count += 1;
                last = Some(site.position);
            }
        }
        count
    };
    UnhinderedCounts {
        activator: greedy(&|r| r == TfRole::Activator),
        repressor: greedy(&|r| r == TfRole::Repressor),
        total: greedy(&|r| r.is_tf()),
    }
}

/// Prepares the binding sites of every gene for the occupancy model. Promoters without
/// listed sites are scanned. Listed sites are put in position order and get their
/// hindrance counts recomputed.
pub fn annotate_genotype(genotype: &mut Genotype, params: &BindingParams) {
    let proteins = genotype.proteins.clone();
    for gene in genotype.genes.iter_mut() {
        annotate_gene(gene, &proteins, params);
    }
}

fn annotate_gene(gene: &mut Gene, proteins: &[Protein], params: &BindingParams) {
    if gene.binding_sites.is_empty() {
        gene.binding_sites = scan_binding_sites(&gene.cisreg, proteins, params);
        gene.max_hindered_sites = gene.binding_sites.iter().map(|s| s.n_hindered).max().unwrap_or(0);
    } else {
        gene.binding_sites.sort_by_key(|s| s.position);
        gene.max_hindered_sites = assign_hindrance(&mut gene.binding_sites, params.exclusion_span());
    }
}

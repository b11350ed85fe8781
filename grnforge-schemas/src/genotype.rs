//! Defines the data structures describing a genotype: the proteins it encodes, the genes
//! that encode them, and the transcription-factor binding sites found on each promoter.
//!
//! The simulation engine only reads a genotype. Binding sites are normally derived from
//! the cis-regulatory sequences by the core crate's scanner, but they can also be supplied
//! directly in a genotype file.

use serde::{Deserialize, Serialize};

/// Index of a protein in `Genotype::proteins`.
pub type ProteinId = usize;

/// Index of a gene in `Genotype::genes`.
pub type GeneId = usize;

/// The regulatory role of a protein.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TfRole {
    Activator,
    Repressor,
    /// Not a transcription factor; never binds a promoter.
    NonTf,
}

impl TfRole {
    pub fn is_tf(self) -> bool {
        !matches!(self, TfRole::NonTf)
    }
}

/// A protein species. Duplicated genes encode the same protein and share its pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protein {
    pub name: String,
    pub role: TfRole,
    /// Consensus binding sequence on the forward strand. Empty for non-TFs.
    #[serde(default)]
    pub consensus: String,
    /// Dissociation constant of a perfect-match site, in molecules per cell.
    pub kd: f64,
}

impl Protein {
    /// Reverse complement of the consensus, used to find sites on the other strand.
    pub fn consensus_rc(&self) -> String {
        self.consensus
            .chars()
            .rev()
            .map(|c| match c.to_ascii_uppercase() {
                'A' => 'T',
                'T' => 'A',
                'C' => 'G',
                'G' => 'C',
                other => other,
            })
            .collect()
    }
}

/// Per-gene kinetic constants. Rates are per minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneKinetics {
    pub mrna_decay: f64,
    pub protein_decay: f64,
    /// Proteins produced per minute per translating mRNA.
    pub translation: f64,
    pub pic_disassembly: f64,
}

/// A single transcription-factor binding site on a promoter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSite {
    pub tf_id: ProteinId,
    /// Dissociation constant of this site; higher means weaker binding.
    pub kd: f64,
    pub mismatches: u32,
    /// Start position on the forward strand.
    pub position: usize,
    /// Number of preceding sites that cannot be occupied while this one is.
    pub n_hindered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub name: String,
    pub protein: ProteinId,
    pub cisreg: String,
    pub kinetics: GeneKinetics,
    /// 1 behaves as an OR gate, 2 or more as an AND gate.
    pub min_act_to_transc: usize,
    /// Sorted by position. May be empty, in which case the promoter is never licensed.
    #[serde(default)]
    pub binding_sites: Vec<BindingSite>,
    #[serde(default)]
    pub max_hindered_sites: usize,
}

/// The top-level struct representing a complete genotype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    pub proteins: Vec<Protein>,
    pub genes: Vec<Gene>,
    /// The environmental signal TF. Its level is set by the environment, not by any gene.
    pub signal_protein: ProteinId,
    /// The protein whose level determines growth rate.
    pub effector_protein: ProteinId,
}

impl Genotype {
    /// Genes that encode `protein`, in gene order.
    pub fn genes_encoding(&self, protein: ProteinId) -> impl Iterator<Item = GeneId> + '_ {
        self.genes
            .iter()
            .enumerate()
            .filter(move |(_, g)| g.protein == protein)
            .map(|(id, _)| id)
    }

    /// Number of gene copies beyond the first for every protein.
    pub fn extra_gene_copies(&self) -> usize {
        let mut copies = vec![0usize; self.proteins.len()];
        for gene in &self.genes {
            if let Some(c) = copies.get_mut(gene.protein) {
                *c += 1;
            }
        }
        copies.iter().map(|&c| c.saturating_sub(1)).sum()
    }

    /// Groups genes with identical cis-regulatory sequence. Clusters are ordered by their
    /// first member, and members within a cluster are in gene order.
    pub fn cisreg_clusters(&self) -> Vec<Vec<GeneId>> {
        let mut clusters: Vec<Vec<GeneId>> = Vec::new();
        for (id, gene) in self.genes.iter().enumerate() {
            match clusters
                .iter_mut()
                .find(|c| self.genes[c[0]].cisreg == gene.cisreg)
            {
                Some(cluster) => cluster.push(id),
                None => clusters.push(vec![id]),
            }
        }
        clusters
    }
}

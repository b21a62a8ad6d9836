//! Density-based clustering (DBSCAN) over a pairwise similarity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    Noise,
    /// Clusters are numbered from 1 in discovery order.
    Cluster(u32),
}

/// Label `n` points given a similarity `sim(q, p)`.
///
/// The neighbours of `p` are every `q`, `p` itself included, with
/// `sim(q, p) >= eps`. A point with at least `min_points` neighbours is a core
/// point and starts or extends a cluster; points reached from a core point
/// join its cluster (noise included) but only core points expand it further.
pub fn dbscan<F>(n: usize, eps: f64, min_points: usize, mut sim: F) -> Result<Vec<Label>>
where
    F: FnMut(usize, usize) -> Result<f64>,
{
    let mut labels: Vec<Option<Label>> = vec![None; n];
    let mut clusters = 0u32;

    for p in 0..n {
        if labels[p].is_some() {
            continue;
        }
        let neighbours = range_query(n, p, eps, &mut sim)?;
        if neighbours.len() < min_points {
            labels[p] = Some(Label::Noise);
            continue;
        }

        clusters += 1;
        let cluster = Label::Cluster(clusters);
        labels[p] = Some(cluster);

        let mut queued = vec![false; n];
        let mut seeds = neighbours;
        for &q in &seeds {
            queued[q] = true;
        }
        let mut i = 0;
        while i < seeds.len() {
            let q = seeds[i];
            i += 1;
            match labels[q] {
                Some(Label::Noise) => {
                    labels[q] = Some(cluster);
                    continue;
                }
                Some(_) => continue,
                None => labels[q] = Some(cluster),
            }
            let reach = range_query(n, q, eps, &mut sim)?;
            if reach.len() >= min_points {
                for r in reach {
                    if !queued[r] {
                        queued[r] = true;
                        seeds.push(r);
                    }
                }
            }
        }
        tracing::debug!(cluster = clusters, seeds = seeds.len(), "expanded cluster");
    }

    Ok(labels.into_iter().map(|l| l.unwrap_or(Label::Noise)).collect())
}

fn range_query<F>(n: usize, p: usize, eps: f64, sim: &mut F) -> Result<Vec<usize>>
where
    F: FnMut(usize, usize) -> Result<f64>,
{
    let mut out = Vec::new();
    for q in 0..n {
        if sim(q, p)? >= eps {
            out.push(q);
        }
    }
    Ok(out)
}

/// Point indices grouped by label, noise first.
pub fn group(labels: &[Label]) -> BTreeMap<Label, Vec<usize>> {
    let mut groups: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(i);
    }
    groups
}

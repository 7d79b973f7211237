//! Clustering of scalar per-triangle values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentationError};

/// Assignment of values to clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Cluster of every input value.
    pub labels: Vec<usize>,
    /// Cluster centers, ascending.
    pub centers: Vec<f64>,
}

impl Clustering {
    /// Sum of squared distances of the values to their centers.
    #[must_use]
    pub fn inertia(&self, values: &[f64]) -> f64 {
        values
            .iter()
            .zip(&self.labels)
            .map(|(v, &l)| (v - self.centers[l]).powi(2))
            .sum()
    }
}

/// Number of clusters to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterCount {
    /// Exactly this many clusters (fewer if there are fewer distinct values).
    Fixed(usize),
    /// Chosen by the elbow of the inertia curve, at most `max`.
    Auto { max: usize },
}

impl Default for ClusterCount {
    fn default() -> Self {
        Self::Fixed(5)
    }
}

/// Clustering algorithm over 1-D values.
pub trait ClusteringStrategy: fmt::Debug + Send + Sync {
    /// Splits `values` into at most `k` clusters.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::InvalidParameters`] if `k` is zero or
    /// `values` is empty.
    fn cluster(&self, values: &[f64], k: usize) -> Result<Clustering>;

    /// Clusters with a fixed or automatically chosen cluster count.
    ///
    /// # Errors
    ///
    /// See [`cluster`](Self::cluster).
    fn cluster_with(&self, values: &[f64], count: ClusterCount) -> Result<Clustering> {
        match count {
            ClusterCount::Fixed(k) => self.cluster(values, k),
            ClusterCount::Auto { max } => {
                if max == 0 {
                    return Err(SegmentationError::InvalidParameters(
                        "maximum cluster count is zero".into(),
                    )
                    .into());
                }
                let candidates = (1..=max)
                    .map(|k| self.cluster(values, k))
                    .collect::<Result<Vec<_>>>()?;
                let inertias: Vec<f64> = candidates.iter().map(|c| c.inertia(values)).collect();
                let best = elbow(&inertias);
                Ok(candidates.into_iter().nth(best).unwrap_or_else(|| Clustering {
                    labels: vec![0; values.len()],
                    centers: vec![0.0],
                }))
            }
        }
    }
}

/// Index of the point farthest below the chord from the first to the last
/// inertia value.
#[allow(clippy::cast_precision_loss)]
fn elbow(inertias: &[f64]) -> usize {
    let (Some(&first), Some(&last)) = (inertias.first(), inertias.last()) else {
        return 0;
    };
    if inertias.len() < 3 || first <= f64::EPSILON {
        return inertias.iter().position(|&i| i <= first * 1e-9).unwrap_or(inertias.len() - 1);
    }
    let span = (inertias.len() - 1) as f64;
    inertias
        .iter()
        .enumerate()
        .map(|(i, &inertia)| {
            let chord = first + (last - first) * i as f64 / span;
            (i, chord - inertia)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
        .map_or(0, |(i, _)| i)
}

/// Lloyd's k-means on the real line with quantile initialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KMeans1D {
    /// Upper bound on Lloyd iterations.
    pub max_iterations: usize,
}

impl Default for KMeans1D {
    fn default() -> Self {
        Self { max_iterations: 100 }
    }
}

impl ClusteringStrategy for KMeans1D {
    #[allow(clippy::cast_precision_loss)]
    fn cluster(&self, values: &[f64], k: usize) -> Result<Clustering> {
        if k == 0 {
            return Err(SegmentationError::InvalidParameters("cluster count is zero".into()).into());
        }
        if values.is_empty() {
            return Err(SegmentationError::InvalidParameters("no values to cluster".into()).into());
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mut distinct = sorted.clone();
        distinct.dedup();
        let k = k.min(distinct.len());

        let mut centers: Vec<f64> = (0..k)
            .map(|j| sorted[(2 * j + 1) * sorted.len() / (2 * k)])
            .collect();
        centers.dedup();
        // Quantiles can coincide when values repeat; fall back to distinct values.
        if centers.len() < k {
            centers = (0..k).map(|j| distinct[j * distinct.len() / k]).collect();
        }

        let mut labels = vec![0; values.len()];
        for _ in 0..self.max_iterations.max(1) {
            let mut changed = false;
            for (label, value) in labels.iter_mut().zip(values) {
                let nearest = nearest_center(&centers, *value);
                if nearest != *label {
                    *label = nearest;
                    changed = true;
                }
            }
            let mut sums = vec![0.0; k];
            let mut counts = vec![0usize; k];
            for (&label, value) in labels.iter().zip(values) {
                sums[label] += value;
                counts[label] += 1;
            }
            for j in 0..k {
                if counts[j] > 0 {
                    centers[j] = sums[j] / counts[j] as f64;
                }
            }
            if !changed {
                break;
            }
        }
        Ok(Clustering { labels, centers })
    }
}

fn nearest_center(centers: &[f64], value: f64) -> usize {
    centers
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1 - value).abs().total_cmp(&(b.1 - value).abs()))
        .map_or(0, |(j, _)| j)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn two_groups_are_separated() {
        let values = [0.1, 0.12, 0.11, 0.9, 0.88, 0.91];
        let c = KMeans1D::default().cluster(&values, 2).unwrap();
        assert_eq!(c.labels, vec![0, 0, 0, 1, 1, 1]);
        assert_relative_eq!(c.centers[0], 0.11, epsilon = 1e-12);
        assert_relative_eq!(c.centers[1], 0.8966666666666666, epsilon = 1e-12);
    }

    #[test]
    fn cluster_count_is_limited_by_distinct_values() {
        let values = [0.5, 0.5, 0.5, 0.2];
        let c = KMeans1D::default().cluster(&values, 5).unwrap();
        assert_eq!(c.centers.len(), 2);
        assert_eq!(c.labels, vec![1, 1, 1, 0]);
    }

    #[test]
    fn auto_count_finds_three_groups() {
        let mut values = Vec::new();
        for center in [0.1, 0.5, 0.9] {
            for d in [-0.01, 0.0, 0.01] {
                values.push(center + d);
            }
        }
        let c = KMeans1D::default().cluster_with(&values, ClusterCount::Auto { max: 6 }).unwrap();
        assert_eq!(c.centers.len(), 3);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(KMeans1D::default().cluster(&[0.1], 0).is_err());
        assert!(KMeans1D::default().cluster(&[], 2).is_err());
        assert!(KMeans1D::default().cluster_with(&[0.1], ClusterCount::Auto { max: 0 }).is_err());
    }

    #[test]
    fn elbow_of_flat_curve_is_first() {
        assert_eq!(elbow(&[0.0, 0.0, 0.0]), 0);
        assert_eq!(elbow(&[10.0, 1.0, 0.9, 0.8]), 1);
    }
}

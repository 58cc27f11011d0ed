//! CART decision trees split on Gini impurity.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::config::FEATURE_COUNT;
use super::training::TrainingSample;
use super::DisasterLabel;

const LABELS: usize = DisasterLabel::ALL.len();

/// Growth limits shared by every tree of an ensemble.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    Leaf {
        label: DisasterLabel,
    },
    /// Samples with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// A single trained tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: TreeNode,
}

impl DecisionTree {
    /// Grows a tree on `samples[i]` for each `i` in `indices` (repeats allowed).
    pub(crate) fn fit(
        samples: &[TrainingSample],
        mut indices: Vec<usize>,
        params: TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let root = grow(samples, &mut indices, 0, params, rng);
        Self { root }
    }

    pub fn predict(&self, x: &[f64; FEATURE_COUNT]) -> DisasterLabel {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { label } => return *label,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Checks that every split names a real feature and has a finite threshold.
    pub(crate) fn check(&self) -> Result<(), String> {
        fn check_node(node: &TreeNode) -> Result<(), String> {
            match node {
                TreeNode::Leaf { .. } => Ok(()),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!(
                            "split on feature {} (only {} features)",
                            feature, FEATURE_COUNT
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("non-finite threshold {}", threshold));
                    }
                    check_node(left)?;
                    check_node(right)
                }
            }
        }
        check_node(&self.root)
    }

    pub fn depth(&self) -> usize {
        fn depth_of(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        depth_of(&self.root)
    }
}

fn grow(
    samples: &[TrainingSample],
    indices: &mut [usize],
    depth: usize,
    params: TreeParams,
    rng: &mut ChaCha8Rng,
) -> TreeNode {
    let counts = label_counts(samples, indices);
    let majority = majority_label(&counts);

    let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
    if pure || depth >= params.max_depth || indices.len() < params.min_samples_split {
        return TreeNode::Leaf { label: majority };
    }

    let Some((feature, threshold)) = best_split(samples, indices, &counts, params, rng) else {
        return TreeNode::Leaf { label: majority };
    };

    // Partition in place: left half first.
    let mut mid = 0;
    for i in 0..indices.len() {
        if samples[indices[i]].features[feature] <= threshold {
            indices.swap(i, mid);
            mid += 1;
        }
    }
    let (left_idx, right_idx) = indices.split_at_mut(mid);

    let left = grow(samples, left_idx, depth + 1, params, rng);
    let right = grow(samples, right_idx, depth + 1, params, rng);
    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Lowest weighted-Gini split over a random subset of features, or `None`
/// if no split improves on the parent.
fn best_split(
    samples: &[TrainingSample],
    indices: &[usize],
    parent_counts: &[usize; LABELS],
    params: TreeParams,
    rng: &mut ChaCha8Rng,
) -> Option<(usize, f64)> {
    let mut features: [usize; FEATURE_COUNT] = [0, 1, 2];
    features.shuffle(rng);

    let n = indices.len();
    let parent_impurity = gini(parent_counts, n);
    let mut best: Option<(usize, f64, f64)> = None;

    for &feature in features.iter().take(params.max_features) {
        let mut column: Vec<(f64, usize)> = indices
            .iter()
            .map(|&i| (samples[i].features[feature], samples[i].label.index()))
            .collect();
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left = [0usize; LABELS];
        for k in 0..n - 1 {
            left[column[k].1] += 1;
            let (here, next) = (column[k].0, column[k + 1].0);
            if here == next {
                continue;
            }

            let n_left = k + 1;
            let n_right = n - n_left;
            let mut right = *parent_counts;
            for (r, l) in right.iter_mut().zip(&left) {
                *r -= l;
            }
            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / n as f64;

            if best.map_or(true, |(_, _, b)| impurity < b) {
                best = Some((feature, here + (next - here) / 2.0, impurity));
            }
        }
    }

    best.filter(|&(_, _, impurity)| impurity < parent_impurity - 1e-12)
        .map(|(feature, threshold, _)| (feature, threshold))
}

fn label_counts(samples: &[TrainingSample], indices: &[usize]) -> [usize; LABELS] {
    let mut counts = [0; LABELS];
    for &i in indices {
        counts[samples[i].label.index()] += 1;
    }
    counts
}

fn gini(counts: &[usize; LABELS], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Most frequent label; ties go to the earliest in enumeration order.
pub(crate) fn majority_label(counts: &[usize; LABELS]) -> DisasterLabel {
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    DisasterLabel::ALL[best]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const PARAMS: TreeParams = TreeParams {
        max_depth: 6,
        min_samples_split: 2,
        max_features: 3,
    };

    fn sample(features: [f64; 3], label: DisasterLabel) -> TrainingSample {
        TrainingSample { features, label }
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[4, 0, 0, 0], 4), 0.0);
        assert!((gini(&[2, 2, 0, 0], 4) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_majority_tie_goes_to_earliest() {
        assert_eq!(majority_label(&[0, 2, 2, 0]), DisasterLabel::Flood);
        assert_eq!(majority_label(&[1, 1, 1, 1]), DisasterLabel::NoDisaster);
        assert_eq!(majority_label(&[0, 0, 1, 3]), DisasterLabel::Storm);
    }

    #[test]
    fn test_separable_data_is_learned() {
        let samples: Vec<TrainingSample> = (0..20)
            .map(|i| {
                let rain = i as f64 * 20.0;
                let label = if rain > 200.0 {
                    DisasterLabel::Flood
                } else {
                    DisasterLabel::NoDisaster
                };
                sample([25.0, rain, 5.0], label)
            })
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tree = DecisionTree::fit(&samples, (0..samples.len()).collect(), PARAMS, &mut rng);

        assert_eq!(tree.predict(&[25.0, 380.0, 5.0]), DisasterLabel::Flood);
        assert_eq!(tree.predict(&[25.0, 40.0, 5.0]), DisasterLabel::NoDisaster);
        assert_eq!(tree.depth(), 1);
        if let TreeNode::Split { feature, threshold, .. } = tree.root() {
            assert_eq!(*feature, 1);
            assert!((*threshold - 210.0).abs() < 1e-9);
        } else {
            panic!("expected a split at the root");
        }
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let samples = vec![
            sample([1.0, 1.0, 1.0], DisasterLabel::Storm),
            sample([2.0, 2.0, 2.0], DisasterLabel::Storm),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tree = DecisionTree::fit(&samples, vec![0, 1], PARAMS, &mut rng);
        assert_eq!(tree.root(), &TreeNode::Leaf { label: DisasterLabel::Storm });
    }

    #[test]
    fn test_identical_features_cannot_split() {
        let samples = vec![
            sample([1.0, 1.0, 1.0], DisasterLabel::Flood),
            sample([1.0, 1.0, 1.0], DisasterLabel::Drought),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tree = DecisionTree::fit(&samples, vec![0, 1], PARAMS, &mut rng);
        assert_eq!(tree.root(), &TreeNode::Leaf { label: DisasterLabel::Flood });
    }
}

use ndarray::{ArrayView1, ArrayView2};

/// Order in which a tree grows its nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    /// Split every node that can be split, level by level.
    DepthWise,
    /// Always split the open leaf with the largest gain next.
    LeafWise,
}

#[derive(Debug, Clone)]
pub struct TreeParams {
    pub growth: Growth,
    pub max_depth: Option<usize>,
    pub max_leaves: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Minimum hessian sum on each side of a split.
    pub min_child_weight: f64,
    /// L2 penalty on leaf values.
    pub lambda: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            growth: Growth::DepthWise,
            max_depth: None,
            max_leaves: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            min_child_weight: 0.0,
            lambda: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct OpenNode {
    id: usize,
    depth: usize,
    samples: Vec<usize>,
    split: Option<SplitCandidate>,
}

/// Regression tree grown on per-sample gradients and hessians.
///
/// Leaves hold `-G / (H + lambda)`. With `g = -y` and `h = 1` that is the
/// plain mean of the samples in the leaf, which is how the forest uses it;
/// the boosting ensembles pass squared-error residuals instead.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grows a tree over `samples` (row indices into `x`, repeats allowed).
    pub fn fit(
        x: ArrayView2<'_, f64>,
        grad: &[f64],
        hess: &[f64],
        samples: Vec<usize>,
        params: &TreeParams,
    ) -> Self {
        let root_value = leaf_value(grad, hess, &samples, params.lambda);
        let mut nodes = vec![Node::Leaf { value: root_value }];
        let mut open = vec![open_node(x, grad, hess, 0, 0, samples, params)];
        let mut leaves = 1;

        loop {
            if params.max_leaves.map_or(false, |max| leaves >= max) {
                break;
            }
            let next = match params.growth {
                Growth::DepthWise => open.pop(),
                Growth::LeafWise => best_open(&open).map(|i| open.swap_remove(i)),
            };
            let Some(node) = next else { break };
            let Some(split) = node.split else { continue };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = node
                .samples
                .iter()
                .partition(|&&i| x[[i, split.feature]] <= split.threshold);

            let left = nodes.len();
            nodes.push(Node::Leaf {
                value: leaf_value(grad, hess, &left_samples, params.lambda),
            });
            let right = nodes.len();
            nodes.push(Node::Leaf {
                value: leaf_value(grad, hess, &right_samples, params.lambda),
            });
            nodes[node.id] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
            leaves += 1;

            let depth = node.depth + 1;
            open.push(open_node(x, grad, hess, left, depth, left_samples, params));
            open.push(open_node(x, grad, hess, right, depth, right_samples, params));
        }

        Self { nodes }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

fn open_node(
    x: ArrayView2<'_, f64>,
    grad: &[f64],
    hess: &[f64],
    id: usize,
    depth: usize,
    samples: Vec<usize>,
    params: &TreeParams,
) -> OpenNode {
    let depth_ok = params.max_depth.map_or(true, |max| depth < max);
    let split = if depth_ok && samples.len() >= params.min_samples_split.max(2) {
        best_split(x, grad, hess, &samples, params)
    } else {
        None
    };
    OpenNode {
        id,
        depth,
        samples,
        split,
    }
}

fn best_open(open: &[OpenNode]) -> Option<usize> {
    open.iter()
        .enumerate()
        .filter_map(|(i, n)| n.split.map(|s| (i, s.gain)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn leaf_value(grad: &[f64], hess: &[f64], samples: &[usize], lambda: f64) -> f64 {
    let (g, h) = sums(grad, hess, samples);
    if h + lambda > 0.0 {
        -g / (h + lambda)
    } else {
        0.0
    }
}

fn sums(grad: &[f64], hess: &[f64], samples: &[usize]) -> (f64, f64) {
    samples
        .iter()
        .fold((0.0, 0.0), |(g, h), &i| (g + grad[i], h + hess[i]))
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    if h + lambda > 0.0 {
        g * g / (h + lambda)
    } else {
        0.0
    }
}

/// Exhaustive split search: sort the node's samples on each feature and sweep
/// the prefix sums. Thresholds sit halfway between neighbouring values.
fn best_split(
    x: ArrayView2<'_, f64>,
    grad: &[f64],
    hess: &[f64],
    samples: &[usize],
    params: &TreeParams,
) -> Option<SplitCandidate> {
    let (g_total, h_total) = sums(grad, hess, samples);
    let parent = score(g_total, h_total, params.lambda);
    let n = samples.len();
    let min_leaf = params.min_samples_leaf.max(1);

    let mut best: Option<SplitCandidate> = None;
    let mut order = samples.to_vec();

    for feature in 0..x.ncols() {
        order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let mut g_left = 0.0;
        let mut h_left = 0.0;
        for k in 0..n - 1 {
            let i = order[k];
            g_left += grad[i];
            h_left += hess[i];

            let n_left = k + 1;
            if n_left < min_leaf || n - n_left < min_leaf {
                continue;
            }
            let here = x[[i, feature]];
            let next = x[[order[k + 1], feature]];
            if here == next {
                continue;
            }
            let h_right = h_total - h_left;
            if h_left < params.min_child_weight || h_right < params.min_child_weight {
                continue;
            }

            let gain = score(g_left, h_left, params.lambda)
                + score(g_total - g_left, h_right, params.lambda)
                - parent;
            if gain > 1e-12 && best.map_or(true, |b| gain > b.gain) {
                let mid = here + (next - here) / 2.0;
                let threshold = if mid < next { mid } else { here };
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
    }

    best
}

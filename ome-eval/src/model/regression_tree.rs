//! Depth-limited least-squares regression trees
//!
//! Gradient boosting fits one of these to the residuals of each stage.
//! linfa-trees only grows classification trees, so this one lives here.
//! Leaves hold the mean target of their rows.

use super::LeafSize;
use ndarray::{ArrayView1, ArrayView2};

const PURE_EPSILON: f64 = 1e-12;

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

/// Running sums of a node's targets
#[derive(Debug, Clone, Copy, Default)]
struct Sums {
    n: f64,
    y: f64,
    yy: f64,
}

impl Sums {
    fn add(&mut self, y: f64) {
        self.n += 1.0;
        self.y += y;
        self.yy += y * y;
    }

    fn remove(&mut self, y: f64) {
        self.n -= 1.0;
        self.y -= y;
        self.yy -= y * y;
    }

    fn mean(&self) -> f64 {
        if self.n > 0.0 {
            self.y / self.n
        } else {
            0.0
        }
    }

    /// Sum of squared deviations from the mean
    fn sse(&self) -> f64 {
        if self.n > 0.0 {
            (self.yy - self.y * self.y / self.n).max(0.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    cost: f64,
}

/// A fitted regression tree
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        min_samples_leaf: LeafSize,
        max_depth: usize,
    ) -> RegressionTree {
        let mut builder = Builder {
            x,
            y,
            min_leaf: min_samples_leaf.resolve(x.nrows()),
            max_depth,
            nodes: Vec::new(),
        };
        builder.grow((0..x.nrows()).collect(), 0);
        RegressionTree {
            nodes: builder.nodes,
        }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return 0.0,
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

struct Builder<'a, 'b> {
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'b, f64>,
    min_leaf: usize,
    max_depth: usize,
    nodes: Vec<Node>,
}

impl Builder<'_, '_> {
    fn sums(&self, indices: &[usize]) -> Sums {
        let mut sums = Sums::default();
        for &i in indices {
            sums.add(self.y[i]);
        }
        sums
    }

    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let sums = self.sums(&indices);
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: sums.mean() });

        let splittable = indices.len() >= 2 * self.min_leaf
            && depth < self.max_depth
            && sums.sse() > PURE_EPSILON * sums.n.max(1.0);
        if !splittable {
            return id;
        }
        let Some(split) = (0..self.x.ncols())
            .filter_map(|feature| self.best_split_on(&indices, feature, &sums))
            .fold(None, |best: Option<Split>, s| match best {
                Some(b) if b.cost <= s.cost => Some(b),
                _ => Some(s),
            })
        else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.x[[i, split.feature]] <= split.threshold);
        let left = self.grow(left, depth + 1);
        let right = self.grow(right, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn best_split_on(&self, indices: &[usize], feature: usize, parent: &Sums) -> Option<Split> {
        let column = self.x.column(feature);
        let mut order = indices.to_vec();
        order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

        let n = order.len();
        let mut left = Sums::default();
        let mut right = *parent;
        let mut best: Option<Split> = None;

        for k in 0..n.saturating_sub(1) {
            let i = order[k];
            left.add(self.y[i]);
            right.remove(self.y[i]);

            let value = column[i];
            let next = column[order[k + 1]];
            if next <= value {
                continue;
            }
            let n_left = k + 1;
            if n_left < self.min_leaf || n - n_left < self.min_leaf {
                continue;
            }
            let cost = left.sse() + right.sse();
            if best.map_or(true, |b| cost < b.cost) {
                best = Some(Split {
                    feature,
                    threshold: (value + next) / 2.0,
                    cost,
                });
            }
        }
        best
    }
}

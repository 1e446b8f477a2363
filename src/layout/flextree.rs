//! Variable-size tidy tree layout.
//!
//! A contour-based variant of the Walker/Buchheim tidy tree that places nodes
//! of arbitrary footprint without snapping them to depth levels. Each node
//! occupies `[cross, main]` in the layout frame; its children start where its
//! footprint ends along the main axis.
//!
//! # Algorithm Overview
//!
//! 1. **Main-axis pass (top-down):** `y(child) = y(parent) + main(parent)`.
//! 2. **First walk (bottom-up):** Each subtree is summarised by a left and a
//!    right contour, a list of segments giving the subtree's outermost cross
//!    extent down to each segment's bottom. Children are placed left to right
//!    against the accumulated right contour of their earlier siblings. When a
//!    child is pushed by a non-adjacent sibling, the slack is spread evenly over
//!    the siblings in between. The parent is then centered over the outer edges
//!    of its first and last children.
//! 3. **Second walk (top-down):** Accumulate relative offsets into absolute
//!    cross-axis positions.

/// Spacing decision between two contour nodes of different subtrees.
#[derive(Debug, Clone)]
pub struct FlexTreeConfig {
    /// Gap between neighbouring nodes that do not share a parent. Siblings get
    /// no extra gap; their footprint already carries the sibling margin.
    pub neighbour_separation: f32,
}

impl Default for FlexTreeConfig {
    fn default() -> Self {
        Self {
            neighbour_separation: 80.0,
        }
    }
}

const EPSILON: f32 = 1e-3;

/// One step of a contour: the outer cross coordinate of the subtree from the
/// previous segment's bottom down to `bottom`.
#[derive(Debug, Clone, Copy)]
struct Segment {
    bottom: f32,
    x: f32,
    /// Node that owns this extent.
    node: usize,
    /// Index of the sibling subtree the segment came from while merging.
    slot: usize,
}

#[derive(Debug, Clone, Default)]
struct Contour {
    left: Vec<Segment>,
    right: Vec<Segment>,
}

impl Contour {
    fn node(v: usize, bottom: f32, cross: f32) -> Self {
        Self {
            left: vec![Segment {
                bottom,
                x: -cross / 2.0,
                node: v,
                slot: 0,
            }],
            right: vec![Segment {
                bottom,
                x: cross / 2.0,
                node: v,
                slot: 0,
            }],
        }
    }

    fn shifted(&self, dx: f32, slot: usize) -> Self {
        let shift = |s: &Segment| Segment {
            x: s.x + dx,
            slot,
            ..*s
        };
        Self {
            left: self.left.iter().map(shift).collect(),
            right: self.right.iter().map(shift).collect(),
        }
    }

    /// Combine `self` with a subtree placed entirely to its right.
    fn merge(&self, next: &Contour) -> Contour {
        let right_tail = next.right.last().map_or(f32::NEG_INFINITY, |s| s.bottom);
        let mut right = next.right.clone();
        right.extend(self.right.iter().filter(|s| s.bottom > right_tail).copied());

        let left_tail = self.left.last().map_or(f32::NEG_INFINITY, |s| s.bottom);
        let mut left = self.left.clone();
        left.extend(next.left.iter().filter(|s| s.bottom > left_tail).copied());

        Contour { left, right }
    }
}

/// Result of the flextree computation, indexed like the input.
pub struct FlexTreeResult {
    /// Cross-axis center of each node.
    pub positions_x: Vec<f32>,
    /// Main-axis start of each node.
    pub positions_y: Vec<f32>,
    /// Number of nodes reached from the root.
    pub node_count: usize,
}

pub struct FlexTreeLayout {
    config: FlexTreeConfig,
}

impl FlexTreeLayout {
    pub fn new(config: FlexTreeConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FlexTreeConfig::default())
    }

    /// Lay out the tree rooted at `root`.
    ///
    /// # Arguments
    ///
    /// * `children` - Ordered children of every node
    /// * `footprints` - `[cross, main]` space reserved by every node
    ///
    /// The root is placed at `(0, 0)`. Nodes not reachable from `root` stay
    /// at the origin.
    pub fn compute(&self, root: usize, children: &[Vec<usize>], footprints: &[[f32; 2]]) -> FlexTreeResult {
        let n = children.len();
        let mut positions_x = vec![0.0f32; n];
        let mut positions_y = vec![0.0f32; n];
        if root >= n {
            return FlexTreeResult {
                positions_x,
                positions_y,
                node_count: 0,
            };
        }

        // Top-down order doubles as the main-axis pass
        let mut order = Vec::with_capacity(n);
        let mut parent: Vec<Option<usize>> = vec![None; n];
        order.push(root);
        let mut head = 0;
        while head < order.len() {
            let v = order[head];
            head += 1;
            for &c in &children[v] {
                parent[c] = Some(v);
                positions_y[c] = positions_y[v] + footprints[v][1];
                order.push(c);
            }
        }

        let mut rel_x = vec![0.0f32; n];
        let mut contours: Vec<Option<Contour>> = vec![None; n];
        for &v in order.iter().rev() {
            let contour = self.first_walk(v, children, footprints, &positions_y, &parent, &mut contours, &mut rel_x);
            contours[v] = Some(contour);
        }

        // Second walk
        for &v in &order {
            if let Some(p) = parent[v] {
                positions_x[v] = positions_x[p] + rel_x[v];
            }
        }

        FlexTreeResult {
            positions_x,
            positions_y,
            node_count: order.len(),
        }
    }

    /// Place the children of `v` relative to `v` and return `v`'s contour.
    #[allow(clippy::too_many_arguments)]
    fn first_walk(
        &self,
        v: usize,
        children: &[Vec<usize>],
        footprints: &[[f32; 2]],
        y: &[f32],
        parent: &[Option<usize>],
        contours: &mut [Option<Contour>],
        rel_x: &mut [f32],
    ) -> Contour {
        let [cross, main] = footprints[v];
        let bottom = y[v] + main;
        let kids = &children[v];
        if kids.is_empty() {
            return Contour::node(v, bottom, cross);
        }

        let subtrees: Vec<Contour> = kids
            .iter()
            .map(|&c| contours[c].take().unwrap_or_else(|| Contour::node(c, y[c], 0.0)))
            .collect();

        let mut offsets = vec![0.0f32; kids.len()];
        let mut placed: Vec<Contour> = Vec::with_capacity(kids.len());
        placed.push(subtrees[0].shifted(0.0, 0));
        let mut acc = placed[0].clone();

        for i in 1..kids.len() {
            let subtree = &subtrees[i];
            let (s, binding) = self
                .separation(&acc.right, &subtree.left, bottom, parent)
                .unwrap_or((offsets[i - 1], i - 1));
            offsets[i] = s;
            placed.push(subtree.shifted(s, i));

            // Pushed by a non-adjacent sibling: spread the slack over the
            // siblings in between
            if binding + 1 < i {
                let s_mid = (binding + 1..i)
                    .filter_map(|k| self.separation(&placed[k].right, &subtree.left, bottom, parent))
                    .map(|(need, _)| need)
                    .fold(f32::NEG_INFINITY, f32::max);
                let slack = s - s_mid;
                if s_mid.is_finite() && slack > EPSILON {
                    let span = (i - binding) as f32;
                    for k in binding + 1..i {
                        let dx = slack * (k - binding) as f32 / span;
                        offsets[k] += dx;
                        placed[k] = placed[k].shifted(dx, k);
                    }
                    acc = placed[1..i]
                        .iter()
                        .fold(placed[0].clone(), |acc, next| acc.merge(next));
                }
            }
            acc = acc.merge(&placed[i]);
        }

        // Center over the outer edges of the first and last children
        let last = kids.len() - 1;
        let left_edge = offsets[0] - footprints[kids[0]][0] / 2.0;
        let right_edge = offsets[last] + footprints[kids[last]][0] / 2.0;
        let center = (left_edge + right_edge) / 2.0;
        for (&c, &off) in kids.iter().zip(&offsets) {
            rel_x[c] = off - center;
        }

        let below = acc.shifted(-center, 0);
        let mut contour = Contour::node(v, bottom, cross);
        contour
            .left
            .extend(below.left.into_iter().filter(|s| s.bottom > bottom));
        contour
            .right
            .extend(below.right.into_iter().filter(|s| s.bottom > bottom));
        contour
    }

    /// Smallest offset for a subtree with left contour `left` so that it clears
    /// `right`, together with the sibling slot of the binding segment.
    ///
    /// Both contours start at `top`. Segments that start at the same main
    /// coordinate always interact, so zero-length footprints still stack.
    fn separation(
        &self,
        right: &[Segment],
        left: &[Segment],
        top: f32,
        parent: &[Option<usize>],
    ) -> Option<(f32, usize)> {
        let (mut i, mut j) = (0, 0);
        let (mut r_top, mut l_top) = (top, top);
        let mut best: Option<(f32, usize)> = None;

        while i < right.len() && j < left.len() {
            let r = right[i];
            let l = left[j];
            let overlaps =
                r_top.max(l_top) < r.bottom.min(l.bottom) || (r_top - l_top).abs() < EPSILON;
            if overlaps {
                let spacing = if parent[r.node].is_some() && parent[r.node] == parent[l.node] {
                    0.0
                } else {
                    self.config.neighbour_separation
                };
                let need = r.x + spacing - l.x;
                best = match best {
                    Some((b, slot)) if need < b - EPSILON || (need < b + EPSILON && slot >= r.slot) => {
                        Some((b, slot))
                    }
                    _ => Some((need, r.slot)),
                };
            }

            if r.bottom < l.bottom - EPSILON {
                r_top = r.bottom;
                i += 1;
            } else if l.bottom < r.bottom - EPSILON {
                l_top = l.bottom;
                j += 1;
            } else {
                r_top = r.bottom;
                l_top = l.bottom;
                i += 1;
                j += 1;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap(x: &[f32], y: &[f32], fp: &[[f32; 2]], a: usize, b: usize) -> bool {
        let ax = (x[a] - fp[a][0] / 2.0, x[a] + fp[a][0] / 2.0);
        let bx = (x[b] - fp[b][0] / 2.0, x[b] + fp[b][0] / 2.0);
        let ay = (y[a], y[a] + fp[a][1]);
        let by = (y[b], y[b] + fp[b][1]);
        ax.0 < bx.1 - 1e-3 && bx.0 < ax.1 - 1e-3 && ay.0 < by.1 - 1e-3 && by.0 < ay.1 - 1e-3
    }

    fn assert_no_overlap(x: &[f32], y: &[f32], fp: &[[f32; 2]]) {
        for a in 0..x.len() {
            for b in a + 1..x.len() {
                assert!(
                    !overlap(x, y, fp, a, b),
                    "nodes {} and {} overlap: x=({}, {}), y=({}, {})",
                    a,
                    b,
                    x[a],
                    x[b],
                    y[a],
                    y[b]
                );
            }
        }
    }

    #[test]
    fn test_single_node() {
        let layout = FlexTreeLayout::with_defaults();
        let result = layout.compute(0, &[vec![]], &[[100.0, 50.0]]);
        assert_eq!(result.node_count, 1);
        assert_eq!((result.positions_x[0], result.positions_y[0]), (0.0, 0.0));
    }

    #[test]
    fn test_simple_tree() {
        let layout = FlexTreeLayout::with_defaults();
        // Tree: 0 -> 1, 0 -> 2
        let children = vec![vec![1, 2], vec![], vec![]];
        let fp = [[270.0, 210.0]; 3];
        let result = layout.compute(0, &children, &fp);

        assert_eq!(result.node_count, 3);
        let (x, y) = (&result.positions_x, &result.positions_y);
        let midpoint = (x[1] + x[2]) / 2.0;
        assert!(
            (x[0] - midpoint).abs() < 0.01,
            "Root x ({}) should be midpoint of children ({})",
            x[0],
            midpoint
        );
        assert!((y[1] - 210.0).abs() < 0.01, "Child y should be 210, got {}", y[1]);
        assert!(
            (x[2] - x[1] - 270.0).abs() < 0.01,
            "Siblings touch footprint to footprint: {} vs {}",
            x[1],
            x[2]
        );
    }

    #[test]
    fn test_cousins_get_neighbour_gap() {
        let layout = FlexTreeLayout::new(FlexTreeConfig {
            neighbour_separation: 80.0,
        });
        // 0 -> 1, 0 -> 2; 1 -> 3; 2 -> 4
        let children = vec![vec![1, 2], vec![3], vec![4], vec![], vec![]];
        let fp = [[100.0, 50.0]; 5];
        let result = layout.compute(0, &children, &fp);
        let x = &result.positions_x;

        assert!(
            x[4] - x[3] >= 100.0 + 80.0 - 0.01,
            "cousins must be separated by the neighbour margin: {} vs {}",
            x[3],
            x[4]
        );
        assert_no_overlap(x, &result.positions_y, &fp);
    }

    #[test]
    fn test_variable_sizes_do_not_overlap() {
        let layout = FlexTreeLayout::with_defaults();
        // A tall leaf next to a deep narrow subtree
        let children = vec![vec![1, 2, 3], vec![], vec![4], vec![], vec![5], vec![]];
        let fp = [
            [100.0, 50.0],
            [300.0, 400.0],
            [100.0, 50.0],
            [100.0, 50.0],
            [120.0, 50.0],
            [500.0, 50.0],
        ];
        let result = layout.compute(0, &children, &fp);
        assert_eq!(result.node_count, 6);
        assert_no_overlap(&result.positions_x, &result.positions_y, &fp);
        // Node 5 sits at main 150, inside the tall leaf's range, so it must clear it
        let x = &result.positions_x;
        assert!(x[5] - 250.0 >= x[1] + 150.0 + 80.0 - 0.01);
    }

    #[test]
    fn test_slack_spread_to_middle_sibling() {
        let layout = FlexTreeLayout::new(FlexTreeConfig {
            neighbour_separation: 0.0,
        });
        // 1 and 3 have wide grandchildren; 2 is a lone leaf between them
        let children = vec![vec![1, 2, 3], vec![4], vec![], vec![5], vec![], vec![]];
        let fp = [
            [100.0, 100.0],
            [100.0, 100.0],
            [100.0, 100.0],
            [100.0, 100.0],
            [600.0, 100.0],
            [600.0, 100.0],
        ];
        let result = layout.compute(0, &children, &fp);
        let x = &result.positions_x;

        assert_no_overlap(x, &result.positions_y, &fp);
        let left_gap = x[2] - x[1];
        let right_gap = x[3] - x[2];
        assert!(
            (left_gap - right_gap).abs() < 0.01,
            "middle sibling should be centered: gaps {} and {}",
            left_gap,
            right_gap
        );
    }

    #[test]
    fn test_zero_footprints_stack_at_edge() {
        let layout = FlexTreeLayout::with_defaults();
        let children = vec![vec![1, 2, 3], vec![], vec![], vec![]];
        let fp = [[100.0, 50.0], [400.0, 300.0], [0.0, 0.0], [0.0, 0.0]];
        let result = layout.compute(0, &children, &fp);
        let x = &result.positions_x;

        assert!((x[2] - (x[1] + 200.0)).abs() < 0.01);
        assert!((x[3] - x[2]).abs() < 0.01);
        // Parent centered over the outer edges: the block itself
        assert!((x[0] - x[1]).abs() < 0.01, "parent {} block {}", x[0], x[1]);
    }
}

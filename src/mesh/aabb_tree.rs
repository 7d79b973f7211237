use super::DataTriangle;
use crate::math::{Point3, Ray, Vector3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb {
    /// Box enclosing three points.
    #[must_use]
    pub fn from_triangle(vertices: &[Point3; 3]) -> Self {
        let mut bbox = Self {
            min: vertices[0],
            max: vertices[0],
        };
        bbox.extend_point(&vertices[1]);
        bbox.extend_point(&vertices[2]);
        bbox
    }

    /// Grows the box to contain `p`.
    pub fn extend_point(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Grows the box to contain `other`.
    pub fn extend_box(&mut self, other: &Self) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    /// Grows the box by `eps` in every direction.
    pub fn inflate(&mut self, eps: f64) {
        let delta = Vector3::repeat(eps);
        self.min -= delta;
        self.max += delta;
    }

    /// Index of the longest axis.
    #[must_use]
    pub fn longest_axis(&self) -> usize {
        (self.max - self.min).imax()
    }

    /// Squared distance from `p` to the box, zero inside.
    #[must_use]
    pub fn squared_distance(&self, p: &Point3) -> f64 {
        (0..3)
            .map(|i| {
                let d = (self.min[i] - p[i]).max(0.0).max(p[i] - self.max[i]);
                d * d
            })
            .sum()
    }

    /// Slab test: does the ray enter the box with a parameter in `[0, t_max]`?
    #[must_use]
    pub fn hit_by_ray(&self, origin: &Point3, inv_dir: &Vector3, t_max: f64) -> bool {
        let mut t_enter = 0.0_f64;
        let mut t_exit = t_max;
        for axis in 0..3 {
            let mut t0 = (self.min[axis] - origin[axis]) * inv_dir[axis];
            let mut t1 = (self.max[axis] - origin[axis]) * inv_dir[axis];
            if inv_dir[axis] < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            // NaN appears for a zero direction component with the origin on a slab plane.
            if t0.is_nan() || t1.is_nan() {
                continue;
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf { bbox: Aabb, primitive: usize },
    Inner { bbox: Aabb },
    Empty,
}

struct BuildInput {
    primitive: usize,
    bbox: Aabb,
    centroid: Point3,
}

/// Bounding volume hierarchy over triangles, stored as an implicit balanced
/// binary tree (children of node `i` at `2i + 1` and `2i + 2`).
#[derive(Debug, Clone, Default)]
pub struct AabbTree {
    nodes: Vec<Node>,
}

impl AabbTree {
    /// Builds the tree by recursive median splits along the longest axis.
    #[must_use]
    pub fn build(triangles: &[DataTriangle]) -> Self {
        if triangles.is_empty() {
            return Self::default();
        }

        let mut input: Vec<BuildInput> = triangles
            .iter()
            .enumerate()
            .map(|(primitive, tri)| {
                let mut bbox = Aabb::from_triangle(&tri.vertices);
                let scale = (bbox.max - bbox.min).amax().max(1.0);
                bbox.inflate(scale * 1e-9);
                BuildInput {
                    primitive,
                    bbox,
                    centroid: tri.centroid(),
                }
            })
            .collect();

        let len = input.len();
        let mut tree = Self {
            nodes: vec![Node::Empty; len.next_power_of_two() * 2 - 1],
        };
        tree.build_recursive(&mut input, 0);
        tree
    }

    fn build_recursive(&mut self, input: &mut [BuildInput], node: usize) {
        if let [single] = input {
            self.nodes[node] = Node::Leaf {
                bbox: single.bbox,
                primitive: single.primitive,
            };
            return;
        }

        let mut bbox = input[0].bbox;
        for item in &input[1..] {
            bbox.extend_box(&item.bbox);
        }
        let axis = bbox.longest_axis();
        let center = (input.len() - 1) / 2;
        input.select_nth_unstable_by(center, |a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));

        self.nodes[node] = Node::Inner { bbox };
        let (left, right) = input.split_at_mut(center + 1);
        self.build_recursive(left, 2 * node + 1);
        self.build_recursive(right, 2 * node + 2);
    }

    /// Returns `true` if the tree holds no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds the closest primitive along `ray`.
    ///
    /// `intersect` resolves the exact ray parameter of a candidate primitive;
    /// boxes farther than the best hit so far are skipped.
    pub fn closest_hit<F>(&self, ray: &Ray, mut intersect: F) -> Option<(usize, f64)>
    where
        F: FnMut(usize) -> Option<f64>,
    {
        if self.is_empty() {
            return None;
        }
        let inv_dir = ray.direction.map(|d| 1.0 / d);
        let mut best: Option<(usize, f64)> = None;
        let mut stack = vec![0usize];

        while let Some(index) = stack.pop() {
            let t_max = best.map_or(f64::INFINITY, |(_, t)| t);
            match self.nodes.get(index) {
                Some(Node::Leaf { bbox, primitive }) => {
                    if !bbox.hit_by_ray(&ray.origin, &inv_dir, t_max) {
                        continue;
                    }
                    if let Some(t) = intersect(*primitive) {
                        let better = match best {
                            None => true,
                            Some((best_primitive, best_t)) => {
                                t < best_t || (t == best_t && *primitive < best_primitive)
                            }
                        };
                        if better {
                            best = Some((*primitive, t));
                        }
                    }
                }
                Some(Node::Inner { bbox }) => {
                    if bbox.hit_by_ray(&ray.origin, &inv_dir, t_max) {
                        stack.push(2 * index + 2);
                        stack.push(2 * index + 1);
                    }
                }
                Some(Node::Empty) | None => {}
            }
        }
        best
    }

    /// Collects every primitive whose box intersects the given sphere.
    #[must_use]
    pub fn within_sphere(&self, center: &Point3, radius: f64) -> Vec<usize> {
        let radius_sq = radius * radius;
        let mut found = Vec::new();
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            match self.nodes.get(index) {
                Some(Node::Leaf { bbox, primitive }) => {
                    if bbox.squared_distance(center) <= radius_sq {
                        found.push(*primitive);
                    }
                }
                Some(Node::Inner { bbox }) => {
                    if bbox.squared_distance(center) <= radius_sq {
                        stack.push(2 * index + 2);
                        stack.push(2 * index + 1);
                    }
                }
                Some(Node::Empty) | None => {}
            }
        }
        found.sort_unstable();
        found
    }
}

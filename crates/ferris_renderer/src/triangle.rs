//! Triangle primitive for ray tracing.
//!
//! A triangle is stored as a corner `q` plus two edges `u`, `v`, so its
//! vertices are `q`, `q + u` and `q + v`. Intersection solves the ray against
//! the supporting plane, then classifies the planar hit point with barycentric
//! coordinates.

use std::sync::Arc;

use crate::{
    hittable::{HitRecord, Hittable},
    Material,
};
use ferris_math::{Aabb, Interval, Ray, Vec3};

/// Rays whose direction is this close to perpendicular to the plane normal
/// are treated as parallel.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A triangle primitive.
#[derive(Clone)]
pub struct Triangle {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    /// Unit plane normal, normalize(u x v)
    normal: Vec3,
    /// Plane constant: normal . q
    d: f32,
    /// (u x v) / |u x v|^2, for barycentric coordinates
    w: Vec3,
    material: Arc<dyn Material>,
    bbox: Aabb,
}

impl Triangle {
    /// Create a triangle from a corner and the two edges leaving it.
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: Arc<dyn Material>) -> Self {
        let n = u.cross(v);
        let normal = n.normalize();
        let d = normal.dot(q);
        let w = n / n.dot(n);

        let bbox = Aabb::from_vertices(&[q, q + u, q + v]);

        Self {
            q,
            u,
            v,
            normal,
            d,
            w,
            material,
            bbox,
        }
    }

    /// Create a triangle from three vertices, counter-clockwise when seen from
    /// the side its normal points to.
    pub fn from_vertices(v0: Vec3, v1: Vec3, v2: Vec3, material: Arc<dyn Material>) -> Self {
        Self::new(v0, v1 - v0, v2 - v0, material)
    }

    /// The three vertices: `q`, `q + u`, `q + v`.
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.q, self.q + self.u, self.q + self.v]
    }

    /// The two edges `(u, v)` leaving the first vertex.
    pub fn edges(&self) -> (Vec3, Vec3) {
        (self.u, self.v)
    }

    /// Unit normal of the supporting plane (NaN for degenerate triangles).
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Barycentric classification of a point on the plane.
    ///
    /// Returns `(alpha, beta)` when all three weights are non-negative. Edges
    /// belong to the triangle, so adjacent triangles may both report a hit on
    /// a shared edge.
    fn interior(&self, alpha: f32, beta: f32) -> Option<(f32, f32)> {
        let gamma = 1.0 - alpha - beta;
        if alpha < 0.0 || beta < 0.0 || gamma < 0.0 {
            return None;
        }
        Some((alpha, beta))
    }
}

impl Hittable for Triangle {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let denom = self.normal.dot(ray.direction());

        // No hit if the ray is parallel to the plane
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = (self.d - self.normal.dot(ray.origin())) / denom;
        // Also rejects NaN from degenerate (zero-area) triangles
        if !ray_t.contains(t) {
            return None;
        }

        let planar_hitpt = ray.at(t) - self.q;
        let alpha = self.w.dot(planar_hitpt.cross(self.v));
        let beta = self.w.dot(self.u.cross(planar_hitpt));
        let uv = self.interior(alpha, beta)?;

        Some(HitRecord::new(ray, t, self.normal, uv, self.material.as_ref()))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

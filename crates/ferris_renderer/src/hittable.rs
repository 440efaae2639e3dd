//! Hittable trait and HitRecord for ray-object intersection.

use crate::Material;
use ferris_math::{Aabb, Interval, Ray, Vec3};

/// Record of a ray-object intersection.
///
/// Borrowed from the primitive that produced it, so a record never outlives
/// the scene it was found in.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Vec3,
    /// Unit surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a dyn Material,
    /// Surface coordinates; barycentric (alpha, beta) for triangles
    pub u: f32,
    pub v: f32,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> HitRecord<'a> {
    /// Build a record at parameter `t`, orienting the normal against the ray.
    ///
    /// `outward_normal` must be unit length.
    pub fn new(
        ray: &Ray,
        t: f32,
        outward_normal: Vec3,
        (u, v): (f32, f32),
        material: &'a dyn Material,
    ) -> Self {
        // If the ray and normal point in the same direction, we're inside
        let front_face = ray.direction().dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };

        Self {
            p: ray.at(t),
            normal,
            material,
            u,
            v,
            t,
            front_face,
        }
    }
}

/// Trait for objects that can be hit by rays.
///
/// Implementors are shared read-only between render workers.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this object with `t` inside `ray_t`.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>>;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;
}

/// Scan `objects` linearly and keep the closest hit.
///
/// Every aggregate goes through here: each successful hit shrinks the search
/// window to its `t`, so the record returned has the smallest valid `t`
/// regardless of the order the objects are visited in.
pub fn nearest_hit<'a, H>(
    objects: impl IntoIterator<Item = &'a H>,
    ray: &Ray,
    ray_t: Interval,
) -> Option<HitRecord<'a>>
where
    H: Hittable + ?Sized + 'a,
{
    let mut closest = None;
    let mut window = ray_t;

    for object in objects {
        if let Some(rec) = object.hit(ray, window) {
            window = window.with_max(rec.t);
            closest = Some(rec);
        }
    }

    closest
}

//! Scene container: an unordered set of hittables tested by linear scan.

use crate::hittable::{nearest_hit, HitRecord, Hittable};
use ferris_math::{Aabb, Interval, Ray};

/// A list of hittable objects.
///
/// Built once before rendering and shared read-only between render workers.
pub struct Scene {
    objects: Vec<Box<dyn Hittable>>,
    bbox: Aabb,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bbox: Aabb::EMPTY,
        }
    }

    /// Add an object to the scene.
    pub fn add(&mut self, object: impl Hittable + 'static) {
        self.add_boxed(Box::new(object));
    }

    pub fn add_boxed(&mut self, object: Box<dyn Hittable>) {
        self.bbox = Aabb::surrounding(&self.bbox, &object.bounding_box());
        self.objects.push(object);
    }

    /// Clear all objects from the scene.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.bbox = Aabb::EMPTY;
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Hittable + 'static> FromIterator<H> for Scene {
    fn from_iter<I: IntoIterator<Item = H>>(iter: I) -> Self {
        let mut scene = Scene::new();
        for object in iter {
            scene.add(object);
        }
        scene
    }
}

impl Hittable for Scene {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        nearest_hit(self.objects.iter().map(|o| o.as_ref()), ray, ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiffuseLight, Material, Triangle};
    use ferris_math::Vec3;
    use std::sync::Arc;

    /// Unit right triangle in the plane z = `z`, emitting `color`.
    fn tri_at(z: f32, color: Vec3) -> Triangle {
        let material: Arc<dyn Material> = Arc::new(DiffuseLight::new(color));
        Triangle::from_vertices(
            Vec3::new(0.0, 0.0, z),
            Vec3::new(1.0, 0.0, z),
            Vec3::new(0.0, 1.0, z),
            material,
        )
    }

    #[test]
    fn test_empty_scene_misses() {
        let scene = Scene::new();
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::Z);

        assert!(scene.is_empty());
        assert!(scene.hit(&ray, Interval::UNIVERSE).is_none());
        assert!(scene.bounding_box().is_empty());
    }

    #[test]
    fn test_nearest_hit_wins_in_any_order() {
        let near = Vec3::new(1.0, 0.0, 0.0);
        let far = Vec3::new(0.0, 1.0, 0.0);
        let ray = Ray::new_simple(Vec3::new(0.2, 0.2, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let interval = Interval::new(0.001, f32::INFINITY);

        let front_to_back: Scene = [tri_at(1.0, near), tri_at(-1.0, far)].into_iter().collect();
        let back_to_front: Scene = [tri_at(-1.0, far), tri_at(1.0, near)].into_iter().collect();

        for scene in [front_to_back, back_to_front] {
            let rec = scene.hit(&ray, interval).unwrap();
            assert!((rec.t - 4.0).abs() < 1e-5);
            assert_eq!(rec.material.emitted(rec.u, rec.v, rec.p), near);
        }
    }

    #[test]
    fn test_hit_respects_interval_upper_bound() {
        let scene: Scene = [tri_at(1.0, Vec3::ONE), tri_at(-1.0, Vec3::ONE)]
            .into_iter()
            .collect();
        let ray = Ray::new_simple(Vec3::new(0.2, 0.2, 5.0), Vec3::new(0.0, 0.0, -1.0));

        assert!(scene.hit(&ray, Interval::new(0.001, 3.0)).is_none());

        // Only the far triangle lies in the window
        let rec = scene.hit(&ray, Interval::new(5.0, 10.0)).unwrap();
        assert!((rec.t - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_scene_bounding_box_is_union() {
        let mut scene = Scene::new();
        scene.add(tri_at(1.0, Vec3::ONE));
        scene.add(tri_at(-3.0, Vec3::ONE));

        let bbox = scene.bounding_box();
        assert_eq!(scene.len(), 2);
        assert_eq!(bbox.x.min, 0.0);
        assert_eq!(bbox.x.max, 1.0);
        assert!(bbox.z.min <= -3.0 && bbox.z.max >= 1.0);

        scene.clear();
        assert!(scene.is_empty());
        assert!(scene.bounding_box().is_empty());
    }
}

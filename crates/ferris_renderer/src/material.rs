//! Material trait for surface scattering.
//!
//! The integrator only ever talks to [`Material`]; concrete variants are
//! shared between primitives through `Arc<dyn Material>`.

use std::f32::consts::PI;

use crate::hittable::HitRecord;
use crate::sampling::{gen_f32, random_cosine_direction, random_unit_vector, Onb};
use ferris_math::{Ray, Vec3};
use rand::RngCore;

/// Color type alias (linear RGB, typically 0-1)
pub type Color = Vec3;

/// Outcome of a scattering event.
#[derive(Debug, Clone, Copy)]
pub enum Scatter {
    /// A bounce drawn from a continuous distribution. The integrator weights
    /// it with [`Material::scattering_pdf`]; `pdf` is the density the sample
    /// was drawn with.
    Sampled {
        attenuation: Color,
        scattered: Ray,
        pdf: f32,
    },
    /// A delta bounce (mirror, glass). No density exists; the path throughput
    /// is multiplied by the attenuation alone.
    Specular { attenuation: Color, scattered: Ray },
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<Scatter>;

    /// Density with which this material scatters `ray_in` into `scattered`.
    fn scattering_pdf(&self, _ray_in: &Ray, _rec: &HitRecord, _scattered: &Ray) -> f32 {
        0.0
    }

    /// Get emitted light from this material.
    ///
    /// Returns the color of light emitted at the given UV coordinates and point.
    /// Most materials return black (no emission).
    fn emitted(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        Color::ZERO
    }
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<Scatter> {
        // Cosine-weighted hemisphere around the normal
        let onb = Onb::new(rec.normal);
        let direction = onb.transform(random_cosine_direction(rng));

        Some(Scatter::Sampled {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, direction, ray_in.time()),
            pdf: onb.w.dot(direction) / PI,
        })
    }

    fn scattering_pdf(&self, _ray_in: &Ray, rec: &HitRecord, scattered: &Ray) -> f32 {
        let cos_theta = rec.normal.dot(scattered.direction().normalize());
        if cos_theta < 0.0 {
            0.0
        } else {
            cos_theta / PI
        }
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<Scatter> {
        let reflected = reflect(ray_in.direction().normalize(), rec.normal);
        let direction = reflected + self.fuzz * random_unit_vector(rng);

        // Fuzz pushed the ray below the surface: absorb it
        if direction.dot(rec.normal) <= 0.0 {
            return None;
        }

        Some(Scatter::Specular {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, direction, ray_in.time()),
        })
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone)]
pub struct Dielectric {
    /// Index of refraction
    ior: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f32) -> Self {
        Self { ior }
    }

    /// Schlick's approximation for reflectance
    fn reflectance(cosine: f32, ior: f32) -> f32 {
        let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<Scatter> {
        let refraction_ratio = if rec.front_face {
            1.0 / self.ior
        } else {
            self.ior
        };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        // Total internal reflection
        let cannot_refract = refraction_ratio * sin_theta > 1.0;

        let direction = if cannot_refract
            || Self::reflectance(cos_theta, refraction_ratio) > gen_f32(rng)
        {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, refraction_ratio)
        };

        Some(Scatter::Specular {
            attenuation: Color::ONE,
            scattered: Ray::new(rec.p, direction, ray_in.time()),
        })
    }
}

/// Diffuse light emitter.
#[derive(Debug, Clone)]
pub struct DiffuseLight {
    emit: Color,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission color.
    pub fn new(emit: Color) -> Self {
        Self { emit }
    }
}

impl Material for DiffuseLight {
    fn scatter(&self, _ray_in: &Ray, _rec: &HitRecord, _rng: &mut dyn RngCore) -> Option<Scatter> {
        // Lights don't scatter rays
        None
    }

    fn emitted(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        self.emit
    }
}

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface.
#[inline]
fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record_facing_up<'a>(material: &'a dyn Material) -> (Ray, HitRecord<'a>) {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0), 0.25);
        let rec = HitRecord::new(&ray, 1.0, Vec3::Y, (0.0, 0.0), material);
        (ray, rec)
    }

    #[test]
    fn test_lambertian_scatters_into_hemisphere() {
        let material = Lambertian::new(Color::new(0.8, 0.4, 0.2));
        let (ray, rec) = record_facing_up(&material);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..500 {
            let Some(Scatter::Sampled {
                attenuation,
                scattered,
                pdf,
            }) = material.scatter(&ray, &rec, &mut rng)
            else {
                panic!("lambertian always produces a sampled bounce");
            };

            assert_eq!(attenuation, Color::new(0.8, 0.4, 0.2));
            assert!(scattered.direction().dot(rec.normal) >= 0.0);
            assert_eq!(scattered.origin(), rec.p);
            assert_eq!(scattered.time(), 0.25);

            // Sampling density agrees with the evaluated density
            let evaluated = material.scattering_pdf(&ray, &rec, &scattered);
            assert_abs_diff_eq!(pdf, evaluated, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_lambertian_pdf_below_surface_is_zero() {
        let material = Lambertian::new(Color::ONE);
        let (ray, rec) = record_facing_up(&material);
        let below = Ray::new_simple(rec.p, Vec3::new(0.3, -1.0, 0.0));

        assert_eq!(material.scattering_pdf(&ray, &rec, &below), 0.0);

        let straight_up = Ray::new_simple(rec.p, Vec3::Y * 5.0);
        assert_abs_diff_eq!(
            material.scattering_pdf(&ray, &rec, &straight_up),
            1.0 / PI,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_mirror_reflects() {
        let material = Metal::new(Color::splat(0.9), 0.0);
        let ray = Ray::new_simple(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let rec = HitRecord::new(&ray, 1.0, Vec3::Y, (0.0, 0.0), &material);
        let mut rng = StdRng::seed_from_u64(0);

        match material.scatter(&ray, &rec, &mut rng) {
            Some(Scatter::Specular { attenuation, scattered }) => {
                assert_eq!(attenuation, Color::splat(0.9));
                let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
                assert!((scattered.direction() - expected).length() < 1e-5);
            }
            _ => panic!("a perfect mirror must reflect specularly"),
        }
    }

    #[test]
    fn test_metal_fuzz_is_clamped() {
        let metal = Metal::new(Color::ONE, 3.0);
        assert_eq!(metal.fuzz, 1.0);
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        // Leaving glass at a grazing angle cannot refract
        let material = Dielectric::new(1.5);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(1.0, 0.2, 0.0));
        // Outward normal along +Y, ray travels along it: back face
        let rec = HitRecord::new(&ray, 1.0, Vec3::Y, (0.0, 0.0), &material);
        assert!(!rec.front_face);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..50 {
            match material.scatter(&ray, &rec, &mut rng) {
                Some(Scatter::Specular { attenuation, scattered }) => {
                    assert_eq!(attenuation, Color::ONE);
                    // Reflected back into the glass (against the flipped normal)
                    assert!(scattered.direction().y < 0.0);
                }
                _ => panic!("glass always scatters specularly"),
            }
        }
    }

    #[test]
    fn test_schlick_reflectance_bounds() {
        // Head-on glass reflects about 4%
        assert_abs_diff_eq!(Dielectric::reflectance(1.0, 1.5), 0.04, epsilon = 1e-4);
        // Grazing incidence reflects everything
        assert_abs_diff_eq!(Dielectric::reflectance(0.0, 1.5), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_diffuse_light_emits_and_absorbs() {
        let material = DiffuseLight::new(Color::new(4.0, 4.0, 4.0));
        let (ray, rec) = record_facing_up(&material);
        let mut rng = StdRng::seed_from_u64(0);

        assert!(material.scatter(&ray, &rec, &mut rng).is_none());
        assert_eq!(material.emitted(rec.u, rec.v, rec.p), Color::new(4.0, 4.0, 4.0));
        assert_eq!(material.scattering_pdf(&ray, &rec, &ray), 0.0);
    }
}

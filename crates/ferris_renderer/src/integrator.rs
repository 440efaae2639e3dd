//! Path integrator.
//!
//! [`ray_color`] follows one light path through the scene, gathering emitted
//! radiance weighted by the running attenuation product until the path
//! escapes, is absorbed, or runs out of bounces.

use crate::hittable::Hittable;
use crate::material::{Color, Scatter};
use ferris_math::{Interval, Ray};
use rand::RngCore;

/// Start of the valid hit interval, keeps bounces off their own surface.
pub const T_MIN: f32 = 0.001;

/// Densities at or below this terminate the path.
const PDF_EPSILON: f32 = 1e-8;

/// Compute the radiance carried back along `ray`.
///
/// `depth` is the number of surface interactions allowed; zero yields black.
/// A ray that leaves the scene picks up `background`.
pub fn ray_color(
    ray: &Ray,
    depth: u32,
    world: &dyn Hittable,
    background: Color,
    rng: &mut dyn RngCore,
) -> Color {
    let mut radiance = Color::ZERO;
    let mut throughput = Color::ONE;
    let mut ray = *ray;

    for _ in 0..depth {
        let Some(rec) = world.hit(&ray, Interval::new(T_MIN, f32::INFINITY)) else {
            return radiance + throughput * background;
        };

        radiance += throughput * rec.material.emitted(rec.u, rec.v, rec.p);

        match rec.material.scatter(&ray, &rec, rng) {
            // Absorbed, or a pure emitter
            None => return radiance,
            Some(Scatter::Specular {
                attenuation,
                scattered,
            }) => {
                throughput *= attenuation;
                ray = scattered;
            }
            Some(Scatter::Sampled {
                attenuation,
                scattered,
                ..
            }) => {
                // The density is re-evaluated for the chosen direction rather
                // than taken from the sampler.
                let scattering_pdf = rec.material.scattering_pdf(&ray, &rec, &scattered);
                let pdf_value = scattering_pdf;
                if !pdf_value.is_finite() || pdf_value <= PDF_EPSILON {
                    return radiance;
                }

                throughput *= attenuation * (scattering_pdf / pdf_value);
                ray = scattered;
            }
        }
    }

    // Bounce budget exhausted
    radiance
}

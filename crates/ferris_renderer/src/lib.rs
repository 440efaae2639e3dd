//! Ferris renderer - CPU path tracing
//!
//! A Monte Carlo path tracer over triangle geometry. A [`Camera`] generates
//! stratified rays, [`ray_color`] follows each path through a [`Scene`], and
//! the drivers in [`renderer`] assemble the image sequentially or on a
//! worker pool.

mod camera;
mod hittable;
mod integrator;
mod material;
mod mesh;
mod output;
pub mod renderer;
mod sampling;
mod scene;
mod triangle;

pub use camera::{sample_square_stratified, Camera, CameraConfig, CameraError, MAX_IMAGE_PIXELS};
pub use hittable::{nearest_hit, HitRecord, Hittable};
pub use integrator::{ray_color, T_MIN};
pub use material::{Color, Dielectric, DiffuseLight, Lambertian, Material, Metal, Scatter};
pub use mesh::{LoadError, LoadResult, Mesh};
pub use output::{color_to_rgb, linear_to_gamma, save_png, write_ppm};
pub use renderer::{
    render, render_parallel, render_pixel, render_sequential, render_to_ppm, ImageBuffer,
    RenderError, RenderOptions, RenderStrategy,
};
pub use sampling::{gen_f32, gen_range, random_cosine_direction, random_in_unit_disk, random_unit_vector, Onb};
pub use scene::Scene;
pub use triangle::Triangle;

/// Re-export Vec3 and common math types from ferris_math
pub use ferris_math::{Aabb, Interval, Ray, Vec3};

//! Camera for ray generation.
//!
//! A [`Camera`] is built from a [`CameraConfig`] and derives everything it
//! needs for ray generation in [`Camera::initialize`]. Pixels are sampled on
//! a stratified `sqrt_spp x sqrt_spp` grid with one jittered sample per cell.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sampling::{gen_f32, random_in_unit_disk};
use crate::Color;
use ferris_math::{Ray, Vec3};
use rand::RngCore;

/// Squared length below which a basis vector is considered degenerate.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// Largest image, in pixels, a camera may describe.
pub const MAX_IMAGE_PIXELS: u64 = 1 << 27;

/// Errors raised while deriving camera state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("look_from and look_at coincide, the view direction is undefined")]
    DegenerateView,

    #[error("vup is parallel to the view direction")]
    DegenerateUp,

    #[error("invalid camera setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
}

/// User-facing camera settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Ratio of image width over height
    pub aspect_ratio: f32,
    /// Rendered image width in pixels
    pub image_width: u32,
    /// Requested samples per pixel (truncated to a perfect square)
    pub samples_per_pixel: u32,
    /// Maximum number of bounces per path
    pub max_depth: u32,
    /// Radiance returned by rays that escape the scene
    pub background: Color,

    /// Vertical field of view in degrees
    pub vfov: f32,
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub vup: Vec3,

    /// Variation angle of rays through each pixel, in degrees
    pub defocus_angle: f32,
    /// Distance from the camera center to the plane of perfect focus
    pub focus_dist: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.0,
            image_width: 100,
            samples_per_pixel: 10,
            max_depth: 10,
            background: Color::ZERO,
            vfov: 90.0,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            defocus_angle: 0.0,
            focus_dist: 10.0,
        }
    }
}

impl CameraConfig {
    /// Set aspect ratio and image width.
    pub fn with_image(mut self, aspect_ratio: f32, image_width: u32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self.image_width = image_width;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples_per_pixel: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self.max_depth = max_depth;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    /// Set background color.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Image height for the configured width and aspect ratio, at least 1.
    fn derived_height(&self) -> f32 {
        (self.image_width as f32 / self.aspect_ratio).max(1.0)
    }

    fn validate(&self) -> Result<(), CameraError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> CameraError {
            CameraError::InvalidSetting {
                field,
                reason: reason.into(),
            }
        }

        if self.image_width == 0 {
            return Err(invalid("image_width", "must be at least 1"));
        }
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return Err(invalid(
                "aspect_ratio",
                format!("must be positive and finite, got {}", self.aspect_ratio),
            ));
        }

        let height = self.derived_height();
        if height >= u32::MAX as f32 {
            return Err(invalid(
                "aspect_ratio",
                format!(
                    "{} gives an image height of {} for width {}",
                    self.aspect_ratio, height, self.image_width
                ),
            ));
        }
        let pixels = self.image_width as u64 * height as u64;
        if pixels > MAX_IMAGE_PIXELS {
            return Err(invalid(
                "image_width",
                format!(
                    "{}x{} image exceeds the {} pixel limit",
                    self.image_width, height as u64, MAX_IMAGE_PIXELS
                ),
            ));
        }

        if self.samples_per_pixel == 0 {
            return Err(invalid("samples_per_pixel", "must be at least 1"));
        }
        if !self.vfov.is_finite() || self.vfov <= 0.0 || self.vfov >= 180.0 {
            return Err(invalid(
                "vfov",
                format!("must lie strictly between 0 and 180 degrees, got {}", self.vfov),
            ));
        }
        if !self.focus_dist.is_finite() || self.focus_dist <= 0.0 {
            return Err(invalid(
                "focus_dist",
                format!("must be positive and finite, got {}", self.focus_dist),
            ));
        }
        if !self.defocus_angle.is_finite() {
            return Err(invalid("defocus_angle", "must be finite"));
        }

        for (field, value) in [
            ("look_from", self.look_from),
            ("look_at", self.look_at),
            ("vup", self.vup),
            ("background", self.background),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, format!("must be finite, got {}", value)));
            }
        }

        Ok(())
    }
}

/// Camera for generating rays into the scene.
///
/// Derived state is immutable once [`Camera::new`] returns; render workers
/// share the camera by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    config: CameraConfig,

    // Cached computed values (set by initialize())
    image_height: u32,
    sqrt_spp: u32,
    recip_sqrt_spp: f32,
    pixel_samples_scale: f32,
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Create a camera and derive its state from `config`.
    pub fn new(config: CameraConfig) -> Result<Self, CameraError> {
        let mut camera = Self {
            config,
            image_height: 1,
            sqrt_spp: 1,
            recip_sqrt_spp: 1.0,
            pixel_samples_scale: 1.0,
            center: Vec3::ZERO,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
        };
        camera.initialize()?;
        Ok(camera)
    }

    /// Derive image, sampling and viewing state from the configuration.
    ///
    /// A pure function of the configuration: calling it again leaves the
    /// camera unchanged.
    pub fn initialize(&mut self) -> Result<(), CameraError> {
        let config = &self.config;
        config.validate()?;

        let image_width = config.image_width;
        let image_height = config.derived_height() as u32;

        let sqrt_spp = (config.samples_per_pixel as f64).sqrt().floor() as u32;
        if sqrt_spp * sqrt_spp != config.samples_per_pixel {
            log::warn!(
                "samples_per_pixel {} is not a perfect square, using {} ({}x{} grid)",
                config.samples_per_pixel,
                sqrt_spp * sqrt_spp,
                sqrt_spp,
                sqrt_spp
            );
        }

        // Camera basis
        let view = config.look_from - config.look_at;
        if view.length_squared() < DEGENERATE_EPSILON {
            return Err(CameraError::DegenerateView);
        }
        let w = view.normalize();
        let side = config.vup.cross(w);
        if side.length_squared() < DEGENERATE_EPSILON {
            return Err(CameraError::DegenerateUp);
        }
        let u = side.normalize();
        let v = w.cross(u);

        // Viewport dimensions
        let theta = config.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * config.focus_dist;
        let viewport_width = viewport_height * (image_width as f32 / image_height as f32);

        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        let pixel_delta_u = viewport_u / image_width as f32;
        let pixel_delta_v = viewport_v / image_height as f32;

        let center = config.look_from;
        let viewport_upper_left =
            center - config.focus_dist * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        let defocus_radius = config.focus_dist * (config.defocus_angle / 2.0).to_radians().tan();

        log::debug!(
            "Camera: {}x{} image, {}x{} sample grid",
            image_width,
            image_height,
            sqrt_spp,
            sqrt_spp
        );

        self.image_height = image_height;
        self.sqrt_spp = sqrt_spp;
        self.recip_sqrt_spp = 1.0 / sqrt_spp as f32;
        self.pixel_samples_scale = 1.0 / (sqrt_spp * sqrt_spp) as f32;
        self.center = center;
        self.pixel00_loc = pixel00_loc;
        self.pixel_delta_u = pixel_delta_u;
        self.pixel_delta_v = pixel_delta_v;
        self.u = u;
        self.v = v;
        self.w = w;
        self.defocus_disk_u = u * defocus_radius;
        self.defocus_disk_v = v * defocus_radius;

        Ok(())
    }

    /// Generate a ray through pixel (i, j), jittered inside stratum (s_i, s_j).
    pub fn get_ray(&self, i: u32, j: u32, s_i: u32, s_j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square_stratified(s_i, s_j, self.recip_sqrt_spp, rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.config.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        let ray_direction = pixel_sample - ray_origin;
        let ray_time = gen_f32(rng);

        Ray::new(ray_origin, ray_direction, ray_time)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn image_width(&self) -> u32 {
        self.config.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    /// Side length of the per-pixel sample grid.
    pub fn sqrt_spp(&self) -> u32 {
        self.sqrt_spp
    }

    /// Samples actually taken per pixel (`sqrt_spp` squared).
    pub fn effective_samples_per_pixel(&self) -> u32 {
        self.sqrt_spp * self.sqrt_spp
    }

    /// Get the samples scale factor (1 / effective samples per pixel).
    pub fn pixel_samples_scale(&self) -> f32 {
        self.pixel_samples_scale
    }

    pub fn max_depth(&self) -> u32 {
        self.config.max_depth
    }

    pub fn background(&self) -> Color {
        self.config.background
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }
}

/// Jittered offset inside stratum (s_i, s_j) of the unit pixel square.
///
/// The strata tile [-0.5, 0.5) x [-0.5, 0.5); stratum (s_i, s_j) covers
/// x in [s_i / n - 0.5, (s_i + 1) / n - 0.5) with `n = 1 / recip_sqrt_spp`,
/// and likewise for y.
pub fn sample_square_stratified(
    s_i: u32,
    s_j: u32,
    recip_sqrt_spp: f32,
    rng: &mut dyn RngCore,
) -> Vec3 {
    let px = ((s_i as f32 + gen_f32(rng)) * recip_sqrt_spp) - 0.5;
    let py = ((s_j as f32 + gen_f32(rng)) * recip_sqrt_spp) - 0.5;
    Vec3::new(px, py, 0.0)
}

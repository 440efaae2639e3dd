//! Render drivers.
//!
//! Both strategies walk the same pixel grid and draw samples from one
//! generator per scanline, seeded from a single base seed. For a given seed
//! the sequential and parallel strategies therefore produce identical images.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressState, ProgressStyle};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

use crate::integrator::ray_color;
use crate::output::{color_to_rgb, save_png, write_ppm, write_ppm_header, write_ppm_pixel};
use crate::{Camera, Color, Hittable};

/// Errors that can occur while rendering or writing an image.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// How scanlines are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderStrategy {
    /// One scanline after another on the calling thread.
    Sequential,
    /// Scanlines spread over a dedicated worker pool.
    #[default]
    Parallel,
}

/// Render driver settings.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub strategy: RenderStrategy,
    /// Worker count for the parallel strategy (`None` lets rayon decide)
    pub threads: Option<usize>,
    /// Base seed; `None` draws one from OS entropy per render
    pub seed: Option<u64>,
    /// Draw a scanline progress bar on stderr
    pub show_progress: bool,
}

impl RenderOptions {
    pub fn with_strategy(mut self, strategy: RenderStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

/// Linear-color image in raster order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Quantized 8-bit RGB bytes, three per pixel.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| color_to_rgb(*c)).collect()
    }

    /// Write as plain-text PPM.
    pub fn write_ppm<W: Write>(&self, writer: &mut W) -> Result<(), RenderError> {
        write_ppm(writer, self)?;
        Ok(())
    }

    /// Save as PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        save_png(self, path)?;
        Ok(())
    }
}

/// Average the stratified samples of pixel (i, j).
///
/// Non-finite components are replaced by 0.
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    i: u32,
    j: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let sqrt_spp = camera.sqrt_spp();
    let mut pixel_color = Color::ZERO;

    for s_j in 0..sqrt_spp {
        for s_i in 0..sqrt_spp {
            let ray = camera.get_ray(i, j, s_i, s_j, rng);
            pixel_color += ray_color(&ray, camera.max_depth(), world, camera.background(), rng);
        }
    }

    let color = pixel_color * camera.pixel_samples_scale();
    let finite = |c: f32| if c.is_finite() { c } else { 0.0 };
    Color::new(finite(color.x), finite(color.y), finite(color.z))
}

/// Generator for scanline `j` of a render seeded with `seed`.
fn scanline_rng(seed: u64, j: u32) -> StdRng {
    StdRng::seed_from_u64(seed ^ (j as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn render_scanline(camera: &Camera, world: &dyn Hittable, seed: u64, j: u32, row: &mut [Color]) {
    let mut rng = scanline_rng(seed, j);
    for (i, pixel) in row.iter_mut().enumerate() {
        *pixel = render_pixel(camera, world, i as u32, j, &mut rng);
    }
}

/// Bookkeeping shared by every render: start log, base seed, progress and
/// the closing timing log.
struct RenderPass {
    start: Instant,
    seed: u64,
    progress: ProgressBar,
}

impl RenderPass {
    fn begin(camera: &Camera, options: &RenderOptions) -> Self {
        log_start(camera, options);
        Self {
            start: Instant::now(),
            seed: options.seed.unwrap_or_else(rand::random),
            progress: progress_bar(camera, options),
        }
    }

    fn finish(self) {
        self.progress.finish_and_clear();
        log::info!("Render complete in {:.2?}", self.start.elapsed());
    }
}

/// Render scanline by scanline on the calling thread.
pub fn render_sequential(camera: &Camera, world: &dyn Hittable, options: &RenderOptions) -> ImageBuffer {
    let pass = RenderPass::begin(camera, options);
    let mut image = ImageBuffer::new(camera.image_width(), camera.image_height());
    let width = image.width as usize;

    for (j, row) in image.pixels.chunks_mut(width).enumerate() {
        render_scanline(camera, world, pass.seed, j as u32, row);
        pass.progress.inc(1);
    }

    pass.finish();
    image
}

/// Render on a dedicated worker pool, one scanline per task.
///
/// Each worker fills a disjoint row of the pre-sized buffer; the image is
/// complete once the pool joins.
pub fn render_parallel(
    camera: &Camera,
    world: &dyn Hittable,
    options: &RenderOptions,
) -> Result<ImageBuffer, RenderError> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = options.threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    let pass = RenderPass::begin(camera, options);
    let mut image = ImageBuffer::new(camera.image_width(), camera.image_height());
    let width = image.width as usize;
    let seed = pass.seed;

    pool.install(|| {
        image
            .pixels
            .par_chunks_mut(width)
            .enumerate()
            .progress_with(pass.progress.clone())
            .for_each(|(j, row)| render_scanline(camera, world, seed, j as u32, row));
    });

    pass.finish();
    Ok(image)
}

/// Render with the configured strategy.
pub fn render(
    camera: &Camera,
    world: &dyn Hittable,
    options: &RenderOptions,
) -> Result<ImageBuffer, RenderError> {
    match options.strategy {
        RenderStrategy::Sequential => Ok(render_sequential(camera, world, options)),
        RenderStrategy::Parallel => render_parallel(camera, world, options),
    }
}

/// Render straight to a PPM stream.
///
/// The sequential strategy writes each pixel as soon as it is computed; the
/// parallel strategy writes the assembled buffer after all workers finish.
pub fn render_to_ppm<W: Write>(
    camera: &Camera,
    world: &dyn Hittable,
    options: &RenderOptions,
    writer: &mut W,
) -> Result<(), RenderError> {
    match options.strategy {
        RenderStrategy::Sequential => {
            let pass = RenderPass::begin(camera, options);
            write_ppm_header(writer, camera.image_width(), camera.image_height())?;

            for j in 0..camera.image_height() {
                let mut rng = scanline_rng(pass.seed, j);
                for i in 0..camera.image_width() {
                    let color = render_pixel(camera, world, i, j, &mut rng);
                    write_ppm_pixel(writer, color)?;
                }
                pass.progress.inc(1);
            }

            writer.flush()?;
            pass.finish();
        }
        RenderStrategy::Parallel => {
            let image = render_parallel(camera, world, options)?;
            image.write_ppm(writer)?;
            writer.flush()?;
        }
    }

    Ok(())
}

fn log_start(camera: &Camera, options: &RenderOptions) {
    let threads = match options.strategy {
        RenderStrategy::Sequential => 1,
        RenderStrategy::Parallel => options.threads.unwrap_or_else(rayon::current_num_threads),
    };

    log::info!(
        "Rendering {}x{} at {} spp, depth {} ({:?}, {} threads)",
        camera.image_width(),
        camera.image_height(),
        camera.effective_samples_per_pixel(),
        camera.max_depth(),
        options.strategy,
        threads
    );
}

/// Scanlines still to render, given the bar length and position.
fn scanlines_left(len: Option<u64>, pos: u64) -> u64 {
    len.unwrap_or(0).saturating_sub(pos)
}

/// Scanlines-remaining counter on stderr, hidden unless requested.
fn progress_bar(camera: &Camera, options: &RenderOptions) -> ProgressBar {
    if !options.show_progress {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template(
        "[{elapsed_precise}] {wide_bar} {scanlines_left} scanlines remaining",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .with_key("scanlines_left", |state: &ProgressState, w: &mut dyn fmt::Write| {
        let _ = write!(w, "{}", scanlines_left(state.len(), state.pos()));
    });

    ProgressBar::new(camera.image_height() as u64).with_style(style)
}

//! Image output: 8-bit quantization, plain-text PPM and PNG.

use std::io::{self, Write};
use std::path::Path;

use crate::material::Color;
use crate::renderer::ImageBuffer;
use ferris_math::Interval;

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGB.
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    const INTENSITY: Interval = Interval {
        min: 0.0,
        max: 0.999,
    };

    let quantize = |c: f32| (256.0 * INTENSITY.clamp(linear_to_gamma(c))) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z)]
}

/// Write the PPM (P3) header.
pub fn write_ppm_header<W: Write>(writer: &mut W, width: u32, height: u32) -> io::Result<()> {
    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", width, height)?;
    writeln!(writer, "255")
}

/// Write one pixel as an `r g b` line.
pub fn write_ppm_pixel<W: Write>(writer: &mut W, color: Color) -> io::Result<()> {
    let [r, g, b] = color_to_rgb(color);
    writeln!(writer, "{} {} {}", r, g, b)
}

/// Write a whole image as PPM, in raster order.
pub fn write_ppm<W: Write>(writer: &mut W, image: &ImageBuffer) -> io::Result<()> {
    write_ppm_header(writer, image.width, image.height)?;
    for color in &image.pixels {
        write_ppm_pixel(writer, *color)?;
    }
    Ok(())
}

/// Save an image as PNG with the same quantization as the PPM writer.
pub fn save_png<P: AsRef<Path>>(image: &ImageBuffer, path: P) -> Result<(), image::ImageError> {
    image::save_buffer_with_format(
        path,
        &image.to_rgb8(),
        image.width,
        image.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
}

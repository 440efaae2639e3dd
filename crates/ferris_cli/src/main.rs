use std::fs::File;
use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;
use ferris_renderer::{render, render_to_ppm, Camera, CameraConfig};

mod cli;
mod logger;
mod scenes;

use cli::{is_png, Args};
use logger::init_logger;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.clone().into());

    let config = match &args.camera {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read camera config {}", path.display()))?;
            serde_json::from_str::<CameraConfig>(&text)
                .with_context(|| format!("failed to parse camera config {}", path.display()))?
        }
        None => scenes::demo_camera(),
    };
    let camera = Camera::new(args.apply_overrides(config)).context("invalid camera configuration")?;

    let world = scenes::demo_box(args.mesh.as_deref()).context("failed to build scene")?;
    let options = args.render_options();

    match &args.output {
        Some(path) if is_png(path) => {
            let image = render(&camera, &world, &options)?;
            image
                .save_png(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("Saved {}", path.display());
        }
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            render_to_ppm(&camera, &world, &options, &mut writer)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("Saved {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            render_to_ppm(&camera, &world, &options, &mut writer)
                .context("failed to write image to stdout")?;
        }
    }

    Ok(())
}

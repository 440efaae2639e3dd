use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use ferris_renderer::{CameraConfig, RenderOptions, RenderStrategy};
use log::LevelFilter;

/// Log levels selectable on the command line
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "ferris")]
#[command(about = "Offline path tracer for triangle scenes")]
pub struct Args {
    /// Mesh file (v/f records) placed inside the demo box
    #[arg(long)]
    pub mesh: Option<PathBuf>,

    /// Camera configuration as JSON; missing fields take their defaults
    #[arg(long)]
    pub camera: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Samples per pixel (rounded down to a perfect square)
    #[arg(long, short = 's')]
    pub samples: Option<u32>,

    /// Maximum bounce depth
    #[arg(long)]
    pub depth: Option<u32>,

    /// Worker threads for the parallel renderer
    #[arg(long, short = 'j')]
    pub threads: Option<usize>,

    /// Base random seed, for reproducible images
    #[arg(long)]
    pub seed: Option<u64>,

    /// Render on the calling thread, streaming pixels as they finish
    #[arg(long)]
    pub sequential: bool,

    /// Hide the progress bar
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Output file (.png writes PNG, anything else PPM); stdout PPM if absent
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Set the logging level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    /// Apply the command line overrides on top of a camera configuration.
    pub fn apply_overrides(&self, mut config: CameraConfig) -> CameraConfig {
        if let Some(width) = self.width {
            config.image_width = width;
        }
        if let Some(samples) = self.samples {
            config.samples_per_pixel = samples;
        }
        if let Some(depth) = self.depth {
            config.max_depth = depth;
        }
        config
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            strategy: if self.sequential {
                RenderStrategy::Sequential
            } else {
                RenderStrategy::Parallel
            },
            threads: self.threads,
            seed: self.seed,
            show_progress: !self.quiet,
        }
    }
}

/// Whether `path` selects PNG output.
pub fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["ferris"]).unwrap();

        assert!(args.mesh.is_none());
        assert!(args.output.is_none());
        assert!(matches!(args.log_level, LogLevel::Info));

        let options = args.render_options();
        assert_eq!(options.strategy, RenderStrategy::Parallel);
        assert!(options.show_progress);
        assert_eq!(options.seed, None);
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = Args::try_parse_from([
            "ferris", "--width", "64", "-s", "16", "--depth", "3", "--seed", "5", "--sequential", "-q",
        ])
        .unwrap();

        let config = args.apply_overrides(CameraConfig::default().with_lens(40.0, 0.0, 2.0));
        assert_eq!(config.image_width, 64);
        assert_eq!(config.samples_per_pixel, 16);
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.vfov, 40.0);

        let options = args.render_options();
        assert_eq!(options.strategy, RenderStrategy::Sequential);
        assert_eq!(options.seed, Some(5));
        assert!(!options.show_progress);
    }

    #[test]
    fn test_log_level_parsing() {
        let args = Args::try_parse_from(["ferris", "--log-level", "debug"]).unwrap();
        assert_eq!(LevelFilter::from(args.log_level), LevelFilter::Debug);

        assert!(Args::try_parse_from(["ferris", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_output_format_selection() {
        assert!(is_png(Path::new("out.png")));
        assert!(is_png(Path::new("renders/OUT.PNG")));
        assert!(!is_png(Path::new("out.ppm")));
        assert!(!is_png(Path::new("out")));
    }
}

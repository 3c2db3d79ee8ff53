use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use lumen_renderer::{Camera, MathResult, RenderSettings, ScenePreset, DEFAULT_BUCKET_SIZE};

/// Log levels selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
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

/// Built-in scene names
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Preset {
    Empty,
    Simple,
    Trio,
    Field,
}

impl From<Preset> for ScenePreset {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Empty => ScenePreset::Empty,
            Preset::Simple => ScenePreset::Simple,
            Preset::Trio => ScenePreset::Trio,
            Preset::Field => ScenePreset::Field,
        }
    }
}

/// One camera control step, applied before rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CameraMove {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl CameraMove {
    pub fn apply(self, camera: &Camera) -> MathResult<Camera> {
        match self {
            CameraMove::Forward => camera.move_forward(),
            CameraMove::Backward => camera.move_backward(),
            CameraMove::Left => camera.turn_left(),
            CameraMove::Right => camera.turn_right(),
            CameraMove::Up => camera.pitch_up(),
            CameraMove::Down => camera.pitch_down(),
        }
    }
}

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "lumen")]
#[command(about = "Render a sphere scene with the Lumen CPU path tracer")]
pub struct Args {
    /// Image width in pixels
    #[arg(long, default_value_t = 400)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 225)]
    pub height: u32,

    /// Number of samples per pixel
    #[arg(long, short = 's', default_value_t = 50)]
    pub samples_per_pixel: u32,

    /// Maximum number of bounces per path
    #[arg(long, short = 'd', default_value_t = 10)]
    pub max_depth: u32,

    /// Seed for the per-pixel random generators
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Built-in scene, ignored when --scene is given
    #[arg(long, value_enum, default_value_t = Preset::Simple)]
    pub preset: Preset,

    /// JSON scene file
    #[arg(long)]
    pub scene: Option<PathBuf>,

    /// JSON camera file (position, target, up, fov, speeds)
    #[arg(long)]
    pub camera: Option<PathBuf>,

    /// Camera controls applied in order, e.g. --move forward --move left
    #[arg(long = "move", value_enum)]
    pub moves: Vec<CameraMove>,

    /// Render in progressive buckets instead of rows
    #[arg(long)]
    pub buckets: bool,

    /// Bucket edge length in pixels
    #[arg(long, default_value_t = DEFAULT_BUCKET_SIZE)]
    pub bucket_size: u32,

    /// Output image path (format chosen by extension)
    #[arg(short, long, default_value = "render.png")]
    pub output: PathBuf,

    /// Set the logging level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Args {
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings::default()
            .with_resolution(self.width, self.height)
            .with_quality(self.samples_per_pixel, self.max_depth)
            .with_seed(self.seed)
    }
}

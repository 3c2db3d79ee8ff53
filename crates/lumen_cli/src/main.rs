//! Command line front end for the Lumen path tracer.
//!
//! Builds a camera and a scene, renders, and writes the image to disk.

mod cli;

use std::path::Path;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_renderer::{
    render, render_buckets, Camera, CameraDescription, ImageBuffer, SceneDescription, ScenePreset,
};

use cli::Args;

fn load_camera(path: &Path) -> Result<CameraDescription> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read camera file {}", path.display()))?;
    let description = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse camera file {}", path.display()))?;
    Ok(description)
}

fn build_camera(args: &Args, aspect_ratio: f64) -> Result<Camera> {
    let description = match &args.camera {
        Some(path) => load_camera(path)?,
        None => CameraDescription::default(),
    };

    let mut camera = description
        .build()
        .context("Invalid camera description")?
        .with_aspect_ratio(aspect_ratio);

    for step in &args.moves {
        camera = step
            .apply(&camera)
            .with_context(|| format!("Camera move {:?} failed", step))?;
    }

    log::info!(
        "Camera at {:?} looking at {:?}",
        camera.position(),
        camera.target()
    );
    Ok(camera)
}

fn load_scene(args: &Args) -> Result<SceneDescription> {
    match &args.scene {
        Some(path) => SceneDescription::load(path)
            .with_context(|| format!("Failed to load scene {}", path.display())),
        None => {
            let preset = ScenePreset::from(args.preset);
            log::info!("Using preset scene '{}'", preset.name());
            Ok(preset.description())
        }
    }
}

fn save_image(image: &ImageBuffer, path: &Path) -> Result<()> {
    let rgba = image::RgbaImage::from_raw(image.width, image.height, image.to_rgba_bytes())
        .context("Pixel buffer does not match image dimensions")?;
    rgba.save(path)
        .with_context(|| format!("Failed to save {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    log::info!("Starting Lumen");

    let settings = args.render_settings();
    let scene = load_scene(&args)?;
    let world = scene.build()?;
    let camera = build_camera(&args, settings.aspect_ratio())?;

    let image = if args.buckets {
        let cancel = AtomicBool::new(false);
        render_buckets(
            &camera,
            &world,
            &settings,
            args.bucket_size,
            &cancel,
            |result| log::debug!("Bucket {} done", result.bucket.index),
        )?
    } else {
        render(&camera, &world, &settings)?
    };

    save_image(&image, &args.output)?;
    log::info!("Saved to {}", args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_bundled_camera() {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../../scenes/camera.json"));
        let description = load_camera(path).unwrap();
        assert_eq!(description.fov, 60.0);
        assert_eq!(description.aspect_ratio, 1.0);
        assert!(description.build().is_ok());
    }

    #[test]
    fn test_build_camera_applies_moves_and_aspect() {
        let args = Args::parse_from(["lumen", "--move", "forward", "--move", "forward"]);
        let camera = build_camera(&args, 2.0).unwrap();
        assert!((camera.position().z + 1.0).abs() < 1e-9);
        assert_eq!(camera.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_degenerate_camera_file_is_reported() {
        let path = std::env::temp_dir().join(format!("lumen-camera-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "position": [1, 2, 3], "target": [1, 2, 3] }"#).unwrap();

        let args = Args::parse_from(["lumen", "--camera", path.to_str().unwrap()]);
        let err = build_camera(&args, 1.0).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(err.to_string(), "Invalid camera description");
        assert!(err.downcast_ref::<lumen_renderer::MathError>().is_some());
    }

    #[test]
    fn test_load_scene_uses_preset() {
        let args = Args::parse_from(["lumen", "--preset", "field"]);
        let scene = load_scene(&args).unwrap();
        assert_eq!(scene, ScenePreset::Field.description());
    }
}

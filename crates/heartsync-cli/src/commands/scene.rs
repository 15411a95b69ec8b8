use heartsync_core::config::ShowcaseConfig;
use heartsync_core::scene::{
    outline_points, ExtrudeSettings, HeartLayout, HeartPose, Point2, Vec3, CAMERA_FOV_DEGREES,
    CAMERA_POLAR_ANGLE, CAMERA_POSITION, HEART_COLOR, HEART_EXTRUDE,
};
use serde::Serialize;

use crate::error::CliError;

const OUTLINE_SAMPLES: usize = 12;

#[derive(Debug, Serialize)]
pub struct CameraDocument {
    pub position: Vec3,
    pub fov_degrees: f64,
    pub polar_angle: f64,
}

#[derive(Debug, Serialize)]
pub struct SceneDocument {
    pub seed: u64,
    pub color: &'static str,
    pub camera: CameraDocument,
    pub extrude: ExtrudeSettings,
    pub outline: Vec<Point2>,
    pub layout: HeartLayout,
    /// Poses at t = 0
    pub poses: Vec<HeartPose>,
}

pub fn scene_document(count: usize, seed: u64) -> SceneDocument {
    let layout = HeartLayout::seeded(count, seed);
    SceneDocument {
        seed,
        color: HEART_COLOR,
        camera: CameraDocument {
            position: CAMERA_POSITION,
            fov_degrees: CAMERA_FOV_DEGREES,
            polar_angle: CAMERA_POLAR_ANGLE,
        },
        extrude: HEART_EXTRUDE,
        outline: outline_points(OUTLINE_SAMPLES),
        poses: layout.poses(0.0, 0),
        layout,
    }
}

pub fn run_scene(
    config: &ShowcaseConfig,
    count: Option<u16>,
    seed: Option<u64>,
) -> Result<(), CliError> {
    let count = count.map_or(config.scene_hearts, usize::from);
    let seed = seed.unwrap_or_else(rand::random);
    let document = scene_document(count, seed);
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

//! Layout of the floating-heart background.
//!
//! Renderer-agnostic: hearts are generated from any `rand::Rng`, and each
//! frame's pose is a pure function of elapsed time.

use std::f64::consts::FRAC_PI_2;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

pub const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 0.0, 20.0);
pub const CAMERA_FOV_DEGREES: f64 = 45.0;
/// Orbit controls keep the camera level with the hearts.
pub const CAMERA_POLAR_ANGLE: f64 = FRAC_PI_2;
pub const HEART_COLOR: &str = "#ff69b4";

const FLOAT_AMPLITUDE: f64 = 0.5;
const SPIN_PER_FRAME: f64 = 0.005;
const SWAY_FREQUENCY: f64 = 0.5;
const SWAY_AMPLITUDE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

const fn pt(x: f64, y: f64) -> Point2 {
    Point2 { x, y }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloatingHeart {
    /// Resting position; `y` bobs around it
    pub position: Vec3,
    pub scale: f64,
    pub rotation_speed: f64,
    pub float_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeartPose {
    pub position: Vec3,
    pub rotation_y: f64,
    pub rotation_z: f64,
    pub scale: f64,
}

impl FloatingHeart {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            position: Vec3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-5.0..5.0),
            ),
            scale: 0.04 + rng.gen_range(0.0..0.03),
            rotation_speed: 0.5 + rng.gen::<f64>(),
            float_speed: 0.5 + rng.gen::<f64>(),
        }
    }

    /// Pose `elapsed` seconds and `frames` animation frames in.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pose(&self, elapsed: f64, frames: u64) -> HeartPose {
        HeartPose {
            position: Vec3::new(
                self.position.x,
                (elapsed * self.float_speed)
                    .sin()
                    .mul_add(FLOAT_AMPLITUDE, self.position.y),
                self.position.z,
            ),
            rotation_y: SPIN_PER_FRAME * self.rotation_speed * frames as f64,
            rotation_z: (elapsed * SWAY_FREQUENCY).sin() * SWAY_AMPLITUDE,
            scale: self.scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartLayout {
    hearts: Vec<FloatingHeart>,
}

impl HeartLayout {
    pub fn generate<R: Rng>(count: usize, rng: &mut R) -> Self {
        let hearts = (0..count).map(|_| FloatingHeart::random(rng)).collect();
        Self { hearts }
    }

    /// Reproducible layout for a given seed.
    #[must_use]
    pub fn seeded(count: usize, seed: u64) -> Self {
        Self::generate(count, &mut StdRng::seed_from_u64(seed))
    }

    pub fn hearts(&self) -> &[FloatingHeart] {
        &self.hearts
    }

    #[must_use]
    pub fn poses(&self, elapsed: f64, frames: u64) -> Vec<HeartPose> {
        self.hearts
            .iter()
            .map(|heart| heart.pose(elapsed, frames))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo(Point2),
    BezierCurveTo {
        control1: Point2,
        control2: Point2,
        end: Point2,
    },
}

const fn curve(c1: Point2, c2: Point2, end: Point2) -> PathCommand {
    PathCommand::BezierCurveTo {
        control1: c1,
        control2: c2,
        end,
    }
}

/// Closed heart outline, point-down, in shape units.
pub const HEART_OUTLINE: [PathCommand; 7] = [
    PathCommand::MoveTo(pt(-25.0, -25.0)),
    curve(pt(-25.0, -25.0), pt(-20.0, 0.0), pt(0.0, 0.0)),
    curve(pt(30.0, 0.0), pt(30.0, -35.0), pt(30.0, -35.0)),
    curve(pt(30.0, -55.0), pt(10.0, -77.0), pt(-25.0, -95.0)),
    curve(pt(-60.0, -77.0), pt(-80.0, -55.0), pt(-80.0, -35.0)),
    curve(pt(-80.0, -35.0), pt(-80.0, 0.0), pt(-50.0, 0.0)),
    curve(pt(-35.0, 0.0), pt(-25.0, -25.0), pt(-25.0, -25.0)),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtrudeSettings {
    pub depth: f64,
    pub bevel_enabled: bool,
    pub bevel_segments: u32,
    pub steps: u32,
    pub bevel_size: f64,
    pub bevel_thickness: f64,
}

pub const HEART_EXTRUDE: ExtrudeSettings = ExtrudeSettings {
    depth: 8.0,
    bevel_enabled: true,
    bevel_segments: 2,
    steps: 2,
    bevel_size: 1.0,
    bevel_thickness: 1.0,
};

/// Flatten the outline into a polyline with `samples` points per curve.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn outline_points(samples: usize) -> Vec<Point2> {
    let samples = samples.max(1);
    let mut points = Vec::with_capacity(1 + samples * (HEART_OUTLINE.len() - 1));
    let mut cursor = pt(0.0, 0.0);

    for command in HEART_OUTLINE {
        match command {
            PathCommand::MoveTo(point) => {
                cursor = point;
                points.push(point);
            }
            PathCommand::BezierCurveTo {
                control1,
                control2,
                end,
            } => {
                for step in 1..=samples {
                    let t = step as f64 / samples as f64;
                    points.push(cubic(cursor, control1, control2, end, t));
                }
                cursor = end;
            }
        }
    }
    points
}

fn cubic(p0: Point2, p1: Point2, p2: Point2, p3: Point2, t: f64) -> Point2 {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    pt(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

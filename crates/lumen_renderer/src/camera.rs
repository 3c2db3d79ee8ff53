//! Camera for ray generation.
//!
//! The camera is an immutable value. Movement and rotation controls return a
//! new camera with the basis already rebuilt, so a camera can never be
//! observed with stale derived vectors.

use crate::{Ray, Vector3};
use lumen_math::{DQuat, MathResult, Vector3Ext};
use serde::{Deserialize, Serialize};

/// Elevation limit for [`Camera::pitch`], keeps the view off the poles.
pub const PITCH_LIMIT_DEGREES: f64 = 89.0;
pub const DEFAULT_MOVE_SPEED: f64 = 0.5;
/// Degrees per turn or pitch step.
pub const DEFAULT_TURN_SPEED: f64 = 5.0;

/// Pinhole camera looking from `position` towards `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    // Camera positioning
    position: Vector3,
    target: Vector3,
    up: Vector3,

    // Lens settings
    fov: f64, // Vertical field of view in degrees
    aspect_ratio: f64,

    // Control step sizes
    move_speed: f64,
    turn_speed: f64,

    // Derived from the fields above
    u: Vector3,
    v: Vector3,
    w: Vector3,
    half_width: f64,
    half_height: f64,
    lower_left_corner: Vector3,
}

impl Camera {
    /// Create a camera and derive its orthonormal basis.
    ///
    /// Fails when `position == target` or when `up` is parallel to the view
    /// direction.
    pub fn new(
        position: Vector3,
        target: Vector3,
        up: Vector3,
        fov: f64,
        aspect_ratio: f64,
    ) -> MathResult<Self> {
        let w = (position - target).unit()?;
        let u = up.cross(w).unit()?;
        let v = w.cross(u);

        let mut camera = Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            move_speed: DEFAULT_MOVE_SPEED,
            turn_speed: DEFAULT_TURN_SPEED,
            u,
            v,
            w,
            half_width: 0.0,
            half_height: 0.0,
            lower_left_corner: Vector3::ZERO,
        };
        camera.frame_viewport();
        Ok(camera)
    }

    /// Set control step sizes.
    pub fn with_speeds(mut self, move_speed: f64, turn_speed: f64) -> Self {
        self.move_speed = move_speed;
        self.turn_speed = turn_speed;
        self
    }

    /// Set the aspect ratio (e.g., on viewport resize).
    pub fn with_aspect_ratio(mut self, aspect_ratio: f64) -> Self {
        self.aspect_ratio = aspect_ratio;
        self.frame_viewport();
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn with_fov(mut self, fov: f64) -> Self {
        self.fov = fov;
        self.frame_viewport();
        self
    }

    /// Recompute the image plane from the basis and lens settings.
    fn frame_viewport(&mut self) {
        self.half_height = (self.fov.to_radians() / 2.0).tan();
        self.half_width = self.aspect_ratio * self.half_height;
        self.lower_left_corner =
            self.position - self.u * self.half_width - self.v * self.half_height - self.w;
    }

    /// Same lens and speeds, new placement.
    fn relocated(&self, position: Vector3, target: Vector3) -> MathResult<Self> {
        Ok(
            Camera::new(position, target, self.up, self.fov, self.aspect_ratio)?
                .with_speeds(self.move_speed, self.turn_speed),
        )
    }

    /// Generate the ray through screen coordinate (s, t).
    ///
    /// `(0, 0)` is the lower-left corner of the image plane and `(1, 1)` the
    /// upper-right; `s` grows rightward and `t` upward.
    pub fn get_ray(&self, s: f64, t: f64) -> Ray {
        let point = self.lower_left_corner
            + self.u * (s * self.half_width * 2.0)
            + self.v * (t * self.half_height * 2.0);
        Ray::new(self.position, point - self.position)
    }

    /// Move `position` and `target` together along the view direction.
    pub fn translate(&self, step: f64) -> MathResult<Self> {
        let offset = self.view_direction().unit()? * step;
        self.relocated(self.position + offset, self.target + offset)
    }

    pub fn move_forward(&self) -> MathResult<Self> {
        self.translate(self.move_speed)
    }

    pub fn move_backward(&self) -> MathResult<Self> {
        self.translate(-self.move_speed)
    }

    /// Rotate the view around the up axis; positive angles turn left.
    pub fn yaw(&self, degrees: f64) -> MathResult<Self> {
        let axis = self.up.unit()?;
        let rotation = DQuat::from_axis_angle(axis, degrees.to_radians());
        let offset = rotation * self.view_direction();
        self.relocated(self.position, self.position + offset)
    }

    pub fn turn_left(&self) -> MathResult<Self> {
        self.yaw(self.turn_speed)
    }

    pub fn turn_right(&self) -> MathResult<Self> {
        self.yaw(-self.turn_speed)
    }

    /// Raise (positive) or lower the view elevation, keeping the target
    /// distance. The result is clamped to `±PITCH_LIMIT_DEGREES`, but only
    /// in the direction of travel: a camera placed beyond the limit is never
    /// pushed back towards the horizon by pitching further out.
    pub fn pitch(&self, degrees: f64) -> MathResult<Self> {
        let up = self.up.unit()?;
        let offset = self.view_direction();
        let distance = offset.length();
        let direction = offset.unit()?;

        let current = direction.dot(up).clamp(-1.0, 1.0).asin();
        let limit = PITCH_LIMIT_DEGREES.to_radians();
        let wanted = current + degrees.to_radians();
        let elevation = if degrees >= 0.0 {
            wanted.min(limit.max(current))
        } else {
            wanted.max((-limit).min(current))
        };

        let horizontal = (direction - up * direction.dot(up)).unit()?;
        let pitched = horizontal * elevation.cos() + up * elevation.sin();
        self.relocated(self.position, self.position + pitched * distance)
    }

    pub fn pitch_up(&self) -> MathResult<Self> {
        self.pitch(self.turn_speed)
    }

    pub fn pitch_down(&self) -> MathResult<Self> {
        self.pitch(-self.turn_speed)
    }

    /// Vector from `position` to `target` (not normalized).
    pub fn view_direction(&self) -> Vector3 {
        self.target - self.position
    }

    /// Elevation of the view direction above the plane normal to `up`, in degrees.
    pub fn elevation(&self) -> MathResult<f64> {
        let direction = self.view_direction().unit()?;
        let up = self.up.unit()?;
        Ok(direction.dot(up).clamp(-1.0, 1.0).asin().to_degrees())
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn target(&self) -> Vector3 {
        self.target
    }

    pub fn up(&self) -> Vector3 {
        self.up
    }

    pub fn fov(&self) -> f64 {
        self.fov
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn move_speed(&self) -> f64 {
        self.move_speed
    }

    pub fn turn_speed(&self) -> f64 {
        self.turn_speed
    }

    /// Orthonormal basis `(u, v, w)`: right, up, and backwards.
    pub fn basis(&self) -> (Vector3, Vector3, Vector3) {
        (self.u, self.v, self.w)
    }

    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    pub fn half_height(&self) -> f64 {
        self.half_height
    }

    pub fn lower_left_corner(&self) -> Vector3 {
        self.lower_left_corner
    }

    /// Serializable form of this camera.
    pub fn description(&self) -> CameraDescription {
        CameraDescription {
            position: self.position,
            target: self.target,
            up: self.up,
            fov: self.fov,
            aspect_ratio: self.aspect_ratio,
            move_speed: self.move_speed,
            turn_speed: self.turn_speed,
        }
    }
}

/// Plain camera parameters, as read from a scene or config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDescription {
    pub position: Vector3,
    pub target: Vector3,
    pub up: Vector3,
    pub fov: f64,
    pub aspect_ratio: f64,
    pub move_speed: f64,
    pub turn_speed: f64,
}

impl Default for CameraDescription {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            target: Vector3::NEG_Z,
            up: Vector3::Y,
            fov: 90.0,
            aspect_ratio: 1.0,
            move_speed: DEFAULT_MOVE_SPEED,
            turn_speed: DEFAULT_TURN_SPEED,
        }
    }
}

impl CameraDescription {
    /// Build the camera, deriving its basis.
    pub fn build(&self) -> MathResult<Camera> {
        Ok(
            Camera::new(self.position, self.target, self.up, self.fov, self.aspect_ratio)?
                .with_speeds(self.move_speed, self.turn_speed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::MathError;

    const EPS: f64 = 1e-9;

    fn approx(a: Vector3, b: Vector3) -> bool {
        (a - b).length() < EPS
    }

    fn default_camera() -> Camera {
        Camera::new(Vector3::ZERO, Vector3::NEG_Z, Vector3::Y, 90.0, 1.0).unwrap()
    }

    #[test]
    fn test_camera_basis() {
        let camera = default_camera();
        let (u, v, w) = camera.basis();

        assert!(approx(w, Vector3::Z));
        assert!(approx(u, Vector3::X));
        assert!(approx(v, Vector3::Y));
        assert!((camera.half_height() - 1.0).abs() < EPS);
        assert!((camera.half_width() - 1.0).abs() < EPS);
        assert!(approx(camera.lower_left_corner(), Vector3::new(-1.0, -1.0, -1.0)));
    }

    #[test]
    fn test_aspect_ratio_scales_half_width() {
        let camera = default_camera().with_aspect_ratio(2.0);
        assert!((camera.half_width() - 2.0).abs() < EPS);
        assert!((camera.half_height() - 1.0).abs() < EPS);
        assert!(approx(camera.lower_left_corner(), Vector3::new(-2.0, -1.0, -1.0)));
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = Camera::new(
            Vector3::new(3.0, 2.0, 1.0),
            Vector3::new(-1.0, 0.5, -4.0),
            Vector3::Y,
            60.0,
            16.0 / 9.0,
        )
        .unwrap();

        let ray = camera.get_ray(0.5, 0.5);
        let expected = camera.view_direction().unit().unwrap();
        assert_eq!(ray.origin, camera.position());
        assert!(approx(ray.direction.unit().unwrap(), expected));
    }

    #[test]
    fn test_corner_rays() {
        let camera = default_camera();

        let lower_left = camera.get_ray(0.0, 0.0);
        assert!(approx(lower_left.direction, Vector3::new(-1.0, -1.0, -1.0)));

        let upper_right = camera.get_ray(1.0, 1.0);
        assert!(approx(upper_right.direction, Vector3::new(1.0, 1.0, -1.0)));
    }

    #[test]
    fn test_degenerate_up_fails() {
        let result = Camera::new(Vector3::ZERO, Vector3::new(0.0, 5.0, 0.0), Vector3::Y, 90.0, 1.0);
        assert!(matches!(result, Err(MathError::DegenerateVector { .. })));
    }

    #[test]
    fn test_position_equals_target_fails() {
        let result = Camera::new(Vector3::ONE, Vector3::ONE, Vector3::Y, 90.0, 1.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_move_forward_and_back() {
        let camera = default_camera().with_speeds(2.0, 5.0);
        let moved = camera.move_forward().unwrap();

        assert!(approx(moved.position(), Vector3::new(0.0, 0.0, -2.0)));
        assert!(approx(moved.target(), Vector3::new(0.0, 0.0, -3.0)));
        assert!(approx(moved.basis().2, camera.basis().2));
        assert_eq!(moved.move_speed(), 2.0);

        let back = moved.move_backward().unwrap();
        assert!(approx(back.position(), camera.position()));
        assert!(approx(back.target(), camera.target()));
    }

    #[test]
    fn test_turn_left_quarter() {
        let camera = default_camera().with_speeds(1.0, 90.0);
        let turned = camera.turn_left().unwrap();

        assert!(approx(turned.position(), Vector3::ZERO));
        assert!(approx(turned.view_direction(), Vector3::NEG_X));

        let back = turned.turn_right().unwrap();
        assert!(approx(back.view_direction(), Vector3::NEG_Z));
    }

    #[test]
    fn test_yaw_preserves_distance() {
        let camera = Camera::new(Vector3::ZERO, Vector3::new(0.0, 1.0, -4.0), Vector3::Y, 90.0, 1.0)
            .unwrap();
        let turned = camera.yaw(33.0).unwrap();
        let before = camera.view_direction().length();
        let after = turned.view_direction().length();
        assert!((before - after).abs() < EPS);
        // Yaw does not change elevation
        assert!((camera.elevation().unwrap() - turned.elevation().unwrap()).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_up_and_down() {
        let camera = default_camera().with_speeds(1.0, 30.0);
        let up = camera.pitch_up().unwrap();
        assert!((up.elevation().unwrap() - 30.0).abs() < 1e-6);
        assert!((up.view_direction().length() - 1.0).abs() < EPS);

        let level = up.pitch_down().unwrap();
        assert!(level.elevation().unwrap().abs() < 1e-6);
        assert!(approx(level.view_direction(), Vector3::NEG_Z));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let camera = default_camera();

        let top = camera.pitch(500.0).unwrap();
        assert!((top.elevation().unwrap() - PITCH_LIMIT_DEGREES).abs() < 1e-6);
        // Basis still valid near the pole
        assert!((top.basis().0.length() - 1.0).abs() < EPS);

        let bottom = camera.pitch(-500.0).unwrap();
        assert!((bottom.elevation().unwrap() + PITCH_LIMIT_DEGREES).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_beyond_limit_only_moves_back() {
        // Built looking almost straight up, past the pitch limit
        let steep = Camera::new(Vector3::ZERO, Vector3::new(0.0, 100.0, -0.1), Vector3::Y, 90.0, 1.0)
            .unwrap();
        let start = steep.elevation().unwrap();
        assert!(start > PITCH_LIMIT_DEGREES);

        let up = steep.pitch_up().unwrap();
        assert!((up.elevation().unwrap() - start).abs() < 1e-6);

        let down = steep.pitch_down().unwrap();
        let expected = start - DEFAULT_TURN_SPEED;
        assert!((down.elevation().unwrap() - expected).abs() < 1e-6);

        let floor = Camera::new(Vector3::ZERO, Vector3::new(0.0, -100.0, -0.1), Vector3::Y, 90.0, 1.0)
            .unwrap();
        let level = floor.elevation().unwrap();
        assert!((floor.pitch_down().unwrap().elevation().unwrap() - level).abs() < 1e-6);
        assert!(floor.pitch_up().unwrap().elevation().unwrap() > level);
    }

    #[test]
    fn test_description_roundtrip() {
        let camera = default_camera().with_speeds(0.25, 2.0);
        let rebuilt = camera.description().build().unwrap();
        assert_eq!(rebuilt, camera);
    }

    #[test]
    fn test_description_defaults() {
        let desc: CameraDescription =
            serde_json::from_str(r#"{ "position": [0.0, 1.0, 3.0], "fov": 40.0 }"#).unwrap();
        assert_eq!(desc.target, Vector3::NEG_Z);
        assert_eq!(desc.up, Vector3::Y);
        assert_eq!(desc.fov, 40.0);
        assert!(desc.build().is_ok());
    }
}

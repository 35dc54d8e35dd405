//! Sine-modulated arc geometry.
//!
//! The arc runs from the caster's local origin to a point `ray_length` ahead along the caster's
//! forward axis. Each sample is lifted along the local up axis by
//! `sine_amplitude * sin(π * t * sine_frequency)`, then moved into world space with the caster's
//! [`GlobalTransform`].

use std::{f32::consts::PI, fmt};

use bevy_math::Vec3;
use bevy_reflect::Reflect;
use bevy_transform::components::GlobalTransform;

/// Local forward axis of a caster. Bevy cameras and lights look down `-Z`, so casters do too.
pub const LOCAL_FORWARD: Vec3 = Vec3::NEG_Z;
/// Local axis the sine offset is applied along.
pub const LOCAL_UP: Vec3 = Vec3::Y;

/// Shape and speed parameters for a caster's arc.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ArcSettings {
    /// Length of the ray, and of the arc's footprint along the forward axis.
    pub ray_length: f32,
    /// Number of segments in the arc. The arc has `arc_segments + 1` points.
    pub arc_segments: u32,
    /// Frequency coefficient for the sine wave. `1.0` gives a single hump.
    pub sine_frequency: f32,
    /// Peak height of the sine wave.
    pub sine_amplitude: f32,
    /// Speed a pulled object travels along the arc, in world units per second.
    pub travel_speed: f32,
}

impl Default for ArcSettings {
    fn default() -> Self {
        ArcSettings {
            ray_length: 5.0,
            arc_segments: 20,
            sine_frequency: 1.0,
            sine_amplitude: 2.0,
            travel_speed: 1.0,
        }
    }
}

impl ArcSettings {
    pub fn with_ray_length(self, ray_length: f32) -> Self {
        Self { ray_length, ..self }
    }

    pub fn with_arc_segments(self, arc_segments: u32) -> Self {
        Self {
            arc_segments,
            ..self
        }
    }

    pub fn with_sine(self, sine_frequency: f32, sine_amplitude: f32) -> Self {
        Self {
            sine_frequency,
            sine_amplitude,
            ..self
        }
    }

    pub fn with_travel_speed(self, travel_speed: f32) -> Self {
        Self {
            travel_speed,
            ..self
        }
    }

    /// Checks that these settings describe an arc that can be sampled and travelled.
    pub fn validate(&self) -> Result<(), ArcSettingsError> {
        if self.arc_segments == 0 {
            return Err(ArcSettingsError::NoSegments);
        }
        if !self.ray_length.is_finite() || self.ray_length <= 0.0 {
            return Err(ArcSettingsError::InvalidRayLength(self.ray_length));
        }
        if !self.sine_frequency.is_finite() || !self.sine_amplitude.is_finite() {
            return Err(ArcSettingsError::NonFiniteSine);
        }
        if !self.travel_speed.is_finite() || self.travel_speed <= 0.0 {
            return Err(ArcSettingsError::InvalidTravelSpeed(self.travel_speed));
        }
        Ok(())
    }

    /// Number of points the arc is sampled at.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.arc_segments as usize + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcSettingsError {
    NoSegments,
    InvalidRayLength(f32),
    NonFiniteSine,
    InvalidTravelSpeed(f32),
}

impl fmt::Display for ArcSettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSegments => write!(f, "arc must have at least one segment"),
            Self::InvalidRayLength(length) => {
                write!(f, "ray length must be positive and finite, got {length}")
            }
            Self::NonFiniteSine => write!(f, "sine frequency and amplitude must be finite"),
            Self::InvalidTravelSpeed(speed) => {
                write!(f, "travel speed must be positive and finite, got {speed}")
            }
        }
    }
}

impl std::error::Error for ArcSettingsError {}

/// Height of the arc above the forward axis at normalized parameter `t`.
#[inline]
pub fn arc_height(settings: &ArcSettings, t: f32) -> f32 {
    (PI * t * settings.sine_frequency).sin() * settings.sine_amplitude
}

/// The arc point at normalized parameter `t`, in the caster's local space.
#[inline]
pub fn arc_local_point(settings: &ArcSettings, t: f32) -> Vec3 {
    let along = Vec3::ZERO.lerp(LOCAL_FORWARD * settings.ray_length, t);
    along + LOCAL_UP * arc_height(settings, t)
}

/// Samples the arc into `points`, in world space. Any previous contents are cleared.
///
/// Settings are assumed valid; with zero segments only the origin is produced.
pub fn compute_arc_points(
    settings: &ArcSettings,
    caster_transform: &GlobalTransform,
    points: &mut Vec<Vec3>,
) {
    points.clear();
    if settings.arc_segments == 0 {
        points.push(caster_transform.translation());
        return;
    }
    points.reserve(settings.point_count());
    let segments = settings.arc_segments as f32;
    points.extend((0..=settings.arc_segments).map(|i| {
        let t = i as f32 / segments;
        caster_transform.transform_point(arc_local_point(settings, t))
    }));
}

/// Total length of the polyline through `points`.
pub fn path_length(points: &[Vec3]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

#[cfg(test)]
mod tests {
    use bevy_math::Quat;
    use bevy_transform::components::Transform;

    use super::*;

    const TOLERANCE: f32 = 1e-5;

    fn scenario() -> ArcSettings {
        ArcSettings::default()
            .with_ray_length(5.0)
            .with_arc_segments(4)
            .with_sine(1.0, 2.0)
    }

    #[test]
    fn point_count_is_segments_plus_one() {
        let mut points = Vec::new();
        for segments in [1, 2, 4, 20, 97] {
            let settings = ArcSettings::default().with_arc_segments(segments);
            compute_arc_points(&settings, &GlobalTransform::IDENTITY, &mut points);
            assert_eq!(points.len(), segments as usize + 1);
        }
    }

    #[test]
    fn heights_follow_sine() {
        let settings = scenario();
        let mut points = Vec::new();
        compute_arc_points(&settings, &GlobalTransform::IDENTITY, &mut points);
        let expected = [
            0.0,
            2.0 * (PI / 4.0).sin(),
            2.0,
            2.0 * (3.0 * PI / 4.0).sin(),
            0.0,
        ];
        for (point, height) in points.iter().zip(expected) {
            assert!((point.y - height).abs() < TOLERANCE, "{point} vs {height}");
        }
        assert!((points[1].y - 1.41421).abs() < 1e-4);
    }

    #[test]
    fn arc_spans_ray_length_along_forward() {
        let settings = scenario();
        let mut points = Vec::new();
        compute_arc_points(&settings, &GlobalTransform::IDENTITY, &mut points);
        assert_eq!(points[0], Vec3::ZERO);
        let last = *points.last().unwrap();
        assert!(last.distance(Vec3::new(0.0, 0.0, -5.0)) < TOLERANCE);
        for (i, point) in points.iter().enumerate() {
            assert!((point.z + 1.25 * i as f32).abs() < TOLERANCE);
            assert_eq!(point.x, 0.0);
        }
    }

    #[test]
    fn arc_follows_caster_transform() {
        let settings = scenario();
        let transform = Transform::from_xyz(1.0, 2.0, 3.0)
            .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let global = GlobalTransform::from(transform);
        let mut points = Vec::new();
        compute_arc_points(&settings, &global, &mut points);

        assert!(points[0].distance(Vec3::new(1.0, 2.0, 3.0)) < TOLERANCE);
        // Rotating -Z by +90° about Y points it down -X.
        assert!(points[4].distance(Vec3::new(-4.0, 2.0, 3.0)) < TOLERANCE);
        assert!(points[2].distance(Vec3::new(-1.5, 4.0, 3.0)) < TOLERANCE);
    }

    #[test]
    fn recompute_overwrites_previous_points() {
        let mut points = vec![Vec3::ONE; 50];
        compute_arc_points(&scenario(), &GlobalTransform::IDENTITY, &mut points);
        assert_eq!(points.len(), 5);
    }

    #[test]
    fn validation() {
        assert_eq!(ArcSettings::default().validate(), Ok(()));
        assert_eq!(
            ArcSettings::default().with_arc_segments(0).validate(),
            Err(ArcSettingsError::NoSegments)
        );
        assert_eq!(
            ArcSettings::default().with_ray_length(0.0).validate(),
            Err(ArcSettingsError::InvalidRayLength(0.0))
        );
        assert_eq!(
            ArcSettings::default().with_sine(f32::NAN, 1.0).validate(),
            Err(ArcSettingsError::NonFiniteSine)
        );
        assert_eq!(
            ArcSettings::default().with_travel_speed(-1.0).validate(),
            Err(ArcSettingsError::InvalidTravelSpeed(-1.0))
        );
        // A pull at zero speed would never reach the caster.
        assert_eq!(
            ArcSettings::default().with_travel_speed(0.0).validate(),
            Err(ArcSettingsError::InvalidTravelSpeed(0.0))
        );
    }

    #[test]
    fn flat_arc_length_is_ray_length() {
        let settings = scenario().with_sine(1.0, 0.0);
        let mut points = Vec::new();
        compute_arc_points(&settings, &GlobalTransform::IDENTITY, &mut points);
        assert!((path_length(&points) - 5.0).abs() < TOLERANCE);
    }
}

//! Stepping an object along a sequence of waypoints, one frame at a time.

use bevy_math::Vec3;

/// An object is considered to have reached a waypoint once it is within this distance of it.
pub const ARRIVAL_EPSILON: f32 = 0.01;

/// Moves `current` toward `target` by at most `max_distance_delta`, without overshooting.
#[inline]
pub fn move_towards(current: Vec3, target: Vec3, max_distance_delta: f32) -> Vec3 {
    let to_target = target - current;
    let distance = to_target.length();
    if distance <= max_distance_delta || distance == 0.0 {
        return target;
    }
    current + to_target / distance * max_distance_delta
}

/// The outcome of a single [`PullMotion::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionStep {
    /// The object should be placed at this position, and stepped again next frame.
    Moved(Vec3),
    /// Every waypoint has been reached.
    Finished,
}

/// A pull in progress: the waypoints still to visit, in visiting order.
///
/// Built from an arc by reversing it, so the far end of the arc is visited first and the point
/// at the caster last.
#[derive(Debug, Clone, PartialEq)]
pub struct PullMotion {
    waypoints: Vec<Vec3>,
    next: usize,
}

impl PullMotion {
    /// Creates a motion that visits `arc` from its last point to its first.
    pub fn along_reversed(arc: &[Vec3]) -> Self {
        PullMotion {
            waypoints: arc.iter().rev().copied().collect(),
            next: 0,
        }
    }

    /// Waypoints in visiting order.
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// The waypoint currently being travelled toward, if any remain.
    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.waypoints.get(self.next).copied()
    }

    /// Number of waypoints already reached.
    pub fn reached(&self) -> usize {
        self.next
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.waypoints.len()
    }

    /// Advances the motion by one frame.
    ///
    /// Waypoints the object is already within [`ARRIVAL_EPSILON`] of are passed without using up
    /// the frame. The object then moves at most `max_distance_delta` toward the first waypoint it
    /// has not reached.
    pub fn step(&mut self, position: Vec3, max_distance_delta: f32) -> MotionStep {
        while let Some(waypoint) = self.current_waypoint() {
            if position.distance(waypoint) > ARRIVAL_EPSILON {
                return MotionStep::Moved(move_towards(position, waypoint, max_distance_delta));
            }
            self.next += 1;
        }
        MotionStep::Finished
    }
}

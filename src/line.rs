//! The line a caster draws its ray and arc with.

use bevy_color::Color;
use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use bevy_reflect::Reflect;

/// An ordered list of world-space points drawn as a connected line.
///
/// Casters write their ray and arc into this every frame; with the `gizmos` feature the
/// plugin draws it with [`bevy_gizmos`].
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ArcLine {
    pub color: Color,
    /// Line width in pixels, applied to the [`ArcLineGizmos`] config group.
    pub width: f32,
    pub enabled: bool,
    positions: Vec<Vec3>,
}

impl Default for ArcLine {
    fn default() -> Self {
        ArcLine {
            color: Color::srgb(0.0, 1.0, 0.0),
            width: 2.0,
            enabled: true,
            positions: Vec::new(),
        }
    }
}

impl ArcLine {
    pub fn with_color(self, color: impl Into<Color>) -> Self {
        Self {
            color: color.into(),
            ..self
        }
    }

    pub fn with_width(self, width: f32) -> Self {
        Self { width, ..self }
    }

    /// Resizes the line to `count` points. New points start at the origin.
    pub fn set_position_count(&mut self, count: usize) {
        self.positions.resize(count, Vec3::ZERO);
    }

    /// Sets the point at `index`. Indices past [`position_count`](Self::position_count) are
    /// ignored.
    pub fn set_position(&mut self, index: usize, position: Vec3) {
        if let Some(slot) = self.positions.get_mut(index) {
            *slot = position;
        }
    }

    /// Replaces every point of the line.
    pub fn set_positions(&mut self, positions: &[Vec3]) {
        self.positions.clear();
        self.positions.extend_from_slice(positions);
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }
}

#[cfg(feature = "gizmos")]
pub mod gizmos {
    use bevy_ecs::prelude::*;
    use bevy_gizmos::{config::GizmoConfigGroup, config::GizmoConfigStore, gizmos::Gizmos};
    use bevy_reflect::{Reflect, TypePath};

    use super::ArcLine;
    use crate::ArcCaster;

    /// Gizmo config group used to draw [`ArcLine`]s, so their width and depth settings don't leak
    /// into the app's default gizmos.
    #[derive(Default, Reflect, GizmoConfigGroup)]
    pub struct ArcLineGizmos;

    /// Draws the enabled [`ArcLine`] of every caster in the pull set `T` as a line strip.
    pub fn draw_arc_lines<T: TypePath + Send + Sync>(
        lines: Query<&ArcLine, With<ArcCaster<T>>>,
        mut gizmos: Gizmos<ArcLineGizmos>,
    ) {
        for line in lines.iter().filter(|line| line.enabled) {
            gizmos.linestrip(line.positions().iter().copied(), line.color);
        }
    }

    /// Gizmo configs are per group, not per line, so the widest enabled line wins.
    pub fn sync_arc_line_width<T: TypePath + Send + Sync>(
        lines: Query<&ArcLine, With<ArcCaster<T>>>,
        mut config_store: ResMut<GizmoConfigStore>,
    ) {
        let Some(width) = lines
            .iter()
            .filter(|line| line.enabled)
            .map(|line| line.width)
            .reduce(f32::max)
        else {
            return;
        };
        let (config, _) = config_store.config_mut::<ArcLineGizmos>();
        if config.line_width != width {
            config.line_width = width;
        }
    }
}

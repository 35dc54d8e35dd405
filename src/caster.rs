use std::marker::PhantomData;

use bevy_ecs::prelude::*;
use bevy_math::{Ray3d, Vec3};
use bevy_reflect::{Reflect, TypePath};

use crate::{arc::ArcSettings, motion::PullMotion};

/// Marks an entity as something casters in the pull set `T` can grab and pull along their arc.
///
/// # Requirements
///
/// The entity must also have an [`Aabb`](bevy_render::primitives::Aabb) and a
/// [`GlobalTransform`](bevy_transform::components::GlobalTransform). If it has a
/// [`Handle<Mesh>`](bevy_asset::Handle) that resolves, the mesh triangles are used for an exact
/// hit. Pulling writes to its [`Transform`](bevy_transform::components::Transform) translation,
/// so it should not be parented.
#[derive(Component, Debug, Reflect)]
#[reflect(Component)]
pub struct PullTarget<T: TypePath> {
    #[reflect(ignore)]
    _marker: PhantomData<fn() -> T>,
}

impl<T: TypePath> Default for PullTarget<T> {
    fn default() -> Self {
        PullTarget {
            _marker: PhantomData,
        }
    }
}

impl<T: TypePath> Clone for PullTarget<T> {
    fn clone(&self) -> Self {
        PullTarget::default()
    }
}

/// Physical body flags of a pullable object.
///
/// This crate does not simulate physics. A physics integration reads these flags; a pull turns
/// gravity off and makes the body kinematic while it drives the transform, and turns them back
/// when done.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct PullBody {
    pub use_gravity: bool,
    pub kinematic: bool,
}

impl Default for PullBody {
    fn default() -> Self {
        PullBody {
            use_gravity: true,
            kinematic: false,
        }
    }
}

impl PullBody {
    pub(crate) fn suspend(&mut self) {
        self.use_gravity = false;
        self.kinematic = true;
    }

    pub(crate) fn restore(&mut self) {
        self.use_gravity = true;
        self.kinematic = false;
    }
}

/// Whether a caster is showing its arc or pulling something along it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PullPhase {
    #[default]
    Idle,
    Pulling(PullMotion),
}

/// Casts a ray and an arc along its forward (`-Z`) axis, and pulls [`PullTarget<T>`]s along the
/// arc when a [`PullPerformed`](crate::PullPerformed) event names it.
///
/// # Requirements
///
/// The entity needs a [`GlobalTransform`](bevy_transform::components::GlobalTransform) and an
/// [`ArcLine`](crate::ArcLine). A caster without an `ArcLine` is reported and left inert.
#[derive(Component, Reflect)]
#[reflect(Component)]
pub struct ArcCaster<T: TypePath> {
    pub settings: ArcSettings,
    #[reflect(ignore)]
    pub(crate) ray: Option<Ray3d>,
    #[reflect(ignore)]
    pub(crate) path: Vec<Vec3>,
    #[reflect(ignore)]
    pub(crate) target: Option<Entity>,
    #[reflect(ignore)]
    pub(crate) phase: PullPhase,
    #[reflect(ignore)]
    _marker: PhantomData<fn() -> T>,
}

impl<T: TypePath> Default for ArcCaster<T> {
    fn default() -> Self {
        ArcCaster::new(ArcSettings::default())
    }
}

impl<T: TypePath> Clone for ArcCaster<T> {
    fn clone(&self) -> Self {
        ArcCaster {
            settings: self.settings,
            ray: self.ray,
            path: self.path.clone(),
            target: self.target,
            phase: self.phase.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: TypePath> ArcCaster<T> {
    pub fn new(settings: ArcSettings) -> Self {
        ArcCaster {
            settings,
            ray: None,
            path: Vec::new(),
            target: None,
            phase: PullPhase::Idle,
            _marker: PhantomData,
        }
    }

    /// Set the `settings` field of this caster.
    pub fn with_settings(self, settings: ArcSettings) -> Self {
        Self { settings, ..self }
    }

    /// `true` from the frame a pull starts until the frame it finishes.
    pub fn is_moving(&self) -> bool {
        matches!(self.phase, PullPhase::Pulling(_))
    }

    pub fn phase(&self) -> &PullPhase {
        &self.phase
    }

    /// The ray cast from this caster last frame.
    pub fn ray(&self) -> Option<Ray3d> {
        self.ray
    }

    /// The most recently computed arc, in world space, nearest point first.
    ///
    /// Frozen while a pull is in progress.
    pub fn path(&self) -> &[Vec3] {
        &self.path
    }

    /// The entity being pulled, if a pull is in progress.
    pub fn target(&self) -> Option<Entity> {
        self.target
    }
}

//! # Arc pulling for Bevy
//!
//! An [`ArcCaster`] casts a ray along its forward axis and shows a sine-shaped arc in front of it
//! with an [`ArcLine`]. When a [`PullPerformed`] event names the caster, the ray is cast against
//! [`PullTarget`]s; the nearest hit is pulled back along the arc, far end first, until it reaches
//! the caster. While it travels, its [`PullBody`] (if any) has gravity off and is kinematic.
//!
//! Casters and targets are grouped by a generic parameter. An [`ArcCaster<Foo>`] only pulls
//! entities marked [`PullTarget<Foo>`], and only when [`ArcPullPlugin<Foo>`] is added.

use std::{
    fmt::Debug,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_reflect::TypePath;

pub mod arc;
pub mod caster;
pub mod input;
pub mod line;
pub mod motion;
pub mod pull;
pub mod raycast;

pub use crate::{
    arc::{ArcSettings, ArcSettingsError},
    caster::{ArcCaster, PullBody, PullPhase, PullTarget},
    input::{PullAction, PullButton},
    line::ArcLine,
    motion::{MotionStep, PullMotion},
    raycast::{ArcRaycast, PullHit},
};

pub mod prelude {
    pub use crate::{
        ArcCaster, ArcLine, ArcPullPlugin, ArcPullPluginState, ArcPullSystem, ArcSettings,
        PullAction, PullBody, PullButton, PullFinished, PullPerformed, PullStarted, PullTarget,
    };
}

/// Sent to ask a caster to pull whatever its ray hits. Ignored while the caster is already
/// pulling something.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullPerformed {
    pub caster: Entity,
}

/// Sent when a caster's ray hit a target and the target started moving.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullStarted {
    pub caster: Entity,
    pub target: Entity,
}

/// Sent when a pull ends, either because the target reached the caster or because the target
/// was despawned.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullFinished {
    pub caster: Entity,
    pub target: Entity,
}

pub struct ArcPullPlugin<T>(pub PhantomData<fn() -> T>);
impl<T: TypePath + Send + Sync> Plugin for ArcPullPlugin<T> {
    fn build(&self, app: &mut App) {
        app.init_resource::<ArcPullPluginState<T>>()
            .add_event::<PullPerformed>()
            .add_event::<PullStarted>()
            .add_event::<PullFinished>()
            .add_systems(
                Update,
                (
                    input::read_pull_actions::<T>
                        .in_set(ArcPullSystem::ReadInput::<T>)
                        .run_if(|state: Res<ArcPullPluginState<T>>| state.read_input),
                    (pull::report_missing_lines::<T>, pull::update_caster_arcs::<T>)
                        .chain()
                        .in_set(ArcPullSystem::UpdateArcs::<T>),
                    pull::update_caster_lines::<T>
                        .in_set(ArcPullSystem::UpdateLines::<T>)
                        .run_if(|state: Res<ArcPullPluginState<T>>| state.update_lines),
                    pull::start_pulls::<T>.in_set(ArcPullSystem::StartPulls::<T>),
                    pull::advance_pulls::<T>.in_set(ArcPullSystem::AdvancePulls::<T>),
                )
                    .chain(),
            );

        app.register_type::<ArcCaster<T>>()
            .register_type::<PullTarget<T>>()
            .register_type::<ArcLine>()
            .register_type::<PullBody>()
            .register_type::<PullAction>();

        #[cfg(feature = "gizmos")]
        if app.is_plugin_added::<bevy_gizmos::GizmoPlugin>() {
            use bevy_gizmos::AppGizmoBuilder;

            app.init_gizmo_group::<line::gizmos::ArcLineGizmos>()
                .add_systems(
                    PostUpdate,
                    (
                        line::gizmos::sync_arc_line_width::<T>,
                        line::gizmos::draw_arc_lines::<T>,
                    )
                        .chain()
                        .in_set(ArcPullSystem::DrawLines::<T>)
                        .run_if(|state: Res<ArcPullPluginState<T>>| state.draw_lines),
                );
        }
    }
}
impl<T> Default for ArcPullPlugin<T> {
    fn default() -> Self {
        ArcPullPlugin(PhantomData)
    }
}

#[derive(SystemSet)]
pub enum ArcPullSystem<T> {
    ReadInput,
    UpdateArcs,
    UpdateLines,
    StartPulls,
    AdvancePulls,
    #[cfg(feature = "gizmos")]
    DrawLines,
    _Phantom(PhantomData<fn() -> T>),
}
impl<T> PartialEq for ArcPullSystem<T> {
    fn eq(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}
impl<T> Eq for ArcPullSystem<T> {}
impl<T> Debug for ArcPullSystem<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = std::any::type_name::<T>();
        match self {
            Self::ReadInput => write!(f, "ReadInput ({})", set),
            Self::UpdateArcs => write!(f, "UpdateArcs ({})", set),
            Self::UpdateLines => write!(f, "UpdateLines ({})", set),
            Self::StartPulls => write!(f, "StartPulls ({})", set),
            Self::AdvancePulls => write!(f, "AdvancePulls ({})", set),
            #[cfg(feature = "gizmos")]
            Self::DrawLines => write!(f, "DrawLines ({})", set),
            Self::_Phantom(_) => write!(f, "PhantomData<{}>", set),
        }
    }
}
impl<T> Hash for ArcPullSystem<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let set = std::any::type_name::<T>();
        (core::mem::discriminant(self), set).hash(state);
    }
}
impl<T> Clone for ArcPullSystem<T> {
    fn clone(&self) -> Self {
        match self {
            Self::ReadInput => Self::ReadInput,
            Self::UpdateArcs => Self::UpdateArcs,
            Self::UpdateLines => Self::UpdateLines,
            Self::StartPulls => Self::StartPulls,
            Self::AdvancePulls => Self::AdvancePulls,
            #[cfg(feature = "gizmos")]
            Self::DrawLines => Self::DrawLines,
            Self::_Phantom(_) => Self::_Phantom(PhantomData),
        }
    }
}

/// Global plugin state used to switch parts of arc pulling on or off for the pull set `T`.
#[derive(Resource)]
pub struct ArcPullPluginState<T> {
    /// Turn [`PullAction`] buttons into [`PullPerformed`] events.
    pub read_input: bool,
    /// Write caster rays and arcs into their [`ArcLine`] every frame. Hit detection and pulling
    /// don't depend on this.
    pub update_lines: bool,
    #[cfg(feature = "gizmos")]
    pub draw_lines: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for ArcPullPluginState<T> {
    fn default() -> Self {
        ArcPullPluginState {
            read_input: true,
            update_lines: true,
            #[cfg(feature = "gizmos")]
            draw_lines: true,
            _marker: PhantomData,
        }
    }
}

impl<T> ArcPullPluginState<T> {
    /// Leaves triggering entirely to [`PullPerformed`] events sent by the app.
    pub fn without_input(self) -> Self {
        ArcPullPluginState {
            read_input: false,
            ..self
        }
    }
}

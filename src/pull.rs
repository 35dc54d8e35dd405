//! Systems that drive casters: redrawing their ray and arc, starting pulls on trigger, and
//! stepping pulls in progress.

use bevy_core::Name;
use bevy_ecs::prelude::*;
use bevy_reflect::TypePath;
use bevy_time::Time;
use bevy_transform::components::{GlobalTransform, Transform};
use bevy_utils::{error_once, tracing::*};

use crate::{
    arc::compute_arc_points,
    input::PullAction,
    motion::{MotionStep, PullMotion},
    raycast::{ray_from_caster, ArcRaycast},
    ArcCaster, ArcLine, PullBody, PullFinished, PullPerformed, PullPhase, PullStarted,
};

fn describe(entity: Entity, name: Option<&Name>) -> String {
    match name {
        Some(name) => format!("{name} ({entity})"),
        None => format!("{entity}"),
    }
}

/// Reports casters spawned without an [`ArcLine`] and disables their input binding.
///
/// The other caster systems require an `ArcLine`, so such a caster stays inert.
pub fn report_missing_lines<T: TypePath + Send + Sync>(
    mut casters: Query<
        (Entity, Option<&Name>, Option<&mut PullAction>),
        (Added<ArcCaster<T>>, Without<ArcLine>),
    >,
) {
    for (entity, name, action) in &mut casters {
        error!("ArcLine component missing on {}", describe(entity, name));
        if let Some(mut action) = action {
            action.disable();
        }
    }
}

/// Refreshes each caster's ray, then its arc path if it is not pulling anything.
///
/// A caster whose settings are invalid is left without a path, so it can't start a pull.
pub fn update_caster_arcs<T: TypePath + Send + Sync>(
    mut casters: Query<(&mut ArcCaster<T>, &GlobalTransform), With<ArcLine>>,
) {
    for (mut caster, transform) in &mut casters {
        let caster = &mut *caster;
        caster.ray = ray_from_caster(transform);

        if caster.is_moving() {
            continue;
        }
        if let Err(e) = caster.settings.validate() {
            error_once!("Invalid arc settings, arcs will not be drawn: {e}");
            caster.path.clear();
            continue;
        }
        compute_arc_points(&caster.settings, transform, &mut caster.path);
    }
}

/// Writes each caster's arc into its [`ArcLine`], or just the straight ray while the caster is
/// pulling or has no arc.
pub fn update_caster_lines<T: TypePath + Send + Sync>(
    mut casters: Query<(&ArcCaster<T>, &mut ArcLine, &GlobalTransform)>,
) {
    for (caster, mut line, transform) in &mut casters {
        if !caster.is_moving() && !caster.path.is_empty() {
            line.set_positions(&caster.path);
            continue;
        }
        let start = transform.translation();
        let end = caster
            .ray
            .map_or(start, |ray| ray.get_point(caster.settings.ray_length));
        line.set_position_count(2);
        line.set_position(0, start);
        line.set_position(1, end);
    }
}

/// Handles [`PullPerformed`] events: casts the caster's ray and, on a hit, starts pulling the hit
/// entity along the reversed arc.
///
/// Targets already being pulled by a caster of the same set are passed through by the ray.
pub fn start_pulls<T: TypePath + Send + Sync>(
    mut performed: EventReader<PullPerformed>,
    mut casters: Query<(&mut ArcCaster<T>, &mut ArcLine)>,
    raycast: ArcRaycast<T>,
    mut bodies: Query<&mut PullBody>,
    names: Query<&Name>,
    mut started: EventWriter<PullStarted>,
) {
    for &PullPerformed { caster: caster_entity } in performed.read() {
        let mut ignore: Vec<Entity> = casters
            .iter()
            .filter_map(|(caster, _)| caster.target)
            .collect();
        ignore.push(caster_entity);

        let Ok((mut caster, mut line)) = casters.get_mut(caster_entity) else {
            continue;
        };
        if caster.is_moving() || caster.path.is_empty() || caster.settings.validate().is_err() {
            continue;
        }
        let Some(ray) = caster.ray else {
            continue;
        };
        let Some((target, hit)) = raycast.cast_ray(ray, caster.settings.ray_length, &ignore)
        else {
            debug!("Pull from {caster_entity} hit nothing");
            continue;
        };
        info!(
            "Hit: {} at {:.2}",
            describe(target, names.get(target).ok()),
            hit.distance
        );

        if let Ok(mut body) = bodies.get_mut(target) {
            body.suspend();
        }
        line.enabled = false;
        let caster = &mut *caster;
        caster.target = Some(target);
        caster.phase = PullPhase::Pulling(PullMotion::along_reversed(&caster.path));
        started.send(PullStarted {
            caster: caster_entity,
            target,
        });
    }
}

/// Moves every pulled entity one frame further along its caster's arc, and ends finished pulls.
pub fn advance_pulls<T: TypePath + Send + Sync>(
    time: Res<Time>,
    mut casters: Query<(Entity, &mut ArcCaster<T>, &mut ArcLine)>,
    mut targets: Query<(&mut Transform, Option<&mut PullBody>)>,
    mut finished: EventWriter<PullFinished>,
) {
    let delta = time.delta_seconds();
    for (entity, mut caster, mut line) in &mut casters {
        let caster = &mut *caster;
        let PullPhase::Pulling(motion) = &mut caster.phase else {
            continue;
        };
        let Some(target) = caster.target else {
            caster.phase = PullPhase::Idle;
            line.enabled = true;
            continue;
        };

        let max_distance_delta = caster.settings.travel_speed * delta;
        let done = match targets.get_mut(target) {
            Ok((mut transform, body)) => {
                match motion.step(transform.translation, max_distance_delta) {
                    MotionStep::Moved(position) => {
                        transform.translation = position;
                        false
                    }
                    MotionStep::Finished => {
                        if let Some(mut body) = body {
                            body.restore();
                        }
                        true
                    }
                }
            }
            Err(_) => {
                warn!("Pulled entity {target} is gone, ending pull from {entity}");
                true
            }
        };

        if done {
            caster.phase = PullPhase::Idle;
            caster.target = None;
            line.enabled = true;
            finished.send(PullFinished {
                caster: entity,
                target,
            });
        }
    }
}

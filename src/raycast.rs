//! Finding what a caster's ray hits.
//!
//! Candidates are first culled with a ray/AABB slab test, nearest first, then checked exactly
//! against their mesh triangles when a mesh is available.

use bevy_asset::{Assets, Handle};
use bevy_ecs::{
    prelude::*,
    system::{lifetimeless::Read, SystemParam},
};
use bevy_math::{Affine3A, Dir3, FloatOrd, Ray3d, Vec3, Vec3A};
use bevy_reflect::TypePath;
use bevy_render::{
    mesh::{Indices, Mesh},
    primitives::Aabb,
    render_resource::PrimitiveTopology,
    view::InheritedVisibility,
};
use bevy_transform::components::GlobalTransform;
use bevy_utils::{tracing::*, warn_once};

use crate::{arc::LOCAL_FORWARD, PullTarget};

/// Builds the ray a caster casts: from its origin along its forward axis.
///
/// Returns `None` if the transform collapses the forward axis, e.g. a zero scale.
pub fn ray_from_caster(transform: &GlobalTransform) -> Option<Ray3d> {
    let direction = transform.affine().transform_vector3(LOCAL_FORWARD);
    Some(Ray3d {
        origin: transform.translation(),
        direction: Dir3::new(direction).ok()?,
    })
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Backfaces {
    #[default]
    Cull,
    Include,
}

/// A ray hit against a [`PullTarget`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullHit {
    pub position: Vec3,
    pub distance: f32,
}

/// Returns the near and far distances along `ray` at which it crosses `aabb`, if it does.
///
/// The test is done in model space, so an oriented box is handled as an axis-aligned one.
pub fn ray_aabb_intersection(
    ray: Ray3d,
    aabb: &Aabb,
    model_to_world: &Affine3A,
) -> Option<[f32; 2]> {
    let world_to_model = model_to_world.inverse();
    // The model-space ray keeps the world ray's parameterization, so `t` is a world distance.
    let ray_dir: Vec3A = world_to_model.transform_vector3a((*ray.direction).into());
    let ray_origin: Vec3A = world_to_model.transform_point3a(ray.origin.into());

    let t_0: Vec3A = (aabb.min() - ray_origin) / ray_dir;
    let t_1: Vec3A = (aabb.max() - ray_origin) / ray_dir;
    let t_min: Vec3A = t_0.min(t_1);
    let t_max: Vec3A = t_0.max(t_1);

    let hit_near = t_min.max_element();
    let hit_far = t_max.min_element();
    if hit_near > hit_far || hit_far < 0.0 || hit_near.is_nan() || hit_far.is_nan() {
        return None;
    }
    Some([hit_near.max(0.0), hit_far])
}

/// Möller-Trumbore ray/triangle intersection. Returns the distance along `ray` to the hit.
pub fn ray_triangle_intersection(
    origin: Vec3A,
    direction: Vec3A,
    triangle: [Vec3A; 3],
    backfaces: Backfaces,
) -> Option<f32> {
    let [v0, v1, v2] = triangle;
    let v0_to_v1 = v1 - v0;
    let v0_to_v2 = v2 - v0;
    let p_vec = direction.cross(v0_to_v2);
    let determinant = v0_to_v1.dot(p_vec);

    match backfaces {
        // Negative is back facing, near zero is parallel.
        Backfaces::Cull if determinant < f32::EPSILON => return None,
        Backfaces::Include if determinant.abs() < f32::EPSILON => return None,
        _ => {}
    }

    let determinant_inverse = 1.0 / determinant;
    let t_vec = origin - v0;
    let u = t_vec.dot(p_vec) * determinant_inverse;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q_vec = t_vec.cross(v0_to_v1);
    let v = direction.dot(q_vec) * determinant_inverse;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = v0_to_v2.dot(q_vec) * determinant_inverse;
    (t >= 0.0).then_some(t)
}

/// Nearest world-space hit of `ray` against a triangle-list mesh, if any.
pub fn ray_mesh_intersection(
    ray: Ray3d,
    mesh: &Mesh,
    mesh_to_world: &Affine3A,
    backfaces: Backfaces,
) -> Option<PullHit> {
    if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
        return None;
    }
    let positions = mesh.attribute(Mesh::ATTRIBUTE_POSITION)?.as_float3()?;

    let world_to_mesh = mesh_to_world.inverse();
    let origin = world_to_mesh.transform_point3a(ray.origin.into());
    let direction = world_to_mesh.transform_vector3a((*ray.direction).into());

    let triangle = |i: [usize; 3]| -> Option<[Vec3A; 3]> {
        Some([
            Vec3A::from(*positions.get(i[0])?),
            Vec3A::from(*positions.get(i[1])?),
            Vec3A::from(*positions.get(i[2])?),
        ])
    };
    let triangles: Box<dyn Iterator<Item = [usize; 3]> + '_> = match mesh.indices() {
        Some(Indices::U16(indices)) => Box::new(
            indices
                .chunks_exact(3)
                .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize]),
        ),
        Some(Indices::U32(indices)) => Box::new(
            indices
                .chunks_exact(3)
                .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize]),
        ),
        None => Box::new((0..positions.len() / 3).map(|i| [i * 3, i * 3 + 1, i * 3 + 2])),
    };

    let nearest = triangles
        .filter_map(triangle)
        .filter_map(|tri| ray_triangle_intersection(origin, direction, tri, backfaces))
        .map(FloatOrd)
        .min()?;

    let position = mesh_to_world.transform_point3(Vec3::from(origin + direction * nearest.0));
    Some(PullHit {
        position,
        distance: position.distance(ray.origin),
    })
}

/// A [`SystemParam`] that casts rays against the [`PullTarget`]s of the pull set `T`.
#[derive(SystemParam)]
pub struct ArcRaycast<'w, 's, T: TypePath + Send + Sync> {
    pub meshes: Option<Res<'w, Assets<Mesh>>>,
    pub culling_query: Query<
        'w,
        's,
        (
            Read<Aabb>,
            Read<GlobalTransform>,
            Option<Read<InheritedVisibility>>,
            Entity,
        ),
        With<PullTarget<T>>,
    >,
    pub mesh_query: Query<'w, 's, Read<Handle<Mesh>>, With<PullTarget<T>>>,
}

impl<'w, 's, T: TypePath + Send + Sync> ArcRaycast<'w, 's, T> {
    /// Casts `ray` and returns the nearest target hit within `max_distance`. Entities in `ignore`
    /// are passed through as if they weren't there.
    pub fn cast_ray(
        &self,
        ray: Ray3d,
        max_distance: f32,
        ignore: &[Entity],
    ) -> Option<(Entity, PullHit)> {
        let ray_cull = info_span!("arc ray culling");
        let ray_cull_guard = ray_cull.enter();
        let max_hits = self.culling_query.iter().len().max(1);
        let (aabb_hits_tx, aabb_hits_rx) =
            crossbeam_channel::bounded::<(FloatOrd, Entity, GlobalTransform)>(max_hits);

        self.culling_query
            .par_iter()
            .for_each(|(aabb, transform, visibility, entity)| {
                if ignore.contains(&entity) {
                    return;
                }
                if visibility.is_some_and(|v| !v.get()) {
                    return;
                }
                if let Some([near, _]) = ray_aabb_intersection(ray, aabb, &transform.affine())
                    .filter(|[near, _]| *near <= max_distance)
                {
                    aabb_hits_tx.send((FloatOrd(near), entity, *transform)).ok();
                }
            });
        let mut culled_list: Vec<_> = aabb_hits_rx.try_iter().collect();
        culled_list.sort_by_key(|(aabb_near, ..)| *aabb_near);
        drop(ray_cull_guard);

        let _raycast_guard = info_span!("arc raycast").entered();
        let mut nearest: Option<(Entity, PullHit)> = None;
        for (aabb_near, entity, transform) in culled_list {
            if let Some((_, best)) = nearest {
                // Every remaining box starts farther away than the best hit.
                if aabb_near.0 > best.distance {
                    break;
                }
            }
            let aabb_hit = PullHit {
                position: ray.get_point(aabb_near.0),
                distance: aabb_near.0,
            };
            let hit = match self.resolve_mesh(entity) {
                Some(mesh) if mesh.primitive_topology() == PrimitiveTopology::TriangleList => {
                    ray_mesh_intersection(ray, mesh, &transform.affine(), Backfaces::Cull)
                }
                Some(_) => {
                    warn_once!(
                        "Only TriangleList meshes can be pulled precisely, falling back to the AABB"
                    );
                    Some(aabb_hit)
                }
                None => Some(aabb_hit),
            };
            let Some(hit) = hit.filter(|hit| hit.distance <= max_distance) else {
                continue;
            };
            if nearest.map_or(true, |(_, best)| hit.distance < best.distance) {
                nearest = Some((entity, hit));
            }
        }
        nearest
    }

    fn resolve_mesh(&self, entity: Entity) -> Option<&Mesh> {
        let handle = self.mesh_query.get(entity).ok()?;
        self.meshes.as_ref()?.get(handle)
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::Quat;
    use bevy_render::render_asset::RenderAssetUsages;
    use bevy_transform::components::Transform;

    use super::*;

    // Triangle facing -X, so a ray down +X from the origin hits its front face.
    const V0: [f32; 3] = [1.0, -1.0, 2.0];
    const V1: [f32; 3] = [1.0, 2.0, -1.0];
    const V2: [f32; 3] = [1.0, -1.0, -1.0];

    fn ray(origin: Vec3, direction: Vec3) -> Ray3d {
        Ray3d {
            origin,
            direction: Dir3::new(direction).unwrap(),
        }
    }

    fn unit_box() -> Aabb {
        Aabb::from_min_max(Vec3::splat(-0.5), Vec3::splat(0.5))
    }

    #[test]
    fn caster_ray_points_forward() {
        let transform = GlobalTransform::from(
            Transform::from_xyz(0.0, 1.0, 0.0).with_rotation(Quat::from_rotation_y(
                std::f32::consts::FRAC_PI_2,
            )),
        );
        let ray = ray_from_caster(&transform).unwrap();
        assert_eq!(ray.origin, Vec3::Y);
        assert!(ray.direction.distance(Vec3::NEG_X) < 1e-6);
    }

    #[test]
    fn degenerate_caster_has_no_ray() {
        let transform = GlobalTransform::from(Transform::from_scale(Vec3::ZERO));
        assert!(ray_from_caster(&transform).is_none());
    }

    #[test]
    fn triangle_hit() {
        let tri = [V0.into(), V1.into(), V2.into()];
        let t = ray_triangle_intersection(Vec3A::ZERO, Vec3A::X, tri, Backfaces::Include);
        assert!((t.unwrap() - 1.0).abs() <= f32::EPSILON);
    }

    #[test]
    fn triangle_backface_culled() {
        let tri = [V2.into(), V1.into(), V0.into()];
        assert!(ray_triangle_intersection(Vec3A::ZERO, Vec3A::X, tri, Backfaces::Cull).is_none());
        assert!(
            ray_triangle_intersection(Vec3A::ZERO, Vec3A::X, tri, Backfaces::Include).is_some()
        );
    }

    #[test]
    fn triangle_behind_ray_is_missed() {
        let tri = [V0.into(), V1.into(), V2.into()];
        assert!(
            ray_triangle_intersection(Vec3A::ZERO, Vec3A::NEG_X, tri, Backfaces::Include)
                .is_none()
        );
    }

    #[test]
    fn aabb_hit_distance_is_in_world_units() {
        let ray = ray(Vec3::ZERO, Vec3::NEG_Z);
        let model = Transform::from_xyz(0.0, 0.0, -3.0).with_scale(Vec3::splat(2.0));
        let [near, far] =
            ray_aabb_intersection(ray, &unit_box(), &GlobalTransform::from(model).affine())
                .unwrap();
        assert!((near - 2.0).abs() < 1e-5);
        assert!((far - 4.0).abs() < 1e-5);
    }

    #[test]
    fn aabb_miss_and_behind() {
        let model = GlobalTransform::from(Transform::from_xyz(0.0, 0.0, -3.0)).affine();
        let sideways = ray(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_Z);
        assert!(ray_aabb_intersection(sideways, &unit_box(), &model).is_none());
        let away = ray(Vec3::ZERO, Vec3::Z);
        assert!(ray_aabb_intersection(away, &unit_box(), &model).is_none());
    }

    #[test]
    fn aabb_from_inside_starts_at_zero() {
        let ray = ray(Vec3::ZERO, Vec3::NEG_Z);
        let [near, far] =
            ray_aabb_intersection(ray, &unit_box(), &Affine3A::IDENTITY).unwrap();
        assert_eq!(near, 0.0);
        assert!((far - 0.5).abs() < 1e-6);
    }

    /// A 2x2 quad in the XY plane facing +Z.
    fn quad() -> Mesh {
        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        )
        .with_inserted_attribute(
            Mesh::ATTRIBUTE_POSITION,
            vec![
                [-1.0, -1.0, 0.0],
                [1.0, -1.0, 0.0],
                [-1.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
            ],
        )
        .with_inserted_indices(Indices::U32(vec![0, 1, 2, 1, 3, 2]))
    }

    #[test]
    fn mesh_hit_in_world_space() {
        let model = GlobalTransform::from(Transform::from_xyz(0.0, 0.0, -2.0)).affine();
        let ray = ray(Vec3::new(0.25, -0.5, 0.0), Vec3::NEG_Z);
        let hit = ray_mesh_intersection(ray, &quad(), &model, Backfaces::Cull).unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert!(hit.position.distance(Vec3::new(0.25, -0.5, -2.0)) < 1e-5);
    }

    #[test]
    fn mesh_back_is_culled() {
        let model = GlobalTransform::from(Transform::from_xyz(0.0, 0.0, -2.0)).affine();
        let ray = ray(Vec3::new(0.25, -0.5, -4.0), Vec3::Z);
        assert!(ray_mesh_intersection(ray, &quad(), &model, Backfaces::Cull).is_none());
        assert!(ray_mesh_intersection(ray, &quad(), &model, Backfaces::Include).is_some());
    }

    #[test]
    fn mesh_missed_outside_quad() {
        let model = GlobalTransform::from(Transform::from_xyz(0.0, 0.0, -2.0)).affine();
        let ray = ray(Vec3::new(3.0, 0.0, 0.0), Vec3::NEG_Z);
        assert!(ray_mesh_intersection(ray, &quad(), &model, Backfaces::Include).is_none());
    }

    #[test]
    fn non_triangle_mesh_is_not_intersected() {
        let lines = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default())
            .with_inserted_attribute(
                Mesh::ATTRIBUTE_POSITION,
                vec![[-1.0, -1.0, 0.0], [1.0, 1.0, 0.0], [1.0, -1.0, 0.0]],
            );
        let ray = ray(Vec3::new(0.25, -0.5, 2.0), Vec3::NEG_Z);
        assert!(
            ray_mesh_intersection(ray, &lines, &Affine3A::IDENTITY, Backfaces::Include).is_none()
        );
    }
}

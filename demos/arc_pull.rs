//! A hand that sweeps left and right in front of a row of cubes. Click to pull the cube its ray
//! is pointing at back along the arc.

use bevy::prelude::*;
use bevy_mod_arcpull::prelude::*;

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, ArcPullPlugin::<Hand>::default()))
        .add_systems(Startup, setup)
        .add_systems(Update, (sweep_hand, log_pulls))
        .run();
}

// Groups the hand with the cubes it can pull.
#[derive(Reflect)]
struct Hand;

#[derive(Component)]
struct Sweeping;

fn sweep_hand(time: Res<Time>, mut hands: Query<&mut Transform, With<Sweeping>>) {
    let angle = (time.elapsed_seconds() * 0.3).sin() * 0.6;
    for mut transform in &mut hands {
        transform.rotation = Quat::from_rotation_y(angle);
    }
}

fn log_pulls(mut started: EventReader<PullStarted>, mut finished: EventReader<PullFinished>) {
    for event in started.read() {
        info!("{} started pulling {}", event.caster, event.target);
    }
    for event in finished.read() {
        info!("{} finished pulling {}", event.caster, event.target);
    }
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn(Camera3dBundle {
        transform: Transform::from_xyz(5.0, 5.0, 6.0).looking_at(Vec3::new(0.0, 0.0, -2.0), Vec3::Y),
        ..default()
    });
    commands.spawn(DirectionalLightBundle {
        transform: Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -1.0, 0.5, 0.0)),
        ..default()
    });

    commands.spawn((
        Name::new("Hand"),
        Sweeping,
        PbrBundle {
            mesh: meshes.add(Sphere::new(0.1)),
            material: materials.add(Color::srgb(0.9, 0.8, 0.6)),
            transform: Transform::from_xyz(0.0, 0.5, 0.0),
            ..default()
        },
        ArcCaster::<Hand>::new(ArcSettings::default().with_travel_speed(3.0)),
        ArcLine::default(),
        PullAction::mouse(MouseButton::Left),
    ));

    let cube = meshes.add(Cuboid::new(0.5, 0.5, 0.5));
    for (i, x) in [-2.0, -1.0, 0.0, 1.0, 2.0].into_iter().enumerate() {
        commands.spawn((
            Name::new(format!("Cube {i}")),
            PbrBundle {
                mesh: cube.clone(),
                material: materials.add(Color::hsl(i as f32 * 60.0, 0.7, 0.5)),
                transform: Transform::from_xyz(x, 0.5, -4.0),
                ..default()
            },
            PullTarget::<Hand>::default(),
            PullBody::default(),
        ));
    }
}

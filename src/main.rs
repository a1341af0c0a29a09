use anyhow::{ensure, Result};
use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, SystemInformationDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::args::ARGS;
use crate::hud::Notices;
use crate::keyboard::KeyboardCommands;
use crate::particle::Motion;
use crate::session::{Session, SessionSettings};
use crate::target::TargetImage;

mod allocator;
mod args;
mod brush;
mod color;
mod color_index;
mod hud;
mod keyboard;
mod particle;
mod session;
mod session_settings;
mod target;

const TICK_HZ: f64 = 60.0;
const PREVIEW_COLOR: Color = Color::srgb(0.8, 0.8, 0.8);
const BACKGROUND: Color = Color::srgb(20.0 / 255.0, 20.0 / 255.0, 20.0 / 255.0);

fn main() -> Result<()> {
    let target = match &ARGS.image {
        Some(path) => TargetImage::open(path, ARGS.max_dim)?,
        None => TargetImage::gradient(),
    };
    ensure!(!target.is_empty(), "The target image has no pixels");

    let session = Session::new(
        target,
        SessionSettings {
            max_candidates: ARGS.max_candidates,
            motion: Motion {
                ease: ARGS.ease,
                snap: ARGS.snap,
            },
            color: ARGS.color,
            radius: ARGS.radius,
            dot_size: ARGS.dot_size,
            seed: ARGS.seed.unwrap_or_else(rand::random),
        },
    );

    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Pixel Morph Draw".into(),
                    resizable: false,
                    ..default()
                }),
                ..default()
            }),
            FrameTimeDiagnosticsPlugin::default(),
            SystemInformationDiagnosticsPlugin,
        ))
        .insert_resource(ClearColor(BACKGROUND))
        .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
        .insert_resource(session)
        .insert_resource(KeyboardCommands::create())
        .insert_resource(Notices::default())
        .add_systems(Startup, (setup, hud::spawn_hud))
        .add_systems(Update, (keyboard::handle_keypress, draw, hud::update_hud).chain())
        // At most one brush stroke per fixed tick.
        .add_systems(FixedUpdate, (paint, tick).chain())
        .run();

    Ok(())
}

fn setup(mut commands: Commands, mut window: Single<&mut Window, With<PrimaryWindow>>, session: Res<Session>) {
    let target = session.target();
    // One logical window pixel per image pixel, so cursor coordinates are image coordinates.
    window.resolution.set(target.width as f32, target.height as f32);
    commands.spawn(Camera2d);
    info!("Loaded {}x{} target, press ? for help", target.width, target.height);
    info!("{session:?}");
}

/// Left mouse held: one stroke at the cursor for this tick.
fn paint(
    buttons: Res<ButtonInput<MouseButton>>,
    window: Single<&Window, With<PrimaryWindow>>,
    mut session: ResMut<Session>,
) {
    if !buttons.pressed(MouseButton::Left) {
        return;
    }
    if let Some(cursor) = window.cursor_position() {
        session.queue_stroke(cursor);
    }
}

fn tick(mut session: ResMut<Session>) {
    if session.should_log() {
        info!("{:?}", *session);
    }
    let spawned = session.step_frame();
    if spawned > 0 {
        debug!("Spawned {spawned} particles ({} total)", session.particles.len());
    }
}

/// Image space has y pointing down with the origin in the corner; the camera is centered.
fn to_world(pos: Vec2, target: &TargetImage) -> Vec2 {
    Vec2::new(pos.x - target.width as f32 / 2.0, target.height as f32 / 2.0 - pos.y)
}

fn draw(mut gizmos: Gizmos, session: Res<Session>, window: Single<&Window, With<PrimaryWindow>>) {
    let target = session.target();
    for particle in session.particles.iter() {
        gizmos
            .circle_2d(to_world(particle.position, target), session.dot_size, particle.color.to_color())
            .resolution(8);
    }

    if let Some(cursor) = window.cursor_position() {
        gizmos.circle_2d(to_world(cursor, target), session.brush.radius, PREVIEW_COLOR);
    }
}

//! Caves of Titan bootstrap
//!
//! `caves_of_titan [seed]` – the seed may be decimal or `0x` hex; a random
//! one is picked when it is missing. Works with **Bevy 0.15**.

use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin};
use bevy::input::ButtonInput;
use bevy::prelude::*;
use bevy::window::{MonitorSelection, PrimaryWindow, WindowMode};

use caves_of_titan::constants::WINDOW_SIZE;
use caves_of_titan::prelude::*;

/* ===========================================================
   window: 2D camera and F11 fullscreen
   =========================================================== */
fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// windowed ↔ borderless fullscreen on the primary monitor
fn toggled(mode: WindowMode) -> WindowMode {
    if mode == WindowMode::Windowed {
        WindowMode::BorderlessFullscreen(MonitorSelection::Primary)
    } else {
        WindowMode::Windowed
    }
}

fn fullscreen_key_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    if keys.just_pressed(KeyCode::F11) {
        for mut window in &mut windows {
            window.mode = toggled(window.mode);
        }
    }
}

/* ===========================================================
   level seed from argv
   =========================================================== */
fn parse_seed(arg: &str) -> Option<u64> {
    match arg.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => arg.parse().ok(),
    }
}

fn seed_from_args() -> LevelSeed {
    let Some(arg) = std::env::args().nth(1) else {
        return LevelSeed::random();
    };
    match parse_seed(&arg) {
        Some(seed) => LevelSeed(seed),
        None => {
            eprintln!("ignoring unreadable seed {arg:?}");
            LevelSeed::random()
        }
    }
}

fn main() {
    App::new()
        .add_plugins((
            LogDiagnosticsPlugin::default(),
            FrameTimeDiagnosticsPlugin::default(),
        ))
        .insert_resource(ClearColor(Color::srgb(0.05, 0.04, 0.06)))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Caves of Titan".into(),
                resolution: (WINDOW_SIZE.x as f32, WINDOW_SIZE.y as f32).into(),
                mode: WindowMode::Windowed,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(seed_from_args())
        .add_plugins(SimulationPlugin)
        .add_systems(Startup, setup_camera)
        .add_systems(Update, fullscreen_key_system)
        .run();
}

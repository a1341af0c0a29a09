use std::collections::HashMap;
use std::time::{Duration, Instant};

use bevy::app::AppExit;
use bevy::input::ButtonInput;
use bevy::prelude::*;

use crate::hud::Notices;
use crate::session::Session;

/// Number-row and numpad keys, smallest brush preset first.
const DIGIT_KEYS: [(KeyCode, KeyCode); 10] = [
    (KeyCode::Digit1, KeyCode::Numpad1),
    (KeyCode::Digit2, KeyCode::Numpad2),
    (KeyCode::Digit3, KeyCode::Numpad3),
    (KeyCode::Digit4, KeyCode::Numpad4),
    (KeyCode::Digit5, KeyCode::Numpad5),
    (KeyCode::Digit6, KeyCode::Numpad6),
    (KeyCode::Digit7, KeyCode::Numpad7),
    (KeyCode::Digit8, KeyCode::Numpad8),
    (KeyCode::Digit9, KeyCode::Numpad9),
    (KeyCode::Digit0, KeyCode::Numpad0),
];

const RADIUS_PRESET_STEP: f32 = 6.0;
const CHANNEL_STEP: i32 = 16;

/// Brush radius selected by a digit key: 1 is 6, 0 is 60.
pub fn preset_radius(key: &KeyCode) -> Option<f32> {
    DIGIT_KEYS
        .iter()
        .position(|(digit, numpad)| digit == key || numpad == key)
        .map(|i| (i + 1) as f32 * RADIUS_PRESET_STEP)
}

/// Defines a keyboard command to associate with a keypress.
/// Each command can have a different repeat rate.
pub struct KeyboardCommand {
    pub description: String,
    pub last_action_time: Instant,
    pub interval: Duration,
    pub action: KeyboardAction,
}

/// The function that invokes the keyboard action. `shift` reverses adjustments.
type KeyboardAction = fn(session: &mut Session, key: &KeyCode, shift: bool, notices: &mut Notices);

/// Contains the collection of keyboard commands.
#[derive(Resource)]
pub struct KeyboardCommands {
    pub commands: HashMap<KeyCode, KeyboardCommand>,
}

impl KeyboardCommands {
    pub fn create() -> Self {
        let mut kb_cmds = KeyboardCommands {
            commands: HashMap::new(),
        };

        // Space: freeze / unfreeze particle motion.
        kb_cmds.add_command(KeyCode::Space, "Pause motion", 250, pause);
        // R/G/B: brush color channels.
        kb_cmds.add_command(KeyCode::KeyR, "Increase red (shift: decrease)", 50, adj_channel);
        kb_cmds.add_command(KeyCode::KeyG, "Increase green (shift: decrease)", 50, adj_channel);
        kb_cmds.add_command(KeyCode::KeyB, "Increase blue (shift: decrease)", 50, adj_channel);
        // [ and ]: brush radius.
        kb_cmds.add_command(KeyCode::BracketLeft, "Shrink brush", 50, adj_radius);
        kb_cmds.add_command(KeyCode::BracketRight, "Grow brush", 50, adj_radius);
        // H: toggle the HUD
        kb_cmds.add_command(KeyCode::KeyH, "Toggle HUD", 250, |session, _, _, _| session.toggle_hud());
        // I: toggle the CPU / memory panel
        kb_cmds.add_command(KeyCode::KeyI, "Toggle system stats", 250, |session, _, _, _| session.toggle_stats());
        // L: log allocator statistics in the next tick
        kb_cmds.add_command(KeyCode::KeyL, "Log statistics", 250, |session, _, _, _| session.log_next_frame());
        // Digits: brush size presets.
        for (digit, numpad) in DIGIT_KEYS {
            kb_cmds.add_command(digit, "Brush size preset", 250, set_radius);
            kb_cmds.add_command(numpad, "Brush size preset", 250, set_radius);
        }

        kb_cmds
    }

    pub fn add_command(&mut self, key: KeyCode, description: &str, interval_millis: u64, action: KeyboardAction) {
        self.commands.insert(
            key,
            KeyboardCommand {
                description: description.into(),
                last_action_time: Instant::now(),
                interval: Duration::from_millis(interval_millis),
                action,
            },
        );
    }

    /// One line per distinct command, sorted by key name.
    pub fn help(&self) -> String {
        let mut lines: Vec<String> = self
            .commands
            .iter()
            .map(|(key, cmd)| format!("{key:?} - {}", cmd.description))
            // Numpad digits duplicate the number row.
            .filter(|line| !line.starts_with("Numpad"))
            .collect();
        lines.sort();
        let mut kb_help: String = "Keyboard commands:".into();
        for line in lines {
            kb_help.push('\n');
            kb_help.push_str(&line);
        }
        kb_help
    }
}

fn pause(session: &mut Session, _key: &KeyCode, _shift: bool, notices: &mut Notices) {
    session.toggle_pause();
    notices.push(if session.debug.paused { "Paused" } else { "Running" });
}

fn adj_channel(session: &mut Session, key: &KeyCode, shift: bool, notices: &mut Notices) {
    let channel = match key {
        KeyCode::KeyR => 0,
        KeyCode::KeyG => 1,
        _ => 2,
    };
    session.adj_channel(channel, if shift { -CHANNEL_STEP } else { CHANNEL_STEP });
    notices.push(format!("Color: {}", session.brush.color));
}

fn adj_radius(session: &mut Session, key: &KeyCode, _shift: bool, notices: &mut Notices) {
    if *key == KeyCode::BracketLeft {
        session.adj_radius(-1.0);
    } else {
        session.adj_radius(1.0);
    }
    notices.push(format!("Brush radius: {}", session.brush.radius));
}

fn set_radius(session: &mut Session, key: &KeyCode, _shift: bool, notices: &mut Notices) {
    if let Some(radius) = preset_radius(key) {
        session.set_radius(radius);
        notices.push(format!("Brush radius: {}", session.brush.radius));
    }
}

pub fn handle_keypress(
    kb: Res<ButtonInput<KeyCode>>,
    mut app_exit: MessageWriter<AppExit>,
    mut session: ResMut<Session>,
    mut kb_cmds: ResMut<KeyboardCommands>,
    mut notices: ResMut<Notices>,
) {
    // Esc / Q: quit the app
    if kb.pressed(KeyCode::Escape) || kb.pressed(KeyCode::KeyQ) {
        app_exit.write(AppExit::Success);
    }

    let shift = kb.pressed(KeyCode::ShiftLeft) || kb.pressed(KeyCode::ShiftRight);

    // ?: display help
    if kb.just_pressed(KeyCode::Slash) && shift {
        let kb_help = kb_cmds.help();
        info!("{kb_help}");
        notices.push_for(kb_help, Duration::from_secs(5));
    }

    let now = Instant::now();
    for key in kb.get_pressed() {
        if let Some(command) = kb_cmds.commands.get_mut(key) {
            if now.duration_since(command.last_action_time) >= command.interval {
                command.last_action_time = now;
                debug!("{key:?}: {}", command.description);
                (command.action)(&mut session, key, shift, &mut notices);
            }
        }
    }
}

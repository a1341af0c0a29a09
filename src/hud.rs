use std::time::{Duration, Instant};

use bevy::diagnostic::{
    DiagnosticPath, DiagnosticsStore, FrameTimeDiagnosticsPlugin, SystemInfo, SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;

use crate::session::Session;

const NOTICE_DURATION: Duration = Duration::from_secs(1);

pub struct NoticeText {
    pub text: String,
    pub start_time: Instant,
    pub duration: Duration,
}

/// Short-lived lines shown under the HUD after a keyboard command.
#[derive(Resource, Default)]
pub struct Notices {
    pub notices: Vec<NoticeText>,
}

impl Notices {
    pub fn push(&mut self, text: impl Into<String>) {
        self.push_for(text, NOTICE_DURATION);
    }

    pub fn push_for(&mut self, text: impl Into<String>, duration: Duration) {
        let text = text.into();
        // Holding a key re-sends the same notice; keep only the latest.
        self.notices.retain(|n| n.text != text);
        self.notices.push(NoticeText {
            text,
            start_time: Instant::now(),
            duration,
        });
    }

    pub fn expire(&mut self, now: Instant) {
        self.notices.retain(|n| now.duration_since(n.start_time) < n.duration);
    }
}

#[derive(Component)]
pub struct HudText;

pub fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(8.0),
            left: Val::Px(8.0),
            ..default()
        },
        HudText,
    ));
}

/// Machine and process load, as shown by the stats panel.
#[derive(Default)]
pub struct SystemStats {
    pub fps: Option<f64>,
    pub cpu_percent: Option<f64>,
    pub process_cpu_percent: Option<f64>,
    pub cores: Option<String>,
    pub cpu_name: Option<String>,
    /// Resident memory of this process, in bytes.
    pub process_mem: Option<f64>,
    pub ram_percent: Option<f64>,
}

impl SystemStats {
    pub fn gather(diagnostics: &DiagnosticsStore, info: Option<&SystemInfo>) -> SystemStats {
        let smoothed = |path: &DiagnosticPath| diagnostics.get(path).and_then(|d| d.smoothed());
        SystemStats {
            fps: smoothed(&FrameTimeDiagnosticsPlugin::FPS),
            cpu_percent: smoothed(&SystemInformationDiagnosticsPlugin::SYSTEM_CPU_USAGE),
            process_cpu_percent: smoothed(&SystemInformationDiagnosticsPlugin::PROCESS_CPU_USAGE),
            cores: info.map(|i| i.core_count.clone()),
            cpu_name: info.map(|i| i.cpu.clone()),
            // Reported in GiB.
            process_mem: smoothed(&SystemInformationDiagnosticsPlugin::PROCESS_MEM_USAGE)
                .map(|gib| gib * 1024.0 * 1024.0 * 1024.0),
            ram_percent: smoothed(&SystemInformationDiagnosticsPlugin::SYSTEM_MEM_USAGE),
        }
    }

    pub fn panel(&self) -> String {
        let or_na = |v: Option<f64>| v.map_or("N/A".to_string(), |v| format!("{v:.1}"));
        let mut lines = vec![format!("FPS avg: {}", or_na(self.fps))];
        lines.push(format!(
            "CPU: {}% (this process {}%) | Cores: {}",
            or_na(self.cpu_percent),
            or_na(self.process_cpu_percent),
            self.cores.as_deref().unwrap_or("N/A"),
        ));
        if let Some(name) = &self.cpu_name {
            lines.push(format!("CPU model: {name}"));
        }
        lines.push(format!(
            "RAM: {}  ({}%)",
            self.process_mem.map_or("N/A".to_string(), format_bytes),
            or_na(self.ram_percent),
        ));
        lines.join("\n")
    }
}

pub fn format_bytes(bytes: f64) -> String {
    let mut n = bytes;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if n < 1024.0 {
            return format!("{n:.1}{unit}");
        }
        n /= 1024.0;
    }
    format!("{n:.1}PB")
}

pub fn update_hud(
    session: Res<Session>,
    diagnostics: Res<DiagnosticsStore>,
    info: Option<Res<SystemInfo>>,
    mut notices: ResMut<Notices>,
    mut hud: Single<&mut Text, With<HudText>>,
) {
    notices.expire(Instant::now());

    let mut text = String::new();
    if session.debug.show_hud {
        let fps = diagnostics
            .get(&FrameTimeDiagnosticsPlugin::FPS)
            .and_then(|fps| fps.smoothed())
            .unwrap_or(0.0);
        text.push_str(&format!(
            "Color: {}  Radius: {}\nParticles: {}  Free pixels: {}\nFPS: {fps:.1}{}",
            session.brush.color,
            session.brush.radius,
            session.particles.len(),
            session.allocator.num_unclaimed(),
            if session.debug.paused { "  (paused)" } else { "" },
        ));
    }
    if session.debug.show_stats {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&SystemStats::gather(&diagnostics, info.as_deref()).panel());
    }
    for notice in &notices.notices {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&notice.text);
    }
    hud.0 = text;
}

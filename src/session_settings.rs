use crate::brush::clamp_radius;
use crate::session::Session;

impl Session {
    pub fn toggle_pause(&mut self) {
        self.debug.paused = !self.debug.paused;
    }

    pub fn toggle_hud(&mut self) {
        self.debug.show_hud = !self.debug.show_hud;
    }

    pub fn toggle_stats(&mut self) {
        self.debug.show_stats = !self.debug.show_stats;
    }

    pub fn log_next_frame(&mut self) {
        self.debug.log_frame = self.debug.current_frame;
    }

    pub fn adj_channel(&mut self, channel: usize, increment: i32) {
        self.brush.color = self.brush.color.adjusted(channel, increment);
    }

    pub fn adj_radius(&mut self, increment: f32) {
        self.set_radius(self.brush.radius + increment);
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.brush.radius = clamp_radius(radius);
    }
}

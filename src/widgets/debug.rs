use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

#[derive(Default)]
pub struct DebugState {
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub num_recomputes: usize,
    pub last_key_event_name: String,
    /// Last action taken (e.g. "toggle_filter") for debugging key handling.
    pub last_action: String,
    pub last_recompute: Option<Duration>,
    pub enabled: bool,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}", event.code);
    }

    pub fn on_recompute(&mut self, took: Duration) {
        self.num_recomputes += 1;
        self.last_recompute = Some(took);
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let recompute = self
            .last_recompute
            .map(|d| format!("{:.2}ms", d.as_secs_f64() * 1000.0))
            .unwrap_or_else(|| "-".to_string());
        Paragraph::new(format!(
            "events={} keys={} last_key={} last_action={} frames={} recomputes={} last_recompute={}",
            self.num_events,
            self.num_key_events,
            self.last_key_event_name,
            self.last_action,
            self.num_frames,
            self.num_recomputes,
            recompute
        ))
        .render(area, buf);
    }
}

//! Simulation report generation.

use serde::Serialize;

/// Outcome of one scripted run.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub seed: u64,
    pub events_processed: u64,
    pub ticks: u64,
    pub ignored_tags: Vec<String>,
    pub frames_rendered: u64,

    // Final state
    pub final_score: u32,
    pub best_score: u32,
    pub crashes: u32,
    pub playing: bool,
    pub game_over: bool,
    pub bird_x: f64,
    pub bird_y: f64,
    pub level_length: usize,
}

impl SimReport {
    /// Share of emitted states that made it past the render debounce.
    pub fn frame_ratio(&self) -> f64 {
        if self.events_processed == 0 {
            return 0.0;
        }
        self.frames_rendered as f64 / self.events_processed as f64
    }

    pub fn to_text(&self) -> String {
        let mut report = String::new();

        report.push_str("═══════════════════════════════════════════════\n");
        report.push_str("              SIMULATION REPORT\n");
        report.push_str("═══════════════════════════════════════════════\n\n");

        report.push_str("── INPUT ───────────────────────────────────────\n");
        report.push_str(&format!("  Seed:              {}\n", self.seed));
        report.push_str(&format!("  Events processed:  {}\n", self.events_processed));
        report.push_str(&format!("  Ticks:             {}\n", self.ticks));
        if !self.ignored_tags.is_empty() {
            report.push_str(&format!(
                "  Ignored tags:      {}\n",
                self.ignored_tags.join(", ")
            ));
        }
        report.push_str(&format!(
            "  Frames rendered:   {} ({:.0}%)\n\n",
            self.frames_rendered,
            self.frame_ratio() * 100.0
        ));

        report.push_str("── OUTCOME ─────────────────────────────────────\n");
        report.push_str(&format!("  Final score:       {}\n", self.final_score));
        report.push_str(&format!("  Best score:        {}\n", self.best_score));
        report.push_str(&format!("  Crashes:           {}\n", self.crashes));
        let status = if self.game_over {
            "game over"
        } else if self.playing {
            "playing"
        } else {
            "waiting to start"
        };
        report.push_str(&format!("  Status:            {}\n", status));
        report.push_str(&format!(
            "  Bird:              x={:.2} y={:.2}\n",
            self.bird_x, self.bird_y
        ));
        report.push_str(&format!("  Level columns:     {}\n", self.level_length));

        report
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

use std::fmt::Write as _;

use web_time::Instant;

use trellis_core::{FrameReport, InstanceInfo, Runtime, Target};

/// Smoothed per-frame counters, fed with the report of every
/// [`Runtime::frame`].
pub struct FrameStats {
    frame_count: u64,
    last_frame: Option<Instant>,
    fps_smooth: f32,
    renders_smooth: f32,
    pub last: FrameReport,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

// simple EMA
const SMOOTHING: f32 = 0.2;

fn ema(smooth: f32, sample: f32) -> f32 {
    if smooth == 0.0 {
        sample
    } else {
        (1.0 - SMOOTHING) * smooth + SMOOTHING * sample
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            last_frame: None,
            fps_smooth: 0.0,
            renders_smooth: 0.0,
            last: FrameReport::default(),
        }
    }

    pub fn record(&mut self, report: &FrameReport) {
        self.record_at(report, Instant::now());
    }

    pub fn record_at(&mut self, report: &FrameReport, now: Instant) {
        self.frame_count += 1;
        if let Some(prev) = self.last_frame.replace(now) {
            let dt = (now - prev).as_secs_f32();
            if dt > 0.0 {
                self.fps_smooth = ema(self.fps_smooth, 1.0 / dt);
            }
        }
        self.renders_smooth = ema(self.renders_smooth, report.renders as f32);
        self.last = *report;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> f32 {
        self.fps_smooth
    }

    pub fn renders_per_frame(&self) -> f32 {
        self.renders_smooth
    }

    /// One status line, e.g. `frame: 12  |  fps: 59.8  |  renders: 3.1`.
    pub fn summary(&self) -> String {
        let lines = [
            format!("frame: {}", self.frame_count),
            format!("fps: {:.1}", self.fps_smooth),
            format!("renders: {:.1}", self.renders_smooth),
            format!(
                "last: {}r {}s {}+ {}- {}m",
                self.last.renders,
                self.last.skipped,
                self.last.mounts,
                self.last.unmounts,
                self.last.moves
            ),
        ];
        lines.join("  |  ")
    }
}

pub struct Inspector {
    pub enabled: bool,
    pub stats: FrameStats,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self {
            enabled: false,
            stats: FrameStats::new(),
        }
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    /// Records `report` and, when enabled, logs the stats line.
    pub fn frame(&mut self, report: &FrameReport) {
        self.stats.record(report);
        if self.enabled {
            log::info!("{}", self.stats.summary());
        }
    }

    /// Indented dump of the mounted instance tree.
    pub fn tree<T: Target>(&self, runtime: &Runtime<T>) -> String {
        dump(&runtime.inspect())
    }
}

/// Renders a snapshot from [`Runtime::inspect`], one instance per line:
///
/// ```text
/// root slots=3 node=1
///   list
///     row #1u slots=1
/// ```
///
/// A trailing `*` marks instances waiting for a render.
pub fn dump(snapshot: &[InstanceInfo]) -> String {
    let mut out = String::new();
    for info in snapshot {
        let _ = write!(out, "{:indent$}{}", "", info.name, indent = info.depth * 2);
        if let Some(key) = &info.key {
            let _ = write!(out, " #{key:?}");
        }
        if info.slots > 0 {
            let _ = write!(out, " slots={}", info.slots);
        }
        if let Some(node) = info.owned_node {
            let _ = write!(out, " node={}", node.0);
        }
        if info.dirty {
            out.push_str(" *");
        }
        out.push('\n');
    }
    out
}

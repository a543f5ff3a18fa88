//! Transport bar state: pause, position, duration, volume and seek drag

/// Slider range used while dragging the seek bar
pub const SLIDER_MAX: f64 = 100.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Transport {
    pub loaded: bool,
    pub paused: bool,
    position_secs: f64,
    duration_secs: f64,
    volume: f64,
    drag: Option<f64>,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            loaded: false,
            paused: true,
            position_secs: 0.0,
            duration_secs: 0.0,
            volume: 1.0,
            drag: None,
        }
    }
}

impl Transport {
    pub fn with_volume(volume: f64) -> Self {
        let mut transport = Self::default();
        transport.set_volume(volume);
        transport
    }

    /// A freshly loaded stream starts playing from zero.
    pub fn start(&mut self, duration_secs: Option<f64>) {
        self.loaded = true;
        self.paused = false;
        self.position_secs = 0.0;
        self.duration_secs = duration_secs.unwrap_or(0.0).max(0.0);
        self.drag = None;
    }

    pub fn stop(&mut self) {
        *self = Self::with_volume(self.volume);
    }

    /// Flips pause. Returns the new paused flag, or `None` with nothing loaded.
    pub fn toggle_pause(&mut self) -> Option<bool> {
        if !self.loaded {
            return None;
        }
        self.paused = !self.paused;
        Some(self.paused)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Moves the drag handle by `delta` slider units, starting from the
    /// current position when no drag is in progress.
    pub fn drag_by(&mut self, delta: f64) {
        let start = self.drag.unwrap_or_else(|| self.slider_value());
        self.drag_to(start + delta);
    }

    pub fn drag_to(&mut self, value: f64) {
        if self.duration_secs <= 0.0 {
            return;
        }
        self.drag = Some(value.clamp(0.0, SLIDER_MAX));
    }

    /// Ends the drag and returns the position to seek to.
    pub fn release(&mut self) -> Option<f64> {
        let value = self.drag.take()?;
        let target = value / SLIDER_MAX * self.duration_secs;
        self.position_secs = target;
        Some(target)
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Position reported by the player. Ignored while dragging.
    pub fn sync_position(&mut self, secs: f64) {
        if self.drag.is_none() {
            self.position_secs = secs.max(0.0);
        }
    }

    pub fn sync_duration(&mut self, secs: f64) {
        self.duration_secs = secs.max(0.0);
    }

    pub fn slider_value(&self) -> f64 {
        if let Some(value) = self.drag {
            return value;
        }
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        (self.position_secs / self.duration_secs * SLIDER_MAX).clamp(0.0, SLIDER_MAX)
    }

    /// Position shown next to the slider: the drag target while dragging.
    pub fn displayed_position(&self) -> f64 {
        match self.drag {
            Some(value) => value / SLIDER_MAX * self.duration_secs,
            None => self.position_secs,
        }
    }

    pub fn position_secs(&self) -> f64 {
        self.position_secs
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f64) -> f64 {
        self.volume = volume.clamp(0.0, 1.0);
        self.volume
    }
}

/// Formats seconds as `m:ss`
pub fn format_time(secs: f64) -> String {
    let total = if secs.is_finite() { secs.max(0.0) as u64 } else { 0 };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Elapsed-time label text, refreshed from the periodic tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeDisplay {
    text: String,
}

impl TimeDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, position: f64) {
        self.text = format_elapsed(position);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Formats seconds as `"<seconds, 2 decimal places> s"`.
pub fn format_elapsed(seconds: f64) -> String {
    // Also folds -0.0 and NaN to zero.
    let seconds = if seconds > 0.0 && seconds.is_finite() {
        seconds
    } else {
        0.0
    };
    format!("{seconds:.2} s")
}

use std::sync::mpsc;
use std::time::Duration;

use crate::error::Result;

/// Sending half of the periodic time channel. Positions are in seconds.
pub type TickSender = mpsc::Sender<f64>;

#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub data: Vec<u8>, // Tightly packed RGBA
    pub width: u32,
    pub height: u32,
    pub timestamp: Option<f64>, // Presentation time in seconds
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    EndOfMedia,
    Error(String),
    DurationChanged(f64),
}

/// Registration handle for a periodic time callback. Dropping it cancels the
/// callback.
pub struct TimeObserver {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimeObserver {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Observer with nothing to release.
    pub fn inert() -> Self {
        Self { cancel: None }
    }
}

impl Drop for TimeObserver {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// The media-playback capability the controller drives.
pub trait MediaBackend {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn seek(&mut self, seconds: f64) -> Result<()>;

    fn position(&self) -> Option<f64>;
    fn duration(&self) -> Option<f64>;
    /// 0.0 while paused.
    fn rate(&self) -> f64;
    fn has_error(&self) -> bool;

    /// Next pending event, if any. Called from the UI thread only.
    fn poll_event(&mut self) -> Option<MediaEvent>;

    /// The newest decoded frame since the last call.
    fn take_frame(&mut self) -> Option<VideoFrame>;

    /// Start sending the playback position to `sink` every `interval`.
    fn observe_time(&self, interval: Duration, sink: TickSender) -> TimeObserver;

    /// Release the decoding pipeline. No events follow.
    fn shutdown(&mut self);
}

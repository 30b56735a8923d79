use crate::error::Result;
use crate::renderer::media_backend::{MediaBackend, VideoFrame};
use crate::types::resource_bundle::BundledResource;

/// PlaybackSession is the live binding between the controller and one media
/// resource. It exists from a successful `start()` until teardown.
pub struct PlaybackSession<B: MediaBackend> {
    resource: BundledResource,
    backend: B,
    reached_end: bool,
}

impl<B: MediaBackend> PlaybackSession<B> {
    pub fn new(resource: BundledResource, backend: B) -> Self {
        PlaybackSession {
            resource,
            backend,
            reached_end: false,
        }
    }

    pub fn resource(&self) -> &BundledResource {
        &self.resource
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Non-zero rate and no pipeline error.
    pub fn is_playing(&self) -> bool {
        self.backend.rate() != 0.0 && !self.backend.has_error()
    }

    pub fn has_error(&self) -> bool {
        self.backend.has_error()
    }

    pub fn reached_end(&self) -> bool {
        self.reached_end
    }

    pub fn play(&mut self) -> Result<()> {
        self.backend.play()
    }

    pub fn pause(&mut self) -> Result<()> {
        self.backend.pause()
    }

    pub fn mark_end(&mut self) {
        self.reached_end = true;
    }

    /// Rewind to zero and clear the end-of-media flag.
    pub fn seek_to_start(&mut self) -> Result<()> {
        self.backend.seek(0.0)?;
        self.reached_end = false;
        Ok(())
    }

    pub fn position(&self) -> f64 {
        self.clamp(self.backend.position().unwrap_or(0.0))
    }

    pub fn duration(&self) -> Option<f64> {
        self.backend.duration()
    }

    /// Clamp a reported position into `[0, duration]`.
    pub fn clamp(&self, position: f64) -> f64 {
        let position = if position.is_finite() {
            position.max(0.0)
        } else {
            0.0
        };
        match self.duration() {
            Some(duration) if duration > 0.0 => position.min(duration),
            _ => position,
        }
    }

    pub fn take_frame(&mut self) -> Option<VideoFrame> {
        self.backend.take_frame()
    }

    pub fn close(mut self) {
        self.backend.shutdown();
    }
}

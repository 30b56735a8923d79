use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use crate::error::{PlayerError, Result};
use crate::renderer::media_backend::{MediaBackend, MediaEvent, TimeObserver, VideoFrame};
use crate::types::config::PlayerConfig;
use crate::types::playback_state::PlaybackState;
use crate::types::resource_bundle::ResourceBundle;
use crate::types::session::PlaybackSession;
use crate::types::time_display::TimeDisplay;

/// Drives one looping playback session and the elapsed-time display.
///
/// All methods run on the UI thread. Backend notifications reach the
/// controller through [`PlaybackController::poll`], which drains the
/// backend's event queue and the tick channel.
pub struct PlaybackController<B: MediaBackend> {
    resource_name: String,
    resource_ext: String,
    tick_interval: Duration,
    state: PlaybackState,
    session: Option<PlaybackSession<B>>,
    time_display: TimeDisplay,
    time_observer: Option<TimeObserver>,
    ticks: Option<Receiver<f64>>,
    loop_count: u64,
}

impl<B: MediaBackend> PlaybackController<B> {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            resource_name: config.resource_name.clone(),
            resource_ext: config.resource_ext.clone(),
            tick_interval: config.tick_interval(),
            state: PlaybackState::Stopped,
            session: None,
            time_display: TimeDisplay::new(),
            time_observer: None,
            ticks: None,
            loop_count: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&PlaybackSession<B>> {
        self.session.as_ref()
    }

    pub fn time_text(&self) -> &str {
        self.time_display.text()
    }

    /// How many times playback wrapped around to the start.
    #[cfg(test)]
    pub fn loop_count(&self) -> u64 {
        self.loop_count
    }

    /// Resolve the bundled resource, open it with `open` and start playing.
    ///
    /// A missing resource is logged and returned; the controller stays
    /// stopped and `open` is never called.
    pub fn start<F>(&mut self, bundle: &ResourceBundle, open: F) -> Result<()>
    where
        F: FnOnce(&Path) -> Result<B>,
    {
        if self.state != PlaybackState::Stopped || self.session.is_some() {
            return Err(PlayerError::InvalidState("start() called twice or after teardown"));
        }

        let file_name = format!("{}.{}", self.resource_name, self.resource_ext);
        let Some(resource) = bundle.path_for_resource(&self.resource_name, &self.resource_ext)
        else {
            log::error!("{file_name} not found");
            log::debug!("searched {:?}", bundle.search_dirs());
            return Err(PlayerError::ResourceNotFound { name: file_name });
        };

        let backend = open(&resource.path).inspect_err(|e| {
            log::error!("failed to open {}: {e}", resource.path.display());
        })?;
        let mut session = PlaybackSession::new(resource, backend);

        let (sender, receiver) = mpsc::channel();
        let observer = session.backend().observe_time(self.tick_interval, sender);

        if let Err(e) = session.play() {
            log::error!("failed to start playback: {e}");
            drop(observer);
            session.close();
            return Err(e);
        }

        log::info!(
            "playing {} from {} ({} bytes)",
            session.resource().file_name,
            session.resource().path.display(),
            session.resource().size
        );
        self.session = Some(session);
        self.time_observer = Some(observer);
        self.ticks = Some(receiver);
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// Rewind to zero and keep playing.
    pub fn on_end_of_media(&mut self) {
        if self.state.is_torn_down() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        log::info!("movie reached end");
        session.mark_end();
        if let Err(e) = session.seek_to_start() {
            log::warn!("rewind failed: {e}");
            return;
        }
        if !session.is_playing() {
            if let Err(e) = session.play() {
                log::warn!("resume after rewind failed: {e}");
                return;
            }
        }
        let position = session.position();
        self.loop_count += 1;
        self.state = PlaybackState::Playing;

        // Anything still queued was sampled before the rewind.
        if let Some(ticks) = self.ticks.as_ref() {
            ticks.try_iter().for_each(drop);
        }
        self.time_display.update(position);
    }

    /// Toggle play/pause. Returns the resulting state.
    pub fn on_tap(&mut self) -> PlaybackState {
        if self.state.is_torn_down() {
            return self.state;
        }
        let Some(session) = self.session.as_mut() else {
            return self.state;
        };

        let (result, next) = if session.is_playing() {
            (session.pause(), PlaybackState::Paused)
        } else {
            // A rewind that failed at end-of-media is retried before resuming.
            let rewound = if session.reached_end() {
                session.seek_to_start()
            } else {
                Ok(())
            };
            (rewound.and_then(|()| session.play()), PlaybackState::Playing)
        };
        match result {
            Ok(()) => self.state = next,
            Err(e) => log::warn!("toggle to {next:?} failed: {e}"),
        }
        self.state
    }

    pub fn on_periodic_tick(&mut self, position: f64) {
        if self.state.is_torn_down() {
            return;
        }
        if let Some(session) = self.session.as_ref() {
            self.time_display.update(session.clamp(position));
        }
    }

    /// Apply pending backend events and ticks. Returns true if anything
    /// changed that needs a repaint.
    pub fn poll(&mut self) -> bool {
        if self.state.is_torn_down() {
            return false;
        }

        let mut events = Vec::new();
        if let Some(session) = self.session.as_mut() {
            while let Some(event) = session.backend_mut().poll_event() {
                events.push(event);
            }
        }
        let changed = !events.is_empty();
        for event in events {
            match event {
                MediaEvent::EndOfMedia => self.on_end_of_media(),
                MediaEvent::Error(message) => log::error!("playback error: {message}"),
                MediaEvent::DurationChanged(duration) => {
                    log::debug!("duration is {duration:.2} s")
                }
            }
        }

        // Only the newest pending position matters for the label.
        let latest = self
            .ticks
            .as_ref()
            .and_then(|ticks| ticks.try_iter().last());
        if let Some(position) = latest {
            self.on_periodic_tick(position);
        }
        changed || latest.is_some()
    }

    pub fn take_frame(&mut self) -> Option<VideoFrame> {
        self.session.as_mut()?.take_frame()
    }

    /// Release the tick subscription and the session. Further callbacks are
    /// ignored.
    pub fn teardown(&mut self) {
        if self.state.is_torn_down() {
            return;
        }
        drop(self.time_observer.take());
        drop(self.ticks.take());
        if let Some(session) = self.session.take() {
            session.close();
        }
        log::debug!("playback controller torn down after {} loops", self.loop_count);
        self.state = PlaybackState::TornDown;
    }
}

impl<B: MediaBackend> Drop for PlaybackController<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::media_backend::scripted::{ScriptHandle, ScriptedBackend};
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        bundle: ResourceBundle,
        handle: ScriptHandle,
        controller: PlaybackController<ScriptedBackend>,
    }

    fn fixture_with_resource(present: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        if present {
            fs::write(dir.path().join("sample.mp4"), b"not really a video").unwrap();
        }
        Fixture {
            bundle: ResourceBundle::new(vec![dir.path().to_path_buf()]),
            _dir: dir,
            handle: ScriptHandle::default(),
            controller: PlaybackController::new(&PlayerConfig::default()),
        }
    }

    fn started() -> Fixture {
        let mut fx = fixture_with_resource(true);
        let backend = fx.handle.backend();
        fx.controller.start(&fx.bundle, |_| Ok(backend)).unwrap();
        fx
    }

    #[test]
    fn starts_stopped_then_plays() {
        let mut fx = fixture_with_resource(true);
        assert_eq!(fx.controller.state(), PlaybackState::Stopped);

        let backend = fx.handle.backend();
        let mut opened = None;
        fx.controller
            .start(&fx.bundle, |path| {
                opened = Some(path.to_path_buf());
                Ok(backend)
            })
            .unwrap();

        assert_eq!(fx.controller.state(), PlaybackState::Playing);
        assert!(opened.unwrap().ends_with("sample.mp4"));
        assert!(fx.handle.with(|s| s.playing));
    }

    #[test]
    fn missing_resource_creates_no_session() {
        let mut fx = fixture_with_resource(false);
        let mut opened = false;
        let err = fx
            .controller
            .start(&fx.bundle, |_| {
                opened = true;
                Ok(fx.handle.backend())
            })
            .unwrap_err();

        assert!(matches!(err, PlayerError::ResourceNotFound { ref name } if name == "sample.mp4"));
        assert_eq!(err.to_string(), "sample.mp4 not found");
        assert!(!opened);
        assert!(fx.controller.session().is_none());
        assert_eq!(fx.controller.state(), PlaybackState::Stopped);

        // Nothing is wired up, so no callback can have any effect.
        assert!(!fx.handle.emit_tick(1.0));
        fx.controller.on_end_of_media();
        assert_eq!(fx.controller.on_tap(), PlaybackState::Stopped);
        assert!(!fx.controller.poll());
        assert!(fx.controller.time_text().is_empty());
        assert_eq!(fx.controller.loop_count(), 0);
    }

    #[test]
    fn backend_open_failure_is_reported() {
        let mut fx = fixture_with_resource(true);
        let err = fx
            .controller
            .start(&fx.bundle, |_| Err(PlayerError::Backend("no decoder".into())))
            .unwrap_err();
        assert!(matches!(err, PlayerError::Backend(_)));
        assert_eq!(fx.controller.state(), PlaybackState::Stopped);
    }

    #[test]
    fn play_failure_releases_backend() {
        let mut fx = fixture_with_resource(true);
        fx.handle.with(|s| s.fail_play = true);
        let backend = fx.handle.backend();
        assert!(fx.controller.start(&fx.bundle, |_| Ok(backend)).is_err());
        assert!(fx.handle.with(|s| s.observer_released && s.shut_down));
        assert!(fx.controller.session().is_none());
    }

    #[test]
    fn second_start_is_rejected() {
        let mut fx = started();
        let backend = fx.handle.backend();
        let err = fx.controller.start(&fx.bundle, |_| Ok(backend)).unwrap_err();
        assert!(matches!(err, PlayerError::InvalidState(_)));
        assert_eq!(fx.controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn taps_alternate_pause_and_play() {
        let mut fx = started();
        let expected = [
            PlaybackState::Paused,
            PlaybackState::Playing,
            PlaybackState::Paused,
            PlaybackState::Playing,
        ];
        for want in expected {
            assert_eq!(fx.controller.on_tap(), want);
            assert_eq!(fx.handle.with(|s| s.playing), want.is_playing());
        }
        assert_eq!(fx.handle.with(|s| (s.pause_calls, s.play_calls)), (2, 3));
    }

    #[test]
    fn tap_with_session_error_plays() {
        let mut fx = started();
        fx.handle.with(|s| s.error = true);
        // Rate is non-zero but the error flag means "not playing".
        assert_eq!(fx.controller.on_tap(), PlaybackState::Playing);
        assert_eq!(fx.handle.with(|s| s.pause_calls), 0);
    }

    #[test]
    fn end_of_media_rewinds_and_keeps_playing() {
        let mut fx = started();
        fx.handle.with(|s| s.position = 12.5);
        fx.handle.push_event(MediaEvent::EndOfMedia);

        assert!(fx.controller.poll());
        assert_eq!(fx.controller.state(), PlaybackState::Playing);
        assert_eq!(fx.handle.with(|s| s.position), 0.0);
        assert!(fx.handle.with(|s| s.playing));
        let session = fx.controller.session().unwrap();
        assert_eq!(session.position(), 0.0);
        assert!(!session.reached_end());
    }

    #[test]
    fn loops_without_bound() {
        let mut fx = started();
        for _ in 0..50 {
            fx.handle.push_event(MediaEvent::EndOfMedia);
            fx.controller.poll();
        }
        assert_eq!(fx.controller.loop_count(), 50);
        assert_eq!(fx.handle.with(|s| s.seeks.len()), 50);
        assert_eq!(fx.controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn end_of_media_resumes_a_stalled_backend() {
        let mut fx = started();
        fx.handle.with(|s| s.playing = false);
        fx.controller.on_end_of_media();
        assert!(fx.handle.with(|s| s.playing));
        assert_eq!(fx.controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn tap_retries_a_failed_rewind() {
        let mut fx = started();
        fx.handle.with(|s| {
            s.fail_seek = true;
            s.position = 20.0;
        });
        fx.controller.on_end_of_media();
        assert!(fx.controller.session().unwrap().reached_end());
        assert_eq!(fx.controller.loop_count(), 0);

        fx.controller.on_tap();
        fx.handle.with(|s| {
            s.fail_seek = false;
            s.playing = false;
        });
        assert_eq!(fx.controller.on_tap(), PlaybackState::Playing);
        assert!(!fx.controller.session().unwrap().reached_end());
        assert_eq!(fx.handle.with(|s| s.position), 0.0);
    }

    #[test]
    fn ticks_format_elapsed_seconds() {
        let mut fx = started();
        for (position, text) in [(0.0, "0.00 s"), (1.23, "1.23 s"), (59.99, "59.99 s")] {
            assert!(fx.handle.emit_tick(position));
            assert!(fx.controller.poll());
            assert_eq!(fx.controller.time_text(), text);
        }
    }

    #[test]
    fn tick_is_clamped_to_duration() {
        let mut fx = started();
        fx.handle.with(|s| s.duration = Some(30.0));
        fx.controller.on_periodic_tick(31.7);
        assert_eq!(fx.controller.time_text(), "30.00 s");
    }

    #[test]
    fn rewind_discards_ticks_from_previous_loop() {
        let mut fx = started();
        fx.handle.emit_tick(12.4);
        fx.handle.push_event(MediaEvent::EndOfMedia);

        assert!(fx.controller.poll());
        assert_eq!(fx.controller.time_text(), "0.00 s");

        fx.handle.emit_tick(0.04);
        fx.controller.poll();
        assert_eq!(fx.controller.time_text(), "0.04 s");
    }

    #[test]
    fn poll_applies_only_latest_tick() {
        let mut fx = started();
        fx.handle.emit_tick(1.0);
        fx.handle.emit_tick(2.0);
        fx.handle.emit_tick(3.5);
        fx.controller.poll();
        assert_eq!(fx.controller.time_text(), "3.50 s");
        assert!(!fx.controller.poll());
    }

    #[test]
    fn errors_are_logged_not_fatal() {
        let mut fx = started();
        fx.handle.with(|s| s.error = true);
        fx.handle.push_event(MediaEvent::Error("decode failed".into()));
        assert!(fx.controller.poll());
        assert_eq!(fx.controller.state(), PlaybackState::Playing);
        assert!(fx.controller.session().unwrap().has_error());
    }

    #[test]
    fn teardown_stops_tick_updates() {
        let mut fx = started();
        fx.handle.emit_tick(4.2);
        fx.controller.poll();
        assert_eq!(fx.controller.time_text(), "4.20 s");

        fx.controller.teardown();
        assert_eq!(fx.controller.state(), PlaybackState::TornDown);
        assert!(fx.handle.with(|s| s.observer_released && s.shut_down));

        // The framework may still fire; the update must not land.
        assert!(!fx.handle.emit_tick(9.9));
        fx.controller.on_periodic_tick(9.9);
        fx.controller.poll();
        assert_eq!(fx.controller.time_text(), "4.20 s");
    }

    #[test]
    fn teardown_is_terminal_and_idempotent() {
        let mut fx = started();
        fx.controller.teardown();
        fx.controller.teardown();
        assert_eq!(fx.controller.on_tap(), PlaybackState::TornDown);
        fx.controller.on_end_of_media();
        assert_eq!(fx.controller.loop_count(), 0);

        let backend = fx.handle.backend();
        assert!(matches!(
            fx.controller.start(&fx.bundle, |_| Ok(backend)),
            Err(PlayerError::InvalidState(_))
        ));
    }

    #[test]
    fn drop_releases_subscription() {
        let fx = started();
        let handle = fx.handle.clone();
        drop(fx);
        assert!(handle.with(|s| s.observer_released && s.shut_down));
    }

    #[test]
    fn take_frame_returns_newest() {
        let mut fx = started();
        fx.handle.with(|s| {
            for ts in [0.0, 0.04] {
                s.frames.push_back(VideoFrame {
                    data: vec![0; 4],
                    width: 1,
                    height: 1,
                    timestamp: Some(ts),
                });
            }
        });
        let frame = fx.controller.take_frame().unwrap();
        assert_eq!(frame.timestamp, Some(0.04));
        assert!(fx.controller.take_frame().is_none());
    }
}

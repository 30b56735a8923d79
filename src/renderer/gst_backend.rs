use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_pbutils as gst_pbutils;
use gstreamer_video as gst_video;

use crate::error::{PlayerError, Result};
use crate::renderer::media_backend::{
    MediaBackend, MediaEvent, TickSender, TimeObserver, VideoFrame,
};

/// Called from streaming threads whenever new output is ready.
pub type RepaintHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub struct GstOptions {
    pub muted: bool,
    pub repaint: Option<RepaintHook>,
}

type FrameSlot = Arc<Mutex<Option<VideoFrame>>>;

/// `playbin` playing one local file into an RGBA appsink.
pub struct GstBackend {
    pipeline: gst::Element,
    bus: gst::Bus,
    frame_slot: FrameSlot,
    repaint: Option<RepaintHook>,
    uri: String,
    playing: bool,
    error: bool,
    duration: Option<f64>,
    duration_probed: bool,
}

impl GstBackend {
    pub fn open(path: &Path, options: GstOptions) -> Result<Self> {
        gst::init()?;

        let uri = gst::glib::filename_to_uri(path, None)?;

        let video_sink = gst::parse::bin_from_description(
            "videoconvert ! videoscale ! appsink name=sink",
            true,
        )?;
        let appsink = video_sink
            .by_name("sink")
            .and_then(|sink| sink.downcast::<gst_app::AppSink>().ok())
            .ok_or_else(|| PlayerError::Backend("video sink has no appsink".to_string()))?;

        appsink.set_caps(Some(
            &gst_video::VideoCapsBuilder::new()
                .format(gst_video::VideoFormat::Rgba)
                .build(),
        ));
        appsink.set_max_buffers(1);
        appsink.set_drop(true);

        let frame_slot: FrameSlot = Arc::new(Mutex::new(None));
        let slot = frame_slot.clone();
        let repaint = options.repaint.clone();
        appsink.set_callbacks(
            gst_app::AppSinkCallbacks::builder()
                .new_sample(move |sink| {
                    let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    if let Some(frame) = frame_from_sample(&sample) {
                        if let Ok(mut latest) = slot.lock() {
                            *latest = Some(frame);
                        }
                        if let Some(repaint) = &repaint {
                            repaint();
                        }
                    }
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );

        let pipeline = gst::ElementFactory::make("playbin")
            .property("uri", uri.as_str())
            .property("video-sink", &video_sink)
            .property("mute", options.muted)
            .build()?;
        let bus = pipeline
            .bus()
            .ok_or_else(|| PlayerError::Backend("playbin has no bus".to_string()))?;

        // Paused prerolls the first frame so the window has something to show.
        pipeline.set_state(gst::State::Paused)?;

        log::debug!("opened {}", uri);

        Ok(GstBackend {
            pipeline,
            bus,
            frame_slot,
            repaint: options.repaint,
            uri: uri.to_string(),
            playing: false,
            error: false,
            duration: None,
            duration_probed: false,
        })
    }

    fn query_duration(&self) -> Option<f64> {
        self.pipeline
            .query_duration::<gst::ClockTime>()
            .map(clock_to_seconds)
    }

    /// After preroll, take the pipeline's duration, or fall back to the
    /// discoverer once if the pipeline has none.
    fn resolve_duration(&mut self) -> Option<f64> {
        if self.duration.is_some() || self.duration_probed {
            return None;
        }
        let duration = self.query_duration().or_else(|| {
            self.duration_probed = true;
            probe_duration(&self.uri)
        });
        self.duration = duration;
        duration
    }
}

impl MediaBackend for GstBackend {
    fn play(&mut self) -> Result<()> {
        self.pipeline.set_state(gst::State::Playing)?;
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.pipeline.set_state(gst::State::Paused)?;
        self.playing = false;
        Ok(())
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        let target = gst::ClockTime::from_nseconds((seconds.max(0.0) * 1_000_000_000.0) as u64);
        // A flushing seek out of EOS restarts data flow while the pipeline
        // stays in PLAYING.
        self.pipeline
            .seek_simple(gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT, target)?;
        Ok(())
    }

    fn position(&self) -> Option<f64> {
        self.pipeline
            .query_position::<gst::ClockTime>()
            .map(clock_to_seconds)
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn rate(&self) -> f64 {
        if self.playing { 1.0 } else { 0.0 }
    }

    fn has_error(&self) -> bool {
        self.error
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        while let Some(msg) = self.bus.pop() {
            match msg.view() {
                gst::MessageView::Eos(_) => return Some(MediaEvent::EndOfMedia),
                gst::MessageView::Error(err) => {
                    self.error = true;
                    return Some(MediaEvent::Error(format!(
                        "{} (debug: {:?})",
                        err.error(),
                        err.debug()
                    )));
                }
                gst::MessageView::Warning(warn) => {
                    log::warn!("pipeline warning: {}", warn.error());
                }
                gst::MessageView::AsyncDone(_) => {
                    if let Some(duration) = self.resolve_duration() {
                        return Some(MediaEvent::DurationChanged(duration));
                    }
                }
                gst::MessageView::DurationChanged(_) => {
                    if let Some(duration) = self.query_duration() {
                        self.duration = Some(duration);
                        return Some(MediaEvent::DurationChanged(duration));
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn take_frame(&mut self) -> Option<VideoFrame> {
        self.frame_slot.lock().ok()?.take()
    }

    fn observe_time(&self, interval: Duration, sink: TickSender) -> TimeObserver {
        let stop = Arc::new(AtomicBool::new(false));
        let stopped = stop.clone();
        let pipeline = self.pipeline.downgrade();
        let repaint = self.repaint.clone();

        let spawned = thread::Builder::new()
            .name("loopview-tick".to_string())
            .spawn(move || {
                let mut last_sent = None;
                while !stopped.load(Ordering::Acquire) {
                    thread::sleep(interval);
                    let Some(pipeline) = pipeline.upgrade() else {
                        break;
                    };
                    let position = pipeline.query_position::<gst::ClockTime>();
                    if !should_emit_tick(pipeline.current_state(), last_sent, position) {
                        continue;
                    }
                    last_sent = position;
                    let Some(position) = position else {
                        continue;
                    };
                    if sink.send(clock_to_seconds(position)).is_err() {
                        break;
                    }
                    if let Some(repaint) = &repaint {
                        repaint();
                    }
                }
            });

        match spawned {
            Ok(handle) => TimeObserver::new(move || {
                stop.store(true, Ordering::Release);
                if handle.join().is_err() {
                    log::warn!("tick thread panicked");
                }
            }),
            Err(e) => {
                log::error!("failed to start tick thread: {e}");
                TimeObserver::inert()
            }
        }
    }

    fn shutdown(&mut self) {
        self.playing = false;
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            log::warn!("failed to stop pipeline: {e}");
        }
    }
}

impl Drop for GstBackend {
    fn drop(&mut self) {
        self.pipeline.set_state(gst::State::Null).ok();
    }
}

/// Ticks go out only while playing and only when the position moved, so a
/// paused window is not woken every interval.
fn should_emit_tick(
    state: gst::State,
    last_sent: Option<gst::ClockTime>,
    position: Option<gst::ClockTime>,
) -> bool {
    state == gst::State::Playing && position.is_some() && position != last_sent
}

fn clock_to_seconds(time: gst::ClockTime) -> f64 {
    time.nseconds() as f64 / 1_000_000_000.0
}

/// Container-level duration via the discoverer, for files whose pipeline has
/// not reported one yet.
fn probe_duration(uri: &str) -> Option<f64> {
    let discoverer = gst_pbutils::Discoverer::new(gst::ClockTime::from_seconds(5)).ok()?;
    let info = discoverer.discover_uri(uri).ok()?;
    info.duration().map(clock_to_seconds)
}

/// Copy an RGBA sample into a tightly packed frame, dropping row padding.
fn frame_from_sample(sample: &gst::Sample) -> Option<VideoFrame> {
    let caps = sample.caps()?;
    let info = gst_video::VideoInfo::from_caps(caps).ok()?;
    let buffer = sample.buffer()?;
    let map = buffer.map_readable().ok()?;

    let width = info.width();
    let height = info.height();
    let stride = usize::try_from(*info.stride().first()?).ok()?;
    let data = pack_rows(map.as_slice(), width as usize * 4, stride, height as usize)?;

    Some(VideoFrame {
        data,
        width,
        height,
        timestamp: buffer.pts().map(clock_to_seconds),
    })
}

fn pack_rows(src: &[u8], row_bytes: usize, stride: usize, rows: usize) -> Option<Vec<u8>> {
    if stride < row_bytes || src.len() < stride * rows.saturating_sub(1) + row_bytes {
        return None;
    }
    if stride == row_bytes {
        return Some(src[..row_bytes * rows].to_vec());
    }
    let mut data = Vec::with_capacity(row_bytes * rows);
    for row in src.chunks(stride).take(rows) {
        data.extend_from_slice(&row[..row_bytes]);
    }
    Some(data)
}

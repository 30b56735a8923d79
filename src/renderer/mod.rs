pub mod gst_backend;
pub mod media_backend;
pub mod playback_controller;

pub mod config;
pub mod playback_state;
pub mod resource_bundle;
pub mod session;
pub mod time_display;

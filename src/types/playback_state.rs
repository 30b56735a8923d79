/// Lifecycle of the playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No session yet, or the resource could not be opened.
    #[default]
    Stopped,
    Playing,
    Paused,
    /// Terminal: the tick subscription is released and no callbacks apply.
    TornDown,
}

impl PlaybackState {
    pub fn is_playing(self) -> bool {
        self == PlaybackState::Playing
    }

    pub fn has_session(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }

    pub fn is_torn_down(self) -> bool {
        self == PlaybackState::TornDown
    }
}

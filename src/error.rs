use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum NudgeError {
    #[error("Invalid interval format: '{0}'")]
    InvalidInterval(String),

    #[error("Interval must be greater than zero")]
    ZeroInterval,

    #[error("Interval must be at least {min_secs} seconds")]
    IntervalTooShort { min_secs: u64 },

    #[error("Task cannot be empty")]
    EmptyTask,

    #[error("failed to send notification: {0}")]
    Notification(#[from] notify_rust::error::Error),

    /// Sound file configured but absent on disk.
    #[error("sound file not found at {}", .0.display())]
    SoundFileMissing(PathBuf),

    #[error("'{player}' not found, cannot play sound{hint}")]
    PlayerNotFound { player: &'static str, hint: &'static str },

    #[error("'{player}' failed to play sound: {stderr}")]
    PlayerFailed { player: &'static str, stderr: String },

    #[error("sound playback is not supported on {0}")]
    UnsupportedPlatform(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NudgeError>;

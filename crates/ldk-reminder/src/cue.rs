use std::path::PathBuf;

use ldk_config::{SoundMode, SoundSettings};

use crate::NotificationCue;

/// Sound cue for a due reminder. A configured file that does not exist
/// degrades to a plain beep.
pub fn notification_cue(sound: &SoundSettings) -> NotificationCue {
    if !sound.enabled {
        return NotificationCue::Beep;
    }
    match sound.mode {
        SoundMode::Alias => {
            let alias = sound.alias.trim();
            if alias.is_empty() {
                NotificationCue::Beep
            } else {
                NotificationCue::Alias(alias.to_string())
            }
        }
        SoundMode::File => {
            let path = PathBuf::from(sound.file.trim());
            if !sound.file.trim().is_empty() && path.is_file() {
                NotificationCue::File(path)
            } else {
                tracing::warn!(file = %sound.file, "sound file unavailable; falling back to beep");
                NotificationCue::Beep
            }
        }
    }
}

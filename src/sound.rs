use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{NudgeError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sound {
    Off,
    /// Terminal bell.
    Bell,
    File(PathBuf),
}

impl Sound {
    pub fn from_setting(setting: &str) -> Self {
        match setting.trim() {
            "" | "off" | "none" => Sound::Off,
            "bell" => Sound::Bell,
            path => Sound::File(PathBuf::from(path)),
        }
    }

    pub fn play(&self) -> Result<()> {
        match self {
            Sound::Off => Ok(()),
            Sound::Bell => {
                let mut stdout = std::io::stdout();
                stdout.write_all(b"\x07")?;
                stdout.flush()?;
                Ok(())
            }
            Sound::File(path) => play_file(path),
        }
    }
}

#[cfg(target_os = "linux")]
const PLAYER: Option<&str> = Some("aplay");
#[cfg(target_os = "macos")]
const PLAYER: Option<&str> = Some("afplay");
#[cfg(target_os = "windows")]
const PLAYER: Option<&str> = Some("powershell");
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const PLAYER: Option<&str> = None;

fn player_command(player: &str, path: &Path) -> Command {
    let mut cmd = Command::new(player);
    if player == "powershell" {
        let escaped = path.display().to_string().replace('\'', "''");
        cmd.arg("-command")
            .arg(format!("(New-Object Media.SoundPlayer '{escaped}').PlaySync();"));
    } else {
        cmd.arg(path);
    }
    cmd
}

fn install_hint(player: &str) -> &'static str {
    match player {
        "aplay" => " (install alsa-utils)",
        _ => "",
    }
}

/// Plays a WAV file with the platform's stock player. Blocks until playback ends.
pub fn play_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(NudgeError::SoundFileMissing(path.to_path_buf()));
    }
    let player = PLAYER.ok_or(NudgeError::UnsupportedPlatform(std::env::consts::OS))?;
    run_player(player, path)
}

fn run_player(player: &'static str, path: &Path) -> Result<()> {
    let output = match player_command(player, path).output() {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(NudgeError::PlayerNotFound {
                player,
                hint: install_hint(player),
            });
        }
        Err(e) => return Err(e.into()),
    };
    if !output.status.success() {
        return Err(NudgeError::PlayerFailed {
            player,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

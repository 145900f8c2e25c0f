use std::fmt;
use std::str::FromStr;

use crate::errors::RespawnError;

/// Control command carried on the command queue.
///
/// The numeric codes (`STARTUP = 0` .. `STOP = 4`) are stable and are what
/// [`Command::try_from`] accepts for raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    Startup = 0,
    Pause = 1,
    Resume = 2,
    Reload = 3,
    Stop = 4,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Startup => "startup",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Reload => "reload",
            Command::Stop => "stop",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Command {
    type Error = RespawnError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Command::Startup),
            1 => Ok(Command::Pause),
            2 => Ok(Command::Resume),
            3 => Ok(Command::Reload),
            4 => Ok(Command::Stop),
            other => Err(RespawnError::UnknownCommand(format!("code {other}"))),
        }
    }
}

impl FromStr for Command {
    type Err = RespawnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "startup" | "start" => Ok(Command::Startup),
            "pause" => Ok(Command::Pause),
            "resume" => Ok(Command::Resume),
            "reload" => Ok(Command::Reload),
            "stop" => Ok(Command::Stop),
            other => Err(RespawnError::UnknownCommand(other.to_string())),
        }
    }
}

/// Kind of a filesystem change.
///
/// Declaration order is the log label order: added, modified, deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl ChangeKind {
    const LABELS: [&'static str; 3] = ["added", "modified", "deleted"];

    pub fn label(self) -> &'static str {
        Self::LABELS[self as usize]
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_codes_follow_declaration_order() {
        for (code, expected) in [
            Command::Startup,
            Command::Pause,
            Command::Resume,
            Command::Reload,
            Command::Stop,
        ]
        .into_iter()
        .enumerate()
        {
            assert_eq!(Command::try_from(code as u8).unwrap(), expected);
            assert_eq!(expected as u8, code as u8);
        }
    }

    #[test]
    fn out_of_range_code_is_rejected() {
        let err = Command::try_from(5).unwrap_err();
        assert!(matches!(err, RespawnError::UnknownCommand(_)));
    }

    #[test]
    fn commands_parse_from_names() {
        assert_eq!("  Reload\n".parse::<Command>().unwrap(), Command::Reload);
        assert_eq!("stop".parse::<Command>().unwrap(), Command::Stop);
        assert!("restart".parse::<Command>().is_err());
    }

    #[test]
    fn change_kind_labels() {
        assert_eq!(ChangeKind::Added.label(), "added");
        assert_eq!(ChangeKind::Modified.label(), "modified");
        assert_eq!(ChangeKind::Deleted.to_string(), "deleted");
    }
}

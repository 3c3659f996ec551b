//! Interactive commands read from stdin.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),

    #[error("Invalid argument for '{command}': {value}")]
    InvalidArgument { command: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Toggle,
    Back,
    Forward,
    Seek(f64),
    /// Click on the line with this index
    Line(usize),
    Volume(u8),
    Set { key: String, value: String },
    Resize { width: f64, height: f64 },
    Hover(bool),
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  play | pause | toggle     toggle playback
  back                      seek to start and scroll to top
  forward                   seek to end
  seek <secs>               seek to a position
  line <index>              click a lyric line
  volume <0-100>            set the volume
  set <key> <value>         change a setting (e.g. set theme dark)
  resize <width> <height>   resize the viewport
  hover on|off              hover the lyric panel
  show                      print the visible lines
  quit                      exit";

impl Command {
    /// Parse one input line. Returns `Ok(None)` for blank lines.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when the command or its arguments are not
    /// understood.
    pub fn parse(input: &str) -> Result<Option<Self>, CommandError> {
        let mut words = input.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };

        let command = match name {
            "play" | "pause" | "toggle" => Self::Toggle,
            "back" => Self::Back,
            "forward" => Self::Forward,
            "seek" => Self::Seek(number(words.next(), "seek")?),
            "line" => Self::Line(number(words.next(), "line")?),
            "volume" => Self::Volume(number(words.next(), "volume")?),
            "set" => {
                let key = words.next().ok_or(CommandError::MissingArgument("set"))?;
                let value = words.collect::<Vec<_>>().join(" ");
                if value.is_empty() {
                    return Err(CommandError::MissingArgument("set"));
                }
                Self::Set {
                    key: key.to_string(),
                    value,
                }
            }
            "resize" => Self::Resize {
                width: number(words.next(), "resize")?,
                height: number(words.next(), "resize")?,
            },
            "hover" => match words.next() {
                Some("on") => Self::Hover(true),
                Some("off") => Self::Hover(false),
                Some(other) => {
                    return Err(CommandError::InvalidArgument {
                        command: "hover",
                        value: other.to_string(),
                    })
                }
                None => return Err(CommandError::MissingArgument("hover")),
            },
            "show" => Self::Show,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn number<T: std::str::FromStr>(word: Option<&str>, command: &'static str) -> Result<T, CommandError> {
    let word = word.ok_or(CommandError::MissingArgument(command))?;
    word.parse().map_err(|_| CommandError::InvalidArgument {
        command,
        value: word.to_string(),
    })
}

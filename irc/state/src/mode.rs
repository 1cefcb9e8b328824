use crate::channel::Channel;
use crate::isupport::ModeClass;
use crate::server::ServerInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Add(char, Option<String>),
    Remove(char, Option<String>),
}

impl Mode {
    pub fn value(&self) -> char {
        match self {
            Mode::Add(value, _) | Mode::Remove(value, _) => *value,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Mode::Add(_, _) => Operation::Add,
            Mode::Remove(_, _) => Operation::Remove,
        }
    }

    pub fn arg(&self) -> Option<&str> {
        match self {
            Mode::Add(_, arg) | Mode::Remove(_, arg) => arg.as_deref(),
        }
    }

    /// The same change in the opposite direction.
    pub fn inverse(&self) -> Self {
        match self {
            Mode::Add(value, arg) => Mode::Remove(*value, arg.clone()),
            Mode::Remove(value, arg) => Mode::Add(*value, arg.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Remove,
}

/// Parses a mode string and its parameters against the server's mode classes.
///
/// The whole string is rejected on an unknown letter or when the parameters
/// don't line up with the letters that consume them.
pub fn parse(encoded: &str, args: &[String], server: &ServerInfo) -> Result<Vec<Mode>, String> {
    let mut args = args.iter();
    let mut parsed = vec![];
    let mut adding = true;

    for c in encoded.chars() {
        match c {
            '+' => adding = true,
            '-' => adding = false,
            _ => {
                let class = server
                    .mode_class(c)
                    .ok_or_else(|| format!("unknown mode letter '{c}'"))?;

                let arg = if class.takes_arg(adding) {
                    let arg = args
                        .next()
                        .ok_or_else(|| format!("missing parameter for mode '{c}'"))?;
                    Some(arg.clone())
                } else {
                    None
                };

                parsed.push(if adding {
                    Mode::Add(c, arg)
                } else {
                    Mode::Remove(c, arg)
                });
            }
        }
    }

    if let Some(arg) = args.next() {
        return Err(format!("unexpected mode parameter '{arg}'"));
    }

    Ok(parsed)
}

/// Applies parsed modes left to right. List modes are not retained.
pub fn apply(channel: &mut Channel, modes: &[Mode], server: &ServerInfo) {
    for mode in modes {
        let letter = mode.value();

        match server.mode_class(letter) {
            Some(ModeClass::Prefix) => {
                let (Some(user_mode), Some(nick)) =
                    (server.user_mode_for_letter(letter), mode.arg())
                else {
                    continue;
                };
                let key = server.casemap.fold(nick);

                let applied = match mode.operation() {
                    Operation::Add => channel.add_user_mode(&key, user_mode),
                    Operation::Remove => channel.remove_user_mode(&key, user_mode),
                };

                if !applied {
                    log::debug!("{nick} is not a member of {}", channel.name());
                }
            }
            Some(ModeClass::Always | ModeClass::Set | ModeClass::Flag) => match mode {
                Mode::Add(_, arg) => channel.set_mode(letter, arg.clone()),
                Mode::Remove(_, _) => channel.unset_mode(letter),
            },
            Some(ModeClass::List) | None => {}
        }
    }
}

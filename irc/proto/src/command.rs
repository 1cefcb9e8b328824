use std::fmt;

/// The key a line is dispatched on: a three digit numeric or a command word.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    Numeric(u16),
    Verb(String),
}

impl Command {
    pub fn new(tag: &str) -> Self {
        if tag.len() == 3 {
            if let Ok(code) = tag.parse::<u16>() {
                return Command::Numeric(code);
            }
        }

        Command::Verb(tag.to_uppercase())
    }

    pub fn numeric(&self) -> Option<Numeric> {
        match self {
            Command::Numeric(code) => Numeric::try_from(*code).ok(),
            Command::Verb(_) => None,
        }
    }
}

impl From<Numeric> for Command {
    fn from(numeric: Numeric) -> Self {
        Command::Numeric(numeric as u16)
    }
}

impl From<&str> for Command {
    fn from(tag: &str) -> Self {
        Command::new(tag)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Numeric(code) => write!(f, "{code:03}"),
            Command::Verb(verb) => write!(f, "{verb}"),
        }
    }
}

macro_rules! numerics {
    ($($name:ident = $code:literal,)+) => {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum Numeric {
            $($name = $code,)+
        }

        impl TryFrom<u16> for Numeric {
            type Error = ();

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $($code => Ok(Numeric::$name),)+
                    _ => Err(()),
                }
            }
        }
    };
}

numerics! {
    RPL_WELCOME = 1,
    RPL_MYINFO = 4,
    RPL_ISUPPORT = 5,
    RPL_ENDOFWHO = 315,
    RPL_CHANNELMODEIS = 324,
    RPL_NOTOPIC = 331,
    RPL_TOPIC = 332,
    RPL_TOPICWHOTIME = 333,
    RPL_WHOREPLY = 352,
    RPL_NAMREPLY = 353,
    RPL_WHOSPCRPL = 354,
    RPL_ENDOFNAMES = 366,
    RPL_MOTD = 372,
    RPL_MOTDSTART = 375,
    RPL_ENDOFMOTD = 376,
    ERR_NOMOTD = 422,
    ERR_NONICKNAMEGIVEN = 431,
    ERR_ERRONEUSNICKNAME = 432,
    ERR_NICKNAMEINUSE = 433,
    RPL_KNOCK = 710,
}

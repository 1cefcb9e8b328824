use std::fmt;

pub use self::command::{Command, Numeric};

pub mod command;
pub mod format;
pub mod parse;

/// A single tokenized IRC line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub tags: Vec<Tag>,
    pub source: Option<Source>,
    pub command: Command,
    /// Positional parameters, the trailing parameter already unsplit.
    pub params: Vec<String>,
    /// The original line without its CR-LF terminator.
    pub raw: String,
}

impl Message {
    pub fn new(command: Command, params: Vec<String>) -> Self {
        let mut message = Self {
            tags: vec![],
            source: None,
            command,
            params,
            raw: String::new(),
        };
        message.raw = format::line(&message);

        message
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    pub fn user(&self) -> Option<&User> {
        match &self.source {
            Some(Source::User(user)) => Some(user),
            Some(Source::Server(_)) | None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Server(String),
    User(User),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub nickname: String,
    pub username: Option<String>,
    pub hostname: Option<String>,
}

impl User {
    /// Splits a `nick!user@host` mask. Missing parts are left empty.
    pub fn from_mask(mask: &str) -> Self {
        let (rest, hostname) = match mask.split_once('@') {
            Some((rest, host)) => (rest, Some(host.to_string())),
            None => (mask, None),
        };
        let (nickname, username) = match rest.split_once('!') {
            Some((nick, user)) => (nick, Some(user.to_string())),
            None => (rest, None),
        };

        Self {
            nickname: nickname.to_string(),
            username,
            hostname,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nick = &self.nickname;

        match (&self.username, &self.hostname) {
            (None, None) => write!(f, "{nick}"),
            (None, Some(host)) => write!(f, "{nick}@{host}"),
            (Some(user), None) => write!(f, "{nick}!{user}"),
            (Some(user), Some(host)) => write!(f, "{nick}!{user}@{host}"),
        }
    }
}

pub fn command(command: &str, parameters: Vec<String>) -> Message {
    Message::new(Command::new(command), parameters)
}

#[macro_export]
macro_rules! command {
    ($c:expr) => (
        $crate::command($c, vec![])
    );
    ($c:expr, $($p:expr),+ $(,)?) => (
        $crate::command($c, vec![$($p.into(),)*])
    );
}

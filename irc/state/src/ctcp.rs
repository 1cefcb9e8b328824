use chrono::Utc;

use crate::config;

// Reference: https://rawgit.com/DanielOaks/irc-rfcs/master/dist/draft-oakley-irc-ctcp-latest.html

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action,
    ClientInfo,
    Finger,
    Ping,
    Source,
    Time,
    Version,
    Unknown(String),
}

impl From<&str> for Command {
    fn from(command: &str) -> Self {
        match command.to_uppercase().as_ref() {
            "ACTION" => Command::Action,
            "CLIENTINFO" => Command::ClientInfo,
            "FINGER" => Command::Finger,
            "PING" => Command::Ping,
            "SOURCE" => Command::Source,
            "TIME" => Command::Time,
            "VERSION" => Command::Version,
            _ => Command::Unknown(command.to_string()),
        }
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        match self {
            Command::Action => "ACTION",
            Command::ClientInfo => "CLIENTINFO",
            Command::Finger => "FINGER",
            Command::Ping => "PING",
            Command::Source => "SOURCE",
            Command::Time => "TIME",
            Command::Version => "VERSION",
            Command::Unknown(command) => command.as_ref(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Query<'a> {
    pub command: Command,
    pub params: Option<&'a str>,
    /// The text between the control codes, as sent.
    pub text: &'a str,
}

pub fn is_query(text: &str) -> bool {
    text.starts_with('\u{1}')
}

pub fn parse_query(text: &str) -> Option<Query<'_>> {
    let query = text
        .strip_suffix('\u{1}')
        .unwrap_or(text)
        .strip_prefix('\u{1}')?;

    let (command, params) = match query.split_once(char::is_whitespace) {
        Some((command, params)) => (command, Some(params)),
        None => (query, None),
    };

    Some(Query {
        command: Command::from(command),
        params,
        text: query,
    })
}

/// The reply sent when nobody overrides it, without the wrapping control codes.
///
/// Only the bare, uppercase queries are answered. A PING is echoed back as sent.
pub fn default_reply(query: &Query<'_>, config: &config::Ctcp) -> Option<String> {
    match query.text {
        "VERSION" => Some(format!("VERSION {}", config.version)),
        "FINGER" => Some(format!("FINGER {}", config.finger)),
        "TIME" => Some(format!("TIME {}", Utc::now().to_rfc2822())),
        text if text.starts_with("PING ") => Some(text.to_string()),
        _ => None,
    }
}

/// A `NOTICE` carrying a reply, `reply` being the unwrapped text.
pub fn response_message(target: &str, reply: &str) -> proto::Message {
    proto::command!("NOTICE", target, format!("\u{1}{reply}\u{1}"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse() {
        let tests = [
            (
                "\u{1}VERSION\u{1}",
                Query {
                    command: Command::Version,
                    params: None,
                    text: "VERSION",
                },
            ),
            (
                "\u{1}ping 1700000000\u{1}",
                Query {
                    command: Command::Ping,
                    params: Some("1700000000"),
                    text: "ping 1700000000",
                },
            ),
            (
                "\u{1}ACTION waves hello",
                Query {
                    command: Command::Action,
                    params: Some("waves hello"),
                    text: "ACTION waves hello",
                },
            ),
        ];

        for (text, expected) in tests {
            assert!(is_query(text));
            assert_eq!(parse_query(text), Some(expected));
        }

        assert!(!is_query("hello"));
        assert_eq!(parse_query("hello"), None);
    }

    #[test]
    fn default_replies() {
        let config = config::Ctcp {
            version: "test 1.0".into(),
            finger: "nobody".into(),
        };
        let reply = |text: &str| parse_query(text).and_then(|query| default_reply(&query, &config));

        assert_eq!(reply("\u{1}VERSION\u{1}").as_deref(), Some("VERSION test 1.0"));
        assert_eq!(reply("\u{1}FINGER\u{1}").as_deref(), Some("FINGER nobody"));
        assert_eq!(reply("\u{1}PING 123\u{1}").as_deref(), Some("PING 123"));
        assert!(reply("\u{1}TIME\u{1}").is_some_and(|reply| reply.starts_with("TIME ")));
        assert_eq!(reply("\u{1}PING\u{1}"), None);
        assert_eq!(reply("\u{1}PING lowercase ping\u{1}").as_deref(), Some("PING lowercase ping"));
        assert_eq!(reply("\u{1}ping 123\u{1}"), None);
        assert_eq!(reply("\u{1}VERSION please\u{1}"), None);
        assert_eq!(reply("\u{1}version\u{1}"), None);
        assert_eq!(reply("\u{1}ACTION waves\u{1}"), None);
        assert_eq!(reply("\u{1}FOO\u{1}"), None);
    }

    #[test]
    fn response() {
        assert_eq!(
            proto::format::message(&response_message("dan", "PING 123")),
            "NOTICE dan :\u{1}PING 123\u{1}\r\n"
        );
    }
}

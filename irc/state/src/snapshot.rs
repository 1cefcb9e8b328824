//! Immutable copies of live registry state.
//!
//! A snapshot is taken at one instant and never changes afterwards. Consumers
//! that want fresh data ask the client for a new one.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};

use crate::channel::Topic;
use crate::isupport::ChannelUserMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub(crate) nick: String,
    pub(crate) ident: Option<String>,
    pub(crate) host: Option<String>,
    pub(crate) account: Option<String>,
    pub(crate) real_name: Option<String>,
    pub(crate) away: bool,
    pub(crate) server: Option<String>,
    pub(crate) captured: DateTime<Utc>,
}

impl User {
    /// A snapshot of someone the registry doesn't track, built from their mask alone.
    pub fn transient(mask: &proto::User) -> Self {
        Self {
            nick: mask.nickname.clone(),
            ident: mask.username.clone(),
            host: mask.hostname.clone(),
            account: None,
            real_name: None,
            away: false,
            server: None,
            captured: Utc::now(),
        }
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn ident(&self) -> Option<&str> {
        self.ident.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn real_name(&self) -> Option<&str> {
        self.real_name.as_deref()
    }

    pub fn is_away(&self) -> bool {
        self.away
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn captured(&self) -> DateTime<Utc> {
        self.captured
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nick = &self.nick;

        match (&self.ident, &self.host) {
            (Some(ident), Some(host)) => write!(f, "{nick}!{ident}@{host}"),
            (None, Some(host)) => write!(f, "{nick}@{host}"),
            (Some(ident), None) => write!(f, "{nick}!{ident}"),
            (None, None) => write!(f, "{nick}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub(crate) user: User,
    pub(crate) modes: BTreeSet<ChannelUserMode>,
}

impl Member {
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Empty for a plain member.
    pub fn modes(&self) -> &BTreeSet<ChannelUserMode> {
        &self.modes
    }

    pub fn has_mode(&self, letter: char) -> bool {
        self.modes.iter().any(|mode| mode.mode == letter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub(crate) name: String,
    pub(crate) topic: Option<Topic>,
    pub(crate) members: Vec<Member>,
    pub(crate) modes: BTreeMap<char, Option<String>>,
    pub(crate) list_received: bool,
    pub(crate) captured: DateTime<Utc>,
}

impl Channel {
    /// A snapshot of a channel the client is not in.
    pub fn transient(name: &str) -> Self {
        Self {
            name: name.to_string(),
            topic: None,
            members: vec![],
            modes: BTreeMap::new(),
            list_received: false,
            captured: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Looks up a member by nick, ASCII case-insensitively.
    pub fn member(&self, nick: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|member| member.user.nick.eq_ignore_ascii_case(nick))
    }

    pub fn modes(&self) -> &BTreeMap<char, Option<String>> {
        &self.modes
    }

    pub fn list_received(&self) -> bool {
        self.list_received
    }

    pub fn captured(&self) -> DateTime<Utc> {
        self.captured
    }
}

/// The source of an action, a user or a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    User(User),
    Server(String),
}

impl Actor {
    pub fn name(&self) -> &str {
        match self {
            Actor::User(user) => user.nick(),
            Actor::Server(server) => server,
        }
    }
}

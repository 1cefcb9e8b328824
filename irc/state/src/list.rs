//! Decoding of multi-line list replies: WHO, WHOX, NAMES and the MOTD.
use std::collections::BTreeSet;

use crate::isupport::ChannelUserMode;
use crate::server::ServerInfo;

/// The fields requested with WHOX: channel, user, host, server, nick, flags, account, realname.
pub const WHOX_FIELDS: &str = "%cuhsnfar";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoReply {
    pub channel: String,
    pub user: proto::User,
    pub server: String,
    pub away: bool,
    pub modes: BTreeSet<ChannelUserMode>,
    /// Always `None` for plain WHO.
    pub account: Option<String>,
    pub real_name: String,
}

/// RPL_WHOREPLY: `<client> <channel> <user> <host> <server> <nick> <flags> :<hopcount> <realname>`
pub fn who_reply(params: &[String], server: &ServerInfo) -> Option<WhoReply> {
    let [_, channel, ident, host, server_name, nick, flags, last, ..] = params else {
        return None;
    };

    // The hop count shares the trailing parameter with the real name
    let real_name = last
        .split_once(' ')
        .map_or(String::new(), |(_, real_name)| real_name.to_string());

    Some(decode(
        [channel, ident, host, server_name, nick, flags],
        None,
        real_name,
        server,
    ))
}

/// RPL_WHOSPCRPL for [`WHOX_FIELDS`]:
/// `<client> <channel> <user> <host> <server> <nick> <flags> <account> :<realname>`
pub fn whox_reply(params: &[String], server: &ServerInfo) -> Option<WhoReply> {
    let [_, channel, ident, host, server_name, nick, flags, account, real_name, ..] = params
    else {
        return None;
    };

    let account = (account != "0").then(|| account.clone());

    Some(decode(
        [channel, ident, host, server_name, nick, flags],
        account,
        real_name.clone(),
        server,
    ))
}

fn decode(
    [channel, ident, host, server_name, nick, flags]: [&String; 6],
    account: Option<String>,
    real_name: String,
    server: &ServerInfo,
) -> WhoReply {
    let (away, modes) = flags_status(flags, server);

    WhoReply {
        channel: channel.clone(),
        user: proto::User {
            nickname: nick.clone(),
            username: Some(ident.clone()),
            hostname: Some(host.clone()),
        },
        server: server_name.clone(),
        away,
        modes,
        account,
        real_name,
    }
}

/// Decodes WHO flags such as `G*@+` into the away flag and channel-user-modes.
///
/// `H` (here) and `G` (gone) are fixed markers. `*` (operator) and anything
/// not in the PREFIX table are dropped.
pub fn flags_status(flags: &str, server: &ServerInfo) -> (bool, BTreeSet<ChannelUserMode>) {
    let away = flags.contains('G');
    let modes = flags
        .chars()
        .filter_map(|c| server.user_mode_for_prefix(c))
        .collect();

    (away, modes)
}

/// Decodes a NAMES token: status prefixes followed by a nick or a `nick!user@host` mask.
pub fn names_entry(token: &str, server: &ServerInfo) -> (proto::User, BTreeSet<ChannelUserMode>) {
    let mut modes = BTreeSet::new();
    let mut rest = token;

    while let Some(c) = rest.chars().next() {
        match server.user_mode_for_prefix(c) {
            Some(mode) => {
                modes.insert(mode);
                rest = &rest[c.len_utf8()..];
            }
            None => break,
        }
    }

    (proto::User::from_mask(rest), modes)
}

/// Lines of the message of the day, collected between RPL_MOTDSTART and RPL_ENDOFMOTD.
#[derive(Debug, Clone, Default)]
pub struct Motd {
    lines: Vec<String>,
}

impl Motd {
    pub fn start(&mut self) {
        self.lines.clear();
    }

    pub fn push(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    pub fn finish(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

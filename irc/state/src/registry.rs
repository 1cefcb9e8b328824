use std::collections::{BTreeSet, HashMap};

use chrono::Utc;

use crate::casemap::CaseMap;
use crate::channel::Channel;
use crate::isupport::ChannelUserMode;
use crate::snapshot;
use crate::user::User;

/// The live users and tracked channels of one connection, keyed by folded name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    casemap: CaseMap,
    users: HashMap<String, User>,
    channels: HashMap<String, Channel>,
}

impl Registry {
    pub fn new(casemap: CaseMap) -> Self {
        Self {
            casemap,
            ..Self::default()
        }
    }

    pub fn casemap(&self) -> CaseMap {
        self.casemap
    }

    pub fn fold(&self, name: &str) -> String {
        self.casemap.fold(name)
    }

    pub fn user(&self, nick: &str) -> Option<&User> {
        self.users.get(&self.fold(nick))
    }

    pub fn user_mut(&mut self, nick: &str) -> Option<&mut User> {
        let key = self.fold(nick);
        self.users.get_mut(&key)
    }

    pub fn get_or_create_user(&mut self, mask: &proto::User) -> &mut User {
        let key = self.fold(&mask.nickname);
        let user = self.users.entry(key).or_insert_with(|| {
            log::trace!("tracking user {mask}");
            User::new(mask)
        });
        user.update_mask(mask);
        user
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&self.fold(name))
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        let key = self.fold(name);
        self.channels.get_mut(&key)
    }

    pub fn is_tracked(&self, name: &str) -> bool {
        self.channels.contains_key(&self.fold(name))
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn channel_track(&mut self, name: &str) -> &mut Channel {
        let key = self.fold(name);
        self.channels.entry(key).or_insert_with(|| {
            log::debug!("tracking channel {name}");
            Channel::new(name)
        })
    }

    /// Stops tracking a channel, dropping members that are left in no other channel.
    pub fn channel_untrack(&mut self, name: &str, own_nick: &str) -> Option<Channel> {
        let channel = self.channels.remove(&self.fold(name))?;
        log::debug!("untracking channel {}", channel.name);

        for key in channel.members.keys() {
            self.prune(key, own_nick);
        }

        Some(channel)
    }

    /// Adds a known user to a tracked channel, replacing any modes they held.
    pub fn add_member(
        &mut self,
        channel: &str,
        nick: &str,
        modes: BTreeSet<ChannelUserMode>,
    ) -> bool {
        let key = self.fold(nick);

        if !self.users.contains_key(&key) {
            return false;
        }

        match self.channel_mut(channel) {
            Some(channel) => {
                channel.members.insert(key, modes);
                true
            }
            None => false,
        }
    }

    pub fn remove_member(&mut self, channel: &str, nick: &str, own_nick: &str) -> bool {
        let key = self.fold(nick);

        let removed = self
            .channel_mut(channel)
            .and_then(|channel| channel.members.shift_remove(&key))
            .is_some();

        if removed {
            self.prune(&key, own_nick);
        }

        removed
    }

    /// Replaces the membership of a tracked channel wholesale.
    pub fn replace_members(
        &mut self,
        channel: &str,
        members: Vec<(String, BTreeSet<ChannelUserMode>)>,
        own_nick: &str,
    ) {
        let members = members
            .into_iter()
            .map(|(nick, modes)| (self.fold(&nick), modes))
            .filter(|(key, _)| self.users.contains_key(key))
            .collect();

        let Some(channel) = self.channel_mut(channel) else {
            return;
        };
        let previous = std::mem::replace(&mut channel.members, members);

        for key in previous.keys() {
            self.prune(key, own_nick);
        }
    }

    /// Renames a user everywhere, returning the user before and after.
    pub fn track_nick_rename(
        &mut self,
        old: &str,
        new: &str,
    ) -> Option<(snapshot::User, snapshot::User)> {
        let old_key = self.fold(old);
        let new_key = self.fold(new);

        let mut user = self.users.remove(&old_key)?;
        let before = user.snapshot();
        user.nick = new.to_string();
        let after = user.snapshot();

        for channel in self.channels.values_mut() {
            if let Some((index, _, modes)) = channel.members.shift_remove_full(&old_key) {
                channel.members.shift_insert(index, new_key.clone(), modes);
            }
        }

        if let Some(stale) = self.users.insert(new_key, user) {
            log::warn!(
                "{} renamed to {new}, replacing stale user {}",
                before.nick(),
                stale.nick
            );
        }

        Some((before, after))
    }

    pub fn track_account(
        &mut self,
        nick: &str,
        account: Option<String>,
    ) -> Option<snapshot::User> {
        let user = self.user_mut(nick)?;
        user.account = account;
        Some(user.snapshot())
    }

    pub fn track_away(&mut self, nick: &str, away: bool) -> Option<snapshot::User> {
        let user = self.user_mut(nick)?;
        user.away = away;
        Some(user.snapshot())
    }

    /// Removes a user network-wide, returning them and the channels they were in.
    pub fn track_quit(&mut self, nick: &str) -> Option<(snapshot::User, Vec<String>)> {
        let key = self.fold(nick);
        let user = self.users.remove(&key)?;

        let channels = self
            .channels
            .values_mut()
            .filter_map(|channel| {
                channel
                    .members
                    .shift_remove(&key)
                    .map(|_| channel.name.clone())
            })
            .collect();

        Some((user.snapshot(), channels))
    }

    /// Re-keys every map under a new case mapping.
    pub fn set_casemap(&mut self, casemap: CaseMap) {
        if self.casemap == casemap {
            return;
        }

        log::debug!("casemapping changed from {} to {casemap}", self.casemap);

        let renamed = self
            .users
            .iter()
            .map(|(key, user)| (key.clone(), casemap.fold(&user.nick)))
            .collect::<HashMap<_, _>>();

        self.users = self
            .users
            .drain()
            .map(|(_, user)| (casemap.fold(&user.nick), user))
            .collect();

        self.channels = self
            .channels
            .drain()
            .map(|(_, mut channel)| {
                channel.members = channel
                    .members
                    .into_iter()
                    .map(|(key, modes)| {
                        let key = renamed
                            .get(&key)
                            .cloned()
                            .unwrap_or_else(|| casemap.fold(&key));
                        (key, modes)
                    })
                    .collect();

                (casemap.fold(&channel.name), channel)
            })
            .collect();

        self.casemap = casemap;
    }

    pub fn user_snapshot(&self, nick: &str) -> Option<snapshot::User> {
        self.user(nick).map(User::snapshot)
    }

    pub fn channel_snapshot(&self, name: &str) -> Option<snapshot::Channel> {
        let channel = self.channel(name)?;

        let members = channel
            .members
            .iter()
            .filter_map(|(key, modes)| {
                self.users.get(key).map(|user| snapshot::Member {
                    user: user.snapshot(),
                    modes: modes.clone(),
                })
            })
            .collect();

        Some(snapshot::Channel {
            name: channel.name.clone(),
            topic: channel.topic.clone(),
            members,
            modes: channel.modes.clone(),
            list_received: channel.list_received,
            captured: Utc::now(),
        })
    }

    /// Drops a user who is no longer in any tracked channel. The client itself is kept.
    fn prune(&mut self, key: &str, own_nick: &str) {
        if key == self.fold(own_nick) {
            return;
        }

        if self
            .channels
            .values()
            .any(|channel| channel.members.contains_key(key))
        {
            return;
        }

        if let Some(user) = self.users.remove(key) {
            log::trace!("dropping user {}", user.nick);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn registry() -> Registry {
        let mut registry = Registry::new(CaseMap::Rfc1459);

        registry.get_or_create_user(&proto::User::from_mask("me!m@host"));
        registry.get_or_create_user(&proto::User::from_mask("Dan!d@localhost"));
        registry.channel_track("#Rust");
        registry.channel_track("#irc");

        for channel in ["#rust", "#irc"] {
            registry.add_member(channel, "me", BTreeSet::new());
            registry.add_member(channel, "dan", BTreeSet::new());
        }

        registry
    }

    #[test]
    fn channel_lookup_is_case_folded() {
        let mut registry = registry();

        assert!(registry.is_tracked("#RUST"));
        registry.channel_track("#rUsT");
        assert_eq!(registry.channels().count(), 2);
        assert_eq!(registry.channel("#rust").map(Channel::name), Some("#Rust"));
    }

    #[test]
    fn nick_rename() {
        let mut registry = registry();

        let (before, after) = registry.track_nick_rename("dan", "Daniel").unwrap();

        assert_eq!(before.nick(), "Dan");
        assert_eq!(after.nick(), "Daniel");
        assert_eq!(after.ident(), Some("d"));
        assert!(registry.user("dan").is_none());
        assert!(registry.user("daniel").is_some());

        let channel = registry.channel_snapshot("#rust").unwrap();
        assert!(channel.member("Daniel").is_some());
        assert!(channel.member("Dan").is_none());
        assert_eq!(registry.track_nick_rename("dan", "other"), None);
    }

    #[test]
    fn nick_rename_over_stale_user() {
        let mut registry = registry();
        registry.get_or_create_user(&proto::User::from_mask("erin!e@elsewhere"));
        registry.add_member("#irc", "erin", BTreeSet::new());

        let (_, after) = registry.track_nick_rename("dan", "Erin").unwrap();

        assert_eq!(after.ident(), Some("d"));
        assert_eq!(registry.user("erin").unwrap().snapshot().ident(), Some("d"));
        assert!(registry.user("dan").is_none());

        let channel = registry.channel_snapshot("#irc").unwrap();
        assert_eq!(
            channel
                .members()
                .iter()
                .filter(|member| member.user().nick() == "Erin")
                .count(),
            1
        );
    }

    #[test]
    fn quit() {
        let mut registry = registry();

        let (user, mut channels) = registry.track_quit("DAN").unwrap();
        channels.sort();

        assert_eq!(user.nick(), "Dan");
        assert_eq!(channels, vec!["#Rust", "#irc"]);
        assert!(registry.user("dan").is_none());
        assert!(registry.channel_snapshot("#irc").unwrap().member("dan").is_none());
    }

    #[test]
    fn stale_users_are_dropped() {
        let mut registry = registry();

        assert!(registry.remove_member("#rust", "dan", "me"));
        assert!(registry.user("dan").is_some());

        assert!(registry.remove_member("#irc", "dan", "me"));
        assert!(registry.user("dan").is_none());

        registry.channel_untrack("#irc", "me");
        registry.channel_untrack("#rust", "me");
        assert!(registry.user("me").is_some());
        assert_eq!(registry.channels().count(), 0);
    }

    #[test]
    fn account_and_away() {
        let mut registry = registry();

        let user = registry.track_account("dan", Some("daniel".into())).unwrap();
        assert_eq!(user.account(), Some("daniel"));

        let user = registry.track_away("dan", true).unwrap();
        assert!(user.is_away());
        assert_eq!(user.account(), Some("daniel"));

        assert_eq!(registry.track_away("nobody", true), None);
    }

    #[test]
    fn casemap_change() {
        let mut registry = Registry::new(CaseMap::Ascii);
        registry.get_or_create_user(&proto::User::from_mask("Dan[m]"));
        registry.channel_track("#Chan[1]");
        registry.add_member("#chan[1]", "dan[m]", BTreeSet::new());

        assert!(registry.user("dan{m}").is_none());

        registry.set_casemap(CaseMap::Rfc1459);

        assert!(registry.user("dan{m}").is_some());
        assert!(registry.is_tracked("#chan{1}"));
        assert!(
            registry
                .channel_snapshot("#CHAN{1}")
                .unwrap()
                .member("Dan[m]")
                .is_some()
        );
    }
}

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::isupport::ChannelUserMode;
use crate::snapshot;

/// A topic is set as a whole: text, time and setter change together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub text: String,
    pub time: DateTime<Utc>,
    pub setter: snapshot::Actor,
}

/// A live channel, owned by the registry.
#[derive(Debug, Clone, Default)]
pub struct Channel {
    pub(crate) name: String,
    pub(crate) topic: Option<Topic>,
    /// Text from RPL_TOPIC, waiting for RPL_TOPICWHOTIME.
    pub(crate) pending_topic: Option<String>,
    /// Keyed by folded nick.
    pub(crate) members: IndexMap<String, BTreeSet<ChannelUserMode>>,
    pub(crate) modes: BTreeMap<char, Option<String>>,
    pub(crate) list_received: bool,
    /// NAMES entries collected until RPL_ENDOFNAMES.
    pub(crate) names: Option<Vec<(proto::User, BTreeSet<ChannelUserMode>)>>,
}

impl Channel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_member(&self, key: &str) -> bool {
        self.members.contains_key(key)
    }

    pub fn set_topic(&mut self, topic: Topic) {
        self.pending_topic = None;
        self.topic = Some(topic);
    }

    pub fn clear_topic(&mut self) {
        self.pending_topic = None;
        self.topic = None;
    }

    pub fn add_user_mode(&mut self, key: &str, mode: ChannelUserMode) -> bool {
        match self.members.get_mut(key) {
            Some(modes) => {
                modes.insert(mode);
                true
            }
            None => false,
        }
    }

    pub fn remove_user_mode(&mut self, key: &str, mode: ChannelUserMode) -> bool {
        match self.members.get_mut(key) {
            Some(modes) => {
                modes.remove(&mode);
                true
            }
            None => false,
        }
    }

    pub fn set_mode(&mut self, letter: char, arg: Option<String>) {
        self.modes.insert(letter, arg);
    }

    pub fn unset_mode(&mut self, letter: char) {
        self.modes.remove(&letter);
    }

    pub fn push_names(
        &mut self,
        names: impl IntoIterator<Item = (proto::User, BTreeSet<ChannelUserMode>)>,
    ) {
        self.names.get_or_insert_with(Vec::new).extend(names);
    }

    pub fn take_names(&mut self) -> Option<Vec<(proto::User, BTreeSet<ChannelUserMode>)>> {
        self.names.take()
    }
}

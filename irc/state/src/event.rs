use std::cmp::Reverse;

use crate::cap::{Capability, Subcommand};
use crate::channel::Topic;
use crate::ctcp;
use crate::isupport::ChannelUserMode;
use crate::mode::Mode;
use crate::server::ServerInfo;
use crate::snapshot::{Actor, Channel, User};

/// Notifications published while handling messages. Payloads are snapshots.
#[derive(Debug, Clone)]
pub enum Event {
    /// RPL_MYINFO, the server is known.
    Connected(ServerInfo),
    ServerInfoUpdated(ServerInfo),
    Motd(Vec<String>),
    NickRejected(NickRejected),
    Join {
        channel: Channel,
        user: User,
    },
    /// The client joined a channel it asked to be in.
    RequestedJoinComplete {
        channel: Channel,
        user: User,
    },
    Part {
        channel: Channel,
        user: User,
        reason: Option<String>,
    },
    Kick {
        channel: Channel,
        kicker: Actor,
        user: User,
        reason: Option<String>,
    },
    Quit {
        user: User,
        channels: Vec<String>,
        reason: Option<String>,
    },
    Nick {
        before: User,
        after: User,
    },
    Invite {
        channel: String,
        inviter: Actor,
        invitee: String,
    },
    /// `live` is false when the topic came from the join-time numerics.
    Topic {
        channel: Channel,
        topic: Topic,
        live: bool,
    },
    ChannelMode {
        channel: Channel,
        setter: Actor,
        modes: Vec<Mode>,
    },
    UsersUpdated(Channel),
    NamesUpdated(Channel),
    AccountChanged(User),
    AwayChanged(User),
    Knock {
        channel: String,
        user: User,
    },
    CapabilityResponse(CapabilityResponse),
    CapabilityList(Vec<Capability>),
    CapabilityNew(Vec<Capability>),
    CapabilityDeleted(Vec<Capability>),
    PrivateMessage {
        user: User,
        text: String,
    },
    ChannelMessage {
        channel: Channel,
        user: User,
        text: String,
    },
    TargetedChannelMessage {
        channel: Channel,
        prefix: ChannelUserMode,
        user: User,
        text: String,
    },
    PrivateNotice {
        user: User,
        text: String,
    },
    ChannelNotice {
        channel: Channel,
        user: User,
        text: String,
    },
    TargetedChannelNotice {
        channel: Channel,
        prefix: ChannelUserMode,
        user: User,
        text: String,
    },
    ServerNotice {
        server: String,
        text: String,
    },
    CtcpQuery(CtcpQuery),
    CtcpReply {
        user: User,
        command: ctcp::Command,
        params: Option<String>,
    },
    ChannelCtcp {
        channel: Channel,
        user: User,
        command: ctcp::Command,
        params: Option<String>,
    },
    TargetedChannelCtcp {
        channel: Channel,
        prefix: ChannelUserMode,
        user: User,
        command: ctcp::Command,
        params: Option<String>,
    },
}

/// The server refused a nick. Observers may pick the nick tried next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NickRejected {
    old: String,
    new_nick: String,
}

impl NickRejected {
    pub fn new(old: String, new_nick: String) -> Self {
        Self { old, new_nick }
    }

    pub fn old(&self) -> &str {
        &self.old
    }

    pub fn new_nick(&self) -> &str {
        &self.new_nick
    }

    pub fn set_new_nick(&mut self, new_nick: impl Into<String>) {
        self.new_nick = new_nick.into();
    }
}

/// An LS, ACK or NAK reply. Clearing `ending_negotiation` keeps negotiation open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityResponse {
    subcommand: Subcommand,
    capabilities: Vec<Capability>,
    negotiating: bool,
    ending_negotiation: bool,
}

impl CapabilityResponse {
    pub fn new(
        subcommand: Subcommand,
        capabilities: Vec<Capability>,
        negotiating: bool,
        ending_negotiation: bool,
    ) -> Self {
        Self {
            subcommand,
            capabilities,
            negotiating,
            ending_negotiation,
        }
    }

    pub fn subcommand(&self) -> Subcommand {
        self.subcommand
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn is_negotiating(&self) -> bool {
        self.negotiating
    }

    pub fn is_ending_negotiation(&self) -> bool {
        self.ending_negotiation
    }

    pub fn set_ending_negotiation(&mut self, ending_negotiation: bool) {
        self.ending_negotiation = ending_negotiation;
    }
}

/// A private CTCP query. `reply` is sent back unless an observer clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtcpQuery {
    user: User,
    command: ctcp::Command,
    params: Option<String>,
    reply: Option<String>,
}

impl CtcpQuery {
    pub fn new(
        user: User,
        command: ctcp::Command,
        params: Option<String>,
        reply: Option<String>,
    ) -> Self {
        Self {
            user,
            command,
            params,
            reply,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn command(&self) -> &ctcp::Command {
        &self.command
    }

    pub fn params(&self) -> Option<&str> {
        self.params.as_deref()
    }

    pub fn reply(&self) -> Option<&str> {
        self.reply.as_deref()
    }

    pub fn set_reply(&mut self, reply: Option<String>) {
        self.reply = reply;
    }
}

/// Delivers an event before returning. Anything an observer changes on the
/// event is visible to the publisher once `publish` returns.
pub trait Publish {
    fn publish(&mut self, event: &mut Event);
}

/// Collects a copy of every event.
impl Publish for Vec<Event> {
    fn publish(&mut self, event: &mut Event) {
        self.push(event.clone());
    }
}

pub trait Observer {
    fn notify(&mut self, event: &mut Event);
}

impl<F> Observer for F
where
    F: FnMut(&mut Event),
{
    fn notify(&mut self, event: &mut Event) {
        self(event);
    }
}

/// Observers called in descending priority, ties in subscription order.
#[derive(Default)]
pub struct Bus {
    observers: Vec<(i32, Box<dyn Observer>)>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, priority: i32, observer: impl Observer + 'static) {
        self.observers.push((priority, Box::new(observer)));
        // Stable, so equal priorities keep their subscription order
        self.observers.sort_by_key(|(priority, _)| Reverse(*priority));
    }
}

impl Publish for Bus {
    fn publish(&mut self, event: &mut Event) {
        for (_, observer) in &mut self.observers {
            observer.notify(event);
        }
    }
}

use std::collections::VecDeque;

use proto::Message;

use crate::cap::Capabilities;
use crate::config::Config;
use crate::dispatch::{self, Router};
use crate::event::Publish;
use crate::handler;
use crate::list::Motd;
use crate::registry::Registry;
use crate::server::ServerInfo;
use crate::snapshot;
use crate::target::Target;

/// Everything handlers read and mutate for one connection.
#[derive(Debug, Clone)]
pub struct State {
    pub(crate) config: Config,
    pub(crate) registry: Registry,
    pub(crate) server: ServerInfo,
    /// Confirmed by RPL_WELCOME or a NICK of our own.
    pub(crate) nickname: Option<String>,
    /// The nick last sent to the server.
    pub(crate) requested_nick: String,
    pub(crate) intended: Vec<String>,
    pub(crate) capabilities: Capabilities,
    pub(crate) motd: Motd,
    outbound: VecDeque<Message>,
}

impl State {
    pub fn new(config: Config) -> Self {
        let server = ServerInfo::default();

        Self {
            registry: Registry::new(server.casemap),
            requested_nick: config.nickname.clone(),
            intended: config.channels.clone(),
            capabilities: Capabilities::new(&config.capabilities),
            nickname: None,
            motd: Motd::default(),
            outbound: VecDeque::new(),
            server,
            config,
        }
    }

    /// Our current nick, or the one we asked for before the server confirmed any.
    pub fn nickname(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.requested_nick)
    }

    pub fn server(&self) -> &ServerInfo {
        &self.server
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn is_self(&self, nick: &str) -> bool {
        self.registry.casemap().equals(nick, self.nickname())
    }

    pub fn is_intended(&self, channel: &str) -> bool {
        let casemap = self.registry.casemap();

        self.intended
            .iter()
            .any(|intended| casemap.equals(intended, channel))
    }

    pub fn resolve(&self, target: &str) -> Target {
        Target::resolve(target, self.nickname(), &self.server, &self.registry)
    }

    /// An actor for the message's source, from the registry when the user is known.
    pub fn actor(&self, source: Option<&proto::Source>) -> snapshot::Actor {
        match source {
            Some(proto::Source::User(user)) => snapshot::Actor::User(self.user_or_transient(user)),
            Some(proto::Source::Server(server)) => snapshot::Actor::Server(server.clone()),
            None => snapshot::Actor::Server(self.server.address.clone().unwrap_or_default()),
        }
    }

    pub fn user_or_transient(&self, user: &proto::User) -> snapshot::User {
        self.registry
            .user_snapshot(&user.nickname)
            .unwrap_or_else(|| snapshot::User::transient(user))
    }

    pub fn drain_outbound(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.outbound.drain(..)
    }

    pub(crate) fn send(&mut self, message: Message) {
        log::trace!("queued => {}", message.raw);
        self.outbound.push_back(message);
    }
}

/// The protocol state of one connection, fed one inbound message at a time.
#[derive(Clone)]
pub struct Client {
    state: State,
    router: Router,
}

impl Client {
    pub fn new(config: Config) -> Self {
        let mut router = Router::new();
        handler::register(&mut router);

        Self {
            state: State::new(config),
            router,
        }
    }

    pub fn handle(
        &mut self,
        message: &Message,
        publisher: &mut dyn Publish,
    ) -> Result<(), dispatch::Error> {
        log::trace!("Message received => {}", message.raw);

        self.router.dispatch(&mut self.state, message, publisher)
    }

    /// Extra handlers run alongside the built-in ones.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn nickname(&self) -> &str {
        self.state.nickname()
    }

    pub fn channel(&self, name: &str) -> Option<snapshot::Channel> {
        self.state.registry.channel_snapshot(name)
    }

    pub fn user(&self, nick: &str) -> Option<snapshot::User> {
        self.state.registry.user_snapshot(nick)
    }

    /// Lines waiting to be written to the connection, oldest first.
    pub fn drain_outbound(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.state.drain_outbound()
    }

    pub fn begin_negotiation(&mut self) {
        self.state.capabilities.begin();
        self.state.send(proto::command!("CAP", "LS", "302"));
    }

    /// Ends negotiation that an observer kept open.
    pub fn end_negotiation(&mut self) {
        if self.state.capabilities.is_negotiating() {
            self.state.capabilities.end();
            self.state.send(proto::command!("CAP", "END"));
        }
    }

    pub fn join(&mut self, channel: &str) {
        if !self.state.is_intended(channel) {
            self.state.intended.push(channel.to_string());
        }
        self.state.send(proto::command!("JOIN", channel));
    }

    pub fn part(&mut self, channel: &str, reason: Option<&str>) {
        let casemap = self.state.registry.casemap();
        self.state
            .intended
            .retain(|intended| !casemap.equals(intended, channel));

        match reason {
            Some(reason) => self.state.send(proto::command!("PART", channel, reason)),
            None => self.state.send(proto::command!("PART", channel)),
        }
    }
}

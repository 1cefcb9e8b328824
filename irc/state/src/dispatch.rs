use std::collections::HashMap;

use itertools::Itertools;
use proto::{Command, Message, Numeric};

use crate::client::State;
use crate::error;
use crate::event::Publish;

/// Priority of the handlers every client starts with.
pub const BUILTIN_PRIORITY: i32 = i32::MAX - 1;

pub type Handler = fn(&mut State, &Message, &mut dyn Publish) -> Result<(), error::Error>;

#[derive(Clone, Copy)]
struct Route {
    priority: i32,
    handler: Handler,
}

/// Handlers keyed by command, called in descending priority, ties in registration order.
#[derive(Default, Clone)]
pub struct Router {
    routes: HashMap<Command, Vec<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: impl Into<Command>, priority: i32, handler: Handler) {
        let routes = self.routes.entry(command.into()).or_default();

        // Insert after every route of equal or higher priority
        let index = routes
            .iter()
            .position(|route| route.priority < priority)
            .unwrap_or(routes.len());
        routes.insert(index, Route { priority, handler });
    }

    pub fn handles(&self, command: &Command) -> bool {
        self.routes.contains_key(command)
    }

    /// Runs every handler for the message. A failure doesn't stop the handlers after it.
    pub fn dispatch(
        &self,
        state: &mut State,
        message: &Message,
        publisher: &mut dyn Publish,
    ) -> Result<(), Error> {
        let Some(routes) = self.routes.get(&message.command) else {
            log::trace!("no handler for {}", message.command);
            return Ok(());
        };

        let mut errors = vec![];

        for route in routes {
            if let Err(error) = (route.handler)(state, message, publisher) {
                log::warn!("{error}");
                errors.push(error);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error {
                command: message.command.clone(),
                raw: message.raw.clone(),
                errors,
            })
        }
    }
}

/// Every failure raised while dispatching one message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{command} failed: {}", .errors.iter().map(ToString::to_string).join("; "))]
pub struct Error {
    pub command: Command,
    pub raw: String,
    pub errors: Vec<error::Error>,
}

impl Error {
    /// Failures during the welcome sequence leave the connection unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.command.numeric(),
            Some(Numeric::RPL_WELCOME | Numeric::RPL_MYINFO)
        )
    }
}

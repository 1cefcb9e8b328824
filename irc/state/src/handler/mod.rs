//! The built-in message handlers.
use proto::Message;

use crate::client::State;
use crate::dispatch::Router;
use crate::error::Error;
use crate::snapshot;

mod cap;
mod channel;
mod list;
mod message;
mod registration;
mod user;

pub fn register(router: &mut Router) {
    registration::register(router);
    cap::register(router);
    list::register(router);
    channel::register(router);
    user::register(router);
    message::register(router);
}

fn expect_params(message: &Message, expected: usize) -> Result<(), Error> {
    if message.params.len() < expected {
        Err(Error::malformed_length(message, expected))
    } else {
        Ok(())
    }
}

fn source_user(message: &Message) -> Result<&proto::User, Error> {
    message
        .user()
        .ok_or_else(|| Error::invalid_actor_kind(message, "user"))
}

/// The tracked name of a channel a reply refers to.
///
/// Names that aren't channel names are invalid targets. Channels we aren't
/// in are ignored.
fn tracked_channel(state: &State, message: &Message, name: &str) -> Result<Option<String>, Error> {
    if !state.server.is_channel(name) {
        return Err(Error::invalid_target(message, name));
    }

    match state.registry.channel(name) {
        Some(channel) => Ok(Some(channel.name().to_string())),
        None => {
            log::debug!("ignoring {} for untracked channel {name}", message.command);
            Ok(None)
        }
    }
}

fn channel_snapshot(state: &State, message: &Message, name: &str) -> Result<snapshot::Channel, Error> {
    state
        .registry
        .channel_snapshot(name)
        .ok_or_else(|| Error::invalid_target(message, name))
}

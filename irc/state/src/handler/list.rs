use proto::{Message, Numeric};

use super::{channel_snapshot, expect_params, tracked_channel};
use crate::channel::Channel;
use crate::client::State;
use crate::dispatch::{BUILTIN_PRIORITY, Router};
use crate::error::Error;
use crate::event::{Event, Publish};
use crate::list::{self, WhoReply};

pub(super) fn register(router: &mut Router) {
    router.register(Numeric::RPL_WHOREPLY, BUILTIN_PRIORITY, who_reply);
    router.register(Numeric::RPL_WHOSPCRPL, BUILTIN_PRIORITY, whox_reply);
    router.register(Numeric::RPL_ENDOFWHO, BUILTIN_PRIORITY, end_of_who);
    router.register(Numeric::RPL_NAMREPLY, BUILTIN_PRIORITY, names_reply);
    router.register(Numeric::RPL_ENDOFNAMES, BUILTIN_PRIORITY, end_of_names);
    router.register(Numeric::RPL_MOTDSTART, BUILTIN_PRIORITY, motd_start);
    router.register(Numeric::RPL_MOTD, BUILTIN_PRIORITY, motd);
    router.register(Numeric::RPL_ENDOFMOTD, BUILTIN_PRIORITY, end_of_motd);
    router.register(Numeric::ERR_NOMOTD, BUILTIN_PRIORITY, end_of_motd);
}

fn who_reply(state: &mut State, message: &Message, _: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 8)?;

    match list::who_reply(&message.params, &state.server) {
        Some(reply) => {
            track_who(state, reply, false);
            Ok(())
        }
        None => Err(Error::malformed_length(message, 8)),
    }
}

fn whox_reply(state: &mut State, message: &Message, _: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 9)?;

    match list::whox_reply(&message.params, &state.server) {
        Some(reply) => {
            track_who(state, reply, true);
            Ok(())
        }
        None => Err(Error::malformed_length(message, 9)),
    }
}

/// Fills in what a WHO line tells us about a member of a tracked channel.
fn track_who(state: &mut State, reply: WhoReply, whox: bool) {
    if !state.registry.is_tracked(&reply.channel) {
        log::debug!("ignoring WHO reply for {}", reply.channel);
        return;
    }

    let user = state.registry.get_or_create_user(&reply.user);
    user.server = Some(reply.server);
    user.away = reply.away;
    user.real_name = Some(reply.real_name);
    // Plain WHO can't tell "logged out" from "unknown"
    if whox {
        user.account = reply.account;
    }

    state
        .registry
        .add_member(&reply.channel, &reply.user.nickname, reply.modes);
}

fn end_of_who(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;

    // WHO on a mask rather than a channel
    if !state.server.is_channel(&message.params[1]) {
        return Ok(());
    }

    let Some(name) = tracked_channel(state, message, &message.params[1])? else {
        return Ok(());
    };

    if let Some(channel) = state.registry.channel_mut(&name) {
        channel.list_received = true;
    }

    let channel = channel_snapshot(state, message, &name)?;
    publisher.publish(&mut Event::UsersUpdated(channel));

    Ok(())
}

fn names_reply(state: &mut State, message: &Message, _: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 4)?;

    let Some(name) = tracked_channel(state, message, &message.params[2])? else {
        return Ok(());
    };

    // Users are only created once RPL_ENDOFNAMES confirms the channel is still ours
    let names = message.params[3]
        .split_whitespace()
        .map(|token| list::names_entry(token, &state.server))
        .collect::<Vec<_>>();

    if let Some(channel) = state.registry.channel_mut(&name) {
        channel.push_names(names);
    }

    Ok(())
}

fn end_of_names(
    state: &mut State,
    message: &Message,
    publisher: &mut dyn Publish,
) -> Result<(), Error> {
    expect_params(message, 2)?;

    let Some(name) = tracked_channel(state, message, &message.params[1])? else {
        return Ok(());
    };

    let names = state
        .registry
        .channel_mut(&name)
        .and_then(Channel::take_names);

    match names {
        Some(names) => {
            let members = names
                .into_iter()
                .map(|(user, modes)| {
                    state.registry.get_or_create_user(&user);
                    (user.nickname, modes)
                })
                .collect();
            let own_nick = state.nickname().to_string();
            state.registry.replace_members(&name, members, &own_nick);
        }
        None => log::debug!("end of NAMES for {name} without any entries"),
    }

    let channel = channel_snapshot(state, message, &name)?;
    publisher.publish(&mut Event::NamesUpdated(channel));

    Ok(())
}

fn motd_start(state: &mut State, message: &Message, _: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 1)?;

    state.motd.start();

    Ok(())
}

fn motd(state: &mut State, message: &Message, _: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;

    state.motd.push(&message.params[1]);

    Ok(())
}

fn end_of_motd(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 1)?;

    let lines = state.motd.finish();
    state.server.motd.clone_from(&lines);

    publisher.publish(&mut Event::Motd(lines));

    Ok(())
}

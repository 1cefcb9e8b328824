use proto::{Message, Numeric};

use super::expect_params;
use crate::client::State;
use crate::dispatch::{BUILTIN_PRIORITY, Router};
use crate::error::Error;
use crate::event::{Event, NickRejected, Publish};
use crate::isupport;
use crate::server::ServerInfo;

pub(super) fn register(router: &mut Router) {
    router.register(Numeric::RPL_WELCOME, BUILTIN_PRIORITY, welcome);
    router.register(Numeric::RPL_MYINFO, BUILTIN_PRIORITY, my_info);
    router.register(Numeric::RPL_ISUPPORT, BUILTIN_PRIORITY, isupport);

    for numeric in [
        Numeric::ERR_NONICKNAMEGIVEN,
        Numeric::ERR_ERRONEUSNICKNAME,
        Numeric::ERR_NICKNAMEINUSE,
    ] {
        router.register(numeric, BUILTIN_PRIORITY, nick_rejected);
    }
}

fn welcome(state: &mut State, message: &Message, _: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 1)?;

    let nickname = message.params[0].clone();
    log::info!("registered as {nickname}");

    state.requested_nick = nickname.clone();
    state.nickname = Some(nickname);

    Ok(())
}

fn my_info(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 3)?;

    state.server = ServerInfo::new(&message.params[1], &message.params[2]);
    state.registry.set_casemap(state.server.casemap);

    publisher.publish(&mut Event::Connected(state.server.clone()));

    Ok(())
}

fn isupport(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;

    // First is our nick, last is the human readable trailer
    let tokens = &message.params[1..message.params.len() - 1];

    for token in tokens {
        if token.contains(char::is_whitespace) {
            continue;
        }

        match token.parse::<isupport::Operation>() {
            Ok(operation) => state.server.apply(operation),
            Err(error) => log::debug!("ignoring ISUPPORT token {token}: {error}"),
        }
    }
    state.registry.set_casemap(state.server.casemap);

    publisher.publish(&mut Event::ServerInfoUpdated(state.server.clone()));

    Ok(())
}

fn nick_rejected(
    state: &mut State,
    message: &Message,
    publisher: &mut dyn Publish,
) -> Result<(), Error> {
    expect_params(message, 1)?;

    let old = state.requested_nick.clone();
    let mut event = Event::NickRejected(NickRejected::new(old.clone(), format!("{old}`")));

    log::info!("nick {old} rejected by the server ({})", message.command);
    publisher.publish(&mut event);

    let Event::NickRejected(rejected) = event else {
        return Ok(());
    };

    let next = rejected.new_nick().to_string();
    state.send(proto::command!("NICK", next.as_str()));
    state.requested_nick = next;

    Ok(())
}

use proto::Message;

use super::{expect_params, source_user};
use crate::client::State;
use crate::dispatch::{BUILTIN_PRIORITY, Router};
use crate::error::Error;
use crate::event::{Event, Publish};
use crate::snapshot;

pub(super) fn register(router: &mut Router) {
    router.register("NICK", BUILTIN_PRIORITY, nick);
    router.register("QUIT", BUILTIN_PRIORITY, quit);
    router.register("ACCOUNT", BUILTIN_PRIORITY, account);
    router.register("AWAY", BUILTIN_PRIORITY, away);
}

fn nick(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 1)?;
    let user = source_user(message)?;
    let new = &message.params[0];
    let is_self = state.is_self(&user.nickname);

    let renamed = state.registry.track_nick_rename(&user.nickname, new);

    if is_self {
        log::info!("nick changed from {} to {new}", user.nickname);
        state.nickname = Some(new.clone());
        state.requested_nick.clone_from(new);
    }

    let (before, after) = match renamed {
        Some(renamed) => renamed,
        // We only track ourselves once in a channel
        None if is_self => {
            let before = snapshot::User::transient(user);
            let after = snapshot::User::transient(&proto::User {
                nickname: new.clone(),
                ..user.clone()
            });
            (before, after)
        }
        None => return Err(Error::invalid_target(message, &user.nickname)),
    };

    publisher.publish(&mut Event::Nick { before, after });

    Ok(())
}

fn quit(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    let user = source_user(message)?;

    let Some((user, channels)) = state.registry.track_quit(&user.nickname) else {
        log::debug!("{} quit without sharing a channel", user.nickname);
        return Ok(());
    };

    publisher.publish(&mut Event::Quit {
        user,
        channels,
        reason: message.param(0).map(ToString::to_string),
    });

    Ok(())
}

/// account-notify: `ACCOUNT <account>`, `*` when logged out.
fn account(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 1)?;
    let user = source_user(message)?;

    let account = (message.params[0] != "*").then(|| message.params[0].clone());

    match state.registry.track_account(&user.nickname, account) {
        Some(user) => publisher.publish(&mut Event::AccountChanged(user)),
        None => log::debug!("account change for untracked user {}", user.nickname),
    }

    Ok(())
}

/// away-notify: `AWAY :<message>` when going away, no argument when back.
fn away(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    let user = source_user(message)?;

    let away = message.param(0).is_some_and(|reason| !reason.is_empty());

    match state.registry.track_away(&user.nickname, away) {
        Some(user) => publisher.publish(&mut Event::AwayChanged(user)),
        None => log::debug!("away change for untracked user {}", user.nickname),
    }

    Ok(())
}

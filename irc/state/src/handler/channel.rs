use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use proto::{Message, Numeric};

use super::{channel_snapshot, expect_params, source_user, tracked_channel};
use crate::channel::Topic;
use crate::client::State;
use crate::dispatch::{BUILTIN_PRIORITY, Router};
use crate::error::Error;
use crate::event::{Event, Publish};
use crate::list::WHOX_FIELDS;
use crate::mode;
use crate::snapshot;
use crate::target::Target;

pub(super) fn register(router: &mut Router) {
    router.register("JOIN", BUILTIN_PRIORITY, join);
    router.register("PART", BUILTIN_PRIORITY, part);
    router.register("KICK", BUILTIN_PRIORITY, kick);
    router.register("TOPIC", BUILTIN_PRIORITY, topic);
    router.register("INVITE", BUILTIN_PRIORITY, invite);
    router.register("MODE", BUILTIN_PRIORITY, channel_mode);
    router.register(Numeric::RPL_TOPIC, BUILTIN_PRIORITY, topic_reply);
    router.register(Numeric::RPL_TOPICWHOTIME, BUILTIN_PRIORITY, topic_who_time);
    router.register(Numeric::RPL_NOTOPIC, BUILTIN_PRIORITY, no_topic);
    router.register(Numeric::RPL_CHANNELMODEIS, BUILTIN_PRIORITY, channel_mode_is);
    router.register(Numeric::RPL_KNOCK, BUILTIN_PRIORITY, knock);
}

fn join(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 1)?;
    let user = source_user(message)?;
    let name = &message.params[0];

    if !state.server.is_channel(name) {
        return Err(Error::invalid_target(message, name));
    }

    // extended-join: `JOIN <channel> <account> :<realname>`
    let extended = match (message.param(1), message.param(2)) {
        (Some(account), Some(real_name)) => {
            Some(((account != "*").then(|| account.to_string()), real_name.to_string()))
        }
        _ => None,
    };

    if state.is_self(&user.nickname) {
        state.registry.channel_track(name);
    } else if !state.registry.is_tracked(name) {
        log::debug!("{} joined untracked channel {name}", user.nickname);

        publisher.publish(&mut Event::Join {
            channel: snapshot::Channel::transient(name),
            user: snapshot::User::transient(user),
        });

        return Ok(());
    }

    let live = state.registry.get_or_create_user(user);
    if let Some((account, real_name)) = extended {
        live.account = account;
        live.real_name = Some(real_name);
    }
    state
        .registry
        .add_member(name, &user.nickname, BTreeSet::new());

    let channel = channel_snapshot(state, message, name)?;
    let user = state.user_or_transient(user);

    if !state.is_self(user.nick()) {
        publisher.publish(&mut Event::Join { channel, user });
        return Ok(());
    }

    log::info!("joined {}", channel.name());

    state.send(proto::command!("MODE", channel.name()));
    if state.server.whox {
        state.send(proto::command!("WHO", channel.name(), WHOX_FIELDS));
    } else {
        state.send(proto::command!("WHO", channel.name()));
    }

    if state.is_intended(channel.name()) {
        publisher.publish(&mut Event::RequestedJoinComplete { channel, user });
    } else {
        publisher.publish(&mut Event::Join { channel, user });
    }

    Ok(())
}

fn part(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 1)?;
    let user = source_user(message)?;

    let Some(name) = tracked_channel(state, message, &message.params[0])? else {
        return Ok(());
    };

    let channel = channel_snapshot(state, message, &name)?;
    let Some(user) = member(state, &name, &user.nickname) else {
        return Err(Error::invalid_target(message, &user.nickname));
    };
    let own_nick = state.nickname().to_string();

    if state.is_self(user.nick()) {
        state.registry.channel_untrack(&name, &own_nick);
    } else {
        state.registry.remove_member(&name, user.nick(), &own_nick);
    }

    publisher.publish(&mut Event::Part {
        channel,
        user,
        reason: message.param(1).map(ToString::to_string),
    });

    Ok(())
}

fn kick(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;

    let Some(name) = tracked_channel(state, message, &message.params[0])? else {
        return Ok(());
    };
    let victim = &message.params[1];

    let channel = channel_snapshot(state, message, &name)?;
    let Some(user) = member(state, &name, victim) else {
        return Err(Error::invalid_target(message, victim));
    };
    let kicker = state.actor(message.source.as_ref());
    let own_nick = state.nickname().to_string();

    if state.is_self(victim) {
        log::info!("kicked from {name} by {}", kicker.name());
        state.registry.channel_untrack(&name, &own_nick);
    } else {
        state.registry.remove_member(&name, victim, &own_nick);
    }

    publisher.publish(&mut Event::Kick {
        channel,
        kicker,
        user,
        reason: message.param(2).map(ToString::to_string),
    });

    Ok(())
}

/// A member of a tracked channel, matched under the server's case mapping.
fn member(state: &State, channel: &str, nick: &str) -> Option<snapshot::User> {
    let key = state.registry.fold(nick);

    state
        .registry
        .channel(channel)
        .filter(|channel| channel.is_member(&key))
        .and_then(|_| state.registry.user_snapshot(nick))
}

fn topic(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;

    let Some(name) = tracked_channel(state, message, &message.params[0])? else {
        return Ok(());
    };

    let topic = Topic {
        text: message.params[1].clone(),
        time: Utc::now(),
        setter: state.actor(message.source.as_ref()),
    };

    if let Some(channel) = state.registry.channel_mut(&name) {
        if topic.text.is_empty() {
            channel.clear_topic();
        } else {
            channel.set_topic(topic.clone());
        }
    }

    let channel = channel_snapshot(state, message, &name)?;
    publisher.publish(&mut Event::Topic {
        channel,
        topic,
        live: true,
    });

    Ok(())
}

fn topic_reply(state: &mut State, message: &Message, _: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 3)?;

    let Some(name) = tracked_channel(state, message, &message.params[1])? else {
        return Ok(());
    };

    if let Some(channel) = state.registry.channel_mut(&name) {
        channel.pending_topic = Some(message.params[2].clone());
    }

    Ok(())
}

/// Commits the topic from RPL_TOPIC together with its setter and time.
fn topic_who_time(
    state: &mut State,
    message: &Message,
    publisher: &mut dyn Publish,
) -> Result<(), Error> {
    expect_params(message, 4)?;

    let Some(name) = tracked_channel(state, message, &message.params[1])? else {
        return Ok(());
    };

    let time = message.params[3]
        .parse::<i64>()
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .ok_or_else(|| Error::malformed_timestamp(message, &message.params[3]))?;
    let setter = setter(state, &message.params[2]);

    let Some(channel) = state.registry.channel_mut(&name) else {
        return Ok(());
    };
    let Some(text) = channel
        .pending_topic
        .take()
        .or_else(|| channel.topic.as_ref().map(|topic| topic.text.clone()))
    else {
        log::debug!("topic time for {name} without a topic");
        return Ok(());
    };

    let topic = Topic { text, time, setter };
    channel.set_topic(topic.clone());

    let channel = channel_snapshot(state, message, &name)?;
    publisher.publish(&mut Event::Topic {
        channel,
        topic,
        live: false,
    });

    Ok(())
}

/// RPL_TOPICWHOTIME carries a mask or, on some servers, just a nick or server name.
fn setter(state: &State, mask: &str) -> snapshot::Actor {
    let user = proto::User::from_mask(mask);

    if user.username.is_none() && user.hostname.is_none() && mask.contains('.') {
        snapshot::Actor::Server(mask.to_string())
    } else {
        snapshot::Actor::User(state.user_or_transient(&user))
    }
}

fn no_topic(state: &mut State, message: &Message, _: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;

    let Some(name) = tracked_channel(state, message, &message.params[1])? else {
        return Ok(());
    };

    if let Some(channel) = state.registry.channel_mut(&name) {
        channel.clear_topic();
    }

    Ok(())
}

fn invite(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;

    let invitee = message.params[0].clone();
    let channel = message.params[1].clone();

    if !state.server.is_channel(&channel) {
        return Err(Error::invalid_target(message, &channel));
    }

    if state.is_self(&invitee) && state.is_intended(&channel) {
        log::info!("invited to {channel}, joining");
        state.send(proto::command!("JOIN", channel.as_str()));
    }

    publisher.publish(&mut Event::Invite {
        channel,
        inviter: state.actor(message.source.as_ref()),
        invitee,
    });

    Ok(())
}

fn channel_mode(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;
    let target = &message.params[0];

    let name = match state.resolve(target) {
        Target::Channel(name) => name,
        Target::Private => {
            log::debug!("user modes set: {}", message.params[1]);
            return Ok(());
        }
        Target::TargetedChannel { .. } | Target::Unknown => {
            return Err(Error::invalid_target(message, target));
        }
    };

    let modes = mode::parse(&message.params[1], &message.params[2..], &state.server)
        .map_err(|description| Error::malformed_mode_string(message, description))?;

    if let Some(channel) = state.registry.channel_mut(&name) {
        mode::apply(channel, &modes, &state.server);
    }

    let channel = channel_snapshot(state, message, &name)?;
    publisher.publish(&mut Event::ChannelMode {
        channel,
        setter: state.actor(message.source.as_ref()),
        modes,
    });

    Ok(())
}

/// The reply to our own `MODE <channel>`, applied without an event.
fn channel_mode_is(state: &mut State, message: &Message, _: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 3)?;

    let Some(name) = tracked_channel(state, message, &message.params[1])? else {
        return Ok(());
    };

    let modes = mode::parse(&message.params[2], &message.params[3..], &state.server)
        .map_err(|description| Error::malformed_mode_string(message, description))?;

    if let Some(channel) = state.registry.channel_mut(&name) {
        mode::apply(channel, &modes, &state.server);
    }

    Ok(())
}

fn knock(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 3)?;

    if !state.server.is_channel(&message.params[1]) {
        return Err(Error::invalid_target(message, &message.params[1]));
    }

    let user = proto::User::from_mask(&message.params[2]);

    publisher.publish(&mut Event::Knock {
        channel: message.params[1].clone(),
        user: state.user_or_transient(&user),
    });

    Ok(())
}

#[cfg(test)]
mod test {
    use crate::error::Error;
    use crate::event::Event;
    use crate::handler::test::{client, feed, joined, sent};
    use crate::mode::Mode;
    use crate::snapshot::Actor;

    #[test]
    fn join_of_unrequested_channel() {
        let mut client = joined();

        let events = feed(&mut client, &[":Nick!n@host JOIN #other"]);

        assert!(matches!(events.as_slice(), [Event::Join { channel, .. }] if channel.name() == "#other"));
        assert_eq!(sent(&mut client), vec!["MODE #other", "WHO #other"]);
    }

    #[test]
    fn extended_join() {
        let mut client = joined();

        let events = feed(
            &mut client,
            &[
                ":alice!a@host JOIN #rust alice :Alice Example",
                ":bob!b@host JOIN #rust * :Bob",
            ],
        );

        assert_eq!(events.len(), 2);
        assert_eq!(client.user("alice").unwrap().account(), Some("alice"));
        assert_eq!(client.user("bob").unwrap().account(), None);
        assert_eq!(client.user("bob").unwrap().real_name(), Some("Bob"));
        assert!(sent(&mut client).is_empty());
    }

    #[test]
    fn part_and_kick() {
        let mut client = joined();

        feed(&mut client, &[":erin!e@host JOIN #rust"]);

        let events = feed(
            &mut client,
            &[
                ":dan!d@localhost PART #rust :bye",
                ":Nick!n@host KICK #rust erin :behave",
            ],
        );

        match &events[0] {
            Event::Part {
                channel,
                user,
                reason,
            } => {
                // Snapshots are taken before the user leaves
                assert!(channel.member("dan").is_some());
                assert_eq!(user.nick(), "dan");
                assert_eq!(reason.as_deref(), Some("bye"));
            }
            other => panic!("unexpected {other:?}"),
        }
        match &events[1] {
            Event::Kick {
                kicker, user, ..
            } => {
                assert_eq!(kicker.name(), "Nick");
                assert_eq!(user.nick(), "erin");
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(client.user("dan").is_none());
        assert!(client.user("erin").is_none());
        assert_eq!(client.channel("#rust").unwrap().members().len(), 1);

        feed(&mut client, &[":Nick!n@host PART #rust"]);
        assert!(client.channel("#rust").is_none());
        assert!(client.user("Nick").is_some());
    }

    #[test]
    fn kick_of_unknown_user() {
        let mut client = joined();

        let message = proto::parse::message(":dan!d@localhost KICK #rust nobody").unwrap();
        let mut events = Vec::<Event>::new();
        let error = client.handle(&message, &mut events).unwrap_err();

        assert!(matches!(error.errors.as_slice(), [Error::InvalidTarget { .. }]));
        assert_eq!(error.errors[0].raw(), ":dan!d@localhost KICK #rust nobody");
        assert!(events.is_empty());
        assert_eq!(client.channel("#rust").unwrap().members().len(), 2);
    }

    #[test]
    fn part_and_kick_use_casemapping() {
        let mut client = joined();

        feed(&mut client, &[":dan[m]!d@host JOIN #rust", ":erin!e@host JOIN #rust"]);

        let events = feed(
            &mut client,
            &[
                ":Nick!n@host KICK #rust Dan{m} :behave",
                ":ERIN!e@host PART #rust",
            ],
        );

        assert!(matches!(&events[0], Event::Kick { user, .. } if user.nick() == "dan[m]"));
        assert!(matches!(&events[1], Event::Part { user, .. } if user.nick() == "erin"));
        assert!(client.user("dan[m]").is_none());
        assert!(client.user("erin").is_none());
        assert_eq!(client.channel("#rust").unwrap().members().len(), 2);
    }

    #[test]
    fn topic_commits_at_who_time() {
        let mut client = joined();

        let events = feed(
            &mut client,
            &[":irc.example.com 332 Nick #rust :Rust discussion"],
        );
        assert!(events.is_empty());
        assert!(client.channel("#rust").unwrap().topic().is_none());

        let events = feed(
            &mut client,
            &[":irc.example.com 333 Nick #rust dan!d@localhost 1700000000"],
        );

        let [Event::Topic { topic, live, .. }] = events.as_slice() else {
            panic!("unexpected {events:?}");
        };
        assert!(!live);
        assert_eq!(topic.text, "Rust discussion");
        assert_eq!(topic.time.timestamp(), 1_700_000_000);
        assert!(matches!(&topic.setter, Actor::User(user) if user.nick() == "dan"));
        assert_eq!(client.channel("#rust").unwrap().topic(), Some(topic));

        let events = feed(&mut client, &[":dan!d@localhost TOPIC #rust :New topic"]);
        assert!(matches!(events.as_slice(), [Event::Topic { live: true, .. }]));
        assert_eq!(
            client.channel("#rust").unwrap().topic().map(|topic| topic.text.as_str()),
            Some("New topic")
        );
    }

    #[test]
    fn malformed_topic_time() {
        let mut client = joined();

        feed(
            &mut client,
            &[":irc.example.com 332 Nick #rust :Rust discussion"],
        );

        let message =
            proto::parse::message(":irc.example.com 333 Nick #rust dan!d@localhost notanumber")
                .unwrap();
        let mut events = Vec::<Event>::new();
        let error = client.handle(&message, &mut events).unwrap_err();

        assert!(matches!(error.errors.as_slice(), [Error::MalformedArgument { .. }]));
        assert!(events.is_empty());
        assert!(client.channel("#rust").unwrap().topic().is_none());
    }

    #[test]
    fn channel_modes() {
        let mut client = joined();

        let events = feed(&mut client, &[":Nick!n@host MODE #rust +ok-n dan secret"]);

        let [Event::ChannelMode { modes, setter, .. }] = events.as_slice() else {
            panic!("unexpected {events:?}");
        };
        assert_eq!(
            modes,
            &vec![
                Mode::Add('o', Some("dan".into())),
                Mode::Add('k', Some("secret".into())),
                Mode::Remove('n', None),
            ]
        );
        assert_eq!(setter.name(), "Nick");

        let channel = client.channel("#rust").unwrap();
        assert!(channel.member("dan").unwrap().has_mode('o'));
        assert_eq!(channel.modes().get(&'k'), Some(&Some("secret".to_string())));
    }

    #[test]
    fn malformed_mode_applies_nothing() {
        let mut client = joined();

        let message = proto::parse::message(":Nick!n@host MODE #rust +ok dan").unwrap();
        let mut events = Vec::<Event>::new();
        let error = client.handle(&message, &mut events).unwrap_err();

        assert!(matches!(error.errors.as_slice(), [Error::MalformedModeString { .. }]));
        assert!(events.is_empty());

        let channel = client.channel("#rust").unwrap();
        assert!(!channel.member("dan").unwrap().has_mode('o'));
    }

    #[test]
    fn invite_to_intended_channel() {
        let mut client = client();
        feed(&mut client, &[":irc.example.com 001 Nick :Welcome"]);

        let events = feed(
            &mut client,
            &[
                ":dan!d@localhost INVITE Nick #rust",
                ":dan!d@localhost INVITE Nick #elsewhere",
            ],
        );

        assert_eq!(events.len(), 2);
        assert_eq!(sent(&mut client), vec!["JOIN #rust"]);
    }

    #[test]
    fn invite_and_knock_need_a_channel() {
        let mut client = joined();

        for line in [
            ":dan!d@localhost INVITE Nick rust",
            ":irc.example.com 710 Nick rust dan!d@localhost :has asked for an invite",
        ] {
            let message = proto::parse::message(line).unwrap();
            let mut events = Vec::<Event>::new();
            let error = client.handle(&message, &mut events).unwrap_err();

            assert!(matches!(error.errors.as_slice(), [Error::InvalidTarget { .. }]));
            assert!(events.is_empty());
        }

        assert!(sent(&mut client).is_empty());
    }
}

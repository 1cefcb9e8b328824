use proto::Message;

use super::{channel_snapshot, expect_params, source_user};
use crate::client::State;
use crate::ctcp;
use crate::dispatch::{BUILTIN_PRIORITY, Router};
use crate::error::Error;
use crate::event::{CtcpQuery, Event, Publish};
use crate::target::Target;

pub(super) fn register(router: &mut Router) {
    router.register("PRIVMSG", BUILTIN_PRIORITY, privmsg);
    router.register("PRIVMSG", BUILTIN_PRIORITY, ctcp_query);
    router.register("NOTICE", BUILTIN_PRIORITY, notice);
    router.register("NOTICE", BUILTIN_PRIORITY, ctcp_reply);
}

fn privmsg(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;
    let text = &message.params[1];

    if ctcp::is_query(text) {
        return Ok(());
    }

    let user = state.user_or_transient(source_user(message)?);
    let text = text.clone();

    let mut event = match state.resolve(&message.params[0]) {
        Target::Private => Event::PrivateMessage { user, text },
        Target::Channel(name) => Event::ChannelMessage {
            channel: channel_snapshot(state, message, &name)?,
            user,
            text,
        },
        Target::TargetedChannel { channel, prefix } => Event::TargetedChannelMessage {
            channel: channel_snapshot(state, message, &channel)?,
            prefix,
            user,
            text,
        },
        Target::Unknown => return Err(Error::invalid_target(message, &message.params[0])),
    };

    publisher.publish(&mut event);

    Ok(())
}

fn notice(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;
    let text = &message.params[1];

    if ctcp::is_query(text) {
        return Ok(());
    }

    let user = match &message.source {
        Some(proto::Source::User(user)) => state.user_or_transient(user),
        Some(proto::Source::Server(server)) => {
            publisher.publish(&mut Event::ServerNotice {
                server: server.clone(),
                text: text.clone(),
            });
            return Ok(());
        }
        None => return Err(Error::invalid_actor_kind(message, "user or server")),
    };
    let text = text.clone();

    let mut event = match state.resolve(&message.params[0]) {
        Target::Private => Event::PrivateNotice { user, text },
        Target::Channel(name) => Event::ChannelNotice {
            channel: channel_snapshot(state, message, &name)?,
            user,
            text,
        },
        Target::TargetedChannel { channel, prefix } => Event::TargetedChannelNotice {
            channel: channel_snapshot(state, message, &channel)?,
            prefix,
            user,
            text,
        },
        Target::Unknown => return Err(Error::invalid_target(message, &message.params[0])),
    };

    publisher.publish(&mut event);

    Ok(())
}

fn ctcp_query(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;

    let Some(query) = ctcp::parse_query(&message.params[1]) else {
        return Ok(());
    };
    let source = source_user(message)?;
    let user = state.user_or_transient(source);
    let params = query.params.map(ToString::to_string);

    match state.resolve(&message.params[0]) {
        Target::Private => {
            let reply = ctcp::default_reply(&query, &state.config.ctcp);
            let mut event = Event::CtcpQuery(CtcpQuery::new(user, query.command, params, reply));

            publisher.publish(&mut event);

            if let Event::CtcpQuery(query) = event {
                match query.reply() {
                    Some(reply) => state.send(ctcp::response_message(&source.nickname, reply)),
                    None => log::debug!(
                        "CTCP {} from {} left unanswered",
                        query.command().as_ref(),
                        source.nickname
                    ),
                }
            }
        }
        Target::Channel(name) => {
            let channel = channel_snapshot(state, message, &name)?;
            publisher.publish(&mut Event::ChannelCtcp {
                channel,
                user,
                command: query.command,
                params,
            });
        }
        Target::TargetedChannel { channel, prefix } => {
            let channel = channel_snapshot(state, message, &channel)?;
            publisher.publish(&mut Event::TargetedChannelCtcp {
                channel,
                prefix,
                user,
                command: query.command,
                params,
            });
        }
        Target::Unknown => return Err(Error::invalid_target(message, &message.params[0])),
    }

    Ok(())
}

fn ctcp_reply(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 2)?;

    let Some(query) = ctcp::parse_query(&message.params[1]) else {
        return Ok(());
    };
    let user = state.user_or_transient(source_user(message)?);

    match state.resolve(&message.params[0]) {
        Target::Private => publisher.publish(&mut Event::CtcpReply {
            user,
            command: query.command,
            params: query.params.map(ToString::to_string),
        }),
        Target::Channel(name) | Target::TargetedChannel { channel: name, .. } => {
            log::debug!("ignoring CTCP reply sent to {name}");
        }
        Target::Unknown => return Err(Error::invalid_target(message, &message.params[0])),
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use crate::ctcp;
    use crate::error::Error;
    use crate::event::{Bus, Event};
    use crate::handler::test::{feed, joined, sent};

    #[test]
    fn messages_by_target() {
        let mut client = joined();

        let events = feed(
            &mut client,
            &[
                ":dan!d@localhost PRIVMSG Nick :hi",
                ":dan!d@localhost PRIVMSG #RUST :hello all",
                ":dan!d@localhost PRIVMSG @#rust :ops only",
                ":dan!d@localhost NOTICE Nick :psst",
                ":irc.example.com NOTICE * :Looking up your hostname",
            ],
        );

        assert!(matches!(&events[0], Event::PrivateMessage { user, text } if user.nick() == "dan" && text == "hi"));
        assert!(matches!(&events[1], Event::ChannelMessage { channel, .. } if channel.name() == "#rust"));
        assert!(matches!(&events[2], Event::TargetedChannelMessage { prefix, .. } if prefix.mode == 'o'));
        assert!(matches!(&events[3], Event::PrivateNotice { text, .. } if text == "psst"));
        assert!(matches!(&events[4], Event::ServerNotice { server, .. } if server == "irc.example.com"));
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn message_to_unknown_target() {
        let mut client = joined();

        let message = proto::parse::message(":dan!d@localhost PRIVMSG #elsewhere :hello").unwrap();
        let error = client.handle(&message, &mut Vec::<Event>::new()).unwrap_err();

        assert!(matches!(error.errors.as_slice(), [Error::InvalidTarget { .. }]));
    }

    #[test]
    fn ctcp_version() {
        let mut client = joined();

        let events = feed(&mut client, &[":dan!d@localhost PRIVMSG Nick :\u{1}VERSION\u{1}"]);

        let [Event::CtcpQuery(query)] = events.as_slice() else {
            panic!("unexpected {events:?}");
        };
        assert_eq!(query.command(), &ctcp::Command::Version);
        assert_eq!(query.user().nick(), "dan");

        let version = client.state().config.ctcp.version.clone();
        assert_eq!(
            sent(&mut client),
            vec![format!("NOTICE dan :\u{1}VERSION {version}\u{1}")]
        );
    }

    #[test]
    fn ctcp_replies_only_to_exact_queries() {
        let mut client = joined();

        let events = feed(
            &mut client,
            &[
                ":dan!d@localhost PRIVMSG Nick :\u{1}ping 123\u{1}",
                ":dan!d@localhost PRIVMSG Nick :\u{1}VERSION please\u{1}",
                ":dan!d@localhost PRIVMSG Nick :\u{1}PING 1700000000 abc\u{1}",
            ],
        );

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], Event::CtcpQuery(query) if query.reply().is_none()));
        assert!(matches!(&events[1], Event::CtcpQuery(query) if query.reply().is_none()));
        assert_eq!(
            sent(&mut client),
            vec!["NOTICE dan :\u{1}PING 1700000000 abc\u{1}"]
        );
    }

    #[test]
    fn ctcp_reply_vetoed() {
        let mut client = joined();
        let mut bus = Bus::new();
        bus.subscribe(0, |event: &mut Event| {
            if let Event::CtcpQuery(query) = event {
                query.set_reply(None);
            }
        });

        let message = proto::parse::message(":dan!d@localhost PRIVMSG Nick :\u{1}PING 42\u{1}").unwrap();
        client.handle(&message, &mut bus).unwrap();

        assert!(sent(&mut client).is_empty());
    }

    #[test]
    fn channel_ctcp_and_replies() {
        let mut client = joined();

        let events = feed(
            &mut client,
            &[
                ":dan!d@localhost PRIVMSG #rust :\u{1}ACTION waves\u{1}",
                ":dan!d@localhost NOTICE Nick :\u{1}PING 42\u{1}",
                ":dan!d@localhost NOTICE #rust :\u{1}VERSION x\u{1}",
            ],
        );

        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            Event::ChannelCtcp { command: ctcp::Command::Action, params, .. } if params.as_deref() == Some("waves")
        ));
        assert!(matches!(
            &events[1],
            Event::CtcpReply { command: ctcp::Command::Ping, params, .. } if params.as_deref() == Some("42")
        ));
        assert!(sent(&mut client).is_empty());
    }
}

use proto::Message;

use super::expect_params;
use crate::cap::{Capability, Subcommand};
use crate::client::State;
use crate::dispatch::{BUILTIN_PRIORITY, Router};
use crate::error::Error;
use crate::event::{CapabilityResponse, Event, Publish};

pub(super) fn register(router: &mut Router) {
    router.register("CAP", BUILTIN_PRIORITY, cap);
}

/// `CAP <client> <subcommand> [*] :<capabilities>`, `*` marking a continued listing.
fn cap(state: &mut State, message: &Message, publisher: &mut dyn Publish) -> Result<(), Error> {
    expect_params(message, 3)?;

    let Ok(subcommand) = message.params[1].parse::<Subcommand>() else {
        log::debug!("ignoring CAP {}", message.params[1]);
        return Ok(());
    };
    let more = message.params.len() > 3 && message.params[2] == "*";
    let caps = Capability::parse_list(&message.params[message.params.len() - 1]);

    match subcommand {
        Subcommand::Ls => {
            let request = state.capabilities.ls(caps.clone(), more);
            request_capabilities(state, &request);
            respond(state, publisher, subcommand, caps);
        }
        Subcommand::Ack => {
            state.capabilities.ack(&caps);
            respond(state, publisher, subcommand, caps);
        }
        Subcommand::Nak => {
            state.capabilities.nak(&caps);
            respond(state, publisher, subcommand, caps);
        }
        Subcommand::List => {
            state.capabilities.list(caps, more);

            if !more {
                publisher.publish(&mut Event::CapabilityList(state.capabilities.listed()));
            }
        }
        Subcommand::New => {
            let request = state.capabilities.add(&caps);
            publisher.publish(&mut Event::CapabilityNew(caps));
            request_capabilities(state, &request);
        }
        Subcommand::Del => {
            state.capabilities.remove(&caps);
            publisher.publish(&mut Event::CapabilityDeleted(caps));
        }
    }

    Ok(())
}

fn request_capabilities(state: &mut State, request: &[String]) {
    if request.is_empty() {
        return;
    }

    log::debug!("requesting capabilities: {}", request.join(" "));
    state.send(proto::command!("CAP", "REQ", request.join(" ")));
}

/// Publishes the response, then ends negotiation unless an observer held it open.
fn respond(
    state: &mut State,
    publisher: &mut dyn Publish,
    subcommand: Subcommand,
    caps: Vec<Capability>,
) {
    let mut event = Event::CapabilityResponse(CapabilityResponse::new(
        subcommand,
        caps,
        state.capabilities.is_negotiating(),
        state.capabilities.ending_negotiation(),
    ));

    publisher.publish(&mut event);

    let Event::CapabilityResponse(response) = event else {
        return;
    };

    if response.is_negotiating() && response.is_ending_negotiation() {
        log::debug!("capability negotiation complete");
        state.capabilities.end();
        state.send(proto::command!("CAP", "END"));
    }
}

use crate::isupport::ChannelUserMode;
use crate::registry::Registry;
use crate::server::ServerInfo;

/// Where a message was addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The client itself.
    Private,
    /// A tracked channel, by its tracked name.
    Channel(String),
    /// A tracked channel behind a status prefix, e.g. `@#channel`.
    TargetedChannel {
        channel: String,
        prefix: ChannelUserMode,
    },
    Unknown,
}

impl Target {
    pub fn resolve(
        target: &str,
        own_nick: &str,
        server: &ServerInfo,
        registry: &Registry,
    ) -> Self {
        if registry.casemap().equals(target, own_nick) {
            return Target::Private;
        }

        let mut chars = target.chars();

        if let Some(symbol) = chars.next() {
            let prefix = server
                .user_mode_for_prefix(symbol)
                .filter(|_| server.statusmsg().contains(&symbol));

            if let (Some(prefix), Some(channel)) = (prefix, registry.channel(chars.as_str())) {
                return Target::TargetedChannel {
                    channel: channel.name().to_string(),
                    prefix,
                };
            }
        }

        match registry.channel(target) {
            Some(channel) => Target::Channel(channel.name().to_string()),
            None => Target::Unknown,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::casemap::CaseMap;

    #[test]
    fn resolve() {
        let mut server = ServerInfo::default();
        let mut registry = Registry::new(CaseMap::Rfc1459);
        registry.channel_track("#Rust");

        let op = ChannelUserMode {
            mode: 'o',
            prefix: '@',
        };

        let tests = [
            ("Me", Target::Private),
            ("me", Target::Private),
            ("#rust", Target::Channel("#Rust".into())),
            ("#RUST", Target::Channel("#Rust".into())),
            (
                "@#rust",
                Target::TargetedChannel {
                    channel: "#Rust".into(),
                    prefix: op,
                },
            ),
            ("@#other", Target::Unknown),
            ("%#rust", Target::Unknown),
            ("#other", Target::Unknown),
            ("someone", Target::Unknown),
            ("@", Target::Unknown),
        ];

        for (target, expected) in tests {
            assert_eq!(
                Target::resolve(target, "me", &server, &registry),
                expected,
                "{target}"
            );
        }

        // Only prefixes that are both targetable and known channel-user-modes
        server.apply("STATUSMSG=+".parse().unwrap());

        assert_eq!(
            Target::resolve("@#rust", "me", &server, &registry),
            Target::Unknown
        );
        assert!(matches!(
            Target::resolve("+#rust", "me", &server, &registry),
            Target::TargetedChannel { prefix, .. } if prefix.mode == 'v'
        ));
    }
}

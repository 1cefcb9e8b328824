use crate::casemap::CaseMap;
use crate::isupport::{self, ChannelModes, ChannelUserMode, ModeClass, Parameter};

/// Facts about the connected server, mostly learned from RPL_MYINFO and ISUPPORT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub address: Option<String>,
    pub version: Option<String>,
    pub motd: Vec<String>,
    pub prefix: Vec<ChannelUserMode>,
    pub chanmodes: ChannelModes,
    pub chantypes: Vec<char>,
    statusmsg: Option<Vec<char>>,
    pub casemap: CaseMap,
    pub whox: bool,
    pub uhnames: bool,
    pub network: Option<String>,
    pub nicklen: Option<u16>,
    pub channellen: Option<u16>,
    pub topiclen: Option<u16>,
    pub modes: Option<u16>,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            address: None,
            version: None,
            motd: vec![],
            prefix: isupport::default_prefix(),
            chanmodes: ChannelModes::default(),
            chantypes: default_chantypes(),
            statusmsg: None,
            casemap: CaseMap::default(),
            whox: false,
            uhnames: false,
            network: None,
            nicklen: None,
            channellen: None,
            topiclen: None,
            modes: None,
        }
    }
}

impl ServerInfo {
    /// A fresh record for a server that just identified itself in RPL_MYINFO.
    pub fn new(address: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            version: Some(version.into()),
            ..Self::default()
        }
    }

    pub fn apply(&mut self, operation: isupport::Operation) {
        match operation {
            isupport::Operation::Add(parameter) => match parameter {
                Parameter::CASEMAPPING(casemap) => self.casemap = casemap,
                Parameter::CHANMODES(chanmodes) => self.chanmodes = chanmodes,
                Parameter::CHANNELLEN(len) => self.channellen = Some(len),
                Parameter::CHANTYPES(chantypes) => self.chantypes = chantypes,
                Parameter::MODES(modes) => self.modes = modes,
                Parameter::NETWORK(network) => self.network = Some(network),
                Parameter::NICKLEN(len) => self.nicklen = Some(len),
                Parameter::PREFIX(prefix) => self.prefix = prefix,
                Parameter::STATUSMSG(statusmsg) => self.statusmsg = Some(statusmsg),
                Parameter::TOPICLEN(len) => self.topiclen = Some(len),
                Parameter::UHNAMES => self.uhnames = true,
                Parameter::WHOX => self.whox = true,
            },
            isupport::Operation::Remove(parameter) => match parameter.as_str() {
                "CASEMAPPING" => self.casemap = CaseMap::default(),
                "CHANMODES" => self.chanmodes = ChannelModes::default(),
                "CHANNELLEN" => self.channellen = None,
                "CHANTYPES" => self.chantypes = default_chantypes(),
                "MODES" => self.modes = None,
                "NETWORK" => self.network = None,
                "NICKLEN" | "MAXNICKLEN" => self.nicklen = None,
                "PREFIX" => self.prefix = isupport::default_prefix(),
                "STATUSMSG" => self.statusmsg = None,
                "TOPICLEN" => self.topiclen = None,
                "UHNAMES" => self.uhnames = false,
                "WHOX" => self.whox = false,
                _ => log::trace!("ignoring removal of ISUPPORT parameter {parameter}"),
            },
        }
    }

    /// Prefixes that may lead a message target. Falls back to every `PREFIX` symbol.
    pub fn statusmsg(&self) -> Vec<char> {
        match &self.statusmsg {
            Some(statusmsg) => statusmsg.clone(),
            None => self.prefix.iter().map(|mode| mode.prefix).collect(),
        }
    }

    pub fn user_mode_for_prefix(&self, prefix: char) -> Option<ChannelUserMode> {
        self.prefix.iter().find(|mode| mode.prefix == prefix).copied()
    }

    pub fn user_mode_for_letter(&self, letter: char) -> Option<ChannelUserMode> {
        self.prefix.iter().find(|mode| mode.mode == letter).copied()
    }

    pub fn mode_class(&self, letter: char) -> Option<ModeClass> {
        if self.user_mode_for_letter(letter).is_some() {
            Some(ModeClass::Prefix)
        } else {
            self.chanmodes.class(letter)
        }
    }

    pub fn is_channel(&self, name: &str) -> bool {
        name.chars()
            .next()
            .is_some_and(|c| self.chantypes.contains(&c))
    }
}

fn default_chantypes() -> Vec<char> {
    vec!['#', '&']
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let server = ServerInfo::default();

        assert_eq!(server.statusmsg(), vec!['@', '+']);
        assert_eq!(server.mode_class('o'), Some(ModeClass::Prefix));
        assert_eq!(server.mode_class('b'), Some(ModeClass::List));
        assert!(server.is_channel("#rust"));
        assert!(server.is_channel("&local"));
        assert!(!server.is_channel("nick"));
        assert!(!server.is_channel(""));
    }

    #[test]
    fn new_resets_learned_parameters() {
        let mut server = ServerInfo::default();
        server.apply("STATUSMSG=@".parse().unwrap());

        let server = ServerInfo::new("irc.example.com", "ircd-1.0");

        assert_eq!(server.address.as_deref(), Some("irc.example.com"));
        assert_eq!(server.version.as_deref(), Some("ircd-1.0"));
        assert_eq!(server.statusmsg(), vec!['@', '+']);
        assert_eq!(server.casemap, CaseMap::Rfc1459);
    }

    #[test]
    fn apply() {
        let mut server = ServerInfo::default();

        for token in ["PREFIX=(ohv)@%+", "CHANTYPES=#", "STATUSMSG=@", "WHOX"] {
            server.apply(token.parse().unwrap());
        }

        assert_eq!(server.statusmsg(), vec!['@']);
        assert_eq!(
            server.user_mode_for_prefix('%'),
            Some(ChannelUserMode {
                mode: 'h',
                prefix: '%'
            })
        );
        assert!(!server.is_channel("&local"));
        assert!(server.whox);

        server.apply("-WHOX".parse().unwrap());
        server.apply("-STATUSMSG".parse().unwrap());

        assert!(!server.whox);
        assert_eq!(server.statusmsg(), vec!['@', '%', '+']);
    }
}

use std::str::FromStr;

use crate::casemap::CaseMap;

#[derive(Debug)]
pub enum Operation {
    Add(Parameter),
    Remove(String),
}

impl FromStr for Operation {
    type Err = &'static str;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.is_empty() {
            return Err("empty ISUPPORT token not allowed");
        }

        if let Some(parameter) = token.strip_prefix('-') {
            return Ok(Operation::Remove(parameter.to_string()));
        }

        let (parameter, value) = token.split_once('=').unwrap_or((token, ""));

        let parameter = match parameter {
            "CASEMAPPING" => Parameter::CASEMAPPING(
                value
                    .parse::<CaseMap>()
                    .map_err(|_| "unknown casemapping")?,
            ),
            "CHANMODES" => Parameter::CHANMODES(parse_channel_modes(value)?),
            "CHANNELLEN" => Parameter::CHANNELLEN(parse_required_positive_integer(value)?),
            "CHANTYPES" => Parameter::CHANTYPES(value.chars().collect()),
            "MODES" => Parameter::MODES(parse_optional_positive_integer(value)?),
            "NETWORK" => Parameter::NETWORK(parse_required_non_empty_string(value)?),
            "NICKLEN" | "MAXNICKLEN" => {
                Parameter::NICKLEN(parse_required_positive_integer(value)?)
            }
            "PREFIX" => Parameter::PREFIX(parse_prefix(value)?),
            "STATUSMSG" => Parameter::STATUSMSG(
                parse_required_non_empty_string(value)?.chars().collect(),
            ),
            "TOPICLEN" => Parameter::TOPICLEN(parse_required_positive_integer(value)?),
            "UHNAMES" => Parameter::UHNAMES,
            "WHOX" => Parameter::WHOX,
            _ => return Err("unknown ISUPPORT parameter"),
        };

        Ok(Operation::Add(parameter))
    }
}

// ISUPPORT Parameter References
// - https://defs.ircdocs.horse/defs/isupport.html
// - https://modern.ircdocs.horse/#rplisupport-005
// - https://ircv3.net/specs/extensions/whox
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Parameter {
    CASEMAPPING(CaseMap),
    CHANMODES(ChannelModes),
    CHANNELLEN(u16),
    CHANTYPES(Vec<char>),
    MODES(Option<u16>),
    NETWORK(String),
    NICKLEN(u16),
    PREFIX(Vec<ChannelUserMode>),
    STATUSMSG(Vec<char>),
    TOPICLEN(u16),
    UHNAMES,
    WHOX,
}

/// A channel-user-mode letter and the status prefix displayed for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelUserMode {
    pub mode: char,
    pub prefix: char,
}

/// How a channel mode letter consumes parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeClass {
    /// Status modes from `PREFIX`, always carry a nick.
    Prefix,
    /// Type A, list modes such as bans.
    List,
    /// Type B, a parameter on set and unset.
    Always,
    /// Type C, a parameter only on set.
    Set,
    /// Type D, never a parameter.
    Flag,
}

impl ModeClass {
    pub fn takes_arg(self, adding: bool) -> bool {
        match self {
            ModeClass::Prefix | ModeClass::List | ModeClass::Always => true,
            ModeClass::Set => adding,
            ModeClass::Flag => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelModes {
    pub list: String,
    pub always: String,
    pub set: String,
    pub flag: String,
}

impl ChannelModes {
    pub fn class(&self, letter: char) -> Option<ModeClass> {
        if self.list.contains(letter) {
            Some(ModeClass::List)
        } else if self.always.contains(letter) {
            Some(ModeClass::Always)
        } else if self.set.contains(letter) {
            Some(ModeClass::Set)
        } else if self.flag.contains(letter) {
            Some(ModeClass::Flag)
        } else {
            None
        }
    }
}

impl Default for ChannelModes {
    fn default() -> Self {
        Self {
            list: "b".into(),
            always: "k".into(),
            set: "l".into(),
            flag: "imnpst".into(),
        }
    }
}

pub fn default_prefix() -> Vec<ChannelUserMode> {
    vec![
        ChannelUserMode {
            mode: 'o',
            prefix: '@',
        },
        ChannelUserMode {
            mode: 'v',
            prefix: '+',
        },
    ]
}

fn parse_channel_modes(value: &str) -> Result<ChannelModes, &'static str> {
    let mut classes = value.split(',');

    // Servers may append further classes; those letters are unknown to us
    match (classes.next(), classes.next(), classes.next(), classes.next()) {
        (Some(list), Some(always), Some(set), Some(flag)) => Ok(ChannelModes {
            list: list.to_string(),
            always: always.to_string(),
            set: set.to_string(),
            flag: flag.to_string(),
        }),
        _ => Err("four channel mode classes required"),
    }
}

fn parse_prefix(value: &str) -> Result<Vec<ChannelUserMode>, &'static str> {
    if value.is_empty() {
        return Ok(vec![]);
    }

    let (modes, prefixes) = value
        .strip_prefix('(')
        .and_then(|value| value.split_once(')'))
        .ok_or("prefix must be formatted as (modes)prefixes")?;

    if modes.chars().count() != prefixes.chars().count() {
        return Err("prefix modes and symbols differ in length");
    }

    Ok(modes
        .chars()
        .zip(prefixes.chars())
        .map(|(mode, prefix)| ChannelUserMode { mode, prefix })
        .collect())
}

fn parse_optional_positive_integer(value: &str) -> Result<Option<u16>, &'static str> {
    if value.is_empty() {
        Ok(None)
    } else if let Ok(value) = value.parse::<u16>() {
        Ok(Some(value))
    } else {
        Err("optional value must be a positive integer if specified")
    }
}

fn parse_required_non_empty_string(value: &str) -> Result<String, &'static str> {
    if value.is_empty() {
        Err("value required")
    } else {
        Ok(value.to_string())
    }
}

fn parse_required_positive_integer(value: &str) -> Result<u16, &'static str> {
    value
        .parse::<u16>()
        .map_err(|_| "value required to be a positive integer")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn operations() {
        let tests = [
            (
                "PREFIX=(qaohv)~&@%+",
                Parameter::PREFIX(vec![
                    ChannelUserMode {
                        mode: 'q',
                        prefix: '~',
                    },
                    ChannelUserMode {
                        mode: 'a',
                        prefix: '&',
                    },
                    ChannelUserMode {
                        mode: 'o',
                        prefix: '@',
                    },
                    ChannelUserMode {
                        mode: 'h',
                        prefix: '%',
                    },
                    ChannelUserMode {
                        mode: 'v',
                        prefix: '+',
                    },
                ]),
            ),
            (
                "CHANMODES=beI,k,l,BCMNORScimnpstz",
                Parameter::CHANMODES(ChannelModes {
                    list: "beI".into(),
                    always: "k".into(),
                    set: "l".into(),
                    flag: "BCMNORScimnpstz".into(),
                }),
            ),
            ("CASEMAPPING=ascii", Parameter::CASEMAPPING(CaseMap::Ascii)),
            ("CHANTYPES=#", Parameter::CHANTYPES(vec!['#'])),
            ("STATUSMSG=@+", Parameter::STATUSMSG(vec!['@', '+'])),
            ("NICKLEN=30", Parameter::NICKLEN(30)),
            ("MODES", Parameter::MODES(None)),
            ("WHOX", Parameter::WHOX),
        ];

        for (token, expected) in tests {
            match token.parse::<Operation>() {
                Ok(Operation::Add(parameter)) => assert_eq!(parameter, expected),
                other => panic!("{token}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn invalid() {
        let tests = [
            "",
            "PREFIX=ov@+",
            "PREFIX=(ov)@",
            "CHANMODES=b,k",
            "NICKLEN=abc",
            "NETWORK",
            "CASEMAPPING=rfc7613",
            "EXCEPTS",
        ];

        for token in tests {
            assert!(token.parse::<Operation>().is_err(), "{token}");
        }

        assert!(matches!(
            "-WHOX".parse::<Operation>(),
            Ok(Operation::Remove(parameter)) if parameter == "WHOX"
        ));
    }

    #[test]
    fn mode_classes() {
        let modes = ChannelModes::default();

        assert_eq!(modes.class('b'), Some(ModeClass::List));
        assert_eq!(modes.class('k'), Some(ModeClass::Always));
        assert_eq!(modes.class('l'), Some(ModeClass::Set));
        assert_eq!(modes.class('t'), Some(ModeClass::Flag));
        assert_eq!(modes.class('Z'), None);
        assert!(ModeClass::Set.takes_arg(true));
        assert!(!ModeClass::Set.takes_arg(false));
    }
}

use std::collections::HashSet;

use indexmap::IndexMap;
use strum::{Display, EnumString};

/// Capabilities the client knows how to use.
pub const RECOGNIZED: &[&str] = &[
    "account-notify",
    "away-notify",
    "extended-join",
    "multi-prefix",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Negotiation {
    #[default]
    Idle,
    Negotiating,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Subcommand {
    Ls,
    List,
    Ack,
    Nak,
    New,
    Del,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub name: String,
    pub enabled: bool,
    /// Value advertised with CAP 302, e.g. `sasl=PLAIN,EXTERNAL`.
    pub value: Option<String>,
}

impl Capability {
    pub fn parse(token: &str) -> Self {
        let (enabled, token) = match token.strip_prefix('-') {
            Some(token) => (false, token),
            None => (true, token),
        };
        let (name, value) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (token, None),
        };

        Self {
            name: name.to_string(),
            enabled,
            value,
        }
    }

    pub fn parse_list(list: &str) -> Vec<Self> {
        list.split_whitespace().map(Self::parse).collect()
    }
}

/// Capability negotiation state: what the server supports, what it listed,
/// what was negotiated and what is still awaiting an answer.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    negotiation: Negotiation,
    wanted: Vec<String>,
    negotiated: IndexMap<String, Capability>,
    supported: IndexMap<String, Capability>,
    listed: IndexMap<String, Capability>,
    requested: HashSet<String>,
    ls_pending: bool,
    list_pending: bool,
}

impl Capabilities {
    /// Only recognized capabilities that are also configured are ever requested.
    pub fn new(configured: &[String]) -> Self {
        let wanted = RECOGNIZED
            .iter()
            .filter(|name| configured.iter().any(|cap| cap == *name))
            .map(ToString::to_string)
            .collect();

        Self {
            wanted,
            ..Self::default()
        }
    }

    pub fn negotiation(&self) -> Negotiation {
        self.negotiation
    }

    pub fn is_negotiating(&self) -> bool {
        self.negotiation == Negotiation::Negotiating
    }

    /// No requested capability is awaiting ACK/NAK and no LS continuation is pending.
    pub fn ending_negotiation(&self) -> bool {
        self.requested.is_empty() && !self.ls_pending
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.negotiated.get(name).is_some_and(|cap| cap.enabled)
    }

    pub fn negotiated(&self) -> Vec<Capability> {
        self.negotiated.values().cloned().collect()
    }

    pub fn supported(&self) -> Vec<Capability> {
        self.supported.values().cloned().collect()
    }

    pub fn listed(&self) -> Vec<Capability> {
        self.listed.values().cloned().collect()
    }

    pub fn begin(&mut self) {
        if self.negotiation == Negotiation::Idle {
            self.negotiation = Negotiation::Negotiating;
        }
    }

    pub fn end(&mut self) {
        self.negotiation = Negotiation::Ended;
    }

    /// Records an LS line, returning the capabilities to request once the listing is complete.
    pub fn ls(&mut self, caps: Vec<Capability>, more: bool) -> Vec<String> {
        self.begin();

        if !self.ls_pending {
            self.supported.clear();
        }
        self.supported
            .extend(caps.into_iter().map(|cap| (cap.name.clone(), cap)));
        self.ls_pending = more;

        if more {
            return vec![];
        }

        let available = self
            .supported
            .values()
            .filter(|cap| cap.enabled)
            .map(|cap| cap.name.clone())
            .collect::<Vec<_>>();

        self.request(&available)
    }

    pub fn list(&mut self, caps: Vec<Capability>, more: bool) {
        if !self.list_pending {
            self.listed.clear();
        }
        self.listed
            .extend(caps.into_iter().map(|cap| (cap.name.clone(), cap)));
        self.list_pending = more;
    }

    pub fn ack(&mut self, caps: &[Capability]) {
        for cap in caps {
            self.requested.remove(&cap.name);
            self.negotiated.insert(cap.name.clone(), cap.clone());
        }
    }

    pub fn nak(&mut self, caps: &[Capability]) {
        for cap in caps {
            self.requested.remove(&cap.name);
        }
    }

    /// Records CAP NEW, returning newly available capabilities to request.
    pub fn add(&mut self, caps: &[Capability]) -> Vec<String> {
        self.supported
            .extend(caps.iter().map(|cap| (cap.name.clone(), cap.clone())));

        let available = caps
            .iter()
            .filter(|cap| cap.enabled)
            .map(|cap| cap.name.clone())
            .collect::<Vec<_>>();

        self.request(&available)
    }

    pub fn remove(&mut self, caps: &[Capability]) {
        for cap in caps {
            self.supported.shift_remove(&cap.name);
            self.negotiated.shift_remove(&cap.name);
            self.requested.remove(&cap.name);
        }
    }

    fn request(&mut self, available: &[String]) -> Vec<String> {
        let request = self
            .wanted
            .iter()
            .filter(|name| available.contains(name))
            .filter(|name| !self.is_enabled(name) && !self.requested.contains(*name))
            .cloned()
            .collect::<Vec<_>>();

        self.requested.extend(request.iter().cloned());

        request
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn configured() -> Vec<String> {
        RECOGNIZED.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parse() {
        assert_eq!(
            Capability::parse("sasl=PLAIN,EXTERNAL"),
            Capability {
                name: "sasl".into(),
                enabled: true,
                value: Some("PLAIN,EXTERNAL".into()),
            }
        );
        assert_eq!(
            Capability::parse("-multi-prefix"),
            Capability {
                name: "multi-prefix".into(),
                enabled: false,
                value: None,
            }
        );
        assert_eq!("ls".parse::<Subcommand>(), Ok(Subcommand::Ls));
        assert_eq!(Subcommand::Nak.to_string(), "NAK");
    }

    #[test]
    fn negotiation() {
        let mut caps = Capabilities::new(&configured());
        assert_eq!(caps.negotiation(), Negotiation::Idle);

        let request = caps.ls(Capability::parse_list("sasl multi-prefix"), true);
        assert!(request.is_empty());
        assert!(caps.is_negotiating());
        assert!(!caps.ending_negotiation());

        let request = caps.ls(Capability::parse_list("away-notify chghost"), false);
        assert_eq!(request, vec!["away-notify", "multi-prefix"]);
        assert_eq!(caps.supported().len(), 4);
        assert!(!caps.ending_negotiation());

        caps.ack(&Capability::parse_list("multi-prefix"));
        assert!(!caps.ending_negotiation());

        caps.nak(&Capability::parse_list("away-notify"));
        assert!(caps.ending_negotiation());
        assert!(caps.is_enabled("multi-prefix"));
        assert!(!caps.is_enabled("away-notify"));
        assert_eq!(caps.negotiated().len(), 1);
    }

    #[test]
    fn only_configured_are_requested() {
        let mut caps = Capabilities::new(&["extended-join".to_string(), "sasl".to_string()]);

        let request = caps.ls(
            Capability::parse_list("sasl extended-join account-notify"),
            false,
        );

        assert_eq!(request, vec!["extended-join"]);
    }

    #[test]
    fn new_and_del() {
        let mut caps = Capabilities::new(&configured());
        caps.ls(vec![], false);
        assert!(caps.ending_negotiation());

        let request = caps.add(&Capability::parse_list("account-notify"));
        assert_eq!(request, vec!["account-notify"]);

        caps.ack(&Capability::parse_list("account-notify"));
        assert!(caps.is_enabled("account-notify"));

        caps.remove(&Capability::parse_list("account-notify"));
        assert!(!caps.is_enabled("account-notify"));
        assert!(caps.supported().is_empty());
    }

    #[test]
    fn ack_of_disabled_capability() {
        let mut caps = Capabilities::new(&configured());
        caps.ack(&Capability::parse_list("multi-prefix"));
        caps.ack(&Capability::parse_list("-multi-prefix"));

        assert!(!caps.is_enabled("multi-prefix"));
    }
}

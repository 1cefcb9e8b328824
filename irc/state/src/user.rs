use chrono::Utc;

use crate::snapshot;

/// A live user, owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub(crate) nick: String,
    pub(crate) ident: Option<String>,
    pub(crate) host: Option<String>,
    pub(crate) account: Option<String>,
    pub(crate) real_name: Option<String>,
    pub(crate) away: bool,
    pub(crate) server: Option<String>,
}

impl User {
    pub fn new(mask: &proto::User) -> Self {
        Self {
            nick: mask.nickname.clone(),
            ident: mask.username.clone(),
            host: mask.hostname.clone(),
            account: None,
            real_name: None,
            away: false,
            server: None,
        }
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Fills in the parts of the mask we learned, keeping what we already know otherwise.
    pub fn update_mask(&mut self, mask: &proto::User) {
        if let Some(ident) = &mask.username {
            self.ident = Some(ident.clone());
        }
        if let Some(host) = &mask.hostname {
            self.host = Some(host.clone());
        }
    }

    pub fn snapshot(&self) -> snapshot::User {
        snapshot::User {
            nick: self.nick.clone(),
            ident: self.ident.clone(),
            host: self.host.clone(),
            account: self.account.clone(),
            real_name: self.real_name.clone(),
            away: self.away,
            server: self.server.clone(),
            captured: Utc::now(),
        }
    }
}

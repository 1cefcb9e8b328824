pub use self::client::{Client, State};
pub use self::config::Config;
pub use self::error::Error;
pub use self::event::{Bus, Event, Observer, Publish};
pub use self::snapshot::Actor;
pub use self::target::Target;

pub mod cap;
pub mod casemap;
pub mod channel;
pub mod client;
pub mod config;
pub mod ctcp;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod isupport;
pub mod list;
pub mod mode;
pub mod registry;
pub mod server;
pub mod snapshot;
pub mod target;
pub mod user;

mod handler;

/// A message the client could not make sense of. Each variant carries the raw
/// line for diagnosing a non-conformant server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("malformed length: {description} ({raw})")]
    MalformedLength { raw: String, description: String },
    #[error("invalid target: {description} ({raw})")]
    InvalidTarget { raw: String, description: String },
    #[error("invalid actor kind: {description} ({raw})")]
    InvalidActorKind { raw: String, description: String },
    #[error("malformed mode string: {description} ({raw})")]
    MalformedModeString { raw: String, description: String },
    #[error("malformed argument: {description} ({raw})")]
    MalformedArgument { raw: String, description: String },
}

impl Error {
    pub fn raw(&self) -> &str {
        match self {
            Error::MalformedLength { raw, .. }
            | Error::InvalidTarget { raw, .. }
            | Error::InvalidActorKind { raw, .. }
            | Error::MalformedModeString { raw, .. }
            | Error::MalformedArgument { raw, .. } => raw,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Error::MalformedLength { description, .. }
            | Error::InvalidTarget { description, .. }
            | Error::InvalidActorKind { description, .. }
            | Error::MalformedModeString { description, .. }
            | Error::MalformedArgument { description, .. } => description,
        }
    }

    pub(crate) fn malformed_length(message: &proto::Message, expected: usize) -> Self {
        Error::MalformedLength {
            raw: message.raw.clone(),
            description: format!(
                "{} expects at least {expected} arguments, got {}",
                message.command,
                message.params.len()
            ),
        }
    }

    pub(crate) fn invalid_target(message: &proto::Message, target: &str) -> Self {
        Error::InvalidTarget {
            raw: message.raw.clone(),
            description: format!("{target} is not a known target for {}", message.command),
        }
    }

    pub(crate) fn invalid_actor_kind(message: &proto::Message, expected: &str) -> Self {
        Error::InvalidActorKind {
            raw: message.raw.clone(),
            description: format!("{} requires a {expected} source", message.command),
        }
    }

    pub(crate) fn malformed_mode_string(message: &proto::Message, description: String) -> Self {
        Error::MalformedModeString {
            raw: message.raw.clone(),
            description,
        }
    }

    pub(crate) fn malformed_timestamp(message: &proto::Message, argument: &str) -> Self {
        Error::MalformedArgument {
            raw: message.raw.clone(),
            description: format!("{argument} is not a unix timestamp"),
        }
    }
}

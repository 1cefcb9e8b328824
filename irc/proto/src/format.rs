use std::fmt::Write;

use itertools::Itertools;

use crate::{Message, Tag};

/// Most IRC servers limit messages to 512 bytes in length, including the trailing CR-LF characters.
pub const BYTE_LIMIT: usize = 512;

/// Formats a message for the wire, CR-LF included.
pub fn message(message: &Message) -> String {
    let mut output = line(message);
    output.push_str("\r\n");
    output
}

/// Formats a message without its line terminator.
pub fn line(message: &Message) -> String {
    let mut output = String::with_capacity(BYTE_LIMIT);

    if !message.tags.is_empty() {
        let _ = write!(&mut output, "@{} ", message.tags.iter().map(tag).join(";"));
    }

    let _ = write!(&mut output, "{}", message.command);

    if !message.params.is_empty() {
        let _ = write!(&mut output, " {}", parameters(&message.params));
    }

    output
}

fn tag(tag: &Tag) -> String {
    let Some(value) = tag.value.as_deref().filter(|value| !value.is_empty()) else {
        return tag.key.clone();
    };

    let mappings = [
        ('\\', r"\\"),
        (';', r"\:"),
        (' ', r"\s"),
        ('\r', r"\r"),
        ('\n', r"\n"),
    ];

    let escaped = mappings
        .into_iter()
        .fold(value.to_string(), |value, (from, to)| value.replace(from, to));

    format!("{}={escaped}", tag.key)
}

fn parameters(parameters: &[String]) -> String {
    let last = parameters.len() - 1;

    parameters
        .iter()
        .enumerate()
        .map(|(index, param)| {
            if index == last {
                trailing(param)
            } else {
                param.clone()
            }
        })
        .join(" ")
}

fn trailing(parameter: &str) -> String {
    if parameter.contains(' ') || parameter.is_empty() || parameter.starts_with(':') {
        format!(":{parameter}")
    } else {
        parameter.to_string()
    }
}

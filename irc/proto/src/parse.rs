use std::string::FromUtf8Error;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{alpha1, char, none_of, one_of, satisfy};
use nom::combinator::{all_consuming, map, opt, peek, recognize, verify};
use nom::multi::{many0, many0_count, many1_count, many_m_n};
use nom::sequence::{preceded, terminated, tuple};
use nom::{Finish, IResult};

use crate::{Command, Message, Source, Tag, User};

pub fn message_bytes(bytes: Vec<u8>) -> Result<Message, Error> {
    let input = String::from_utf8(bytes)?;
    message(&input)
}

/// Parses a single IRC line. The CR-LF terminator is optional.
pub fn message(input: &str) -> Result<Message, Error> {
    // Some servers send an extra \r before the terminator
    let raw = input.trim_end_matches(['\r', '\n']);

    let mut line = all_consuming(tuple((
        opt(tags),
        opt(source),
        command,
        // Tolerate whitespace between the last parameter and the terminator
        many0_count(char(' ')),
    )));

    line(raw)
        .finish()
        .map(|(_, (tags, source, (command, params), _))| Message {
            tags: tags.unwrap_or_default(),
            source,
            command,
            params,
            raw: raw.to_string(),
        })
        .map_err(|e| Error::Parse {
            input: input.to_string(),
            nom: e.to_string(),
        })
}

fn tags(input: &str) -> IResult<&str, Vec<Tag>> {
    // '@' <tag> [';' <tag>]* <SPACE>
    let (input, tags) = preceded(char('@'), terminated(take_while1(|c| c != ' '), space))(input)?;

    let tags = tags
        .split(';')
        .filter(|tag| !tag.is_empty())
        .map(|tag| match tag.split_once('=') {
            Some((key, value)) => Tag {
                key: key.to_string(),
                value: Some(unescape(value)),
            },
            None => Tag {
                key: tag.to_string(),
                value: None,
            },
        })
        .collect();

    Ok((input, tags))
}

fn unescape(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }

        match chars.next() {
            Some(':') => output.push(';'),
            Some('s') => output.push(' '),
            Some('r') => output.push('\r'),
            Some('n') => output.push('\n'),
            Some(other) => output.push(other),
            // drop trailing escape char '\'
            None => {}
        }
    }

    output
}

fn source(input: &str) -> IResult<&str, Source> {
    // <servername> / <user>
    let source = alt((
        map(terminated(user, peek(space)), Source::User),
        // Default all non-valid users to server
        map(
            terminated(recognize(many1_count(none_of(" "))), peek(space)),
            |host| Source::Server(host.to_string()),
        ),
    ));
    // ':' <source> <SPACE>
    terminated(preceded(char(':'), source), space)(input)
}

fn command(input: &str) -> IResult<&str, (Command, Vec<String>)> {
    // <sequence of any characters except NUL, CR, LF, colon (`:`) and SPACE>
    let nospcrlfcl = |input| recognize(many1_count(none_of("\0\r\n: ")))(input);
    // *( ":" / " " / nospcrlfcl )
    let trailing = recognize(many0_count(alt((tag(":"), tag(" "), nospcrlfcl))));
    // nospcrlfcl *( ":" / nospcrlfcl )
    let middle = recognize(tuple((
        nospcrlfcl,
        many0_count(alt((tag(":"), nospcrlfcl))),
    )));
    // *( SPACE middle ) [ SPACE ":" trailing ]
    let parameters = tuple((
        many0(preceded(space, middle)),
        opt(preceded(space, preceded(char(':'), trailing))),
    ));
    // letter* / 3digit
    let command = alt((
        alpha1,
        recognize(many_m_n(3, 3, satisfy(|c| c.is_ascii_digit()))),
    ));

    let (input, (command, (leading, trailing))) = tuple((command, parameters))(input)?;

    let parameters = leading
        .into_iter()
        .chain(trailing)
        .map(String::from)
        .collect();

    Ok((input, (Command::new(command), parameters)))
}

fn space(input: &str) -> IResult<&str, ()> {
    map(many1_count(char(' ')), |_| ())(input)
}

fn user(input: &str) -> IResult<&str, User> {
    let username = recognize(many1_count(none_of("\0\r\n @")));
    let special = |input| one_of("-[]\\`_^{|}*/@")(input);
    let strict_nick = recognize(many1_count(alt((
        satisfy(|c| c.is_ascii_alphanumeric()),
        special,
    ))));
    // Bridged nicks such as `foo:matrix.org` are only accepted when followed by `!`,
    // so server names and addresses don't match as users
    let bridged_nick = verify(
        recognize(terminated(
            many1_count(alt((
                satisfy(|c| c.is_ascii_alphanumeric()),
                special,
                one_of(":."),
            ))),
            peek(char('!')),
        )),
        |s: &str| s.contains(':') && s.contains('.'),
    );
    let nickname = alt((bridged_nick, strict_nick));
    let hostname = recognize(many1_count(none_of(" ")));

    // <nickname> [ "!" <user> ] [ "@" <host> ]
    map(
        tuple((
            nickname,
            opt(preceded(char('!'), username)),
            opt(preceded(char('@'), hostname)),
        )),
        |(nickname, username, hostname): (&str, Option<&str>, Option<&str>)| User {
            nickname: nickname.to_string(),
            username: username.map(ToString::to_string),
            hostname: hostname.map(ToString::to_string),
        },
    )(input)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parsing failed: {:?}", input)]
    Parse { input: String, nom: String },
    #[error("invalid utf-8 encoding")]
    InvalidUtf8(#[from] FromUtf8Error),
}

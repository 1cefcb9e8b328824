use strum::{Display, EnumString};

/// Nick and channel name folding announced through `CASEMAPPING`.
///
/// Reference: https://modern.ircdocs.horse/#casemapping-parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum CaseMap {
    #[strum(serialize = "ascii")]
    Ascii,
    #[default]
    #[strum(serialize = "rfc1459")]
    Rfc1459,
    #[strum(to_string = "strict-rfc1459", serialize = "rfc1459-strict")]
    StrictRfc1459,
}

impl CaseMap {
    pub fn fold(self, name: &str) -> String {
        name.chars().map(|c| self.fold_char(c)).collect()
    }

    pub fn equals(self, a: &str, b: &str) -> bool {
        a.len() == b.len()
            && a.chars()
                .zip(b.chars())
                .all(|(a, b)| self.fold_char(a) == self.fold_char(b))
    }

    fn fold_char(self, c: char) -> char {
        match (self, c) {
            (_, 'A'..='Z') => c.to_ascii_lowercase(),
            (CaseMap::Rfc1459 | CaseMap::StrictRfc1459, '[') => '{',
            (CaseMap::Rfc1459 | CaseMap::StrictRfc1459, ']') => '}',
            (CaseMap::Rfc1459 | CaseMap::StrictRfc1459, '\\') => '|',
            (CaseMap::Rfc1459, '~') => '^',
            _ => c,
        }
    }
}

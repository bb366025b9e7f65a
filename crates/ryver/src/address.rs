//! Channel addresses: tagged references to a messaging target.
//!
//! The serialized form is a one-letter kind tag followed by a decimal id
//! with no separator (`"F1042"`). This string is the only identity used to
//! route both inbound categorization and outbound sends.

use std::fmt;

/// The five entity kinds a message can be addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Forum,
    Workroom,
    User,
    Post,
    Task,
}

impl ChannelKind {
    /// One-letter tag used in the serialized address form.
    pub fn tag(self) -> char {
        match self {
            Self::Forum => 'F',
            Self::Workroom => 'W',
            Self::User => 'U',
            Self::Post => 'P',
            Self::Task => 'T',
        }
    }

    fn from_tag(tag: char) -> Option<Self> {
        Some(match tag {
            'F' => Self::Forum,
            'W' => Self::Workroom,
            'U' => Self::User,
            'P' => Self::Post,
            'T' => Self::Task,
            _ => return None,
        })
    }
}

/// A decoded channel address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelAddress {
    pub kind: ChannelKind,
    pub id: u64,
}

impl ChannelAddress {
    pub fn new(kind: ChannelKind, id: u64) -> Self {
        Self { kind, id }
    }

    /// Decode a serialized address.
    ///
    /// Returns `None` for anything that is not a well-formed address: fewer
    /// than two characters, an unknown leading tag, or a non-numeric
    /// remainder. Upstream callers pass arbitrary strings here, so every
    /// outbound send decodes defensively.
    pub fn parse(address: &str) -> Option<Self> {
        let mut chars = address.chars();
        let kind = ChannelKind::from_tag(chars.next()?)?;
        let rest = chars.as_str();
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let id = rest.parse().ok()?;
        Some(Self { kind, id })
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.tag(), self.id)
    }
}

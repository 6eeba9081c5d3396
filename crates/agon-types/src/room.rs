//! Fan-out rooms and their canonical names.

use crate::address::normalize_address;

/// A room that connections can join to receive events.
///
/// The canonical wire name doubles as the registry key: `global`,
/// `tournament:{id}`, `match:{id}` and `agent:{address}`. Agent rooms always
/// carry the lowercase address so mixed-case producers and subscribers land
/// in the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    /// Platform-wide announcements. Every connection is a member.
    Global,
    /// All activity for one tournament.
    Tournament(u64),
    /// Turn-by-turn activity for one match, including spectator chat.
    Match(u64),
    /// Events concerning a single agent.
    Agent(String),
}

impl Room {
    /// Creates an agent room, lowercasing the address.
    pub fn agent(address: impl AsRef<str>) -> Self {
        Room::Agent(normalize_address(address.as_ref()))
    }

    /// Canonical room name used on the wire and as the registry key.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Parses a canonical room name.
    ///
    /// Formats:
    /// - `global`
    /// - `tournament:{id}` with a decimal tournament id
    /// - `match:{id}` with a decimal match id
    /// - `agent:{address}`
    pub fn parse(s: &str) -> Option<Room> {
        if s == "global" {
            return Some(Room::Global);
        }
        let (prefix, rest) = s.split_once(':')?;
        match prefix {
            "tournament" => rest.parse().ok().map(Room::Tournament),
            "match" => rest.parse().ok().map(Room::Match),
            "agent" if !rest.is_empty() => Some(Room::agent(rest)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Room::Global => write!(f, "global"),
            Room::Tournament(id) => write!(f, "tournament:{}", id),
            Room::Match(id) => write!(f, "match:{}", id),
            Room::Agent(address) => write!(f, "agent:{}", address),
        }
    }
}

//! Parsing the reply to the `list` command.
//!
//! Minecraft answers `list` with free text:
//!
//! ```text
//! There are 2 of a max of 20 players online: alice, bob
//! There are 0 of a max of 20 players online:
//! ```
//!
//! Parsing is fail-safe. A reply that does not look like this reads as
//! nobody online, because a cosmetic change in the server's wording must
//! not block the shutdown logic downstream.

use std::sync::LazyLock;

use idlewatch_protocol::PlayerList;
use regex::Regex;

static LIST_REPLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)There are (\d+) of a max(?: of)? (\d+) players online:?(.*)")
        .expect("static regex compiles")
});

/// Extracts the player count and names from a `list` reply.
///
/// Names are split on commas and trimmed; empty tokens are dropped.
/// Names are only read when the count is positive, and a positive count
/// with no names keeps the count with an empty list.
pub fn parse_roster(reply: &str) -> PlayerList {
    let Some(caps) = LIST_REPLY.captures(reply.trim()) else {
        return PlayerList::default();
    };
    let Ok(count) = caps[1].parse::<u32>() else {
        return PlayerList::default();
    };
    let max_players = caps[2].parse::<u32>().ok();

    let players = if count > 0 {
        caps[3]
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    PlayerList {
        count,
        max_players,
        players,
    }
}

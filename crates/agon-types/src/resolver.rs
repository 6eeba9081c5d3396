//! Event-to-room routing.
//!
//! `rooms_for` is the one place that decides which rooms an event reaches.
//! Producers never pick rooms by hand; they emit a [`GameEvent`] and the
//! resolver derives the fan-out set.

use crate::event::GameEvent;
use crate::room::Room;

/// Rooms an event fans out to, in first-occurrence order with duplicates
/// removed. Never empty.
///
/// Routing rules:
/// - match lifecycle events reach the match room, the owning tournament room
///   when the match is part of one, and each participant's agent room
/// - `match:turnPlayed` stays in the match room so per-turn traffic never
///   floods tournament spectators
/// - `tournament:created` and `tournament:completed` also reach `global`
/// - Elo updates reach `global` and the agent's own room
/// - evolution updates are platform-wide
/// - a2a messages reach both endpoints' agent rooms
/// - chat messages and clears stay in their match room
pub fn rooms_for(event: &GameEvent) -> Vec<Room> {
    let mut rooms = Vec::new();
    match event {
        GameEvent::MatchCreated(data) | GameEvent::MatchStarted(data) => {
            push_unique(&mut rooms, Room::Match(data.match_id));
            if let Some(tournament_id) = data.tournament_id {
                push_unique(&mut rooms, Room::Tournament(tournament_id));
            }
            for agent in &data.agents {
                push_unique(&mut rooms, Room::agent(agent));
            }
        }
        GameEvent::MatchTurnPlayed(data) => {
            push_unique(&mut rooms, Room::Match(data.match_id));
        }
        GameEvent::MatchCompleted(data) => {
            push_unique(&mut rooms, Room::Match(data.match_id));
            if let Some(tournament_id) = data.tournament_id {
                push_unique(&mut rooms, Room::Tournament(tournament_id));
            }
            for agent in &data.agents {
                push_unique(&mut rooms, Room::agent(agent));
            }
        }
        GameEvent::TournamentCreated(data) => {
            push_unique(&mut rooms, Room::Global);
            push_unique(&mut rooms, Room::Tournament(data.tournament_id));
        }
        GameEvent::TournamentRoundCompleted(data) => {
            push_unique(&mut rooms, Room::Tournament(data.tournament_id));
        }
        GameEvent::TournamentCompleted(data) => {
            push_unique(&mut rooms, Room::Global);
            push_unique(&mut rooms, Room::Tournament(data.tournament_id));
        }
        GameEvent::AgentEloUpdated(data) => {
            push_unique(&mut rooms, Room::Global);
            push_unique(&mut rooms, Room::agent(&data.address));
        }
        GameEvent::EvolutionParametersChanged(_) => {
            push_unique(&mut rooms, Room::Global);
        }
        GameEvent::A2aMessage(data) => {
            push_unique(&mut rooms, Room::agent(&data.from));
            push_unique(&mut rooms, Room::agent(&data.to));
        }
        GameEvent::ChatMessage(message) => {
            push_unique(&mut rooms, Room::Match(message.match_id));
        }
        GameEvent::ChatCleared(data) => {
            push_unique(&mut rooms, Room::Match(data.match_id));
        }
    }
    rooms
}

fn push_unique(rooms: &mut Vec<Room>, room: Room) {
    if !rooms.contains(&room) {
        rooms.push(room);
    }
}

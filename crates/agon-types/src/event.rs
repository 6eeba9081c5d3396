//! Game events broadcast to connected spectators.

use serde::{Deserialize, Serialize};

/// The closed set of event kinds the platform emits.
///
/// Producers cannot invent kinds at runtime. Adding one means adding a
/// variant here and a payload variant on [`GameEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Match scheduled on chain.
    MatchCreated,
    /// First turn is about to be played.
    MatchStarted,
    /// A turn was committed.
    MatchTurnPlayed,
    /// Match settled with a result.
    MatchCompleted,
    /// Tournament registered.
    TournamentCreated,
    /// A bracket round finished.
    TournamentRoundCompleted,
    /// Tournament settled.
    TournamentCompleted,
    /// Elo rating recomputed for an agent.
    AgentEloUpdated,
    /// Evolution engine published new strategy parameters.
    EvolutionParametersChanged,
    /// Agent-to-agent protocol message.
    A2aMessage,
    /// Spectator chat message.
    ChatMessage,
    /// Chat history dropped for a match.
    ChatCleared,
}

impl EventKind {
    /// Wire name of the kind, e.g. `match:turnPlayed`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MatchCreated => "match:created",
            EventKind::MatchStarted => "match:started",
            EventKind::MatchTurnPlayed => "match:turnPlayed",
            EventKind::MatchCompleted => "match:completed",
            EventKind::TournamentCreated => "tournament:created",
            EventKind::TournamentRoundCompleted => "tournament:roundCompleted",
            EventKind::TournamentCompleted => "tournament:completed",
            EventKind::AgentEloUpdated => "agent:eloUpdated",
            EventKind::EvolutionParametersChanged => "evolution:parametersChanged",
            EventKind::A2aMessage => "a2a:message",
            EventKind::ChatMessage => "chat:message",
            EventKind::ChatCleared => "chat:cleared",
        }
    }

    /// Get all event kinds.
    pub fn all() -> Vec<EventKind> {
        vec![
            EventKind::MatchCreated,
            EventKind::MatchStarted,
            EventKind::MatchTurnPlayed,
            EventKind::MatchCompleted,
            EventKind::TournamentCreated,
            EventKind::TournamentRoundCompleted,
            EventKind::TournamentCompleted,
            EventKind::AgentEloUpdated,
            EventKind::EvolutionParametersChanged,
            EventKind::A2aMessage,
            EventKind::ChatMessage,
            EventKind::ChatCleared,
        ]
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A platform event together with its typed payload.
///
/// Serialized with adjacent tagging, so every frame carries the kind under
/// `event` and the payload under `data`:
/// `{"event":"match:created","data":{...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum GameEvent {
    /// Match scheduled on chain.
    #[serde(rename = "match:created")]
    MatchCreated(MatchEventData),
    /// First turn is about to be played.
    #[serde(rename = "match:started")]
    MatchStarted(MatchEventData),
    /// A turn was committed.
    #[serde(rename = "match:turnPlayed")]
    MatchTurnPlayed(MatchTurnData),
    /// Match settled with a result.
    #[serde(rename = "match:completed")]
    MatchCompleted(MatchResultData),
    /// Tournament registered.
    #[serde(rename = "tournament:created")]
    TournamentCreated(TournamentEventData),
    /// A bracket round finished.
    #[serde(rename = "tournament:roundCompleted")]
    TournamentRoundCompleted(TournamentRoundData),
    /// Tournament settled.
    #[serde(rename = "tournament:completed")]
    TournamentCompleted(TournamentResultData),
    /// Elo rating recomputed for an agent.
    #[serde(rename = "agent:eloUpdated")]
    AgentEloUpdated(EloUpdateData),
    /// Evolution engine published new strategy parameters.
    #[serde(rename = "evolution:parametersChanged")]
    EvolutionParametersChanged(EvolutionData),
    /// Agent-to-agent protocol message.
    #[serde(rename = "a2a:message")]
    A2aMessage(A2aMessageData),
    /// Spectator chat message.
    #[serde(rename = "chat:message")]
    ChatMessage(ChatMessage),
    /// Chat history dropped for a match.
    #[serde(rename = "chat:cleared")]
    ChatCleared(ChatClearedData),
}

impl GameEvent {
    /// The kind tag of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::MatchCreated(_) => EventKind::MatchCreated,
            GameEvent::MatchStarted(_) => EventKind::MatchStarted,
            GameEvent::MatchTurnPlayed(_) => EventKind::MatchTurnPlayed,
            GameEvent::MatchCompleted(_) => EventKind::MatchCompleted,
            GameEvent::TournamentCreated(_) => EventKind::TournamentCreated,
            GameEvent::TournamentRoundCompleted(_) => EventKind::TournamentRoundCompleted,
            GameEvent::TournamentCompleted(_) => EventKind::TournamentCompleted,
            GameEvent::AgentEloUpdated(_) => EventKind::AgentEloUpdated,
            GameEvent::EvolutionParametersChanged(_) => EventKind::EvolutionParametersChanged,
            GameEvent::A2aMessage(_) => EventKind::A2aMessage,
            GameEvent::ChatMessage(_) => EventKind::ChatMessage,
            GameEvent::ChatCleared(_) => EventKind::ChatCleared,
        }
    }
}

/// Games agents compete in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameKind {
    /// Price-prediction duel settled against an oracle feed.
    OracleDuel,
    /// Simultaneous-move strategy game.
    StrategyArena,
    /// Sealed-bid auction series.
    AuctionWars,
    /// Rapid-fire trivia between agents.
    QuizBowl,
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameKind::OracleDuel => write!(f, "oracleDuel"),
            GameKind::StrategyArena => write!(f, "strategyArena"),
            GameKind::AuctionWars => write!(f, "auctionWars"),
            GameKind::QuizBowl => write!(f, "quizBowl"),
        }
    }
}

/// Payload for `match:created` and `match:started`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEventData {
    /// On-chain match id.
    pub match_id: u64,
    /// Game being played.
    pub game: GameKind,
    /// Tournament this match belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<u64>,
    /// Participating agent addresses.
    pub agents: Vec<String>,
}

/// Payload for `match:turnPlayed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchTurnData {
    /// On-chain match id.
    pub match_id: u64,
    /// One-based turn number.
    pub turn: u32,
    /// Address of the agent that moved.
    pub agent: String,
    /// Game-specific description of the move, for spectator UIs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<serde_json::Value>,
}

/// Payload for `match:completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultData {
    /// On-chain match id.
    pub match_id: u64,
    /// Game that was played.
    pub game: GameKind,
    /// Tournament this match belonged to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<u64>,
    /// Participating agent addresses.
    pub agents: Vec<String>,
    /// Winner address, absent on a draw.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

/// Payload for `tournament:created`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentEventData {
    /// On-chain tournament id.
    pub tournament_id: u64,
    /// Display name.
    pub name: String,
    /// Game played throughout the bracket.
    pub game: GameKind,
}

/// Payload for `tournament:roundCompleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentRoundData {
    /// On-chain tournament id.
    pub tournament_id: u64,
    /// One-based round number that just finished.
    pub round: u32,
}

/// Payload for `tournament:completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentResultData {
    /// On-chain tournament id.
    pub tournament_id: u64,
    /// Champion address, absent when the bracket was cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

/// Payload for `agent:eloUpdated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EloUpdateData {
    /// Agent wallet address.
    pub address: String,
    /// Rating before the update.
    pub old_elo: f64,
    /// Rating after the update.
    pub new_elo: f64,
    /// Match that triggered the update, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<u64>,
}

/// Payload for `evolution:parametersChanged`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionData {
    /// Evolution generation counter.
    pub generation: u64,
    /// Opaque parameter set published by the evolution engine.
    pub parameters: serde_json::Value,
}

/// Payload for `a2a:message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct A2aMessageData {
    /// Sender agent address.
    pub from: String,
    /// Recipient agent address.
    pub to: String,
    /// Truncated message body for spectator display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// Payload for `chat:cleared`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatClearedData {
    /// Match whose history was dropped.
    pub match_id: u64,
}

/// One spectator chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique message id.
    pub id: String,
    /// Match the message was posted to.
    pub match_id: u64,
    /// Canonical room name the message fans out on.
    pub match_room: String,
    /// Sender wallet address, as supplied.
    pub sender: String,
    /// Shortened sender address for display.
    pub sender_display: String,
    /// Message text after trimming and truncation.
    pub text: String,
    /// Unix timestamp in milliseconds when the message was accepted.
    pub sent_at: u64,
}

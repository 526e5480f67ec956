/// Presentation commands emitted by the core.
/// The host loop forwards them to sound and the message line; the renderer
/// reads the world state directly. None of them needs a reply.

use crate::domain::chest::ChestId;
use crate::domain::item::ItemKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    ChestClaimed { chest: ChestId },
    ChestReleased { chest: ChestId },
    ItemRevealed { chest: ChestId, kind: ItemKind },
    PairMatched { first: ChestId, second: ChestId },
    PairMismatched { first: ChestId, second: ChestId },
    PairReturned { first: ChestId, second: ChestId },
    HazardTriggered { chest: ChestId },
    HazardCleared { chest: ChestId },
    TimeChanged { remaining: u32 },
    RoundWon,
    RoundLost,
}

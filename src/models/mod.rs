mod graph;
mod performer;
mod title;
mod tmdb;

pub use graph::{
    CastGraphView, Connection, GraphStats, Hsl, MostConnectedPair, PerformerSummary,
    PlacedPerformer, RankedRecommendation, SessionPhase, SessionStatus, Supporter,
};
pub use performer::{is_voice_role, Appearance, CreditCandidate, Performer, PersonId};
pub use title::{CollectionItem, MediaType, TitleId};
pub use tmdb::{
    ApiCastMember, ApiCombinedCreditsResponse, ApiCreditEntry, ApiCreditsResponse, CastMember,
    CreditEntry,
};

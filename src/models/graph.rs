use serde::{Deserialize, Serialize};

use super::{Performer, PersonId, TitleId};

/// Weighted edge between two performers who share at least one collection item.
///
/// `source` always holds the smaller performer id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub source: PersonId,
    pub target: PersonId,
    pub shared_items: Vec<TitleId>,
    pub weight: usize,
}

impl Connection {
    pub fn involves(&self, id: PersonId) -> bool {
        self.source == id || self.target == id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MostConnectedPair {
    pub source: PerformerSummary,
    pub target: PerformerSummary,
    pub weight: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphStats {
    pub total_performers: usize,
    pub performers_in_multiple_items: usize,
    pub most_connected_pair: Option<MostConnectedPair>,
}

/// Lightweight performer listing used by the top-performers panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformerSummary {
    pub id: PersonId,
    pub name: String,
    pub image: Option<String>,
    pub appearance_count: usize,
}

impl From<&Performer> for PerformerSummary {
    fn from(performer: &Performer) -> Self {
        Self {
            id: performer.id,
            name: performer.name.clone(),
            image: performer.image.clone(),
            appearance_count: performer.appearance_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

/// A displayed performer with its spatial and visual attributes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedPerformer {
    pub id: PersonId,
    pub name: String,
    pub image: Option<String>,
    pub appearance_count: usize,
    pub rank: usize,
    pub is_top: bool,
    pub x: f64,
    pub y: f64,
    /// Render ordering only
    pub depth: f64,
    pub size: f64,
    pub color: Hsl,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Supporter {
    pub performer_id: PersonId,
    pub name: String,
    pub role: String,
}

/// A title recommended because performers from the collection appear in it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedRecommendation {
    pub title_id: TitleId,
    pub name: String,
    pub image: Option<String>,
    pub rating: f64,
    pub vote_count: u32,
    pub supporters: Vec<Supporter>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    FetchingCast,
    ReadyForGraph,
    FetchingRecommendations,
    FullyReady,
}

/// Progress snapshot published while a session runs
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub fetch_progress: u8,
}

/// Everything a client needs to render the performer graph
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CastGraphView {
    pub performers: Vec<PlacedPerformer>,
    pub connections: Vec<Connection>,
    pub top_performers: Vec<PerformerSummary>,
    pub recommendations: Vec<RankedRecommendation>,
    pub stats: GraphStats,
    pub loading: bool,
    pub fetch_progress: u8,
    pub loading_recommendations: bool,
}

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifier for a movie or TV title.
///
/// TMDB numbers movies and series independently, so the media type is part of the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleId {
    Movie(u64),
    Tv(u64),
}

impl Display for TitleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TitleId::Movie(id) => write!(f, "movie:{}", id),
            TitleId::Tv(id) => write!(f, "tv:{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    #[default]
    Tv,
}

impl MediaType {
    /// Path segment used by the upstream API
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    pub fn title_id(&self, id: u64) -> TitleId {
        match self {
            MediaType::Movie => TitleId::Movie(id),
            MediaType::Tv => TitleId::Tv(id),
        }
    }
}

/// One entry of the user's collection, as handed to us by the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionItem {
    pub id: u64,
    #[serde(default)]
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl CollectionItem {
    pub fn title_id(&self) -> TitleId {
        self.media_type.title_id(self.id)
    }
}

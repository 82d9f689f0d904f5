use serde::Deserialize;

use super::{PersonId, TitleId};
use crate::error::AppError;

/// One billed performer of a collection item, as returned by the cast lookup
#[derive(Debug, Clone, PartialEq)]
pub struct CastMember {
    pub id: PersonId,
    pub name: String,
    pub image: Option<String>,
    pub popularity: f64,
    pub department: Option<String>,
    pub character: String,
}

/// One title from a performer's filmography, as returned by the credits lookup
#[derive(Debug, Clone, PartialEq)]
pub struct CreditEntry {
    pub title_id: TitleId,
    pub name: String,
    pub image: Option<String>,
    pub character: String,
    pub rating: f64,
    pub vote_count: u32,
}

/// Response from GET /{movie|tv}/{id}/credits
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCreditsResponse {
    #[serde(default)]
    pub cast: Vec<ApiCastMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub known_for_department: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
}

impl TryFrom<ApiCastMember> for CastMember {
    type Error = AppError;

    fn try_from(member: ApiCastMember) -> Result<Self, Self::Error> {
        if member.name.trim().is_empty() {
            return Err(AppError::InvalidResponse(format!(
                "cast member {} has no name",
                member.id
            )));
        }

        Ok(CastMember {
            id: member.id,
            name: member.name,
            image: member.profile_path,
            popularity: member.popularity.unwrap_or_default(),
            department: member.known_for_department,
            character: member.character.unwrap_or_default(),
        })
    }
}

/// Response from GET /person/{id}/combined_credits
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCombinedCreditsResponse {
    #[serde(default)]
    pub cast: Vec<ApiCreditEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCreditEntry {
    pub id: u64,
    pub media_type: String,
    /// Movie title
    #[serde(default)]
    pub title: Option<String>,
    /// Series name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u32>,
}

impl TryFrom<ApiCreditEntry> for CreditEntry {
    type Error = AppError;

    fn try_from(entry: ApiCreditEntry) -> Result<Self, Self::Error> {
        let title_id = match entry.media_type.as_str() {
            "movie" => TitleId::Movie(entry.id),
            "tv" => TitleId::Tv(entry.id),
            other => {
                return Err(AppError::InvalidResponse(format!(
                    "credit {} has unknown media type '{}'",
                    entry.id, other
                )))
            }
        };

        let name = entry
            .title
            .or(entry.name)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| {
                AppError::InvalidResponse(format!("credit {} has no title", title_id))
            })?;

        Ok(CreditEntry {
            title_id,
            name,
            image: entry.poster_path,
            character: entry.character.unwrap_or_default(),
            rating: entry.vote_average.unwrap_or_default(),
            vote_count: entry.vote_count.unwrap_or_default(),
        })
    }
}

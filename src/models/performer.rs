use serde::{Deserialize, Serialize};

use super::TitleId;

pub type PersonId = u64;

/// Returns true when a role label marks a voice-acting credit
pub fn is_voice_role(role: &str) -> bool {
    role.to_lowercase().contains("voice")
}

/// A person's credit on one collection item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appearance {
    pub performer_id: PersonId,
    pub item_id: TitleId,
    pub title: String,
    pub role: String,
    pub image: Option<String>,
}

impl Appearance {
    pub fn is_voice(&self) -> bool {
        is_voice_role(&self.role)
    }
}

/// A title from a performer's wider filmography that the user does not own yet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditCandidate {
    pub title_id: TitleId,
    pub name: String,
    pub image: Option<String>,
    pub role: String,
    pub rating: f64,
    pub vote_count: u32,
}

/// A person credited on one or more collection items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Performer {
    pub id: PersonId,
    pub name: String,
    pub image: Option<String>,
    pub popularity: f64,
    pub appearances: Vec<Appearance>,
    /// `None` until the credits lookup for this performer has succeeded
    #[serde(default)]
    pub recommendations: Option<Vec<CreditCandidate>>,
}

impl Performer {
    pub fn new(id: PersonId, name: String, image: Option<String>, popularity: f64) -> Self {
        Self {
            id,
            name,
            image,
            popularity,
            appearances: Vec::new(),
            recommendations: None,
        }
    }

    pub fn appearance_count(&self) -> usize {
        self.appearances.len()
    }

    /// Records an appearance unless this item is already credited.
    ///
    /// Returns whether the appearance was added.
    pub fn add_appearance(&mut self, appearance: Appearance) -> bool {
        if self.has_appeared_in(&appearance.item_id) {
            return false;
        }
        self.appearances.push(appearance);
        true
    }

    pub fn has_appeared_in(&self, item_id: &TitleId) -> bool {
        self.appearances.iter().any(|a| &a.item_id == item_id)
    }

    /// Number of appearances whose role is a voice credit
    pub fn voice_appearance_count(&self) -> usize {
        self.appearances.iter().filter(|a| a.is_voice()).count()
    }

    /// Voice credits make up more than half of the recorded appearances
    pub fn is_voice_performer(&self) -> bool {
        self.voice_appearance_count() * 2 > self.appearance_count()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog entry as returned by TVmaze. Treated as an immutable value
/// once fetched; the client never writes shows back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image: Option<ShowImage>,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub premiered: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default, rename = "averageRuntime")]
    pub average_runtime: Option<u32>,
    #[serde(default)]
    pub network: Option<Network>,
    #[serde(default, rename = "webChannel")]
    pub web_channel: Option<Network>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, rename = "officialSite")]
    pub official_site: Option<String>,
}

impl Show {
    pub fn rating_average(&self) -> Option<f64> {
        self.rating.as_ref().and_then(|r| r.average)
    }

    pub fn medium_image(&self) -> Option<&str> {
        self.image.as_ref().and_then(|i| i.medium.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowImage {
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub original: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub average: Option<f64>,
}

/// Broadcast network or web channel. TVmaze returns a larger object; only
/// the name is displayed or persisted alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
}

/// One `/shows/{id}/cast` item: an actor and the character they play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastEntry {
    pub person: Person,
    #[serde(default)]
    pub character: Option<Character>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub image: Option<ShowImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub season: i64,
    // Specials air without an episode number.
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub airdate: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// A persisted snapshot of a show's fields plus the time it was favorited.
/// The serialized field names are the stored format; changing them breaks
/// existing favorites files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image: Option<ShowImage>,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub premiered: Option<String>,
    #[serde(default)]
    pub network: Option<Network>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(rename = "addedDate")]
    pub added_date: DateTime<Utc>,
}

impl FavoriteEntry {
    pub fn from_show(show: &Show, added_date: DateTime<Utc>) -> Self {
        Self {
            id: show.id,
            name: show.name.clone(),
            image: show.image.clone(),
            rating: show.rating.clone(),
            genres: show.genres.clone(),
            status: show.status.clone(),
            summary: show.summary.clone(),
            premiered: show.premiered.clone(),
            network: show.network.clone(),
            language: show.language.clone(),
            runtime: show.runtime,
            added_date,
        }
    }

    pub fn rating_average(&self) -> Option<f64> {
        self.rating.as_ref().and_then(|r| r.average)
    }
}

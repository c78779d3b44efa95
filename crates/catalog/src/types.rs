//! Producer record types.
//!
//! The JSON shape follows the catalog documents the recommender is fed:
//! `_id` and `fullName` at the top level, tag lists that may be missing or
//! `null`, and an optional experience label.
//!
//! ```json
//! {
//!   "_id": "p-17",
//!   "fullName": "Ada Beats",
//!   "genres": ["Hip Hop", "Trap"],
//!   "skills": ["Mixing"],
//!   "tools": null,
//!   "experience": "Expert",
//!   "featuredTracks": ["Intro", { "title": "Night Drive", "artist": "Ada" }]
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A producer as the catalog source supplies it.
///
/// Only `id`, `full_name`, the three tag lists, and `experience` feed the
/// feature encoder. The remaining fields are carried for enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, alias = "name", deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tools: Vec<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub featured_tracks: Vec<FeaturedTrack>,
}

impl ProducerRecord {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_experience(mut self, experience: impl Into<String>) -> Self {
        self.experience = Some(experience.into());
        self
    }

    pub fn with_featured_tracks<I>(mut self, tracks: I) -> Self
    where
        I: IntoIterator<Item = FeaturedTrack>,
    {
        self.featured_tracks = tracks.into_iter().collect();
        self
    }

    /// Featured tracks rendered for display, in declaration order.
    pub fn featured_track_titles(&self) -> Vec<String> {
        self.featured_tracks.iter().map(ToString::to_string).collect()
    }
}

/// A featured track, either a bare title or a `{title, artist}` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeaturedTrack {
    Title(String),
    Detailed {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        artist: Option<String>,
    },
}

impl fmt::Display for FeaturedTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeaturedTrack::Title(title) => f.write_str(title),
            FeaturedTrack::Detailed { title, artist } => write!(
                f,
                "{} - {}",
                artist.as_deref().unwrap_or("Unknown Artist"),
                title.as_deref().unwrap_or("Unknown Track")
            ),
        }
    }
}

/// A `null` list is empty and `null` elements are skipped.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items.into_iter().flatten().collect())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

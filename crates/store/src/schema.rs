use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collection::{GeneratedId, Record};

/// A curated glyph: an SVG image with a title, plus whatever extra fields
/// the caller supplied at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericGlyph {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub svg: String,
    /// Caller-supplied fields outside the fixed shape, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Draft form of [`GenericGlyph`]: everything but the id, which is
/// generated at append time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewGlyph {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub svg: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One recorded dream entry.  The glyph-count map and emotion list are the
/// inputs to the per-user stats fold; both may be empty or absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamSeed {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub g_glyph_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub extracted_emotions: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Draft form of [`DreamSeed`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDream {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub g_glyph_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub extracted_emotions: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Derived per-user aggregate, created lazily on the first dream write and
/// folded in place on every subsequent one.
///
/// The frequency maps are monotonically non-decreasing: each dream entry
/// only ever adds to them, and no correction or deletion path exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Equal to the user id carried by the dream entries.
    pub id: String,
    #[serde(default)]
    pub mask: String,
    /// Ids of the dream entries folded into this profile, oldest first.
    #[serde(default)]
    pub dream_seeds: Vec<String>,
    #[serde(default)]
    pub g_glyph_frequency: BTreeMap<String, u64>,
    #[serde(default)]
    pub emotion_frequency: BTreeMap<String, u64>,
    /// Wall-clock time of the most recent stats fold.
    pub last_updated: DateTime<Utc>,
}

impl UserProfile {
    /// Fresh profile for a user with no recorded dreams yet.
    pub fn blank(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mask: String::new(),
            dream_seeds: Vec::new(),
            g_glyph_frequency: BTreeMap::new(),
            emotion_frequency: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

impl Record for GenericGlyph {
    const DOC_FIELD: &'static str = "gGlyphs";

    fn id(&self) -> &str {
        &self.id
    }
}

impl GeneratedId for GenericGlyph {
    type Draft = NewGlyph;
    const ID_PREFIX: &'static str = "gGlyph_";

    fn finalize(id: String, draft: NewGlyph) -> Self {
        Self {
            id,
            title: draft.title,
            svg: draft.svg,
            extra: draft.extra,
        }
    }
}

impl Record for DreamSeed {
    const DOC_FIELD: &'static str = "dGlyphs";

    fn id(&self) -> &str {
        &self.id
    }
}

impl GeneratedId for DreamSeed {
    type Draft = NewDream;
    const ID_PREFIX: &'static str = "dream_";

    fn finalize(id: String, draft: NewDream) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            g_glyph_counts: draft.g_glyph_counts,
            extracted_emotions: draft.extracted_emotions,
            extra: draft.extra,
        }
    }
}

impl Record for UserProfile {
    const DOC_FIELD: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }
}

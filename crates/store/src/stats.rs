//! Per-user stats fold.
//!
//! Each newly appended dream entry is folded into the owning user's
//! [`UserProfile`]: symbol counts are summed into `gGlyphFrequency`, every
//! emotion label increments `emotionFrequency` by one, and the dream id is
//! pushed onto the profile's history.

use chrono::Utc;
use tracing::debug;

use crate::collection::Collection;
use crate::error::Result;
use crate::schema::{DreamSeed, UserProfile};

/// Fold one dream entry into the corresponding user profile and persist it.
///
/// A profile is synthesized on the user's first dream.  This write is a
/// separate persist from the dream append that triggered it: a crash
/// between the two leaves the dream durable and this update lost.
pub async fn fold_dream(
    users: &Collection<UserProfile>,
    dream: &DreamSeed,
) -> Result<UserProfile> {
    let mut profile = users
        .get_by_id(&dream.user_id)
        .await?
        .unwrap_or_else(|| UserProfile::blank(dream.user_id.clone()));

    profile.dream_seeds.push(dream.id.clone());
    for (symbol, count) in &dream.g_glyph_counts {
        *profile.g_glyph_frequency.entry(symbol.clone()).or_insert(0) += *count;
    }
    for emotion in &dream.extracted_emotions {
        *profile.emotion_frequency.entry(emotion.clone()).or_insert(0) += 1;
    }
    profile.last_updated = Utc::now();

    users.upsert(profile.clone()).await?;
    debug!(
        user = %profile.id,
        dream = %dream.id,
        symbols = dream.g_glyph_counts.len(),
        emotions = dream.extracted_emotions.len(),
        "dream folded into user stats"
    );
    Ok(profile)
}

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::collection::Collection;
use crate::error::{Result, StoreError};
use crate::schema::{DreamSeed, GenericGlyph, NewDream, NewGlyph, UserProfile};
use crate::stats;

/// The three collection stores behind one explicitly constructed handle.
///
/// Built once at process start from the configured data directory and
/// passed by reference (or `Arc`) into whatever composes the API layer.
/// Each collection serializes its own operations; the collections are
/// independent of each other.
pub struct GlyphDb {
    data_dir: PathBuf,
    glyphs: Collection<GenericGlyph>,
    dreams: Collection<DreamSeed>,
    users: Collection<UserProfile>,
}

impl GlyphDb {
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            data_dir: dir.to_path_buf(),
            glyphs: Collection::new(dir.join("genericGlyphs.json")),
            dreams: Collection::new(dir.join("dreamSeeds.json")),
            users: Collection::new(dir.join("users.json")),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn init_glyphs(&self) -> Result<()> {
        self.glyphs.init().await
    }

    pub async fn init_dreams(&self) -> Result<()> {
        self.dreams.init().await
    }

    pub async fn init_users(&self) -> Result<()> {
        self.users.init().await
    }

    /// Ensure all three backing documents exist.  Idempotent.
    pub async fn init_all(&self) -> Result<()> {
        self.init_glyphs().await?;
        self.init_dreams().await?;
        self.init_users().await?;
        info!(data_dir = %self.data_dir.display(), "collections initialised");
        Ok(())
    }

    pub async fn add_glyph(&self, draft: NewGlyph) -> Result<GenericGlyph> {
        self.glyphs.append(draft).await
    }

    pub async fn list_glyphs(&self) -> Result<Vec<GenericGlyph>> {
        self.glyphs.list().await
    }

    /// Append a dream entry, then fold it into the owning user's profile.
    ///
    /// The two persists are not atomic end-to-end.  When the fold fails the
    /// dream entry is already durable and is *not* rolled back; the failure
    /// surfaces as [`StoreError::StatsAggregation`] carrying the dream id.
    pub async fn add_dream(&self, draft: NewDream) -> Result<DreamSeed> {
        let dream = self.dreams.append(draft).await?;
        match stats::fold_dream(&self.users, &dream).await {
            Ok(profile) => {
                debug!(dream = %dream.id, user = %profile.id, "user stats updated");
                Ok(dream)
            }
            Err(err) => {
                warn!(
                    dream = %dream.id,
                    error = %err,
                    "stats aggregation failed; dream entry remains durable"
                );
                Err(StoreError::StatsAggregation {
                    dream_id: dream.id.clone(),
                    source: Box::new(err),
                })
            }
        }
    }

    pub async fn list_dreams(&self) -> Result<Vec<DreamSeed>> {
        self.dreams.list().await
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserProfile>> {
        self.users.get_by_id(id).await
    }

    pub async fn save_user(&self, profile: UserProfile) -> Result<()> {
        self.users.upsert(profile).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use uuid::Uuid;

    use super::GlyphDb;
    use crate::schema::{NewDream, NewGlyph};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("glyphdb-db-{}", Uuid::new_v4()))
    }

    fn glyph_draft(title: &str) -> NewGlyph {
        NewGlyph {
            title: title.to_string(),
            svg: "<svg/>".to_string(),
            ..Default::default()
        }
    }

    fn dream_draft(user: &str, counts: &[(&str, u64)], emotions: &[&str]) -> NewDream {
        NewDream {
            user_id: user.to_string(),
            g_glyph_counts: counts
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            extracted_emotions: emotions.iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn init_all_creates_all_three_documents() {
        let dir = temp_dir();
        let db = GlyphDb::open(&dir);
        db.init_all().await.unwrap();
        assert!(dir.join("genericGlyphs.json").exists());
        assert!(dir.join("dreamSeeds.json").exists());
        assert!(dir.join("users.json").exists());
        // Idempotent: a second pass never alters contents.
        db.add_glyph(glyph_draft("A")).await.unwrap();
        db.init_all().await.unwrap();
        assert_eq!(db.list_glyphs().await.unwrap().len(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn add_glyph_then_list_returns_exactly_one_matching_record() {
        let dir = temp_dir();
        let db = GlyphDb::open(&dir);
        db.init_all().await.unwrap();
        db.add_glyph(glyph_draft("A")).await.unwrap();
        let glyphs = db.list_glyphs().await.unwrap();
        assert_eq!(glyphs.len(), 1);
        assert_eq!(glyphs[0].title, "A");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn add_dream_updates_the_user_aggregate() {
        let dir = temp_dir();
        let db = GlyphDb::open(&dir);
        db.init_all().await.unwrap();
        db.add_dream(dream_draft("u1", &[("sun", 2)], &["joy", "joy"]))
            .await
            .unwrap();

        let profile = db.get_user("u1").await.unwrap().unwrap();
        assert_eq!(profile.g_glyph_frequency["sun"], 2);
        assert_eq!(profile.emotion_frequency["joy"], 2);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn sequential_dreams_accumulate() {
        let dir = temp_dir();
        let db = GlyphDb::open(&dir);
        db.init_all().await.unwrap();
        db.add_dream(dream_draft("u1", &[("sun", 1)], &[]))
            .await
            .unwrap();
        db.add_dream(dream_draft("u1", &[("sun", 3)], &[]))
            .await
            .unwrap();
        let profile = db.get_user("u1").await.unwrap().unwrap();
        assert_eq!(profile.g_glyph_frequency["sun"], 4);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn dream_ids_are_unique_and_listed_in_insertion_order() {
        let dir = temp_dir();
        let db = GlyphDb::open(&dir);
        db.init_all().await.unwrap();
        let first = db.add_dream(dream_draft("u1", &[], &[])).await.unwrap();
        let second = db.add_dream(dream_draft("u2", &[], &[])).await.unwrap();
        assert_ne!(first.id, second.id);
        let dreams = db.list_dreams().await.unwrap();
        assert_eq!(dreams.len(), 2);
        assert_eq!(dreams[0].id, first.id);
        assert_eq!(dreams[1].id, second.id);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn profile_history_references_dream_ids() {
        let dir = temp_dir();
        let db = GlyphDb::open(&dir);
        db.init_all().await.unwrap();
        let dream = db.add_dream(dream_draft("u1", &[], &[])).await.unwrap();
        let profile = db.get_user("u1").await.unwrap().unwrap();
        assert_eq!(profile.dream_seeds, vec![dream.id]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn get_user_returns_none_for_unknown_ids() {
        let dir = temp_dir();
        let db = GlyphDb::open(&dir);
        db.init_all().await.unwrap();
        assert!(db.get_user("nobody").await.unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn save_user_round_trips() {
        let dir = temp_dir();
        let db = GlyphDb::open(&dir);
        db.init_all().await.unwrap();
        let mut profile = crate::schema::UserProfile::blank("u1");
        profile.mask = "owl".to_string();
        db.save_user(profile).await.unwrap();
        assert_eq!(db.get_user("u1").await.unwrap().unwrap().mask, "owl");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failed_aggregation_keeps_the_dream_durable() {
        let dir = temp_dir();
        let db = GlyphDb::open(&dir);
        db.init_all().await.unwrap();

        // Wedge the user store's temp-file slot so its next persist fails.
        let tmp = dir.join("users.json.tmp");
        std::fs::create_dir(&tmp).unwrap();

        let err = db
            .add_dream(dream_draft("u1", &[("sun", 1)], &[]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::StoreError::StatsAggregation { .. }
        ));

        // The dream entry was appended before the fold failed.
        assert_eq!(db.list_dreams().await.unwrap().len(), 1);

        std::fs::remove_dir(&tmp).unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }
}

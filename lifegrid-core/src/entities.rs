//! Persisted entity types: blocks, profile and the store root aggregate.

use crate::{BlockId, Granularity, Visibility};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// BLOCK
// ============================================================================

/// User content attached to one time unit.
///
/// Blocks are created lazily by the first upsert; a missing block and a
/// default block render the same way.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Block {
    /// Free-form note, optionally Markdown.
    pub text: String,
    /// Image URLs or data URIs.
    pub images: Vec<String>,
    /// Video URLs (YouTube links in practice).
    pub videos: Vec<String>,
    /// Spotify track URLs or ids.
    pub spotify: Vec<String>,
    pub visibility: Visibility,
    pub tags: Vec<String>,
}

impl Block {
    /// Whether anything differs from a freshly materialized block.
    pub fn has_content(&self) -> bool {
        self != &Block::default()
    }

    /// Apply a partial update. Present fields replace the current value
    /// wholesale; collections are not merged element-wise.
    pub fn apply(&mut self, patch: &BlockPatch) {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(images) = &patch.images {
            self.images = images.clone();
        }
        if let Some(videos) = &patch.videos {
            self.videos = videos.clone();
        }
        if let Some(spotify) = &patch.spotify {
            self.spotify = spotify.clone();
        }
        if let Some(visibility) = patch.visibility {
            self.visibility = visibility;
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
    }

    /// Consume the block and return it with `patch` applied.
    pub fn merged(mut self, patch: &BlockPatch) -> Self {
        self.apply(patch);
        self
    }
}

/// Partial update payload for blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BlockPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl BlockPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn images(mut self, images: Vec<String>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn videos(mut self, videos: Vec<String>) -> Self {
        self.videos = Some(videos);
        self
    }

    pub fn spotify(mut self, spotify: Vec<String>) -> Self {
        self.spotify = Some(spotify);
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// True when the patch carries no fields.
    pub fn is_empty(&self) -> bool {
        self == &BlockPatch::default()
    }
}

// ============================================================================
// PROFILE
// ============================================================================

/// User profile shown next to the grid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserProfile {
    pub name: String,
    pub bio: String,
    pub avatar_url: String,
    /// Long-form Markdown introduction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_intro: Option<String>,
}

impl UserProfile {
    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(bio) = &patch.bio {
            self.bio = bio.clone();
        }
        if let Some(avatar_url) = &patch.avatar_url {
            self.avatar_url = avatar_url.clone();
        }
        if let Some(markdown_intro) = &patch.markdown_intro {
            self.markdown_intro = Some(markdown_intro.clone());
        }
    }
}

/// Partial update payload for the profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub markdown_intro: Option<String>,
}

impl ProfilePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    pub fn markdown_intro(mut self, markdown_intro: impl Into<String>) -> Self {
        self.markdown_intro = Some(markdown_intro.into());
        self
    }
}

// ============================================================================
// STORE ROOT
// ============================================================================

/// Root aggregate persisted as one unit.
///
/// `date_of_birth == None` is the uninitialized state; the UI sends the user
/// to the date entry flow until it is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreRoot {
    #[serde(rename = "dob")]
    pub date_of_birth: Option<NaiveDate>,
    pub profile: UserProfile,
    pub blocks: BTreeMap<BlockId, Block>,
    pub view_mode: Granularity,
}

impl StoreRoot {
    /// Root for a user who has just entered their date of birth.
    pub fn with_date_of_birth(date_of_birth: NaiveDate) -> Self {
        Self {
            date_of_birth: Some(date_of_birth),
            ..Self::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.date_of_birth.is_some()
    }

    /// Blocks of one granularity, in grid order.
    pub fn blocks_of(&self, granularity: Granularity) -> impl Iterator<Item = (&BlockId, &Block)> {
        self.blocks
            .iter()
            .filter(move |(id, _)| id.granularity() == granularity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_default_is_private_and_empty() {
        let block = Block::default();
        assert_eq!(block.visibility, Visibility::Private);
        assert!(block.text.is_empty());
        assert!(block.images.is_empty());
        assert!(block.videos.is_empty());
        assert!(block.spotify.is_empty());
        assert!(block.tags.is_empty());
        assert!(!block.has_content());
    }

    #[test]
    fn test_apply_replaces_present_fields_only() {
        let block = Block::default().merged(
            &BlockPatch::new()
                .text("Graduation")
                .visibility(Visibility::Public)
                .tags(["school", "family"]),
        );
        let updated = block.clone().merged(&BlockPatch::new().tags(["school"]));

        assert_eq!(updated.text, "Graduation");
        assert_eq!(updated.visibility, Visibility::Public);
        assert_eq!(updated.tags, vec!["school".to_string()]);
    }

    #[test]
    fn test_apply_empty_collection_clears() {
        let block = Block::default().merged(&BlockPatch::new().images(vec!["a.png".into()]));
        let cleared = block.merged(&BlockPatch::new().images(vec![]));
        assert!(cleared.images.is_empty());
        assert!(!cleared.has_content());
    }

    #[test]
    fn test_block_deserialize_missing_tags() {
        let json = r#"{"text":"Born","images":[],"videos":[],"spotify":[],"visibility":"private"}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.text, "Born");
        assert!(block.tags.is_empty());
    }

    #[test]
    fn test_block_patch_deserializes_partial_json() {
        let patch: BlockPatch = serde_json::from_str(r#"{"text":"Test week"}"#).unwrap();
        assert_eq!(patch, BlockPatch::new().text("Test week"));
        assert!(!patch.is_empty());
        assert!(BlockPatch::new().is_empty());
    }

    #[test]
    fn test_profile_apply() {
        let mut profile = UserProfile::default();
        profile.apply(&ProfilePatch::new().name("Jane Doe").bio("Loaded"));
        profile.apply(&ProfilePatch::new().markdown_intro("# Hi"));

        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.bio, "Loaded");
        assert_eq!(profile.avatar_url, "");
        assert_eq!(profile.markdown_intro.as_deref(), Some("# Hi"));
    }

    #[test]
    fn test_profile_serde_camel_case() {
        let profile = UserProfile {
            avatar_url: "me.png".to_string(),
            ..UserProfile::default()
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"avatarUrl\":\"me.png\""));
        assert!(!json.contains("markdownIntro"));
    }

    #[test]
    fn test_store_root_initialization_state() {
        assert!(!StoreRoot::default().is_initialized());
        let dob = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let root = StoreRoot::with_date_of_birth(dob);
        assert!(root.is_initialized());
        assert_eq!(root.view_mode, Granularity::Week);
    }

    #[test]
    fn test_blocks_of_filters_granularity() {
        let mut root = StoreRoot::default();
        root.blocks.insert(BlockId::year(3), Block::default());
        root.blocks.insert(BlockId::week(0, 1).unwrap(), Block::default());
        root.blocks.insert(BlockId::year(1), Block::default());

        let years: Vec<String> = root
            .blocks_of(Granularity::Year)
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(years, vec!["year_1", "year_3"]);
    }
}

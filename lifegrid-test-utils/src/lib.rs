//! LIFEGRID Test Utilities
//!
//! Shared test infrastructure for the LIFEGRID workspace:
//! - Proptest generators for dates, identifiers and block content
//! - Fixtures for the common store scenarios
//! - A fault-injecting persistence port
//! - Custom assertions for LIFEGRID results and grids

// Re-export storage types tests reach for most
pub use lifegrid_storage::{BlockStore, MemoryPersistence, PersistencePort};

// Re-export core types for convenience
pub use lifegrid_core::{
    Block, BlockId, BlockPatch, Classification, GridError, Granularity, Horizon, LifegridError,
    LifegridResult, ProfilePatch, StorageError, StoreRoot, TimeUnit, UserProfile,
    ValidationError, Visibility,
};

use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;

// ============================================================================
// TRACING
// ============================================================================

/// Install a test-friendly tracing subscriber once per process.
///
/// Filter comes from `RUST_LOG` (default `warn`); set
/// `LIFEGRID_TEST_LOG_FORMAT=json` for JSON lines.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("LIFEGRID_TEST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer();
    // A second call in the same process finds a subscriber already set.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for LIFEGRID inputs.

    use super::*;
    use chrono::Days;
    use proptest::prelude::*;

    /// Days between 1900-01-01 and 2020-12-31.
    const BIRTH_WINDOW_DAYS: u64 = 44_194;

    /// A date of birth between 1900 and 2020.
    pub fn arb_date_of_birth() -> impl Strategy<Value = NaiveDate> {
        let base = fixtures::date(1900, 1, 1);
        (0..=BIRTH_WINDOW_DAYS).prop_map(move |days| base + Days::new(days))
    }

    /// A day on or after `date_of_birth`, within a century of it.
    pub fn arb_today_after(date_of_birth: NaiveDate) -> impl Strategy<Value = NaiveDate> {
        (0u64..=36_600).prop_map(move |days| date_of_birth + Days::new(days))
    }

    /// A birth date paired with a "today" no earlier than it.
    pub fn arb_birth_and_today() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
        arb_date_of_birth().prop_flat_map(|dob| (Just(dob), arb_today_after(dob)))
    }

    pub fn arb_granularity() -> impl Strategy<Value = Granularity> {
        prop_oneof![
            Just(Granularity::Week),
            Just(Granularity::Month),
            Just(Granularity::Year),
        ]
    }

    pub fn arb_visibility() -> impl Strategy<Value = Visibility> {
        prop_oneof![
            Just(Visibility::Private),
            Just(Visibility::Public),
            Just(Visibility::Friends),
        ]
    }

    /// A horizon short enough to keep week grids small in property runs.
    pub fn arb_horizon() -> impl Strategy<Value = Horizon> {
        (1u32..=120).prop_filter_map("horizon in range", Horizon::new)
    }

    /// An id inside the default 90-year grid.
    pub fn arb_block_id() -> impl Strategy<Value = BlockId> {
        arb_granularity().prop_flat_map(|granularity| {
            let count = Horizon::default().unit_count(granularity);
            (0..count).prop_map(move |index| BlockId::from_index(granularity, index))
        })
    }

    /// Tags from a small vocabulary so suggestions see repeats.
    pub fn arb_tag() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "family", "travel", "work", "school", "music", "health", "friends", "home",
        ])
        .prop_map(str::to_string)
    }

    fn arb_urls(scheme: &'static str) -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z0-9]{1,12}", 0..3).prop_map(move |slugs| {
            slugs
                .into_iter()
                .map(|slug| format!("{}{}", scheme, slug))
                .collect()
        })
    }

    pub fn arb_block_patch() -> impl Strategy<Value = BlockPatch> {
        (
            prop::option::of("[ -~]{0,40}"),
            prop::option::of(arb_urls("https://img.example/")),
            prop::option::of(arb_urls("https://youtube.com/watch?v=")),
            prop::option::of(arb_urls("spotify:track:")),
            prop::option::of(arb_visibility()),
            prop::option::of(prop::collection::vec(arb_tag(), 0..4)),
        )
            .prop_map(|(text, images, videos, spotify, visibility, tags)| BlockPatch {
                text,
                images,
                videos,
                spotify,
                visibility,
                tags,
            })
    }

    pub fn arb_block() -> impl Strategy<Value = Block> {
        arb_block_patch().prop_map(|patch| Block::default().merged(&patch))
    }

    /// An initialized root with a handful of blocks.
    pub fn arb_store_root() -> impl Strategy<Value = StoreRoot> {
        (
            arb_date_of_birth(),
            arb_granularity(),
            "[A-Za-z ]{0,20}",
            prop::collection::btree_map(arb_block_id(), arb_block(), 0..8),
        )
            .prop_map(|(dob, view_mode, name, blocks)| {
                let mut root = StoreRoot::with_date_of_birth(dob);
                root.view_mode = view_mode;
                root.profile.name = name;
                root.blocks = blocks;
                root
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for the common scenarios.

    use super::*;

    /// Store key the web client used.
    pub const STORE_KEY: &str = "life_calendar_user";

    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("fixture date must be valid")
    }

    /// Birth date of the year-grid scenario.
    pub fn scenario_date_of_birth() -> NaiveDate {
        date(2000, 1, 1)
    }

    /// "Today" of the year-grid scenario.
    pub fn scenario_today() -> NaiveDate {
        date(2024, 6, 15)
    }

    /// Fresh uninitialized store plus a handle onto its persistence.
    pub fn empty_store() -> (BlockStore<MemoryPersistence>, MemoryPersistence) {
        let persistence = MemoryPersistence::new();
        let store = BlockStore::open(persistence.clone(), STORE_KEY)
            .expect("opening an empty memory store cannot fail");
        (store, persistence)
    }

    /// Store with the scenario date of birth already set.
    pub fn initialized_store() -> (BlockStore<MemoryPersistence>, MemoryPersistence) {
        let (mut store, persistence) = empty_store();
        store
            .set_date_of_birth(scenario_date_of_birth())
            .expect("memory writes cannot fail");
        (store, persistence)
    }

    /// A root with content spread across all three granularities.
    pub fn populated_root() -> StoreRoot {
        let mut root = StoreRoot::with_date_of_birth(scenario_date_of_birth());
        root.profile = UserProfile {
            name: "Jane Doe".to_string(),
            bio: "Counting weeks".to_string(),
            avatar_url: String::new(),
            markdown_intro: Some("# Hello".to_string()),
        };
        root.blocks.insert(
            BlockId::year(24),
            Block::default().merged(
                &BlockPatch::new()
                    .text("Moved to Lisbon")
                    .visibility(Visibility::Public)
                    .tags(["travel", "home"]),
            ),
        );
        root.blocks.insert(
            BlockId::month(18, 8).expect("month in range"),
            Block::default().merged(
                &BlockPatch::new()
                    .text("First day at university")
                    .tags(["school"]),
            ),
        );
        root.blocks.insert(
            BlockId::week(23, 51).expect("week in range"),
            Block::default().merged(
                &BlockPatch::new()
                    .spotify(vec!["spotify:track:4uLU6hMCjMI75M1A2tKUQC".to_string()])
                    .tags(["music", "travel"]),
            ),
        );
        root
    }

    /// Envelope as an older web client wrote it: empty dob allowed, blocks
    /// without tags, and one key in the retired calendar-week format.
    pub fn legacy_envelope() -> String {
        serde_json::json!({
            "version": 0,
            "state": {
                "dob": "1990-05-17",
                "profile": { "name": "Legacy", "bio": "", "avatarUrl": "" },
                "blocks": {
                    "year_10": {
                        "text": "Old block",
                        "images": [],
                        "videos": [],
                        "spotify": [],
                        "visibility": "friends"
                    },
                    "week_2024_W10": { "text": "unreachable" }
                },
                "viewMode": "years"
            }
        })
        .to_string()
    }

    /// Envelope as the browser client persists it, with the state nested
    /// under `userData` and no view mode.
    pub fn user_data_envelope() -> String {
        serde_json::json!({
            "version": 0,
            "state": {
                "userData": {
                    "dob": "1990-05-17",
                    "profile": { "name": "Browser", "bio": "", "avatarUrl": "" },
                    "blocks": {
                        "year_3": { "text": "School", "visibility": "public" }
                    }
                }
            }
        })
        .to_string()
    }
}

// ============================================================================
// FAULT INJECTION
// ============================================================================

pub mod mocks {
    //! Persistence ports that misbehave on request.

    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Wraps a [`MemoryPersistence`] and fails writes or reads while the
    /// matching switch is on. Clones share both switches and the data.
    #[derive(Debug, Clone, Default)]
    pub struct FailingPersistence {
        inner: MemoryPersistence,
        fail_writes: Arc<AtomicBool>,
        fail_reads: Arc<AtomicBool>,
    }

    impl FailingPersistence {
        pub fn new() -> Self {
            Self::default()
        }

        /// Start with `blob` saved under `key`.
        pub fn with_blob(key: &str, blob: impl Into<Vec<u8>>) -> Self {
            Self {
                inner: MemoryPersistence::with_blob(key, blob),
                ..Self::default()
            }
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        /// The healthy storage underneath.
        pub fn inner(&self) -> &MemoryPersistence {
            &self.inner
        }
    }

    impl PersistencePort for FailingPersistence {
        fn load_root(&self, key: &str) -> LifegridResult<Option<Vec<u8>>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StorageError::PersistenceRead {
                    store_key: key.to_string(),
                    reason: "injected read failure".to_string(),
                }
                .into());
            }
            self.inner.load_root(key)
        }

        fn save_root(&self, key: &str, blob: &[u8]) -> LifegridResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::PersistenceWrite {
                    store_key: key.to_string(),
                    reason: "injected write failure".to_string(),
                }
                .into());
            }
            self.inner.save_root(key, blob)
        }

        fn delete_root(&self, key: &str) -> LifegridResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::PersistenceWrite {
                    store_key: key.to_string(),
                    reason: "injected delete failure".to_string(),
                }
                .into());
            }
            self.inner.delete_root(key)
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for LIFEGRID results and generated grids.

    use super::*;

    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &LifegridResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &LifegridResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    #[track_caller]
    pub fn assert_uninitialized<T: std::fmt::Debug>(result: &LifegridResult<T>) {
        match result {
            Err(LifegridError::Storage(StorageError::Uninitialized)) => {}
            other => panic!("Expected Uninitialized, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_persistence_write<T: std::fmt::Debug>(result: &LifegridResult<T>) {
        match result {
            Err(LifegridError::Storage(StorageError::PersistenceWrite { .. })) => {}
            other => panic!("Expected PersistenceWrite, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_corrupt<T: std::fmt::Debug>(result: &LifegridResult<T>) {
        match result {
            Err(LifegridError::Storage(StorageError::Corrupt { .. })) => {}
            other => panic!("Expected Corrupt, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_invalid_date<T: std::fmt::Debug>(result: &LifegridResult<T>) {
        match result {
            Err(LifegridError::Grid(GridError::InvalidDate { .. })) => {}
            other => panic!("Expected InvalidDate, got: {:?}", other),
        }
    }

    /// Check the structural invariants every generated grid must hold:
    /// exact length, contiguous strictly increasing periods, sequential
    /// indices and at most one current unit.
    #[track_caller]
    pub fn assert_grid_invariants(units: &[TimeUnit], granularity: Granularity, horizon: Horizon) {
        assert_eq!(
            units.len(),
            horizon.unit_count(granularity) as usize,
            "Wrong unit count for {:?} over {} years",
            granularity,
            horizon.years()
        );

        for (i, unit) in units.iter().enumerate() {
            assert_eq!(unit.sequence_index as usize, i, "Index out of sequence");
            assert_eq!(unit.granularity, granularity, "Mixed granularity");
            assert!(
                unit.period_start < unit.period_end,
                "Empty period at index {}",
                i
            );
        }

        for pair in units.windows(2) {
            assert_eq!(
                pair[0].period_end, pair[1].period_start,
                "Gap between units {} and {}",
                pair[0].sequence_index, pair[1].sequence_index
            );
        }

        let current = units
            .iter()
            .filter(|u| u.classification == Classification::Current)
            .count();
        assert!(current <= 1, "Found {} current units", current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scenario_fixtures() {
        assert_eq!(fixtures::scenario_date_of_birth(), fixtures::date(2000, 1, 1));
        assert!(fixtures::scenario_today() > fixtures::scenario_date_of_birth());
    }

    #[test]
    fn test_initialized_store_fixture() {
        let (store, persistence) = fixtures::initialized_store();
        assert!(store.is_initialized());
        assert!(persistence.contains(fixtures::STORE_KEY));
    }

    #[test]
    fn test_populated_root_spans_granularities() {
        let root = fixtures::populated_root();
        for granularity in Granularity::ALL {
            assert_eq!(root.blocks_of(granularity).count(), 1);
        }
    }

    #[test]
    fn test_failing_persistence_toggles() {
        let port = mocks::FailingPersistence::new();
        port.set_fail_writes(true);
        assertions::assert_persistence_write(&port.save_root("k", b"x"));

        port.set_fail_writes(false);
        assertions::assert_ok(&port.save_root("k", b"x"));
        assert!(port.inner().contains("k"));

        port.set_fail_reads(true);
        assertions::assert_err(&port.load_root("k"));
    }

    #[test]
    fn test_init_test_tracing_is_reentrant() {
        init_test_tracing();
        init_test_tracing();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_block_id_in_default_horizon(id in generators::arb_block_id()) {
            let dob = fixtures::scenario_date_of_birth();
            prop_assert!(id.period(dob, Horizon::default()).is_some());
        }

        #[test]
        fn prop_generated_today_not_before_birth(
            (dob, today) in generators::arb_birth_and_today(),
        ) {
            prop_assert!(today >= dob);
        }

        #[test]
        fn prop_generated_root_is_initialized(root in generators::arb_store_root()) {
            prop_assert!(root.is_initialized());
        }
    }
}

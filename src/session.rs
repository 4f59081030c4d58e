//! Session Cache
//!
//! Each user session owns the datasets it has loaded and the aggregates
//! computed from them. Both are computed at most once per session and
//! variant, and dropped when the session ends.

use crate::config::DataConfig;
use crate::data::{DataLoader, DataNormalizer, DatasetVariant};
use crate::error::DashboardResult;
use crate::stats::{AggregateResult, Aggregator};
use polars::prelude::DataFrame;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Identifies a session in a [`SessionStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A normalized dataset held for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub variant: DatasetVariant,
    pub path: PathBuf,
    pub df: DataFrame,
    /// Rows where `cnt != casual + registered`
    pub inconsistent_totals: usize,
}

/// Per-session memoized state.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    datasets: HashMap<DatasetVariant, LoadedDataset>,
    aggregates: HashMap<DatasetVariant, AggregateResult>,
}

impl Session {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            datasets: HashMap::new(),
            aggregates: HashMap::new(),
        }
    }

    /// Load and normalize a dataset, or return the copy already held.
    pub fn dataset(
        &mut self,
        variant: DatasetVariant,
        source: &DataConfig,
    ) -> DashboardResult<&LoadedDataset> {
        Self::load_into(&mut self.datasets, self.id, variant, source)
    }

    /// Aggregate a dataset, loading it first if needed.
    ///
    /// The result is memoized; later calls return the cached value until the
    /// session ends or the variant is reloaded. A failed load caches nothing.
    pub fn aggregate(
        &mut self,
        variant: DatasetVariant,
        source: &DataConfig,
    ) -> DashboardResult<&AggregateResult> {
        match self.aggregates.entry(variant) {
            Entry::Occupied(entry) => {
                tracing::debug!(session = %self.id, variant = %variant, "Aggregate cache hit");
                Ok(&*entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let dataset = Self::load_into(&mut self.datasets, self.id, variant, source)?;
                let result = Aggregator::aggregate(&dataset.df, variant)?;
                Ok(&*entry.insert(result))
            }
        }
    }

    /// The cached aggregate, if one has been computed.
    #[cfg(test)]
    pub fn cached_aggregate(&self, variant: DatasetVariant) -> Option<&AggregateResult> {
        self.aggregates.get(&variant)
    }

    /// Forget the dataset and aggregate for one variant.
    pub fn reload(&mut self, variant: DatasetVariant) {
        self.datasets.remove(&variant);
        self.aggregates.remove(&variant);
        tracing::debug!(session = %self.id, variant = %variant, "Dropped cached dataset");
    }

    fn load_into<'a>(
        datasets: &'a mut HashMap<DatasetVariant, LoadedDataset>,
        id: SessionId,
        variant: DatasetVariant,
        source: &DataConfig,
    ) -> DashboardResult<&'a LoadedDataset> {
        match datasets.entry(variant) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = source.path_for(variant);
                let raw = DataLoader::load_csv(&path, variant)?;
                let df = DataNormalizer::normalize(&raw, variant)?;

                let inconsistent_totals = Aggregator::count_inconsistent_totals(&df)?;
                if inconsistent_totals > 0 {
                    tracing::warn!(
                        session = %id,
                        variant = %variant,
                        rows = inconsistent_totals,
                        "Rows where cnt != casual + registered"
                    );
                }

                Ok(&*entry.insert(LoadedDataset {
                    variant,
                    path,
                    df,
                    inconsistent_totals,
                }))
            }
        }
    }
}

/// All open sessions, keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    next_id: u64,
    sessions: HashMap<SessionId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh session with empty caches.
    pub fn open(&mut self) -> SessionId {
        self.next_id += 1;
        let id = SessionId(self.next_id);
        self.sessions.insert(id, Session::new(id));
        tracing::info!(session = %id, "Session opened");
        id
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// End a session, dropping everything it cached.
    pub fn end(&mut self, id: SessionId) -> bool {
        let ended = self.sessions.remove(&id).is_some();
        if ended {
            tracing::info!(session = %id, "Session ended");
        }
        ended
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const DAY_CSV: &str = "\
instant,dteday,season,yr,mnth,casual,registered,cnt
1,2011-01-01,1,0,1,10,20,30
2,2011-01-02,1,0,1,30,40,70
";

    const HOUR_CSV: &str = "\
instant,dteday,hr,casual,registered,cnt
1,2011-01-01,0,3,13,16
2,2011-01-01,1,8,32,40
";

    fn source_with(files: &[(&str, &str)]) -> (TempDir, DataConfig) {
        let dir = tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let config = DataConfig {
            data_dir: dir.path().to_path_buf(),
            ..DataConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn test_daily_session_end_to_end() {
        let (_dir, source) = source_with(&[("day.csv", DAY_CSV)]);
        let mut store = SessionStore::new();
        let id = store.open();
        let session = store.get_mut(id).unwrap();

        let dataset = session.dataset(DatasetVariant::Day, &source).unwrap();
        assert_eq!(dataset.df.column("dteday").unwrap().dtype(), &DataType::Date);
        assert_eq!(dataset.inconsistent_totals, 0);

        let result = session.aggregate(DatasetVariant::Day, &source).unwrap();
        assert_eq!(result.mean_casual, 20.0);
        assert_eq!(result.mean_registered, 30.0);
        assert_eq!(result.monthly_matrix.as_ref().unwrap().get(0, 1), Some(50.0));
    }

    #[test]
    fn test_aggregate_is_memoized() {
        let (dir, source) = source_with(&[("day.csv", DAY_CSV)]);
        let mut store = SessionStore::new();
        let id = store.open();
        let session = store.get_mut(id).unwrap();

        let first = session.aggregate(DatasetVariant::Day, &source).unwrap().clone();

        // Changing the file does not affect the cached value
        fs::remove_file(dir.path().join("day.csv")).unwrap();
        let second = session.aggregate(DatasetVariant::Day, &source).unwrap();
        assert_eq!(&first, second);
    }

    #[test]
    fn test_missing_file_produces_no_result() {
        let (_dir, source) = source_with(&[]);
        let mut store = SessionStore::new();
        let id = store.open();
        let session = store.get_mut(id).unwrap();

        for variant in DatasetVariant::ALL {
            let err = session.aggregate(variant, &source).unwrap_err();
            assert!(err.is_missing_file(), "{variant}: {err}");
            assert!(session.cached_aggregate(variant).is_none());
        }
    }

    #[test]
    fn test_parse_error_is_recoverable() {
        let (dir, source) = source_with(&[(
            "day.csv",
            "dteday,yr,mnth,casual,registered,cnt\nyesterday,0,1,1,1,2\n",
        )]);
        let mut store = SessionStore::new();
        let id = store.open();
        let session = store.get_mut(id).unwrap();

        let err = session.aggregate(DatasetVariant::Day, &source).unwrap_err();
        assert!(!err.is_missing_file());
        assert!(err.to_string().contains("yesterday"));

        // Fixing the file lets the same session succeed
        fs::write(dir.path().join("day.csv"), DAY_CSV).unwrap();
        assert!(session.aggregate(DatasetVariant::Day, &source).is_ok());
    }

    #[test]
    fn test_text_in_counts_produces_no_result() {
        let (_dir, source) = source_with(&[(
            "hour.csv",
            "instant,dteday,hr,casual,registered,cnt\n1,2011-01-01,0,3,13,16\n2,2011-01-01,1,n/a,32,40\n",
        )]);
        let mut store = SessionStore::new();
        let id = store.open();
        let session = store.get_mut(id).unwrap();

        let err = session.aggregate(DatasetVariant::Hour, &source).unwrap_err();
        assert!(!err.is_missing_file());
        assert!(err.to_string().contains("casual"), "{err}");
        assert!(session.cached_aggregate(DatasetVariant::Hour).is_none());
    }

    #[test]
    fn test_variants_cached_separately() {
        let (_dir, source) = source_with(&[("day.csv", DAY_CSV), ("hour.csv", HOUR_CSV)]);
        let mut store = SessionStore::new();
        let id = store.open();
        let session = store.get_mut(id).unwrap();

        let day = session.aggregate(DatasetVariant::Day, &source).unwrap().clone();
        let hour = session.aggregate(DatasetVariant::Hour, &source).unwrap().clone();

        assert_eq!(day.mean_casual, 20.0);
        assert_eq!(hour.mean_casual, 5.5);
        assert!(hour.monthly_matrix.is_none());
    }

    #[test]
    fn test_reload_recomputes() {
        let (dir, source) = source_with(&[("hour.csv", HOUR_CSV)]);
        let mut store = SessionStore::new();
        let id = store.open();
        let session = store.get_mut(id).unwrap();

        assert_eq!(session.aggregate(DatasetVariant::Hour, &source).unwrap().mean_casual, 5.5);

        fs::write(
            dir.path().join("hour.csv"),
            "instant,dteday,hr,casual,registered,cnt\n1,2011-01-01,0,1,1,2\n",
        )
        .unwrap();
        session.reload(DatasetVariant::Hour);
        assert_eq!(session.aggregate(DatasetVariant::Hour, &source).unwrap().mean_casual, 1.0);
    }

    #[test]
    fn test_end_invalidates() {
        let (_dir, source) = source_with(&[("day.csv", DAY_CSV)]);
        let mut store = SessionStore::new();
        let first = store.open();
        store
            .get_mut(first)
            .unwrap()
            .aggregate(DatasetVariant::Day, &source)
            .unwrap();

        assert!(store.end(first));
        assert!(store.get_mut(first).is_none());
        assert!(!store.end(first));

        let second = store.open();
        assert_ne!(first, second);
        let session = store.get_mut(second).unwrap();
        assert!(session.cached_aggregate(DatasetVariant::Day).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_inconsistent_totals_are_counted() {
        let (_dir, source) = source_with(&[(
            "hour.csv",
            "hr,casual,registered,cnt\n0,1,1,2\n1,1,1,3\n",
        )]);
        let mut store = SessionStore::new();
        let id = store.open();
        let session = store.get_mut(id).unwrap();

        let dataset = session.dataset(DatasetVariant::Hour, &source).unwrap();
        assert_eq!(dataset.inconsistent_totals, 1);
    }
}

//! Data store: loads per-city monthly series from tabular sources.
//!
//! The loaded table is memoized inside [`DataStore`] for the rest of the
//! session. Nothing invalidates it automatically; call [`DataStore::reset`]
//! to force the next [`DataStore::load`] to read the sources again.

mod config;
mod reader;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{info, warn};

use crate::series::{ClimateTable, VariableKind};

pub use config::{SourceSpec, StoreConfig};
pub use reader::{read_source, MalformedReason, MalformedRecord, ParsedSource};

/// Errors that abort a load. No partial table is kept when one occurs.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("data unavailable: {variable} source '{}': {source}", path.display())]
    DataUnavailable {
        variable: VariableKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
}

/// Summary of a completed load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Number of source files read.
    pub sources_read: usize,
    /// Number of (city, variable) series kept.
    pub series_loaded: usize,
    /// Rows that were dropped.
    pub malformed: Vec<MalformedRecord>,
}

/// Reads every configured source into a fresh table, bypassing any cache.
pub fn load_table(config: &StoreConfig) -> Result<(ClimateTable, LoadReport), StoreError> {
    let delimiter = u8::try_from(config.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            StoreError::InvalidConfig(format!("delimiter '{}' is not ASCII", config.delimiter))
        })?;

    if config.sources.is_empty() {
        return Err(StoreError::InvalidConfig("no sources configured".to_string()));
    }

    let mut table = ClimateTable::new();
    let mut report = LoadReport::default();

    for source in &config.sources {
        let path = config.source_path(source);
        let unavailable = |e: std::io::Error| StoreError::DataUnavailable {
            variable: source.variable.clone(),
            path: path.clone(),
            source: e,
        };

        let file = File::open(&path).map_err(unavailable)?;
        let parsed = read_source(
            BufReader::new(file),
            &source.variable,
            config.has_headers,
            delimiter,
        )
        .map_err(|e| unavailable(e.into()))?;

        info!(
            variable = %source.variable,
            path = %path.display(),
            series = parsed.series.len(),
            malformed = parsed.malformed.len(),
            "read source"
        );

        report.sources_read += 1;
        report.series_loaded += parsed.series.len();
        report.malformed.extend(parsed.malformed);

        for (city, series) in parsed.series {
            table
                .entry(city)
                .or_default()
                .insert(source.variable.clone(), series);
        }
    }

    Ok((table, report))
}

#[derive(Debug, Clone)]
struct Loaded {
    table: Arc<ClimateTable>,
    report: Arc<LoadReport>,
}

/// Process-scoped, explicitly resettable cache over the configured sources.
#[derive(Debug)]
pub struct DataStore {
    config: StoreConfig,
    cache: Mutex<Option<Loaded>>,
    reads: AtomicUsize,
}

impl DataStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(None),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn cache(&self) -> MutexGuard<'_, Option<Loaded>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the loaded table, reading sources only on the first call
    /// after construction or [`reset`](Self::reset).
    ///
    /// The lock is held across the read so concurrent first callers share a
    /// single load.
    pub fn load(&self) -> Result<Arc<ClimateTable>, StoreError> {
        let mut cache = self.cache();
        if let Some(loaded) = cache.as_ref() {
            return Ok(Arc::clone(&loaded.table));
        }

        self.reads.fetch_add(1, Ordering::SeqCst);
        let (table, report) = load_table(&self.config)?;

        if !report.malformed.is_empty() {
            warn!(
                dropped = report.malformed.len(),
                "some source rows were malformed and dropped"
            );
        }
        info!(
            cities = table.len(),
            series = report.series_loaded,
            "climate data loaded"
        );

        let loaded = Loaded {
            table: Arc::new(table),
            report: Arc::new(report),
        };
        let table = Arc::clone(&loaded.table);
        *cache = Some(loaded);
        Ok(table)
    }

    /// Report of the cached load, if any.
    pub fn last_report(&self) -> Option<Arc<LoadReport>> {
        self.cache().as_ref().map(|l| Arc::clone(&l.report))
    }

    /// Drops the cached table.
    pub fn reset(&self) {
        *self.cache() = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.cache().is_some()
    }

    /// How many times sources have actually been read.
    pub fn source_reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::CityName;
    use std::path::Path;
    use tempfile::tempdir;

    const HEADER: &str = "city,jan,feb,mar,apr,may,jun,jul,aug,sep,oct,nov,dec\n";

    fn write_source(dir: &Path, name: &str, rows: &[&str]) {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        std::fs::write(dir.join(name), text).unwrap();
    }

    fn write_all_sources(dir: &Path) {
        write_source(
            dir,
            "temperature.csv",
            &[
                "Hanoi,20,21,22,23,24,25,26,27,28,29,30,31",
                "Hue,25,25,25,25,25,25,25,25,25,25,25",
            ],
        );
        write_source(
            dir,
            "rainfall.csv",
            &[
                "Hanoi,100,100,100,100,100,100,100,100,100,100,100,100",
                "Hue,50,50,50,50,50,50,50,50,50,50,50,50",
            ],
        );
        write_source(
            dir,
            "sunshine.csv",
            &["hanoi,5,5,5,5,5,5,5,5,5,5,5,5", "hue,6,6,6,6,6,6,6,6,6,6,6,6"],
        );
    }

    #[test]
    fn test_load_groups_variables_by_city() {
        let dir = tempdir().unwrap();
        write_all_sources(dir.path());
        let store = DataStore::new(StoreConfig::with_data_dir(dir.path()));

        let table = store.load().unwrap();
        let hanoi = &table[&CityName::new("hanoi").unwrap()];
        assert_eq!(hanoi.len(), 3);
        assert!(hanoi[&VariableKind::Temperature].is_complete());

        // Hue's temperature row has 11 values and is dropped; the rest stays.
        let hue = &table[&CityName::new("hue").unwrap()];
        assert!(!hue.contains_key(&VariableKind::Temperature));
        assert!(hue.contains_key(&VariableKind::Rainfall));

        let report = store.last_report().unwrap();
        assert_eq!(report.sources_read, 3);
        assert_eq!(report.malformed.len(), 1);
    }

    #[test]
    fn test_second_load_uses_cache() {
        let dir = tempdir().unwrap();
        write_all_sources(dir.path());
        let store = DataStore::new(StoreConfig::with_data_dir(dir.path()));

        let first = store.load().unwrap();
        // Removing sources proves the second call never touches the disk.
        std::fs::remove_file(dir.path().join("rainfall.csv")).unwrap();
        let second = store.load().unwrap();

        assert_eq!(*first, *second);
        assert_eq!(store.source_reads(), 1);
    }

    #[test]
    fn test_concurrent_first_load_reads_once() {
        let dir = tempdir().unwrap();
        write_all_sources(dir.path());
        let store = DataStore::new(StoreConfig::with_data_dir(dir.path()));

        let tables: Vec<Arc<ClimateTable>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| store.load().unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(store.source_reads(), 1);
        assert_eq!(tables.len(), 8);
        for table in &tables[1..] {
            assert!(Arc::ptr_eq(&tables[0], table));
        }
    }

    #[test]
    fn test_reset_forces_reread() {
        let dir = tempdir().unwrap();
        write_all_sources(dir.path());
        let store = DataStore::new(StoreConfig::with_data_dir(dir.path()));

        store.load().unwrap();
        store.reset();
        assert!(!store.is_loaded());
        store.load().unwrap();
        assert_eq!(store.source_reads(), 2);
    }

    #[test]
    fn test_missing_source_is_fatal_and_leaves_no_cache() {
        let dir = tempdir().unwrap();
        write_all_sources(dir.path());
        std::fs::remove_file(dir.path().join("sunshine.csv")).unwrap();
        let store = DataStore::new(StoreConfig::with_data_dir(dir.path()));

        let err = store.load().unwrap_err();
        match err {
            StoreError::DataUnavailable { variable, .. } => {
                assert_eq!(variable, VariableKind::Sunshine)
            }
            other => panic!("expected DataUnavailable, got {:?}", other),
        }
        assert!(!store.is_loaded());
        assert!(store.last_report().is_none());
    }

    #[test]
    fn test_non_ascii_delimiter_is_rejected() {
        let config = StoreConfig {
            delimiter: '→',
            ..Default::default()
        };
        assert!(matches!(load_table(&config), Err(StoreError::InvalidConfig(_))));
    }
}

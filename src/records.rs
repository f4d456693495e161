use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Positional layout of the original dataset, used when the header row does
/// not carry recognizable column names: address first, then price, latitude
/// and longitude starting at column 9.
const FALLBACK_ADDRESS: usize = 0;
const FALLBACK_PRICE: usize = 9;
const FALLBACK_LATITUDE: usize = 10;
const FALLBACK_LONGITUDE: usize = 11;

const ADDRESS_NAMES: &[&str] = &["address", "addr", "street"];
const PRICE_NAMES: &[&str] = &["price"];
const LATITUDE_NAMES: &[&str] = &["latitude", "lat"];
const LONGITUDE_NAMES: &[&str] = &["longitude", "long", "lng"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file could not be found: {path}")]
    FileNotFound {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row at line {line} is missing required columns")]
    MalformedRow { line: u64 },
    #[error("invalid price {value:?} at line {line}")]
    InvalidPrice { line: u64, value: String },
    #[error("invalid coordinate {value:?} at line {line}")]
    InvalidCoordinate { line: u64, value: String },
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct Record {
    pub address: String,
    pub price: u64,
    pub latitude: f64,
    pub longitude: f64,
}

/// In-memory house records keyed by address. Duplicate addresses in the
/// input overwrite earlier rows (last write wins, matching the dataset's
/// own convention of one row per address).
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    houses: HashMap<String, Record>,
}

impl RecordStore {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let file = File::open(&path).map_err(|source| StoreError::FileNotFound {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StoreError> {
        // Flexible so that short rows reach our own MalformedRow check
        // instead of failing as a generic length mismatch.
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = Columns::resolve(rdr.headers()?);
        debug!("resolved columns: {columns:?}");

        let mut houses = HashMap::new();
        for result in rdr.records() {
            let row = result?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            let record = columns.parse_row(&row, line)?;
            houses.insert(record.address.clone(), record);
        }

        Ok(RecordStore { houses })
    }

    /// Returns a new store holding exactly the records priced at or under
    /// the cutoff. The original store is left untouched, so reapplying the
    /// same cutoff is a no-op by construction.
    pub fn filter_by_max_price(&self, cutoff: u64) -> Self {
        let houses = self
            .houses
            .iter()
            .filter(|(_, record)| record.price <= cutoff)
            .map(|(address, record)| (address.clone(), record.clone()))
            .collect();

        RecordStore { houses }
    }

    pub fn values(&self) -> impl Iterator<Item = &Record> {
        self.houses.values()
    }

    pub fn get(&self, address: &str) -> Option<&Record> {
        self.houses.get(address)
    }

    pub fn len(&self) -> usize {
        self.houses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.houses.is_empty()
    }
}

/// Field indices for the four columns we care about, resolved from the
/// header by name where possible.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Columns {
    address: usize,
    price: usize,
    latitude: usize,
    longitude: usize,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Self {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|header| names.iter().any(|name| header.eq_ignore_ascii_case(name)))
        };

        match (
            find(ADDRESS_NAMES),
            find(PRICE_NAMES),
            find(LATITUDE_NAMES),
            find(LONGITUDE_NAMES),
        ) {
            (Some(address), Some(price), Some(latitude), Some(longitude)) => Columns {
                address,
                price,
                latitude,
                longitude,
            },
            _ => Columns {
                address: FALLBACK_ADDRESS,
                price: FALLBACK_PRICE,
                latitude: FALLBACK_LATITUDE,
                longitude: FALLBACK_LONGITUDE,
            },
        }
    }

    fn parse_row(&self, row: &csv::StringRecord, line: u64) -> Result<Record, StoreError> {
        let field = |index: usize| row.get(index).ok_or(StoreError::MalformedRow { line });

        let address = field(self.address)?.to_owned();
        let price = field(self.price)?;
        let latitude = field(self.latitude)?;
        let longitude = field(self.longitude)?;

        let price = price.parse::<u64>().map_err(|_| StoreError::InvalidPrice {
            line,
            value: price.to_owned(),
        })?;
        let latitude = parse_coordinate(latitude, line)?;
        let longitude = parse_coordinate(longitude, line)?;

        Ok(Record {
            address,
            price,
            latitude,
            longitude,
        })
    }
}

fn parse_coordinate(value: &str, line: u64) -> Result<f64, StoreError> {
    value
        .parse::<f64>()
        .map_err(|_| StoreError::InvalidCoordinate {
            line,
            value: value.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMED_CSV: &str = "\
addr,city,price,lat,long
A,Sacramento,100,40.0,-75.0
B,Sacramento,200,41.0,-74.0
C,Sacramento,300,42.0,-73.0
";

    #[test]
    fn test_load_fixture_file() {
        let store = RecordStore::from_path("test-inputs/houses.csv").unwrap();

        assert_eq!(store.len(), 5);
        assert_eq!(
            store.get("3526 HIGH ST"),
            Some(&Record {
                address: "3526 HIGH ST".to_owned(),
                price: 59222,
                latitude: 38.631913,
                longitude: -121.434879,
            })
        );
    }

    #[test]
    fn test_named_column_lookup() {
        let store = RecordStore::from_reader(NAMED_CSV.as_bytes()).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("B").unwrap().price, 200);
        assert_eq!(store.get("C").unwrap().latitude, 42.0);
    }

    #[test]
    fn test_positional_fallback() {
        let csv = "\
c0,c1,c2,c3,c4,c5,c6,c7,c8,c9,c10,c11
A,x,x,x,x,x,x,x,x,100,40.0,-75.0
";
        let store = RecordStore::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(
            store.get("A"),
            Some(&Record {
                address: "A".to_owned(),
                price: 100,
                latitude: 40.0,
                longitude: -75.0,
            })
        );
    }

    #[test]
    fn test_missing_file() {
        let err = RecordStore::from_path("test-inputs/no-such-file.csv").unwrap_err();
        assert!(matches!(err, StoreError::FileNotFound { .. }));
    }

    #[test]
    fn test_short_row_is_malformed() {
        let csv = "\
c0,c1,c2,c3,c4,c5,c6,c7,c8,c9,c10,c11
A,x,x,x,x,x,x,x,x,100,40.0,-75.0
B,x,x
";
        let err = RecordStore::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow { line: 3 }));
    }

    #[test]
    fn test_invalid_price() {
        let csv = "\
addr,price,lat,long
A,cheap,40.0,-75.0
";
        let err = RecordStore::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPrice { line: 2, .. }));
    }

    #[test]
    fn test_invalid_coordinate() {
        let csv = "\
addr,price,lat,long
A,100,north,-75.0
";
        let err = RecordStore::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidCoordinate { line: 2, .. }));
    }

    #[test]
    fn test_duplicate_address_last_write_wins() {
        let csv = "\
addr,price,lat,long
A,100,40.0,-75.0
A,250,41.0,-74.0
";
        let store = RecordStore::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("A").unwrap().price, 250);
    }

    #[test]
    fn test_filter_keeps_records_at_or_under_cutoff() {
        let store = RecordStore::from_reader(NAMED_CSV.as_bytes()).unwrap();
        let cheap = store.filter_by_max_price(200);

        assert_eq!(cheap.len(), 2);
        assert!(cheap.values().all(|record| record.price <= 200));
        assert!(cheap.get("A").is_some());
        assert!(cheap.get("B").is_some());
        // Original store is untouched.
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_filter_boundary_is_inclusive() {
        let store = RecordStore::from_reader(NAMED_CSV.as_bytes()).unwrap();

        assert_eq!(store.filter_by_max_price(100).len(), 1);
        assert_eq!(store.filter_by_max_price(99).len(), 0);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let store = RecordStore::from_reader(NAMED_CSV.as_bytes()).unwrap();
        let once = store.filter_by_max_price(150);
        let twice = once.filter_by_max_price(150);

        assert_eq!(once.len(), twice.len());
        assert_eq!(once.get("A"), twice.get("A"));
    }

    #[test]
    fn test_scenario_cutoff_150_keeps_only_a() {
        let store = RecordStore::from_reader(NAMED_CSV.as_bytes()).unwrap();
        let cheap = store.filter_by_max_price(150);

        assert_eq!(cheap.len(), 1);
        assert!(cheap.get("A").is_some());
    }
}

use csv::ReaderBuilder;
use serde::Deserialize;
use thiserror::Error;
use crate::record::{Identity, Record, RecordError};
use crate::source::model::Address;
use crate::utils::join_non_empty;

/// `organization` value marking a row that describes a person
const NO_ORGANIZATION: &str = "N/A";

#[derive(Debug, Error)]
pub enum TsvError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("invalid data row {row}: {source}")]
    Record { row: usize, source: RecordError },
}

/// One data row; columns are matched by header name.
#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    first: String,
    #[serde(default)]
    middle: String,
    #[serde(default)]
    last: String,
    organization: String,
    address: String,
    city: String,
    state: String,
    #[serde(default)]
    county: String,
    zip: String,
    #[serde(default)]
    zip4: String,
}

impl From<Row> for Address {
    fn from(row: Row) -> Self {
        let identity = if row.organization.trim() == NO_ORGANIZATION {
            Identity::Person(join_non_empty([row.first.as_str(), row.middle.as_str(), row.last.as_str()]))
        } else {
            Identity::Organization(row.organization)
        };
        Self {
            identity: Some(identity),
            street: row.address,
            county: Some(row.county),
            city: row.city,
            state: row.state,
            zip: row.zip,
            zip4: Some(row.zip4),
            country: None,
        }
    }
}

/// Extract one record per data row of a tab-separated file with a header line.
pub fn parse_str(text: &str) -> Result<Vec<Record>, TsvError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());

    rdr.deserialize::<Row>()
        .enumerate()
        .map(|(idx, row)| {
            Record::try_from(Address::from(row?))
                .map_err(|source| TsvError::Record { row: idx + 1, source })
        })
        .collect()
}

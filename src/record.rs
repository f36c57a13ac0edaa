use serde::Serialize;
use thiserror::Error;
use crate::source::model::Address;
use crate::utils::non_empty;

/// Sort key used for a record without a zip code.
///
/// [`Record`] refuses an empty zip, so this only matters if that rule is ever relaxed.
const MISSING_ZIP: &str = "99999";

/// Who an address belongs to: a person or a company, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Identity {
    #[serde(rename = "name")]
    Person(String),
    #[serde(rename = "organization")]
    Organization(String),
}

impl Identity {
    /// trimmed copy, `None` if the value is blank
    fn normalized(self) -> Option<Self> {
        match self {
            Identity::Person(name) => non_empty(&name).map(Identity::Person),
            Identity::Organization(org) => non_empty(&org).map(Identity::Organization),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("entry has neither a name nor an organization")]
    MissingIdentity,
    #[error("required field `{0}` is empty")]
    EmptyField(&'static str),
}

/// The canonical address record written to the output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(flatten)]
    identity: Identity,
    street: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    county: Option<String>,
    city: String,
    state: String,
    zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
}

impl Record {
    fn sort_key(&self) -> &str {
        if self.zip.is_empty() {
            MISSING_ZIP
        } else {
            &self.zip
        }
    }
}

impl TryFrom<Address> for Record {
    type Error = RecordError;

    fn try_from(address: Address) -> Result<Self, Self::Error> {
        fn required(field: &'static str, value: &str) -> Result<String, RecordError> {
            non_empty(value).ok_or(RecordError::EmptyField(field))
        }

        Ok(
            Self {
                zip: required("zip", &address.full_zip())?,
                identity: address.identity
                    .and_then(Identity::normalized)
                    .ok_or(RecordError::MissingIdentity)?,
                street: required("street", &address.street)?,
                county: address.county.as_deref().and_then(non_empty),
                city: required("city", &address.city)?,
                state: required("state", &address.state)?,
                country: address.country.as_deref().and_then(non_empty),
            }
        )
    }
}

#[cfg(test)]
impl Record {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn zip(&self) -> &str {
        &self.zip
    }

    pub fn county(&self) -> Option<&str> {
        self.county.as_deref()
    }
}

/// Order records by zip code, compared as plain strings.
///
/// The sort is stable: records sharing a zip keep their input order.
pub fn sort_records(records: &mut [Record]) {
    records.sort_by(|r1, r2| r1.sort_key().cmp(r2.sort_key()));
}

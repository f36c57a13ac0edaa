use thiserror::Error;
use crate::record::{Identity, Record, RecordError};
use crate::source::model::Address;

const BLOCK_SEPARATOR: &str = "\n\n";
const COUNTY_TOKEN: &str = "COUNTY";

#[derive(Debug, Error)]
#[error("invalid block {block}: {source}")]
pub struct TxtError {
    block: usize,
    source: BlockError,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("expected at least {0} lines")]
    MissingLine(usize),
    #[error("expected `city, STATE ZIP`, got {0:?}")]
    MalformedLocality(String),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Extract one record per blank-line separated block.
///
/// Each block reads:
///
/// ```text
/// name
/// street
/// [county COUNTY]
/// city, STATE ZIP
/// ```
pub fn parse_str(text: &str) -> Result<Vec<Record>, TxtError> {
    let text = text.replace("\r\n", "\n");
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    text.split(BLOCK_SEPARATOR)
        .enumerate()
        .map(|(idx, block)| parse_block(block).map_err(|source| TxtError { block: idx + 1, source }))
        .collect()
}

fn parse_block(block: &str) -> Result<Record, BlockError> {
    let lines = block.lines().collect::<Vec<_>>();
    let line = |idx: usize| lines.get(idx).copied().ok_or(BlockError::MissingLine(idx + 1));

    // commas only separate name parts, e.g. `DOE, JOHN`
    let name = line(0)?.replace(',', "");
    let street = line(1)?;

    let third = line(2)?;
    let (county, locality) = if third.contains(COUNTY_TOKEN) {
        (Some(third.replace(COUNTY_TOKEN, "")), line(3)?)
    } else {
        (None, third)
    };
    let (city, state, zip) = split_locality(locality)?;

    Ok(
        Record::try_from(Address {
            identity: Some(Identity::Person(name)),
            street: street.to_owned(),
            county,
            city: city.to_owned(),
            state: state.to_owned(),
            zip: zip.to_owned(),
            ..Default::default()
        })?
    )
}

/// split `city, STATE ZIP`
fn split_locality(line: &str) -> Result<(&str, &str, &str), BlockError> {
    let malformed = || BlockError::MalformedLocality(line.to_owned());

    let (city, rest) = line.split_once(',')
        .filter(|(_, rest)| !rest.contains(','))
        .ok_or_else(malformed)?;
    let mut tokens = rest.split_whitespace();
    let state = tokens.next().ok_or_else(malformed)?;
    let zip = tokens.next().ok_or_else(malformed)?;
    Ok((city.trim(), state, zip))
}

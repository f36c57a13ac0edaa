use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use crate::record::Record;

pub mod model;
mod tsv;
mod txt;
mod xml;

pub use tsv::TsvError;
pub use txt::TxtError;
pub use xml::XmlError;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read file: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Xml(#[from] XmlError),
    #[error(transparent)]
    Tsv(#[from] TsvError),
    #[error(transparent)]
    Txt(#[from] TxtError),
}

/// Input formats, recognized by file name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `<ENT>` elements of an XML document
    Xml,
    /// tab-separated rows under a header line
    Tsv,
    /// blank-line separated text blocks
    Txt,
}

impl SourceFormat {
    /// match the suffix of `path`, case-sensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let path = path.as_os_str().to_string_lossy();
        if path.ends_with(".xml") {
            Some(SourceFormat::Xml)
        } else if path.ends_with(".tsv") {
            Some(SourceFormat::Tsv)
        } else if path.ends_with(".txt") {
            Some(SourceFormat::Txt)
        } else {
            None
        }
    }

    /// read the whole file at `path` and parse it as this format
    pub fn parse(self, path: &Path) -> Result<Vec<Record>, SourceError> {
        let text = fs::read_to_string(path)?;
        Ok(
            match self {
                SourceFormat::Xml => xml::parse_str(&text)?,
                SourceFormat::Tsv => tsv::parse_str(&text)?,
                SourceFormat::Txt => txt::parse_str(&text)?,
            }
        )
    }
}

use crate::record::Identity;

/// basic structure for an address as read from a source file
///
/// Values are kept as they appear in the source; trimming and validation
/// happen when it is turned into a [`Record`](crate::record::Record).
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Address {
    pub identity: Option<Identity>,
    pub street: String,
    pub county: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub zip4: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// `zip` extended with `-zip4` when the source supplied a non-empty one
    pub fn full_zip(&self) -> String {
        match self.zip4.as_deref().map(str::trim) {
            Some(zip4) if !zip4.is_empty() => format!("{}-{}", self.zip.trim(), zip4),
            _ => self.zip.trim().to_owned(),
        }
    }
}

use roxmltree::{Document, Node};
use thiserror::Error;
use crate::record::{Identity, Record, RecordError};
use crate::source::model::Address;
use crate::utils::{join_non_empty, non_empty};

const ENTITY_TAG: &str = "ENT";
/// secondary street lines, appended after `STREET` in this order
const EXTRA_STREET_TAGS: [&str; 2] = ["STREET_2", "STREET_3"];
/// everything after this in a postal code is dropped
const POSTAL_CODE_SUFFIX: &str = " -";

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed document: {0}")]
    Document(#[from] roxmltree::Error),
    #[error("entity at line {line} has no <{tag}> element")]
    MissingElement { tag: &'static str, line: u32 },
    #[error("invalid entity at line {line}: {source}")]
    Record { line: u32, source: RecordError },
}

/// Extract one record per `<ENT>` element, wherever it sits in the tree.
///
/// A blank document has nothing to extract and yields no records.
pub fn parse_str(text: &str) -> Result<Vec<Record>, XmlError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let document = Document::parse(text)?;

    document.descendants()
        .filter(|node| node.has_tag_name(ENTITY_TAG))
        .map(|entity| {
            let line = document.text_pos_at(entity.range().start).row;
            let address = parse_entity(entity, line)?;
            Record::try_from(address).map_err(|source| XmlError::Record { line, source })
        })
        .collect()
}

fn parse_entity(entity: Node, line: u32) -> Result<Address, XmlError> {
    let required = |tag: &'static str| {
        child_text(entity, tag).ok_or(XmlError::MissingElement { tag, line })
    };

    let identity = if let Some(name) = child_text(entity, "NAME").as_deref().and_then(non_empty) {
        Some(Identity::Person(name))
    } else {
        child_text(entity, "COMPANY").as_deref().and_then(non_empty).map(Identity::Organization)
    };

    let street = required("STREET")?;
    let extra_streets = EXTRA_STREET_TAGS.iter()
        .filter_map(|tag| child_text(entity, tag))
        .collect::<Vec<_>>();
    let street = join_non_empty(
        std::iter::once(street.as_str()).chain(extra_streets.iter().map(String::as_str))
    );

    let postal_code = required("POSTAL_CODE")?;
    let postal_code = postal_code.trim();
    let zip = postal_code.split(POSTAL_CODE_SUFFIX)
        .next()
        .unwrap_or(postal_code);

    Ok(
        Address {
            identity,
            street,
            city: required("CITY")?,
            state: required("STATE")?,
            zip: zip.to_owned(),
            country: child_text(entity, "COUNTRY").as_deref().and_then(non_empty),
            ..Default::default()
        }
    )
}

/// all text inside the first `tag` child, empty when the element has none
fn child_text(entity: Node, tag: &str) -> Option<String> {
    entity.children()
        .find(|child| child.has_tag_name(tag))
        .map(|child| {
            child.descendants()
                .filter(Node::is_text)
                .filter_map(|node| node.text())
                .collect::<String>()
        })
}

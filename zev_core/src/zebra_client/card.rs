//! A minimal element tree for a single `<CARD>` fragment.

use std::str::Utf8Error;

use quick_xml::{
    events::{attributes::AttrError, BytesStart, Event},
    Reader,
};
use thiserror::Error;

use crate::event::{parse_date_ddmmyyyy, parse_display_order, EventRecord};

static TAG_FIELDS: &str = "FIELDS";
static TAG_ID: &str = "ID";
static TAG_NAME: &str = "EV_N";
static TAG_DATE: &str = "EV_D";
static TAG_HOUR: &str = "EVE_HOUR";
static TAG_LOCATION: &str = "EVE_LOC";
static TAG_ORDER: &str = "EVE_ORDER";
static TAG_STATUS: &str = "STA_EV";

/// The fields requested from the CRM for every card, in request order.
pub static FIELD_TAGS: [&str; 6] = [
    TAG_NAME,
    TAG_DATE,
    TAG_HOUR,
    TAG_LOCATION,
    TAG_ORDER,
    TAG_STATUS,
];

#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid escape sequence: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("tag name is not valid UTF-8: {0}")]
    Utf8(#[from] Utf8Error),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("fragment contains no element")]
    Empty,
}

/// One element of a parsed card fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Attributes are not kept, but each one must be well-formed.
    fn new(start: &BytesStart) -> Result<Self, FragmentError> {
        for attribute in start.attributes() {
            attribute?;
        }
        Ok(Self {
            name: std::str::from_utf8(start.name().as_ref())?.to_string(),
            ..Default::default()
        })
    }

    /// The first direct child called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// The first element called `name` below this one, searched depth first.
    pub fn descendant(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| {
            if child.name == name {
                Some(child)
            } else {
                child.descendant(name)
            }
        })
    }

    /// The trimmed text of the direct child `name`, or an empty string if there is none.
    pub fn child_text(&self, name: &str) -> &str {
        self.child(name).map_or("", |child| child.text.trim())
    }
}

/// A card fragment which parsed as well-formed XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    root: Element,
}

impl Card {
    /// Parse a single `<CARD>` fragment.
    ///
    /// The fragment must contain exactly one balanced root element; anything after it is
    /// ignored.
    pub fn parse(fragment: &str) -> Result<Self, FragmentError> {
        let mut reader = Reader::from_str(fragment);
        let mut open: Vec<Element> = vec![];
        loop {
            match reader.read_event()? {
                Event::Start(start) => open.push(Element::new(&start)?),
                Event::Empty(start) => {
                    let element = Element::new(&start)?;
                    match open.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(Self { root: element }),
                    }
                }
                // only the text in front of the first child belongs to an element
                Event::Text(text) => {
                    if let Some(current) = open.last_mut() {
                        if current.children.is_empty() {
                            current.text.push_str(&text.unescape()?);
                        }
                    }
                }
                Event::CData(cdata) => {
                    if let Some(current) = open.last_mut() {
                        if current.children.is_empty() {
                            current.text.push_str(std::str::from_utf8(&cdata)?);
                        }
                    }
                }
                Event::End(_) => {
                    let Some(element) = open.pop() else {
                        return Err(FragmentError::Empty);
                    };
                    match open.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(Self { root: element }),
                    }
                }
                Event::Eof => {
                    return Err(match open.pop() {
                        Some(element) => FragmentError::Unclosed(element.name),
                        None => FragmentError::Empty,
                    });
                }
                _ => {}
            }
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Build the event record of this card.
    ///
    /// Returns `None` if the card has no `FIELDS` container.
    pub fn to_record(&self) -> Option<EventRecord> {
        let fields = self.root.descendant(TAG_FIELDS)?;
        let raw_date = fields.child_text(TAG_DATE);
        Some(EventRecord {
            id: self
                .root
                .child(TAG_ID)
                .map(|id| id.text.trim().to_string()),
            name: fields.child_text(TAG_NAME).to_string(),
            raw_date: raw_date.to_string(),
            parsed_date: parse_date_ddmmyyyy(raw_date),
            hour: fields.child_text(TAG_HOUR).to_string(),
            location: fields.child_text(TAG_LOCATION).to_string(),
            display_order: parse_display_order(fields.child_text(TAG_ORDER)),
            status_flag: fields.child_text(TAG_STATUS).to_string(),
        })
    }
}

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{ElementChild, ElementKind, SourceElement};
use crate::errors::{Error, ErrorKind, Result};

enum ParserState {
    Top,
    /// `fault` holds the first malformed child; the element is reported as that
    /// error once it closes.
    Element { element: SourceElement, fault: Option<Error> },
}

/// Streams the top level elements of an .osm file, in document order. Relations come
/// through as `ElementKind::Other` with their attributes only; their members and tags
/// are not read. A malformed child turns its element into a `MissingAttribute` error
/// and reading carries on with the next element; any other error ends the stream.
pub struct OsmElementReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    state: ParserState,
    finished: bool,
}

pub fn open_osm_file(path: &Path) -> Result<OsmElementReader<Box<dyn BufRead>>> {
    let file_reader = BufReader::new(fs::File::open(path)?);
    let input: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "xz") {
        Box::new(BufReader::new(XzDecoder::new(file_reader)))
    } else {
        Box::new(file_reader)
    };
    Ok(OsmElementReader::new(input))
}

impl<R: BufRead> OsmElementReader<R> {
    pub fn new(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.trim_text(true);
        OsmElementReader {
            reader,
            buf: Vec::new(),
            state: ParserState::Top,
            finished: false,
        }
    }

    fn element_kind(name: &[u8]) -> Option<ElementKind> {
        match name {
            b"node" => Some(ElementKind::Point),
            b"way" => Some(ElementKind::Way),
            b"relation" => Some(ElementKind::Other("relation".to_string())),
            _ => None,
        }
    }

    fn read_attributes(el: &BytesStart) -> Result<HashMap<String, String>> {
        let mut attributes = HashMap::new();
        for attribute_res in el.attributes() {
            let attribute = attribute_res?;
            let key = str::from_utf8(attribute.key.as_ref())?.to_string();
            let value = attribute.unescape_value()?.into_owned();
            attributes.insert(key, value);
        }
        Ok(attributes)
    }

    fn take_attribute(attributes: &mut HashMap<String, String>, child: &str, name: &str) -> Result<String> {
        attributes.remove(name).ok_or_else(|| {
            Error::new(
                ErrorKind::MissingAttribute,
                format!("<{}> child is missing required attribute '{}'", child, name),
            )
        })
    }

    fn parse_child(el: &BytesStart, kind: &ElementKind) -> Result<Option<ElementChild>> {
        match el.name().as_ref() {
            b"tag" => {
                let mut attributes = Self::read_attributes(el)?;
                Ok(Some(ElementChild::Tag {
                    k: Self::take_attribute(&mut attributes, "tag", "k")?,
                    v: Self::take_attribute(&mut attributes, "tag", "v")?,
                }))
            },
            b"nd" if *kind == ElementKind::Way => {
                let mut attributes = Self::read_attributes(el)?;
                Ok(Some(ElementChild::MemberRef {
                    node_ref: Self::take_attribute(&mut attributes, "nd", "ref")?,
                }))
            },
            other => {
                let child = String::from_utf8_lossy(other);
                warn!(child = &*child; "Skipping unexpected child element");
                Ok(None)
            },
        }
    }

    /// Handles a start (or self-closing) tag. Returns a finished element for
    /// self-closing nodes and ways.
    fn on_start(&mut self, el: &BytesStart, self_closing: bool) -> Result<Option<SourceElement>> {
        match &mut self.state {
            ParserState::Top => {
                if let Some(kind) = Self::element_kind(el.name().as_ref()) {
                    let element = SourceElement {
                        kind,
                        attributes: Self::read_attributes(el)?,
                        children: Vec::new(),
                    };
                    if self_closing {
                        return Ok(Some(element));
                    }
                    self.state = ParserState::Element { element, fault: None };
                }
                Ok(None)
            },
            ParserState::Element { element, fault } => {
                if let ElementKind::Other(_) = element.kind {
                    return Ok(None);
                }
                match Self::parse_child(el, &element.kind) {
                    Ok(Some(child)) => element.children.push(child),
                    Ok(None) => (),
                    Err(err) if err.kind == ErrorKind::MissingAttribute => {
                        if fault.is_none() {
                            let message = format!(
                                "element {}: {}",
                                element.id().unwrap_or("without id"),
                                err.message,
                            );
                            *fault = Some(Error::new(ErrorKind::MissingAttribute, message));
                        }
                    },
                    Err(err) => return Err(err),
                }
                Ok(None)
            },
        }
    }

    fn on_end(&mut self, name: &[u8]) -> Option<Result<SourceElement>> {
        let closes_current = match &self.state {
            ParserState::Element { element, .. } => Self::element_kind(name).as_ref() == Some(&element.kind),
            ParserState::Top => false,
        };
        if !closes_current {
            return None;
        }
        match std::mem::replace(&mut self.state, ParserState::Top) {
            ParserState::Element { fault: Some(err), .. } => Some(Err(err)),
            ParserState::Element { element, fault: None } => Some(Ok(element)),
            ParserState::Top => None,
        }
    }

    fn next_element(&mut self) -> Result<Option<SourceElement>> {
        loop {
            self.buf.clear();
            // The event borrows `buf`, so take ownership of what we need before reading on.
            let event = self.reader.read_event_into(&mut self.buf)?.into_owned();
            match event {
                Event::Eof => {
                    return match self.state {
                        ParserState::Top => Ok(None),
                        _ => Err("Unexpected end of file inside an element.".into()),
                    };
                },
                Event::Start(e) => {
                    if let Some(element) = self.on_start(&e, false)? {
                        return Ok(Some(element));
                    }
                },
                Event::Empty(e) => {
                    if let Some(element) = self.on_start(&e, true)? {
                        return Ok(Some(element));
                    }
                },
                Event::End(e) => {
                    if let Some(element_res) = self.on_end(e.name().as_ref()) {
                        return element_res.map(Some);
                    }
                },
                // Declarations, comments, text and the like carry no map data.
                _ => (),
            }
        }
    }
}

impl<R: BufRead> Iterator for OsmElementReader<R> {
    type Item = Result<SourceElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.finished = true;
                None
            },
            Err(err) => {
                self.finished = err.kind != ErrorKind::MissingAttribute;
                Some(Err(err))
            },
        }
    }
}

//! MeSH descriptor XML parser.
//!
//! Provides a streaming parser over `descYYYY.xml` content. Only the four
//! fields needed for hierarchy extraction are read from each
//! `DescriptorRecord`; everything else in the record is skipped.

use std::time::Instant;

use mesh_types::{DescriptorRecord, TreeNumber};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::types::{CatalogAnomaly, MeshError, MeshResult, MissingField, ParseStats};

const DESCRIPTOR_RECORD: &[u8] = b"DescriptorRecord";

/// Output of a complete parse.
#[derive(Debug, Clone, Default)]
pub struct ParsedCatalog {
    /// Accepted records in document order.
    pub records: Vec<DescriptorRecord>,
    /// Parse statistics.
    pub stats: ParseStats,
    /// Records dropped for missing fields.
    pub anomalies: Vec<CatalogAnomaly>,
}

/// Descriptor field captured from element text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Identifier,
    Name,
    Annotation,
    ScopeNote,
    TreeNumber,
}

impl Field {
    /// Maps an element path, relative to the enclosing `DescriptorRecord`,
    /// to the field it carries.
    fn classify(relative: &[Vec<u8>]) -> Option<Self> {
        match relative {
            [ui] if ui.as_slice() == b"DescriptorUI" => Some(Self::Identifier),
            [name, string] if name.as_slice() == b"DescriptorName" && string.as_slice() == b"String" => {
                Some(Self::Name)
            }
            [annotation] if annotation.as_slice() == b"Annotation" => Some(Self::Annotation),
            [list, tn] if list.as_slice() == b"TreeNumberList" && tn.as_slice() == b"TreeNumber" => {
                Some(Self::TreeNumber)
            }
            [.., concept, note] if concept.as_slice() == b"Concept" && note.as_slice() == b"ScopeNote" => {
                Some(Self::ScopeNote)
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

/// Fields collected for the record currently open.
#[derive(Debug, Default)]
struct RecordBuilder {
    depth: usize,
    mesh_id: Option<String>,
    name: Option<String>,
    annotation: Option<String>,
    scope_note: Option<String>,
    tree_numbers: Vec<TreeNumber>,
    capture: Option<Capture>,
}

impl RecordBuilder {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    /// Returns true if the first occurrence of `field` was already read.
    fn has(&self, field: Field) -> bool {
        match field {
            Field::Identifier => self.mesh_id.is_some(),
            Field::Name => self.name.is_some(),
            Field::Annotation => self.annotation.is_some(),
            Field::ScopeNote => self.scope_note.is_some(),
            Field::TreeNumber => false,
        }
    }

    fn store(&mut self, field: Field, text: String) {
        let text = text.trim().to_string();
        match field {
            Field::Identifier => self.mesh_id = Some(text),
            Field::Name => self.name = Some(text),
            Field::Annotation => self.annotation = Some(text),
            Field::ScopeNote => self.scope_note = Some(text),
            Field::TreeNumber => {
                if !text.is_empty() {
                    self.tree_numbers.push(TreeNumber::new(text));
                }
            }
        }
    }

    fn build(self) -> Result<DescriptorRecord, (MissingField, Option<String>)> {
        let mesh_id = match self.mesh_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => return Err((MissingField::Identifier, None)),
        };
        let name = match self.name.filter(|name| !name.is_empty()) {
            Some(name) => name,
            None => return Err((MissingField::Name, Some(mesh_id))),
        };
        let definition = self
            .annotation
            .filter(|a| !a.is_empty())
            .or(self.scope_note)
            .unwrap_or_default();

        Ok(DescriptorRecord {
            mesh_id,
            name,
            definition,
            tree_numbers: self.tree_numbers,
        })
    }
}

/// A streaming parser for MeSH descriptor XML.
///
/// Yields one [`DescriptorRecord`] per complete `DescriptorRecord` element.
/// Records without identifier or name are skipped and counted. Structural
/// XML errors end the iteration with [`MeshError::MalformedInput`].
///
/// # Example
///
/// ```
/// use mesh_loader::DescriptorParser;
///
/// let xml = r#"<DescriptorRecordSet>
///   <DescriptorRecord>
///     <DescriptorUI>D000001</DescriptorUI>
///     <DescriptorName><String>Calcimycin</String></DescriptorName>
///     <TreeNumberList><TreeNumber>D03.633.100</TreeNumber></TreeNumberList>
///   </DescriptorRecord>
/// </DescriptorRecordSet>"#;
///
/// let parsed = DescriptorParser::from_str(xml).parse_all().unwrap();
/// assert_eq!(parsed.records.len(), 1);
/// assert_eq!(parsed.records[0].name, "Calcimycin");
/// ```
pub struct DescriptorParser<'a> {
    reader: Reader<&'a [u8]>,
    path: Vec<Vec<u8>>,
    current: Option<RecordBuilder>,
    root_seen: bool,
    root_closed: bool,
    done: bool,
    started: Instant,
    stats: ParseStats,
    anomalies: Vec<CatalogAnomaly>,
}

impl<'a> DescriptorParser<'a> {
    /// Creates a parser over XML text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
            path: Vec::new(),
            current: None,
            root_seen: false,
            root_closed: false,
            done: false,
            started: Instant::now(),
            stats: ParseStats::default(),
            anomalies: Vec::new(),
        }
    }

    /// Returns statistics gathered so far.
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Consumes the parser, returning its statistics and anomalies.
    pub fn finish(self) -> (ParseStats, Vec<CatalogAnomaly>) {
        (self.stats, self.anomalies)
    }

    /// Parses every record, failing on the first structural error.
    pub fn parse_all(mut self) -> MeshResult<ParsedCatalog> {
        let records = self.by_ref().collect::<MeshResult<Vec<_>>>()?;
        let (stats, anomalies) = self.finish();
        Ok(ParsedCatalog {
            records,
            stats,
            anomalies,
        })
    }

    fn byte_position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    fn open(&mut self, name: &[u8]) -> MeshResult<()> {
        if self.path.is_empty() {
            if self.root_closed {
                return Err(MeshError::malformed(
                    self.byte_position(),
                    "element found after the root element",
                ));
            }
            self.root_seen = true;
        }
        self.path.push(name.to_vec());
        let depth = self.path.len();

        match self.current.as_mut() {
            None => {
                if name == DESCRIPTOR_RECORD {
                    self.stats.total_records += 1;
                    self.current = Some(RecordBuilder::new(depth));
                }
            }
            Some(builder) => {
                if builder.capture.is_none() {
                    if let Some(field) = Field::classify(&self.path[builder.depth..]) {
                        if !builder.has(field) {
                            builder.capture = Some(Capture {
                                field,
                                depth,
                                text: String::new(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn close(&mut self) -> MeshResult<Option<DescriptorRecord>> {
        let depth = self.path.len();
        if depth == 0 {
            return Err(MeshError::malformed(
                self.byte_position(),
                "closing tag without matching opening tag",
            ));
        }

        let mut finished = None;
        if let Some(builder) = self.current.as_mut() {
            if builder.capture.as_ref().is_some_and(|c| c.depth == depth) {
                if let Some(capture) = builder.capture.take() {
                    builder.store(capture.field, capture.text);
                }
            }
            if builder.depth == depth {
                finished = self.current.take();
            }
        }

        self.path.pop();
        if self.path.is_empty() {
            self.root_closed = true;
        }

        let Some(builder) = finished else {
            return Ok(None);
        };

        match builder.build() {
            Ok(record) => {
                self.stats.accepted_records += 1;
                self.stats.tree_numbers += record.tree_numbers.len();
                Ok(Some(record))
            }
            Err((missing, mesh_id)) => {
                let position = self.byte_position();
                tracing::debug!(
                    position,
                    %missing,
                    mesh_id = mesh_id.as_deref().unwrap_or(""),
                    "Skipping incomplete descriptor record"
                );
                self.stats.skipped_records += 1;
                self.anomalies.push(CatalogAnomaly::IncompleteRecord {
                    position,
                    missing,
                    mesh_id,
                });
                Ok(None)
            }
        }
    }

    fn text(&mut self, text: &str) -> MeshResult<()> {
        if self.path.is_empty() {
            if !text.trim().is_empty() {
                return Err(MeshError::malformed(
                    self.byte_position(),
                    "text outside the root element",
                ));
            }
            return Ok(());
        }
        let depth = self.path.len();
        if let Some(capture) = self
            .current
            .as_mut()
            .and_then(|b| b.capture.as_mut())
            .filter(|c| c.depth == depth)
        {
            capture.text.push_str(text);
        }
        Ok(())
    }

    fn end_of_input(&mut self) -> MeshResult<()> {
        if let Some(open) = self.path.last() {
            return Err(MeshError::malformed(
                self.byte_position(),
                format!(
                    "unexpected end of input: <{}> is not closed",
                    String::from_utf8_lossy(open)
                ),
            ));
        }
        if !self.root_seen {
            return Err(MeshError::malformed(self.byte_position(), "no root element"));
        }
        self.stats.parse_time_ms = self.started.elapsed().as_millis() as u64;
        Ok(())
    }

    /// Reads events until a record completes or input ends.
    fn advance(&mut self) -> MeshResult<Option<DescriptorRecord>> {
        loop {
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(e) => return Err(MeshError::malformed(self.byte_position(), e.to_string())),
            };

            let record = match event {
                Event::Start(e) => {
                    self.open(e.name().as_ref())?;
                    None
                }
                Event::Empty(e) => {
                    self.open(e.name().as_ref())?;
                    self.close()?
                }
                Event::End(_) => self.close()?,
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|err| MeshError::malformed(self.byte_position(), err.to_string()))?;
                    self.text(&text)?;
                    None
                }
                Event::CData(e) => {
                    let text = std::str::from_utf8(&e)
                        .map_err(|err| MeshError::malformed(self.byte_position(), err.to_string()))?;
                    self.text(text)?;
                    None
                }
                Event::Eof => {
                    self.end_of_input()?;
                    return Ok(None);
                }
                _ => None,
            };

            if record.is_some() {
                return Ok(record);
            }
        }
    }
}

impl Iterator for DescriptorParser<'_> {
    type Item = MeshResult<DescriptorRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

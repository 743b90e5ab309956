//! OAEI Alignment format reader (RDF/XML)
//!
//! Reads the subset of the Alignment API format used by OAEI result and
//! reference files:
//!
//! ```xml
//! <Alignment>
//!   <onto1><Ontology rdf:about="http://cmt"/></onto1>
//!   <map>
//!     <Cell>
//!       <entity1 rdf:resource="http://cmt#Paper"/>
//!       <entity2 rdf:resource="http://edas#Paper"/>
//!       <relation>=</relation>
//!       <measure rdf:datatype="xsd:float">0.93</measure>
//!     </Cell>
//!   </map>
//! </Alignment>
//! ```
//!
//! Elements are matched by local name, so any namespace prefix is accepted.

use super::{Alignment, Correspondence};
use crate::error::{EvalError, EvalResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;
use tracing::debug;

/// Element whose text content is being captured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Measure,
    Relation,
    Entity1,
    Entity2,
    Onto1,
    Onto2,
}

/// Cell under construction
#[derive(Debug, Default)]
struct CellBuilder {
    entity1: Option<String>,
    entity2: Option<String>,
    measure: Option<f64>,
    relation: Option<String>,
}

impl CellBuilder {
    fn finish(self, index: usize) -> EvalResult<Correspondence> {
        let entity1 = self
            .entity1
            .ok_or_else(|| EvalError::Alignment(format!("cell {} has no entity1", index)))?;
        let entity2 = self
            .entity2
            .ok_or_else(|| EvalError::Alignment(format!("cell {} has no entity2", index)))?;
        Ok(Correspondence {
            entity1,
            entity2,
            measure: self.measure.unwrap_or(1.0),
            relation: self.relation.unwrap_or_else(|| "=".to_string()),
        })
    }
}

/// Parse an alignment file
///
/// A missing file is reported as `NotFound`.
pub fn parse_alignment(path: &Path) -> EvalResult<Alignment> {
    if !path.is_file() {
        return Err(EvalError::missing_file(path));
    }
    let content = std::fs::read_to_string(path)?;
    let alignment = parse_alignment_str(&content).map_err(|err| match err {
        EvalError::Xml { message, .. } => EvalError::Xml {
            path: path.display().to_string(),
            message,
        },
        EvalError::Alignment(message) => {
            EvalError::Alignment(format!("{}: {}", path.display(), message))
        }
        other => other,
    })?;
    debug!("Parsed {} cells from {}", alignment.len(), path.display());
    Ok(alignment)
}

/// Parse alignment XML from a string
pub fn parse_alignment_str(xml: &str) -> EvalResult<Alignment> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut alignment = Alignment::default();
    let mut cell: Option<CellBuilder> = None;
    let mut capture: Option<TextField> = None;
    let mut onto_scope: Option<TextField> = None;

    loop {
        let event = reader.read_event().map_err(|e| EvalError::Xml {
            path: "<string>".to_string(),
            message: format!("at byte {}: {}", reader.buffer_position(), e),
        })?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"Cell" => {
                        if !is_empty {
                            cell = Some(CellBuilder::default());
                        }
                    }
                    b"entity1" | b"entity2" => {
                        let field = if e.local_name().as_ref() == b"entity1" {
                            TextField::Entity1
                        } else {
                            TextField::Entity2
                        };
                        if let Some(builder) = cell.as_mut() {
                            if let Some(iri) = iri_attribute(e)? {
                                set_entity(builder, field, iri);
                            } else if !is_empty {
                                capture = Some(field);
                            }
                        }
                    }
                    b"measure" if cell.is_some() && !is_empty => capture = Some(TextField::Measure),
                    b"relation" if cell.is_some() && !is_empty => capture = Some(TextField::Relation),
                    b"onto1" | b"onto2" if cell.is_none() && !is_empty => {
                        let field = if e.local_name().as_ref() == b"onto1" {
                            TextField::Onto1
                        } else {
                            TextField::Onto2
                        };
                        onto_scope = Some(field);
                        capture = Some(field);
                    }
                    b"Ontology" => {
                        if let Some(field) = onto_scope {
                            if let Some(iri) = iri_attribute(e)? {
                                set_ontology(&mut alignment, field, iri);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(ref t) => {
                if let Some(field) = capture {
                    let text = t.unescape().map_err(|e| EvalError::Xml {
                        path: "<string>".to_string(),
                        message: e.to_string(),
                    })?;
                    let text = text.trim();
                    if !text.is_empty() {
                        apply_text(&mut alignment, cell.as_mut(), field, text)?;
                    }
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"Cell" => {
                    if let Some(builder) = cell.take() {
                        let index = alignment.cells.len();
                        alignment.cells.push(builder.finish(index)?);
                    }
                    capture = None;
                }
                b"onto1" | b"onto2" => {
                    onto_scope = None;
                    capture = None;
                }
                b"measure" | b"relation" | b"entity1" | b"entity2" => capture = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if cell.is_some() {
        return Err(EvalError::Alignment("unterminated Cell element".to_string()));
    }

    Ok(alignment)
}

/// `rdf:resource` or `rdf:about` attribute value, if present
fn iri_attribute(element: &BytesStart<'_>) -> EvalResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| EvalError::Xml {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        let key = attr.key.local_name();
        if key.as_ref() == b"resource" || key.as_ref() == b"about" {
            let value = attr.unescape_value().map_err(|e| EvalError::Xml {
                path: "<string>".to_string(),
                message: e.to_string(),
            })?;
            let value = value.trim();
            if value.is_empty() {
                return Err(EvalError::Alignment("empty entity IRI".to_string()));
            }
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

fn set_entity(builder: &mut CellBuilder, field: TextField, iri: String) {
    match field {
        TextField::Entity1 => builder.entity1 = Some(iri),
        TextField::Entity2 => builder.entity2 = Some(iri),
        _ => {}
    }
}

fn set_ontology(alignment: &mut Alignment, field: TextField, iri: String) {
    let slot = match field {
        TextField::Onto1 => &mut alignment.onto1,
        TextField::Onto2 => &mut alignment.onto2,
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(iri);
    }
}

fn apply_text(
    alignment: &mut Alignment,
    cell: Option<&mut CellBuilder>,
    field: TextField,
    text: &str,
) -> EvalResult<()> {
    match (field, cell) {
        (TextField::Measure, Some(builder)) => {
            let measure: f64 = text
                .parse()
                .map_err(|_| EvalError::Alignment(format!("invalid measure '{}'", text)))?;
            if !measure.is_finite() {
                return Err(EvalError::Alignment(format!("invalid measure '{}'", text)));
            }
            builder.measure = Some(measure);
        }
        (TextField::Relation, Some(builder)) => builder.relation = Some(text.to_string()),
        (TextField::Entity1 | TextField::Entity2, Some(builder)) => {
            set_entity(builder, field, text.to_string())
        }
        (TextField::Onto1 | TextField::Onto2, _) => set_ontology(alignment, field, text.to_string()),
        _ => {}
    }
    Ok(())
}

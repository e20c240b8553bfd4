//! Alignment file formats: the TSV dialect and RDF-Alignment XML.
//!
//! Both formats resolve entity URIs through the [`MatchContext`], so a file
//! can only be read against the knowledge bases it was produced from. Rows
//! naming URIs the context does not know are skipped with a warning; bad
//! similarity or relation cells fall back to `1.0` and `?` respectively.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::context::MatchContext;
use crate::error::{FormatError, FormatResult};

use super::{Alignment, Mapping, MappingStatus, RelationKind};

/// First line of every TSV alignment.
pub const TSV_MARKER: &str = "#ontomatch alignment";
const TSV_SOURCE: &str = "#source ontology:";
const TSV_TARGET: &str = "#target ontology:";
const TSV_HEADER: [&str; 7] = [
    "Source URI",
    "Source Label",
    "Target URI",
    "Target Label",
    "Similarity",
    "Relationship",
    "Status",
];

const ALIGN_NS: &str = "http://knowledgeweb.semanticweb.org/heterogeneity/alignment";
const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// On-disk alignment format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentFormat {
    Tsv,
    Rdf,
}

impl AlignmentFormat {
    /// Pick the format from a file extension (`.tsv`, `.rdf`, `.xml`).
    pub fn from_path(path: &Path) -> FormatResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("tsv") => Ok(AlignmentFormat::Tsv),
            Some("rdf") | Some("xml") => Ok(AlignmentFormat::Rdf),
            _ => Err(FormatError::UnrecognizedExtension {
                path: path.display().to_string(),
            }),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> FormatError {
    FormatError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn csv_error(e: csv::Error) -> FormatError {
    FormatError::Csv {
        message: e.to_string(),
    }
}

fn xml_error(e: impl std::fmt::Display) -> FormatError {
    FormatError::Xml {
        message: e.to_string(),
    }
}

/// Write an alignment to `path` in the format its extension names.
pub fn save(alignment: &Alignment, ctx: &MatchContext, path: &Path) -> FormatResult<()> {
    let format = AlignmentFormat::from_path(path)?;
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let writer = BufWriter::new(file);
    match format {
        AlignmentFormat::Tsv => write_tsv(alignment, ctx, writer)?,
        AlignmentFormat::Rdf => write_rdf(alignment, ctx, writer)?,
    }
    tracing::info!(path = %path.display(), mappings = alignment.len(), ?format, "saved alignment");
    Ok(())
}

/// Read an alignment from `path`, picking the format from its extension.
pub fn load(ctx: &MatchContext, path: &Path) -> FormatResult<Alignment> {
    let format = AlignmentFormat::from_path(path)?;
    let alignment = match format {
        AlignmentFormat::Tsv => {
            let file = File::open(path).map_err(|e| io_error(path, e))?;
            read_tsv(ctx, file)?
        }
        AlignmentFormat::Rdf => {
            let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
            read_rdf(ctx, &text)?
        }
    };
    tracing::info!(path = %path.display(), mappings = alignment.len(), ?format, "loaded alignment");
    Ok(alignment)
}

/// A similarity cell: a finite number in [0, 1]. Anything else is `None`.
fn parse_similarity(cell: &str) -> Option<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && (0.0..=1.0).contains(v))
}

// ---------------------------------------------------------------------------
// TSV
// ---------------------------------------------------------------------------

/// Write the TSV dialect: marker, two ontology lines, header, one row per mapping.
pub fn write_tsv<W: Write>(alignment: &Alignment, ctx: &MatchContext, writer: W) -> FormatResult<()> {
    let mut out = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .flexible(true)
        .from_writer(writer);

    out.write_record([TSV_MARKER]).map_err(csv_error)?;
    out.write_record([TSV_SOURCE, ctx.source().uri()]).map_err(csv_error)?;
    out.write_record([TSV_TARGET, ctx.target().uri()]).map_err(csv_error)?;
    out.write_record(TSV_HEADER).map_err(csv_error)?;

    for m in alignment {
        let source_uri = ctx.source().uri_of(m.source).unwrap_or_default();
        let target_uri = ctx.target().uri_of(m.target).unwrap_or_default();
        let source_label = clean_cell(&ctx.source().label(m.source));
        let target_label = clean_cell(&ctx.target().label(m.target));
        let similarity = format!("{:.4}", m.similarity());
        let mut row = vec![
            source_uri,
            source_label.as_str(),
            target_uri,
            target_label.as_str(),
            similarity.as_str(),
            m.relation.token(),
        ];
        if m.status != MappingStatus::Unknown {
            row.push(m.status.token());
        }
        out.write_record(&row).map_err(csv_error)?;
    }
    out.flush().map_err(|e| FormatError::Csv {
        message: e.to_string(),
    })
}

/// Labels are free text; tabs and newlines would break the row.
fn clean_cell(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}

/// Read the TSV dialect back into an alignment bound to `ctx`.
pub fn read_tsv<R: Read>(ctx: &MatchContext, reader: R) -> FormatResult<Alignment> {
    let mut rows = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut alignment = ctx.new_alignment();
    let mut saw_marker = false;

    for record in rows.records() {
        let record = record.map_err(csv_error)?;
        let first = record.get(0).unwrap_or_default().trim();

        if !saw_marker {
            if first != TSV_MARKER {
                return Err(FormatError::UnrecognizedFormat {
                    detail: format!("expected `{TSV_MARKER}`, found `{first}`"),
                });
            }
            saw_marker = true;
            continue;
        }
        if first.starts_with('#') || first == TSV_HEADER[0] {
            continue;
        }

        let line = record.position().map_or(0, |p| p.line());
        if !(6..=7).contains(&record.len()) {
            return Err(FormatError::MalformedRow {
                line,
                columns: record.len(),
            });
        }

        let (Some(source), Some(target)) = (
            ctx.source().id_for_uri(first),
            ctx.target().id_for_uri(record[2].trim()),
        ) else {
            tracing::warn!(
                line,
                source_uri = first,
                target_uri = &record[2],
                "skipping row with unknown entity"
            );
            continue;
        };

        let similarity = parse_similarity(&record[4]).unwrap_or_else(|| {
            tracing::warn!(line, cell = &record[4], "invalid similarity, using 1.0");
            1.0
        });
        let relation = RelationKind::from_token(&record[5]).unwrap_or(RelationKind::Unknown);
        let status = record
            .get(6)
            .map_or(MappingStatus::Unknown, MappingStatus::from_token);

        alignment.add_full(source, target, similarity, relation, status);
    }

    if !saw_marker {
        return Err(FormatError::UnrecognizedFormat {
            detail: "empty file".into(),
        });
    }
    Ok(alignment)
}

// ---------------------------------------------------------------------------
// RDF-Alignment XML
// ---------------------------------------------------------------------------

/// Alignment API cardinality code, e.g. `11` or `1*`.
fn cardinality_code(alignment: &Alignment) -> String {
    let code = |max: usize| if max <= 1 { '1' } else { '*' };
    format!(
        "{}{}",
        code(alignment.max_source_cardinality()),
        code(alignment.max_target_cardinality())
    )
}

fn text_element<W: Write>(xml: &mut Writer<W>, name: &str, text: &str) -> FormatResult<()> {
    xml.write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)?;
    xml.write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    xml.write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

fn resource_element<W: Write>(xml: &mut Writer<W>, name: &str, uri: &str) -> FormatResult<()> {
    let mut node = BytesStart::new(name);
    node.push_attribute(("rdf:resource", uri));
    xml.write_event(Event::Empty(node)).map_err(xml_error)
}

/// Write an RDF-Alignment document.
pub fn write_rdf<W: Write>(alignment: &Alignment, ctx: &MatchContext, writer: W) -> FormatResult<()> {
    let mut xml = Writer::new_with_indent(writer, b'\t', 1);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_error)?;

    let mut root = BytesStart::new("rdf:RDF");
    root.push_attribute(("xmlns", ALIGN_NS));
    root.push_attribute(("xmlns:rdf", RDF_NS));
    root.push_attribute(("xmlns:xsd", XSD_NS));
    xml.write_event(Event::Start(root)).map_err(xml_error)?;
    xml.write_event(Event::Start(BytesStart::new("Alignment")))
        .map_err(xml_error)?;

    text_element(&mut xml, "xml", "yes")?;
    text_element(&mut xml, "level", "0")?;
    text_element(&mut xml, "type", &cardinality_code(alignment))?;
    text_element(&mut xml, "onto1", ctx.source().uri())?;
    text_element(&mut xml, "onto2", ctx.target().uri())?;

    for m in alignment {
        xml.write_event(Event::Start(BytesStart::new("map")))
            .map_err(xml_error)?;
        xml.write_event(Event::Start(BytesStart::new("Cell")))
            .map_err(xml_error)?;

        resource_element(&mut xml, "entity1", ctx.source().uri_of(m.source).unwrap_or_default())?;
        resource_element(&mut xml, "entity2", ctx.target().uri_of(m.target).unwrap_or_default())?;

        let mut measure = BytesStart::new("measure");
        measure.push_attribute(("rdf:datatype", "http://www.w3.org/2001/XMLSchema#float"));
        xml.write_event(Event::Start(measure)).map_err(xml_error)?;
        xml.write_event(Event::Text(BytesText::new(&format!("{:.4}", m.similarity()))))
            .map_err(xml_error)?;
        xml.write_event(Event::End(BytesEnd::new("measure")))
            .map_err(xml_error)?;

        text_element(&mut xml, "relation", m.relation.token())?;
        if m.status != MappingStatus::Unknown {
            text_element(&mut xml, "status", m.status.token())?;
        }

        xml.write_event(Event::End(BytesEnd::new("Cell")))
            .map_err(xml_error)?;
        xml.write_event(Event::End(BytesEnd::new("map")))
            .map_err(xml_error)?;
    }

    xml.write_event(Event::End(BytesEnd::new("Alignment")))
        .map_err(xml_error)?;
    xml.write_event(Event::End(BytesEnd::new("rdf:RDF")))
        .map_err(xml_error)?;
    xml.into_inner().flush().map_err(xml_error)
}

/// Text-bearing child of `<Cell>` currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellField {
    Measure,
    Relation,
    Status,
}

#[derive(Debug, Default)]
struct CellBuilder {
    entity1: Option<String>,
    entity2: Option<String>,
    measure: Option<String>,
    relation: Option<String>,
    status: Option<String>,
}

fn resource_of(e: &BytesStart<'_>) -> FormatResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.local_name().as_ref() == b"resource" {
            let value = attr.unescape_value().map_err(xml_error)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Read an RDF-Alignment document into an alignment bound to `ctx`.
pub fn read_rdf(ctx: &MatchContext, text: &str) -> FormatResult<Alignment> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut alignment = ctx.new_alignment();
    let mut saw_alignment = false;
    let mut cell: Option<CellBuilder> = None;
    let mut field: Option<CellField> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Alignment" => saw_alignment = true,
                b"Cell" => cell = Some(CellBuilder::default()),
                b"entity1" => {
                    if let Some(c) = cell.as_mut() {
                        c.entity1 = resource_of(&e)?;
                    }
                }
                b"entity2" => {
                    if let Some(c) = cell.as_mut() {
                        c.entity2 = resource_of(&e)?;
                    }
                }
                b"measure" => field = Some(CellField::Measure),
                b"relation" => field = Some(CellField::Relation),
                b"status" => field = Some(CellField::Status),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"entity1" => {
                    if let Some(c) = cell.as_mut() {
                        c.entity1 = resource_of(&e)?;
                    }
                }
                b"entity2" => {
                    if let Some(c) = cell.as_mut() {
                        c.entity2 = resource_of(&e)?;
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if let (Some(c), Some(f)) = (cell.as_mut(), field) {
                    let value = t.unescape().map_err(xml_error)?.into_owned();
                    match f {
                        CellField::Measure => c.measure = Some(value),
                        CellField::Relation => c.relation = Some(value),
                        CellField::Status => c.status = Some(value),
                    }
                }
            }
            Event::End(e) => {
                field = None;
                if e.local_name().as_ref() == b"Cell" {
                    if let Some(c) = cell.take() {
                        add_cell(ctx, &mut alignment, c);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_alignment {
        return Err(FormatError::UnrecognizedFormat {
            detail: "no <Alignment> element".into(),
        });
    }
    Ok(alignment)
}

fn add_cell(ctx: &MatchContext, alignment: &mut Alignment, cell: CellBuilder) {
    let entity1 = cell.entity1.unwrap_or_default();
    let entity2 = cell.entity2.unwrap_or_default();
    let (Some(source), Some(target)) = (
        ctx.source().id_for_uri(&entity1),
        ctx.target().id_for_uri(&entity2),
    ) else {
        tracing::warn!(entity1 = %entity1, entity2 = %entity2, "skipping cell with unknown entity");
        return;
    };

    let similarity = match cell.measure.as_deref() {
        Some(measure) => parse_similarity(measure).unwrap_or_else(|| {
            tracing::warn!(entity1 = %entity1, measure, "invalid measure, using 1.0");
            1.0
        }),
        None => 1.0,
    };
    let relation = cell
        .relation
        .as_deref()
        .and_then(RelationKind::from_token)
        .unwrap_or(RelationKind::Unknown);
    let status = cell
        .status
        .as_deref()
        .map_or(MappingStatus::Unknown, MappingStatus::from_token);

    let m = Mapping::with_relation(source, target, similarity, relation).with_status(status);
    alignment.add_mapping(m);
}

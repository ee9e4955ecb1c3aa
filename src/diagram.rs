//! Diagram cells and their `;`-delimited style strings, the raw shape this
//! crate reads from and writes to an `mxCell`-based diagram XML document
//! (`6. EXTERNAL INTERFACES`, diagram file).

use crate::error::{BridgeError, BridgeResult};
use crate::pipeline::PlacedCell;
use std::collections::HashMap;

/// One `mxCell` element: a vertex (term), an edge (relationship), or an
/// edge label cell whose value must be promoted onto its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramCell {
    pub id: String,
    pub parent: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub value: String,
    pub style: Style,
}

impl DiagramCell {
    /// A cell is a vertex (candidate term) if it names no source/target and
    /// has no `edgeLabel` style tag.
    pub fn is_vertex(&self) -> bool {
        self.source.is_none() && self.target.is_none() && !self.style.has_tag("edgeLabel")
    }

    /// A cell is an edge-label cell if it carries the bare `edgeLabel` tag;
    /// its value is promoted onto its parent cell (`4.F`).
    pub fn is_edge_label(&self) -> bool {
        self.style.has_tag("edgeLabel")
    }

    /// A cell directly describes a relationship if it carries value, source
    /// and target together.
    pub fn is_direct_relationship(&self) -> bool {
        self.source.is_some() && self.target.is_some() && !self.is_edge_label()
    }
}

/// A parsed `style` attribute: `key=value` pairs and bare tags, both held
/// in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    pairs: HashMap<String, String>,
    tags: Vec<String>,
}

impl Style {
    /// Parse a `;`-delimited style string. A term containing `=` is a
    /// key/value pair; anything else is a bare tag.
    pub fn parse(raw: &str) -> Self {
        let mut pairs = HashMap::new();
        let mut tags = Vec::new();
        for term in raw.split(';') {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            match term.split_once('=') {
                Some((key, value)) => {
                    pairs.insert(key.trim().to_string(), value.trim().to_string());
                }
                None => tags.push(term.to_string()),
            }
        }
        Style { pairs, tags }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

/// Read every `mxCell` element out of a diagram XML document
/// (`6. EXTERNAL INTERFACES`, diagram file). Only the attributes this crate
/// cares about are extracted; geometry children, styling beyond the `style`
/// attribute, and any other element in the document are ignored.
pub fn read_xml(xml: &str) -> BridgeResult<Vec<DiagramCell>> {
    let mut cells = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<mxCell") {
        let after = &rest[start + "<mxCell".len()..];
        let end = after
            .find('>')
            .ok_or_else(|| BridgeError::ParseError("unterminated <mxCell> element".to_string()))?;
        let attrs = parse_attributes(&after[..end]);
        rest = &after[end + 1..];

        let id = attrs
            .get("id")
            .cloned()
            .ok_or_else(|| BridgeError::ParseError("<mxCell> missing id attribute".to_string()))?;
        let style = Style::parse(attrs.get("style").map(String::as_str).unwrap_or(""));
        cells.push(DiagramCell {
            id,
            parent: attrs.get("parent").cloned(),
            source: attrs.get("source").cloned(),
            target: attrs.get("target").cloned(),
            value: attrs.get("value").map(|v| unescape_xml(v)).unwrap_or_default(),
            style,
        });
    }
    Ok(cells)
}

/// Parse `key="value"` attribute pairs out of an element's raw tag content
/// (everything between the element name and its closing `>` or `/>`).
fn parse_attributes(tag: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    let mut chars = tag.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !c.is_alphabetic() {
            continue;
        }
        let name_start = i;
        let mut name_end = i + c.len_utf8();
        while let Some(&(j, c2)) = chars.peek() {
            if c2.is_alphanumeric() || c2 == '-' || c2 == '_' {
                name_end = j + c2.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        // Skip whitespace and the `=`.
        while let Some(&(_, c2)) = chars.peek() {
            if c2.is_whitespace() || c2 == '=' {
                chars.next();
            } else {
                break;
            }
        }
        let Some(&(quote_start, quote)) = chars.peek() else { break };
        if quote != '"' && quote != '\'' {
            continue;
        }
        chars.next();
        let value_start = quote_start + 1;
        let mut value_end = value_start;
        for (j, c2) in chars.by_ref() {
            if c2 == quote {
                value_end = j;
                break;
            }
        }
        attrs.insert(tag[name_start..name_end].to_string(), tag[value_start..value_end].to_string());
    }
    attrs
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Write a laid-out cell list back out as an `mxGraphModel` document
/// (`6. EXTERNAL INTERFACES`, diagram file). The document is the minimal
/// shape a diagram editor expects: one `mxCell` per vertex or edge, nested
/// under the conventional root/layer cells `0`/`1`.
pub fn write_xml(cells: &[PlacedCell]) -> String {
    let mut out = String::new();
    out.push_str("<mxGraphModel>\n  <root>\n");
    out.push_str("    <mxCell id=\"0\" />\n");
    out.push_str("    <mxCell id=\"1\" parent=\"0\" />\n");
    for cell in cells {
        match cell {
            PlacedCell::Vertex { id, label, x, y, width, height } => {
                out.push_str(&format!(
                    "    <mxCell id=\"{id}\" value=\"{value}\" style=\"rounded=1;whiteSpace=wrap;html=1\" vertex=\"1\" parent=\"1\">\n      <mxGeometry x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" as=\"geometry\" />\n    </mxCell>\n",
                    id = id,
                    value = escape_xml(label),
                    x = x,
                    y = y,
                    width = width,
                    height = height,
                ));
            }
            PlacedCell::Edge { id, source, target, label, attachment, dashed } => {
                let style = if *dashed {
                    "endArrow=block;dashed=1;html=1"
                } else {
                    "endArrow=block;html=1"
                };
                out.push_str(&format!(
                    "    <mxCell id=\"{id}\" value=\"{value}\" style=\"{style}\" edge=\"1\" parent=\"1\" source=\"{source}\" target=\"{target}\">\n      <mxGeometry relative=\"1\" as=\"geometry\">\n        <mxPoint x=\"{sx}\" y=\"{sy}\" as=\"sourcePoint\" />\n        <mxPoint x=\"{tx}\" y=\"{ty}\" as=\"targetPoint\" />\n      </mxGeometry>\n    </mxCell>\n",
                    id = id,
                    value = escape_xml(label),
                    style = style,
                    source = source,
                    target = target,
                    sx = attachment.start_x,
                    sy = attachment.start_y,
                    tx = attachment.end_x,
                    ty = attachment.end_y,
                ));
            }
        }
    }
    out.push_str("  </root>\n</mxGraphModel>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_tags_and_key_value_pairs() {
        let style = Style::parse("edgeLabel;html=1;align=center");
        assert!(style.has_tag("edgeLabel"));
        assert_eq!(style.get("html"), Some("1"));
        assert_eq!(style.get("align"), Some("center"));
    }

    #[test]
    fn ignores_empty_segments() {
        let style = Style::parse(";;html=1;;");
        assert_eq!(style.get("html"), Some("1"));
    }

    #[test]
    fn vertex_without_source_target_or_edge_label_tag() {
        let cell = DiagramCell {
            id: "1".into(),
            parent: None,
            source: None,
            target: None,
            value: "Person".into(),
            style: Style::parse("rounded=1"),
        };
        assert!(cell.is_vertex());
        assert!(!cell.is_edge_label());
    }

    #[test]
    fn edge_label_cell_is_not_a_vertex() {
        let cell = DiagramCell {
            id: "2".into(),
            parent: Some("3".into()),
            source: None,
            target: None,
            value: "has part".into(),
            style: Style::parse("edgeLabel;html=1"),
        };
        assert!(!cell.is_vertex());
        assert!(cell.is_edge_label());
    }

    #[test]
    fn cell_with_source_and_target_is_a_direct_relationship() {
        let cell = DiagramCell {
            id: "4".into(),
            parent: None,
            source: Some("1".into()),
            target: Some("2".into()),
            value: "has part".into(),
            style: Style::parse("endArrow=block"),
        };
        assert!(cell.is_direct_relationship());
        assert!(!cell.is_vertex());
    }

    #[test]
    fn reads_mxcell_elements_out_of_a_diagram_document() {
        let xml = r#"<mxGraphModel><root>
            <mxCell id="0" />
            <mxCell id="1" parent="0" />
            <mxCell id="2" value="Person" style="rounded=1;whiteSpace=wrap;html=1" vertex="1" parent="1">
              <mxGeometry x="40" y="40" width="120" height="60" as="geometry" />
            </mxCell>
            <mxCell id="3" value="Organization" style="rounded=1" vertex="1" parent="1" />
            <mxCell id="4" value="works for" style="endArrow=block;html=1" edge="1" parent="1" source="2" target="3" />
        </root></mxGraphModel>"#;
        let cells = read_xml(xml).unwrap();
        assert_eq!(cells.len(), 5);
        let person = cells.iter().find(|c| c.id == "2").unwrap();
        assert_eq!(person.value, "Person");
        assert!(person.is_vertex());
        let edge = cells.iter().find(|c| c.id == "4").unwrap();
        assert_eq!(edge.source.as_deref(), Some("2"));
        assert_eq!(edge.target.as_deref(), Some("3"));
        assert!(edge.is_direct_relationship());
    }

    #[test]
    fn unescapes_entities_in_cell_values() {
        let xml = r#"<mxCell id="1" value="Dog &amp; Wolf" style="" />"#;
        let cells = read_xml(xml).unwrap();
        assert_eq!(cells[0].value, "Dog & Wolf");
    }

    #[test]
    fn missing_id_attribute_is_a_parse_error() {
        let xml = r#"<mxCell value="Person" style="" />"#;
        assert!(read_xml(xml).is_err());
    }

    #[test]
    fn write_xml_escapes_labels_and_marks_severed_edges_dashed() {
        use crate::connector::Attachment;

        let cells = vec![
            PlacedCell::Vertex {
                id: "cell-0".into(),
                label: "Dog & Wolf".into(),
                x: 10.0,
                y: 20.0,
                width: 120.0,
                height: 60.0,
            },
            PlacedCell::Edge {
                id: "cell-1".into(),
                source: "cell-0".into(),
                target: "cell-0".into(),
                label: "subClassOf".into(),
                attachment: Attachment { start_x: 10.0, start_y: 20.0, end_x: 10.0, end_y: 20.0 },
                dashed: true,
            },
        ];
        let xml = write_xml(&cells);
        assert!(xml.contains("Dog &amp; Wolf"));
        assert!(xml.contains("dashed=1"));
        assert!(xml.contains("mxGraphModel"));
    }
}

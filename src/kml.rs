//! KML rendering
//!
//! Turns a [`WaypointGroup`] into a standalone KML 2.2 document. Rendering is
//! pure: text in, text out.

use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

use crate::extract::describe_date;
use crate::models::{Trip, Waypoint, WaypointGroup};
use crate::{Result, TripKmlError};

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Presentation switches for rendered documents
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Prefix dated placemark names with `[DD.MM]`
    pub date_prefix: bool,
    /// Spaces per nesting level, 0 for a single line
    pub indent: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            date_prefix: false,
            indent: 2,
        }
    }
}

fn write<'a, W: Write>(writer: &mut Writer<W>, event: Event<'a>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| TripKmlError::serialization(format!("failed to write KML: {e}")))
}

fn start<W: Write>(writer: &mut Writer<W>, tag: &str) -> Result<()> {
    write(writer, Event::Start(BytesStart::new(tag)))
}

fn end<W: Write>(writer: &mut Writer<W>, tag: &str) -> Result<()> {
    write(writer, Event::End(BytesEnd::new(tag)))
}

/// `<tag>text</tag>` with all markup-reserved characters escaped
fn text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    start(writer, tag)?;
    write(writer, Event::Text(BytesText::from_escaped(escape(text))))?;
    end(writer, tag)
}

fn placemark_name(waypoint: &Waypoint, options: &RenderOptions) -> String {
    match waypoint.date() {
        Some(date) if options.date_prefix => {
            format!("[{}] {}", date.format("%d.%m"), waypoint.name())
        }
        _ => waypoint.name().to_string(),
    }
}

fn write_placemark<W: Write>(
    writer: &mut Writer<W>,
    waypoint: &Waypoint,
    options: &RenderOptions,
) -> Result<()> {
    let coordinate = waypoint.coordinate();
    coordinate.check().map_err(|e| {
        TripKmlError::serialization(format!("'{}' has an invalid coordinate: {e}", waypoint.name()))
    })?;

    start(writer, "Placemark")?;
    text_element(writer, "name", &placemark_name(waypoint, options))?;

    if let Some(date) = waypoint.date() {
        text_element(writer, "description", &describe_date(date))?;

        start(writer, "ExtendedData")?;
        write(
            writer,
            Event::Start(BytesStart::new("Data").with_attributes([("name", "date")])),
        )?;
        text_element(writer, "value", &date.format("%Y-%m-%d").to_string())?;
        end(writer, "Data")?;
        end(writer, "ExtendedData")?;
    }

    start(writer, "Point")?;
    text_element(writer, "coordinates", &coordinate.to_kml())?;
    end(writer, "Point")?;

    end(writer, "Placemark")
}

/// Render one group as a complete KML document.
///
/// The document name is the trip title when known, otherwise the group
/// label. A coordinate outside the valid range is a contract violation and
/// fails the whole render.
pub fn render_group(trip: &Trip, group: &WaypointGroup, options: &RenderOptions) -> Result<String> {
    let mut writer = if options.indent > 0 {
        Writer::new_with_indent(Vec::new(), b' ', options.indent)
    } else {
        Writer::new(Vec::new())
    };

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write(
        &mut writer,
        Event::Start(BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)])),
    )?;
    start(&mut writer, "Document")?;

    let document_name = trip
        .title
        .clone()
        .unwrap_or_else(|| group.label.to_string());
    text_element(&mut writer, "name", &document_name)?;

    for waypoint in &group.waypoints {
        write_placemark(&mut writer, waypoint, options)?;
    }

    end(&mut writer, "Document")?;
    end(&mut writer, "kml")?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| TripKmlError::serialization(format!("rendered KML is not UTF-8: {e}")))
}

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::LayoutError;
use crate::geometry::Point;
use crate::model::{Fragment, PageFragments};
use crate::warning::{LayoutWarning, WarningCode};

/// Decoded OCR output, one entry per page in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrDocument {
    pub pages: Vec<PageFragments>,
    pub warnings: Vec<LayoutWarning>,
}

/// `[[x, y], ...]`, or an empty polygon when any point is not a numeric pair.
/// The normalizer rejects the empty polygon later, so the fragment is still counted.
fn parse_polygon(value: &Value) -> Vec<Point> {
    let Some(points) = value.as_array() else {
        return Vec::new();
    };

    let mut polygon = Vec::with_capacity(points.len());
    for point in points {
        let coords = point.as_array().map(Vec::as_slice).unwrap_or_default();
        let [x, y] = coords else {
            return Vec::new();
        };
        let (Some(x), Some(y)) = (x.as_f64(), y.as_f64()) else {
            return Vec::new();
        };
        polygon.push(Point::new(x, y));
    }
    polygon
}

/// `[polygon, [text, score]]` as produced per detection by PaddleOCR.
fn is_paddle_entry(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|entry| entry.get(1))
        .and_then(Value::as_array)
        .and_then(|recognition| recognition.first())
        .is_some_and(Value::is_string)
}

fn paddle_fragment(value: &Value) -> Option<Fragment> {
    let entry = value.as_array()?;
    let recognition = entry.get(1)?.as_array()?;
    let text = recognition.first()?.as_str()?;
    let confidence = recognition.get(1).and_then(Value::as_f64).unwrap_or(0.0);
    Some(Fragment::new(
        parse_polygon(entry.first()?),
        text,
        confidence,
    ))
}

fn native_fragment(value: &Value) -> Option<Fragment> {
    let object = value.as_object()?;
    let text = object.get("text")?.as_str()?;
    let polygon = object.get("polygon").map(parse_polygon).unwrap_or_default();
    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(1.0);
    Some(Fragment::new(polygon, text, confidence))
}

fn page_number(index: usize) -> Result<u32, LayoutError> {
    u32::try_from(index + 1)
        .map_err(|_| LayoutError::InvalidInput("too many pages in OCR input".to_string()))
}

fn decode_entries(
    page: u32,
    entries: &[Value],
    decode: fn(&Value) -> Option<Fragment>,
    warnings: &mut Vec<LayoutWarning>,
) -> PageFragments {
    let mut fragments = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match decode(entry) {
            Some(fragment) => fragments.push(fragment),
            None => {
                debug!(page, entry = index, "skipping entry that is not an OCR detection");
                warnings.push(
                    LayoutWarning::new(
                        WarningCode::SkippedEntry,
                        "entry is not an OCR detection and was skipped",
                    )
                    .with_page(page)
                    .with_fragment_index(index),
                );
            }
        }
    }
    PageFragments { page, fragments }
}

fn parse_paddle_pages(items: &[Value]) -> Result<OcrDocument, LayoutError> {
    let mut document = OcrDocument::default();

    // One detection at the top level makes this a single page; other items in it are skipped.
    let single_page = items.iter().any(is_paddle_entry);
    if single_page {
        let page = decode_entries(1, items, paddle_fragment, &mut document.warnings);
        document.pages.push(page);
        return Ok(document);
    }

    for (index, item) in items.iter().enumerate() {
        let page = page_number(index)?;
        let entries = match item {
            Value::Null => &[][..],
            Value::Array(entries) => entries.as_slice(),
            _ => {
                return Err(LayoutError::InvalidInput(format!(
                    "page {page} is neither an array of detections nor null"
                )));
            }
        };
        let page = decode_entries(page, entries, paddle_fragment, &mut document.warnings);
        document.pages.push(page);
    }
    Ok(document)
}

fn parse_native_pages(pages: &[Value]) -> Result<OcrDocument, LayoutError> {
    let mut document = OcrDocument::default();
    for (index, item) in pages.iter().enumerate() {
        let page = match item.get("page").and_then(Value::as_u64) {
            Some(number) => u32::try_from(number).map_err(|_| {
                LayoutError::InvalidInput(format!("page number {number} is out of range"))
            })?,
            None => page_number(index)?,
        };
        let Some(entries) = item.get("fragments").and_then(Value::as_array) else {
            return Err(LayoutError::InvalidInput(format!(
                "page {page} has no \"fragments\" array"
            )));
        };
        let page = decode_entries(page, entries, native_fragment, &mut document.warnings);
        document.pages.push(page);
    }
    Ok(document)
}

/// Decodes PaddleOCR results (a list of pages, or a single page of
/// `[polygon, [text, score]]` entries) or the native
/// `{"pages": [{"page": 1, "fragments": [...]}]}` document.
///
/// # Errors
///
/// Returns [`LayoutError::Json`] when the input is not JSON and
/// [`LayoutError::InvalidInput`] when its overall shape is neither format.
pub fn parse_ocr_json(input: &str) -> Result<OcrDocument, LayoutError> {
    let value: Value = serde_json::from_str(input)?;
    match &value {
        Value::Array(items) => parse_paddle_pages(items),
        Value::Object(object) => match object.get("pages") {
            Some(Value::Array(pages)) => parse_native_pages(pages),
            _ => Err(LayoutError::InvalidInput(
                "expected an object with a \"pages\" array".to_string(),
            )),
        },
        _ => Err(LayoutError::InvalidInput(
            "expected a JSON array of OCR pages or an object with a \"pages\" array".to_string(),
        )),
    }
}

/// # Errors
///
/// Returns [`LayoutError::Io`] when the file cannot be read, otherwise as
/// [`parse_ocr_json`].
pub fn read_ocr_file(path: &Path) -> Result<OcrDocument, LayoutError> {
    let input = fs::read_to_string(path)?;
    parse_ocr_json(&input)
}

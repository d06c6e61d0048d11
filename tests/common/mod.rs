#![allow(dead_code)]

use std::path::Path;

use ocr_layout::Fragment;
use serde_json::{Value, json};

/// Statement page: a centered title, the "Note / 2024 / 2023" header line and
/// two line items with note references and amounts for both years.
pub fn statement_page() -> Vec<Fragment> {
    vec![
        Fragment::rect(150.0, 10.0, 450.0, 30.0, "Consolidated Statement of Financial Position"),
        Fragment::rect(200.0, 50.0, 240.0, 70.0, "Note"),
        Fragment::rect(300.0, 52.0, 340.0, 70.0, "2024"),
        Fragment::rect(400.0, 52.0, 440.0, 70.0, "2023"),
        Fragment::rect(20.0, 90.0, 160.0, 108.0, "Cash and cash equivalents"),
        Fragment::rect(215.0, 90.0, 225.0, 108.0, "5"),
        Fragment::rect(300.0, 90.0, 345.0, 108.0, "1,200"),
        Fragment::rect(400.0, 90.0, 445.0, 108.0, "1,100"),
        Fragment::rect(20.0, 120.0, 130.0, 138.0, "Trade receivables"),
        Fragment::rect(215.0, 120.0, 225.0, 138.0, "6"),
        Fragment::rect(310.0, 120.0, 340.0, 138.0, "800"),
        Fragment::rect(410.0, 120.0, 440.0, 138.0, "750"),
    ]
}

/// Three columns of 100-unit wide words on three lines, with no header keyword.
pub fn word_grid() -> Vec<Fragment> {
    let mut fragments = Vec::new();
    for y in [0.0, 40.0, 80.0] {
        for x in [0.0, 200.0, 400.0] {
            fragments.push(Fragment::rect(x, y, x + 100.0, y + 20.0, "word"));
        }
    }
    fragments
}

fn paddle_entry(fragment: &Fragment) -> Value {
    let polygon = fragment
        .polygon
        .iter()
        .map(|point| json!([point.x, point.y]))
        .collect::<Vec<_>>();
    json!([polygon, [fragment.text, fragment.confidence]])
}

/// PaddleOCR-style result list, one inner list per page.
pub fn paddle_json(pages: &[Vec<Fragment>]) -> String {
    let pages = pages
        .iter()
        .map(|fragments| Value::Array(fragments.iter().map(paddle_entry).collect()))
        .collect::<Vec<_>>();
    Value::Array(pages).to_string()
}

pub fn write_paddle_json(
    path: &Path,
    pages: &[Vec<Fragment>],
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, paddle_json(pages))?;
    Ok(())
}

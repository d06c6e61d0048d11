use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;

use crate::error::LayoutError;
use crate::model::{DocumentLayout, Row};
use crate::options::{OutputFormat, OutputOptions};

const CSV_HEADERS: [&str; 8] = [
    "page", "kind", "index", "column", "xmin", "ymin", "xmax", "ymax",
];

fn row_record(page: u32, kind: &str, index: usize, row: &Row) -> [String; 8] {
    [
        page.to_string(),
        kind.to_string(),
        index.to_string(),
        row.column.map(|column| column.to_string()).unwrap_or_default(),
        row.bbox.xmin.to_string(),
        row.bbox.ymin.to_string(),
        row.bbox.xmax.to_string(),
        row.bbox.ymax.to_string(),
    ]
}

/// One record per column, spanning row and column row, page by page.
/// Columns have no vertical extent, so their `ymin`/`ymax` cells stay empty.
fn csv_records(document: &DocumentLayout) -> Vec<[String; 8]> {
    let mut records = Vec::new();
    for page in &document.pages {
        let layout = &page.layout;
        for (index, column) in layout.columns.iter().enumerate() {
            records.push([
                page.page.to_string(),
                "column".to_string(),
                index.to_string(),
                index.to_string(),
                column.xmin.to_string(),
                String::new(),
                column.xmax.to_string(),
                String::new(),
            ]);
        }
        for (index, row) in layout.spanning_rows.iter().enumerate() {
            records.push(row_record(page.page, "spanning_row", index, row));
        }
        for (index, row) in layout.column_rows.iter().enumerate() {
            records.push(row_record(page.page, "column_row", index, row));
        }
    }
    records
}

fn write_csv<W: Write>(writer: W, document: &DocumentLayout, delimiter: u8) -> Result<W, LayoutError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    writer.write_record(CSV_HEADERS)?;
    for record in csv_records(document) {
        writer.write_record(&record)?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|error| LayoutError::Csv(error.into_error().into()))
}

pub(crate) fn write_layout(
    path: &Path,
    document: &DocumentLayout,
    options: &OutputOptions,
) -> Result<(), LayoutError> {
    let mut file = BufWriter::new(File::create(path)?);
    match options.format {
        OutputFormat::Csv => {
            write_csv(&mut file, document, options.delimiter)?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut file, document)?;
            file.write_all(b"\n")?;
        }
    }
    file.flush()?;
    Ok(())
}

pub(crate) fn write_layout_to_string(
    document: &DocumentLayout,
    options: &OutputOptions,
) -> Result<String, LayoutError> {
    match options.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(document)?),
        OutputFormat::Csv => {
            let bytes = write_csv(Vec::<u8>::new(), document, options.delimiter)?;
            String::from_utf8(bytes).map_err(|error| {
                LayoutError::InvalidInput(format!("invalid utf-8 csv output: {error}"))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::write_layout_to_string;
    use crate::geometry::AxisAlignedBox;
    use crate::model::{Column, DocumentLayout, LayoutReport, LayoutResult, PageLayout, Row};
    use crate::options::{OutputFormat, OutputOptions};

    fn document() -> DocumentLayout {
        DocumentLayout {
            pages: vec![PageLayout {
                page: 2,
                extents: None,
                layout: LayoutResult {
                    columns: vec![Column::new(0.0, 100.0), Column::new(100.0, 250.5)],
                    spanning_rows: vec![Row::spanning(AxisAlignedBox::new(10.0, 0.0, 240.0, 20.0))],
                    column_rows: vec![Row::in_column(
                        AxisAlignedBox::new(100.0, 30.0, 250.5, 45.0),
                        1,
                    )],
                },
                report: LayoutReport::default(),
            }],
        }
    }

    #[test]
    fn csv_lists_columns_then_rows() {
        let options = OutputOptions {
            format: OutputFormat::Csv,
            delimiter: b';',
        };
        let csv = write_layout_to_string(&document(), &options).expect("csv should render");
        assert_eq!(
            csv,
            "page;kind;index;column;xmin;ymin;xmax;ymax\n\
             2;column;0;0;0;;100;\n\
             2;column;1;1;100;;250.5;\n\
             2;spanning_row;0;;10;0;240;20\n\
             2;column_row;0;1;100;30;250.5;45\n"
        );
    }

    #[test]
    fn json_flattens_layout_into_page() {
        let json = write_layout_to_string(&document(), &OutputOptions::default())
            .expect("json should render");
        let value: serde_json::Value = serde_json::from_str(&json).expect("output is valid json");
        let page = &value["pages"][0];
        assert_eq!(page["page"], 2);
        assert_eq!(page["columns"][1]["xmax"], 250.5);
        assert_eq!(page["column_rows"][0]["column"], 1);
        assert!(page["spanning_rows"][0].get("column").is_none());
        assert_eq!(page["report"]["fragments_received"], 0);
    }
}

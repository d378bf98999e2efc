use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use super::ExportError;
use super::format::{miles, thousands};
use crate::data::aggregate::DashboardAggregates;
use crate::data::model::{BASE_MSRP, Record};
use crate::data::table::Column;

pub const TABLE_TITLE: &str = "Electric Vehicle Population Data";
pub const DASHBOARD_TITLE: &str = "EV Population Dashboard - Charts Overview";

/// A4 in points.
const A4_PORTRAIT: (f32, f32) = (595.0, 842.0);
const A4_LANDSCAPE: (f32, f32) = (842.0, 595.0);
const MARGIN: f32 = 40.0;

const HEADER_FILL: [f32; 3] = [66.0 / 255.0, 139.0 / 255.0, 202.0 / 255.0];
const STRIPE_FILL: [f32; 3] = [245.0 / 255.0, 245.0 / 255.0, 245.0 / 255.0];

const TABLE_FONT: f32 = 8.0;
const ROW_HEIGHT: f32 = 14.0;
const CELL_PAD: f32 = 3.0;

// ---------------------------------------------------------------------------
// Report metadata
// ---------------------------------------------------------------------------

/// Metadata printed under the report title.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub generated_on: String,
}

impl ReportMeta {
    pub fn now() -> Self {
        ReportMeta {
            generated_on: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Table export: title, timestamp, row count and the rows as a table.
/// The `Base MSRP` column is printed with thousands separators.
pub fn table_report(
    rows: &[&Record],
    columns: &[Column],
    meta: &ReportMeta,
) -> Result<Vec<u8>, ExportError> {
    let mut page = PageWriter::new(A4_PORTRAIT);

    page.text(MARGIN, 16.0, Font::Bold, TABLE_TITLE);
    page.advance(26.0);
    page.text(MARGIN, 10.0, Font::Regular, &format!("Generated on {}", meta.generated_on));
    page.advance(14.0);
    page.text(
        MARGIN,
        10.0,
        Font::Regular,
        &format!("Filtered results: {} entries", rows.len()),
    );
    page.advance(18.0);

    let header: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|rec| columns.iter().map(|c| table_cell(rec, c)).collect())
        .collect();
    page.table(&header, &body);

    page.finish(TABLE_TITLE)
}

/// Dashboard export: headline metrics, a statistics table and the key
/// insights derived from the aggregates.
pub fn dashboard_report(
    agg: &DashboardAggregates,
    meta: &ReportMeta,
) -> Result<Vec<u8>, ExportError> {
    let summary = &agg.summary;
    let mut page = PageWriter::new(A4_LANDSCAPE);

    page.text(MARGIN, 16.0, Font::Bold, DASHBOARD_TITLE);
    page.advance(26.0);
    page.text(MARGIN, 10.0, Font::Regular, &format!("Generated on {}", meta.generated_on));
    page.advance(14.0);
    page.text(
        MARGIN,
        10.0,
        Font::Regular,
        &format!("Total Vehicles: {}", thousands(summary.total_vehicles as f64)),
    );
    page.text_at(
        MARGIN + 240.0,
        10.0,
        Font::Regular,
        &format!("Average Range: {}", miles(summary.avg_range)),
    );
    page.text_at(
        MARGIN + 460.0,
        10.0,
        Font::Regular,
        &format!("Average MSRP: {}", thousands(summary.avg_msrp)),
    );
    page.advance(18.0);

    let header = vec!["Metric".to_string(), "Value".to_string()];
    let body = vec![
        vec![
            "Total Vehicles".to_string(),
            thousands(summary.total_vehicles as f64),
        ],
        vec!["Average Electric Range".to_string(), miles(summary.avg_range)],
        vec!["Average Base MSRP".to_string(), thousands(summary.avg_msrp)],
        vec![
            "Unique Manufacturers".to_string(),
            summary.unique_makes.to_string(),
        ],
    ];
    page.table(&header, &body);
    page.advance(16.0);

    page.text(MARGIN, 10.0, Font::Bold, "Key Insights:");
    page.advance(14.0);
    for line in key_insights(agg) {
        page.text(MARGIN, 8.0, Font::Regular, &line);
        page.advance(12.0);
    }

    page.finish(DASHBOARD_TITLE)
}

/// Natural-language highlights of the dashboard. A line is left out when
/// the aggregate it reads from is empty.
pub fn key_insights(agg: &DashboardAggregates) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(top) = agg.top_makes.first() {
        lines.push(format!(
            "- Most popular manufacturer: {} with {} vehicles",
            top.label,
            thousands(top.count as f64)
        ));
    }
    if let Some(best) = agg.range_by_make.first() {
        lines.push(format!(
            "- Highest average range: {} with {}",
            best.label,
            miles(best.mean)
        ));
    }
    if let Some(bucket) = agg.most_common_price_range() {
        lines.push(format!(
            "- Most common price range: {} with {} vehicles",
            bucket.band.label(),
            thousands(bucket.count as f64)
        ));
    }
    lines
}

/// Cell text for the PDF table. An MSRP of 0 means "not reported" in the
/// source file and prints blank.
fn table_cell(rec: &Record, column: &Column) -> String {
    if column.key == BASE_MSRP {
        match rec.number(BASE_MSRP) {
            Some(v) if v == 0.0 => return String::new(),
            Some(v) => return thousands(v),
            None => {}
        }
    }
    rec.text(&column.key)
}

// ---------------------------------------------------------------------------
// Page layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Writes content streams top-down and breaks onto new pages as needed.
struct PageWriter {
    size: (f32, f32),
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    /// Distance of the next baseline from the top edge.
    cursor: f32,
}

impl PageWriter {
    fn new(size: (f32, f32)) -> Self {
        PageWriter {
            size,
            pages: Vec::new(),
            ops: Vec::new(),
            cursor: MARGIN,
        }
    }

    fn advance(&mut self, dy: f32) {
        self.cursor += dy;
    }

    fn break_page(&mut self) {
        let done = std::mem::take(&mut self.ops);
        self.pages.push(done);
        self.cursor = MARGIN;
    }

    /// Start a new page unless `height` still fits above the bottom margin.
    fn reserve(&mut self, height: f32) -> bool {
        if self.cursor + height > self.size.1 - MARGIN {
            self.break_page();
            return true;
        }
        false
    }

    fn text(&mut self, x: f32, size: f32, font: Font, s: &str) {
        self.reserve(size);
        self.text_at(x, size, font, s);
    }

    /// Text on the current line without checking for a page break.
    fn text_at(&mut self, x: f32, size: f32, font: Font, s: &str) {
        let y = self.size.1 - self.cursor - size;
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource().into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(pdf_text(s))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn fill_rect(&mut self, x: f32, top: f32, w: f32, h: f32, rgb: [f32; 3]) {
        let y = self.size.1 - top - h;
        self.ops.extend([
            Operation::new("rg", rgb.iter().map(|&c| c.into()).collect()),
            Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]),
            Operation::new("f", vec![]),
            Operation::new("g", vec![0.0f32.into()]),
        ]);
    }

    fn set_gray(&mut self, level: f32) {
        self.ops.push(Operation::new("g", vec![level.into()]));
    }

    /// Grid with a shaded header band and striped rows. The header is
    /// repeated at the top of every continuation page.
    fn table(&mut self, header: &[String], body: &[Vec<String>]) {
        let width = self.size.0 - 2.0 * MARGIN;
        let widths = column_widths(header, body, width);

        self.reserve(2.0 * ROW_HEIGHT);
        self.table_header(header, &widths);

        for (i, row) in body.iter().enumerate() {
            if self.reserve(ROW_HEIGHT) {
                self.table_header(header, &widths);
            }
            if i % 2 == 1 {
                self.fill_rect(MARGIN, self.cursor, width, ROW_HEIGHT, STRIPE_FILL);
            }
            self.table_row(row, &widths);
        }
    }

    fn table_header(&mut self, header: &[String], widths: &[f32]) {
        let total: f32 = widths.iter().sum();
        self.fill_rect(MARGIN, self.cursor, total, ROW_HEIGHT, HEADER_FILL);
        self.set_gray(1.0);
        self.cells(header, widths, Font::Bold);
        self.set_gray(0.0);
    }

    fn table_row(&mut self, row: &[String], widths: &[f32]) {
        self.cells(row, widths, Font::Regular);
    }

    fn cells(&mut self, cells: &[String], widths: &[f32], font: Font) {
        let baseline_offset = (ROW_HEIGHT - TABLE_FONT) / 2.0;
        let mut x = MARGIN;
        let top = self.cursor;
        for (cell, &w) in cells.iter().zip(widths) {
            self.cursor = top + baseline_offset;
            self.text_at(x + CELL_PAD, TABLE_FONT, font, &fit(cell, w - 2.0 * CELL_PAD));
            x += w;
        }
        self.cursor = top + ROW_HEIGHT;
    }

    /// Assemble the pages into a PDF document.
    fn finish(mut self, title: &str) -> Result<Vec<u8>, ExportError> {
        self.break_page();
        let (w, h) = self.size;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.0f32.into(), 0.0f32.into(), w.into(), h.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(pdf_text(title)),
            "Producer" => Object::string_literal("ev-dashboard"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)?;
        log::debug!("Built PDF '{title}' with {count} page(s), {} bytes", out.len());
        Ok(out)
    }
}

/// Share the table width between columns in proportion to their widest
/// cell, with a floor so short columns stay readable.
fn column_widths(header: &[String], body: &[Vec<String>], total: f32) -> Vec<f32> {
    let weights: Vec<f32> = (0..header.len())
        .map(|i| {
            let widest = body
                .iter()
                .filter_map(|row| row.get(i))
                .chain(std::iter::once(&header[i]))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0);
            widest.clamp(6, 40) as f32
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.iter().map(|w| total * w / sum.max(1.0)).collect()
}

/// Truncate `s` so it fits in `width` points at the table font size.
fn fit(s: &str, width: f32) -> String {
    // Helvetica averages a little over half the font size per glyph.
    let max_chars = (width / (TABLE_FONT * 0.55)).floor().max(1.0) as usize;
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(2);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("..");
    out
}

/// Map text onto what the standard Type1 fonts can show.
fn pdf_text(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '≤' => out.extend_from_slice(b"<="),
            '≥' => out.extend_from_slice(b">="),
            '\n' | '\r' | '\t' => out.push(b' '),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::aggregate::TOP_N;
    use crate::data::model::{Dataset, ELECTRIC_RANGE, FieldValue, MAKE};
    use crate::data::table::display_columns;

    fn meta() -> ReportMeta {
        ReportMeta {
            generated_on: "2024-01-31 09:30".into(),
        }
    }

    fn vehicle(make: &str, range: i64, msrp: i64) -> Record {
        let mut fields = BTreeMap::new();
        fields.insert(MAKE.to_string(), FieldValue::String(make.into()));
        fields.insert(ELECTRIC_RANGE.to_string(), FieldValue::Integer(range));
        fields.insert(BASE_MSRP.to_string(), FieldValue::Integer(msrp));
        Record::new(fields)
    }

    /// All strings drawn with `Tj`, page by page.
    fn page_texts(bytes: &[u8]) -> Vec<Vec<String>> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|&id| {
                let raw = doc.get_page_content(id).unwrap();
                Content::decode(&raw)
                    .unwrap()
                    .operations
                    .into_iter()
                    .filter(|op| op.operator == "Tj")
                    .filter_map(|op| match op.operands.first() {
                        Some(Object::String(bytes, _)) => {
                            Some(String::from_utf8_lossy(bytes).into_owned())
                        }
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn empty_table_is_a_valid_document() {
        let bytes = table_report(&[], &display_columns(), &meta()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let pages = page_texts(&bytes);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains(&TABLE_TITLE.to_string()));
        assert!(pages[0].contains(&"Generated on 2024-01-31 09:30".to_string()));
        assert!(pages[0].contains(&"Filtered results: 0 entries".to_string()));
        assert!(pages[0].contains(&"MSRP ($)".to_string()));
    }

    #[test]
    fn msrp_column_uses_thousands_separators() {
        let rec = vehicle("TESLA", 322, 45_000);
        let bytes = table_report(&[&rec], &display_columns(), &meta()).unwrap();
        let text = page_texts(&bytes).concat();
        assert!(text.contains(&"45,000".to_string()));
        assert!(text.contains(&"322".to_string()));
        assert!(text.contains(&"Filtered results: 1 entries".to_string()));
    }

    #[test]
    fn zero_msrp_prints_blank() {
        let rec = vehicle("RIVIAN", 314, 0);
        let columns = display_columns();
        let msrp = columns.iter().find(|c| c.key == BASE_MSRP).unwrap();
        assert_eq!(table_cell(&rec, msrp), "");

        let bytes = table_report(&[&rec], &columns, &meta()).unwrap();
        let text = page_texts(&bytes).concat();
        assert!(text.contains(&"RIVIAN".to_string()));
        assert!(!text.contains(&"0".to_string()));
    }

    #[test]
    fn long_tables_continue_with_repeated_header() {
        let records: Vec<Record> = (0..120).map(|i| vehicle("KIA", i, 30_000)).collect();
        let refs: Vec<&Record> = records.iter().collect();
        let bytes = table_report(&refs, &display_columns(), &meta()).unwrap();
        let pages = page_texts(&bytes);
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(page.contains(&"Make".to_string()));
        }
        let kia_rows: usize = pages
            .iter()
            .map(|p| p.iter().filter(|s| *s == "KIA").count())
            .sum();
        assert_eq!(kia_rows, 120);
    }

    #[test]
    fn dashboard_report_lists_metrics_and_insights() {
        let ds = Dataset::new(
            vec![
                vehicle("TESLA", 300, 35_000),
                vehicle("TESLA", 320, 85_000),
                vehicle("FORD", 250, 45_000),
            ],
            vec![MAKE.into(), ELECTRIC_RANGE.into(), BASE_MSRP.into()],
        );
        let agg = DashboardAggregates::compute(&ds, TOP_N);
        let bytes = dashboard_report(&agg, &meta()).unwrap();
        let text = page_texts(&bytes).concat();
        assert!(text.contains(&DASHBOARD_TITLE.to_string()));
        assert!(text.contains(&"Unique Manufacturers".to_string()));
        assert!(text.contains(&"- Most popular manufacturer: TESLA with 2 vehicles".to_string()));
        assert!(text.contains(&"- Highest average range: TESLA with 310 miles".to_string()));
        assert!(text.contains(&"- Most common price range: $30k-$40k with 1 vehicles".to_string()));
    }

    #[test]
    fn empty_dashboard_omits_insights() {
        let agg = DashboardAggregates::compute(&Dataset::default(), TOP_N);
        assert!(key_insights(&agg).is_empty());
        let bytes = dashboard_report(&agg, &meta()).unwrap();
        let text = page_texts(&bytes).concat();
        assert!(text.contains(&"Key Insights:".to_string()));
        assert!(!text.iter().any(|s| s.starts_with("- ")));
    }

    #[test]
    fn non_ascii_text_is_replaced() {
        assert_eq!(pdf_text("≤$20k"), b"<=$20k".to_vec());
        assert_eq!(pdf_text("Citroën\n"), b"Citro?n ".to_vec());
    }

    #[test]
    fn fit_truncates_long_cells() {
        assert_eq!(fit("TESLA", 100.0), "TESLA");
        let cut = fit(&"X".repeat(200), 40.0);
        assert!(cut.ends_with(".."));
        assert!(cut.chars().count() < 200);
    }
}

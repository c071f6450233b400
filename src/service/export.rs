use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use serde::{Deserialize, Serialize};

use crate::service::extractor::{ChatExtraction, ExtractedRow};

pub const SHEET_NAME: &str = "Парсинг";
pub const HEADERS: [&str; 5] = ["№", "Пользователь", "Запрос", "Чат", "Дата"];

const HEADER_FILL: Color = Color::RGB(0x1E3A5F);
const COLUMN_PADDING: usize = 4;
const MAX_COLUMN_WIDTH: usize = 60;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Excel error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Other error: {0}")]
    Other(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExportTable {
    pub rows: Vec<ExtractedRow>,
}

/// Concatenates per-chat results in request order and renumbers rows
/// 1..N globally.
pub fn aggregate(per_chat: Vec<ChatExtraction>) -> ExportTable {
    let mut rows: Vec<ExtractedRow> = per_chat
        .into_iter()
        .flat_map(|extraction| extraction.rows)
        .collect();
    for (idx, row) in rows.iter_mut().enumerate() {
        row.seq = idx as u64 + 1;
    }

    ExportTable { rows }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%d.%m.%Y %H:%M").to_string()
}

/// `{prefix}_{YYYYMMDD_HHMM}.{ext}`, with "tgparse" for on-demand jobs
/// and "auto" for scheduled ones.
pub fn file_name(prefix: &str, format: ExportFormat, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        now.format("%Y%m%d_%H%M"),
        format.extension()
    )
}

pub fn render(table: &ExportTable, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Xlsx => to_xlsx(table),
        ExportFormat::Csv => to_csv(table),
    }
}

fn cell_values(row: &ExtractedRow) -> [String; 5] {
    [
        row.seq.to_string(),
        row.sender.clone(),
        row.text.clone(),
        row.chat_title.clone(),
        format_timestamp(&row.timestamp),
    ]
}

pub fn to_xlsx(table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(HEADER_FILL)
        .set_font_color(Color::White)
        .set_align(FormatAlign::Center);

    let mut widths: [usize; 5] = HEADERS.map(|header| header.chars().count());

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        let cells = cell_values(row);
        for (col, value) in cells.iter().enumerate() {
            widths[col] = widths[col].max(value.chars().count());
            worksheet.write_string(idx as u32 + 1, col as u16, value)?;
        }
    }

    for (col, width) in widths.iter().enumerate() {
        let width = (width + COLUMN_PADDING).min(MAX_COLUMN_WIDTH);
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}

pub fn to_csv(table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    // BOM first so Excel detects UTF-8.
    let mut buffer: Vec<u8> = UTF8_BOM.to_vec();

    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(HEADERS)?;
        for row in &table.rows {
            writer.write_record(cell_values(row))?;
        }
        writer.flush().map_err(|e| ExportError::Other(e.to_string()))?;
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(seq: u64, sender: &str, text: &str, chat: &str) -> ExtractedRow {
        ExtractedRow {
            seq,
            sender: sender.to_string(),
            text: text.to_string(),
            chat_title: chat.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(),
        }
    }

    fn extraction(chat: &str, rows: Vec<ExtractedRow>) -> ChatExtraction {
        ChatExtraction {
            chat: chat.to_string(),
            chat_title: chat.to_string(),
            rows,
        }
    }

    #[test]
    fn aggregation_preserves_order_and_renumbers() {
        let first = extraction("a", vec![row(1, "@x", "one", "A"), row(2, "@x", "two", "A")]);
        let second = extraction("b", vec![row(1, "@y", "three", "B")]);

        let table = aggregate(vec![first, second]);

        let seqs: Vec<u64> = table.rows.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        let texts: Vec<&str> = table.rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn timestamp_renders_day_first() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(format_timestamp(&ts), "14.03.2025 09:26");
    }

    #[test]
    fn file_names_carry_prefix_and_minute_stamp() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(
            file_name("tgparse", ExportFormat::Xlsx, now),
            "tgparse_20250314_0926.xlsx"
        );
        assert_eq!(file_name("auto", ExportFormat::Csv, now), "auto_20250314_0926.csv");
    }

    #[test]
    fn csv_starts_with_bom_and_header() {
        let table = aggregate(vec![extraction("a", vec![row(1, "@x", "привет", "A")])]);

        let bytes = to_csv(&table).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);

        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "№,Пользователь,Запрос,Чат,Дата");
        assert_eq!(lines.next().unwrap(), "1,@x,привет,A,14.03.2025 09:26");
    }

    #[test]
    fn xlsx_renders_without_error_for_empty_and_filled_tables() {
        let empty = ExportTable::default();
        assert!(!to_xlsx(&empty).unwrap().is_empty());

        let table = aggregate(vec![extraction(
            "a",
            vec![row(1, "@x", "line", "A"), row(2, "@y", "x".repeat(200).as_str(), "A")],
        )]);
        assert!(!to_xlsx(&table).unwrap().is_empty());
    }
}

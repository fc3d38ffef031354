//! Table, CSV and JSON rendering of classified kernel records

use std::io::Write;

use anyhow::{Context, Result};
use kernscope_gpu::KernelRecord;
use kernscope_shared::utils::truncate_chars;

use crate::config::{Column, OutputFormat, ReportConfig};

/// Narrowest a text column is squeezed to when a width is set
const MIN_TEXT_WIDTH: usize = 8;

/// Column separator in tables
const SEP: &str = "  ";

/// Text of one cell
pub fn cell(idx: usize, record: &KernelRecord, column: Column) -> String {
    match column {
        Column::Idx => idx.to_string(),
        Column::Seq => join(record.seq_id(), ","),
        Column::AltSeq => join(record.alt_seq_id(), ","),
        Column::Tid => record.tid().to_string(),
        Column::Layer => record.layer().join(":"),
        Column::Trace => record.trace_markers().join(";"),
        Column::Dir => record
            .direction()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
        Column::Sub => record.sub_seq_id().to_string(),
        Column::Mod => record.modules().join(","),
        Column::Op => record.operations().join(","),
        Column::Kernel => record.short_name().to_string(),
        Column::KernelLong => record.long_name().to_string(),
        Column::Sil => record.kernel_duration().to_string(),
        Column::Device => record.device().to_string(),
        Column::Stream => record.stream().to_string(),
        Column::Grid => record.grid().to_string(),
        Column::Block => record.block().to_string(),
    }
}

fn join<T: ToString>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Render `records` in the configured format
pub fn write_records<W: Write>(
    out: &mut W,
    records: &[KernelRecord],
    config: &ReportConfig,
) -> Result<()> {
    match config.format {
        OutputFormat::Table => write_table(out, records, &config.columns, config.width),
        OutputFormat::Csv => write_csv(out, records, &config.columns),
        OutputFormat::Json => write_json(out, records),
    }
    .context("Failed to write report")
}

fn write_table<W: Write>(
    out: &mut W,
    records: &[KernelRecord],
    columns: &[Column],
    width: usize,
) -> Result<()> {
    let rows: Vec<Vec<String>> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| columns.iter().map(|&c| cell(idx, record, c)).collect())
        .collect();

    let widths = column_widths(columns, &rows, width);

    let header: Vec<String> = columns.iter().map(|c| c.header().to_string()).collect();
    write_row(out, columns, &widths, &header)?;
    for row in &rows {
        write_row(out, columns, &widths, row)?;
    }
    Ok(())
}

/// Natural width of every column, with text columns shrunk so the row fits
/// in `width` when it is non-zero
fn column_widths(columns: &[Column], rows: &[Vec<String>], width: usize) -> Vec<usize> {
    let mut widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.header().len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    if width == 0 {
        return widths;
    }

    let text_count = columns.iter().filter(|c| c.is_text()).count();
    if text_count == 0 {
        return widths;
    }

    let fixed: usize = columns
        .iter()
        .zip(&widths)
        .filter(|(c, _)| !c.is_text())
        .map(|(_, w)| *w)
        .sum::<usize>()
        + SEP.len() * columns.len().saturating_sub(1);
    let share = (width.saturating_sub(fixed) / text_count).max(MIN_TEXT_WIDTH);

    for (c, w) in columns.iter().zip(widths.iter_mut()) {
        if c.is_text() {
            *w = (*w).min(share);
        }
    }
    widths
}

fn write_row<W: Write>(
    out: &mut W,
    columns: &[Column],
    widths: &[usize],
    cells: &[String],
) -> Result<()> {
    let last = columns.len().saturating_sub(1);
    let mut line = String::new();
    for (i, ((column, &w), text)) in columns.iter().zip(widths).zip(cells).enumerate() {
        let text = truncate_chars(text, w);
        if i > 0 {
            line.push_str(SEP);
        }
        if column.is_numeric() {
            line.push_str(&format!("{:>w$}", text, w = w));
        } else if i == last {
            line.push_str(&text);
        } else {
            line.push_str(&format!("{:<w$}", text, w = w));
        }
    }
    writeln!(out, "{}", line)?;
    Ok(())
}

fn write_csv<W: Write>(out: &mut W, records: &[KernelRecord], columns: &[Column]) -> Result<()> {
    let header: Vec<_> = columns.iter().map(|c| csv_field(c.name())).collect();
    writeln!(out, "{}", header.join(","))?;

    for (idx, record) in records.iter().enumerate() {
        let fields: Vec<_> = columns
            .iter()
            .map(|&c| csv_field(&cell(idx, record, c)))
            .collect();
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}

/// Quote a CSV field when it contains a separator, quote or line break
fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn write_json<W: Write>(out: &mut W, records: &[KernelRecord]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_columns;
    use kernscope_gpu::{PassthroughDemangler, SessionContext};
    use kernscope_shared::{LaunchInfo, MarkerInfo, RuntimeInfo};

    fn record(name: &str, markers: MarkerInfo) -> KernelRecord {
        let launch = LaunchInfo {
            name_id: 0,
            correlation_id: 1,
            start: 1000,
            end: 1250,
            device_id: 0,
            stream_id: 7,
            grid_x: 2,
            grid_y: 1,
            grid_z: 1,
            block_x: 64,
            block_y: 1,
            block_z: 1,
            name: name.to_string(),
        };
        let runtime = RuntimeInfo {
            r_start: 900,
            r_end: 910,
            tid: 3,
            ..Default::default()
        };
        KernelRecord::ingest(
            &SessionContext::default(),
            &launch,
            &runtime,
            markers,
            &PassthroughDemangler,
        )
        .unwrap()
        .classify()
        .unwrap()
    }

    fn sample() -> Vec<KernelRecord> {
        vec![
            record(
                "void at::native::elementwise_kernel<128>(int)",
                MarkerInfo {
                    seq_markers: vec!["aten::add, seq = 4".to_string()],
                    seq_id: vec![4],
                    ..Default::default()
                },
            ),
            record("volta_sgemm_128x64_nn", MarkerInfo::default()),
        ]
    }

    #[test]
    fn test_cells() {
        let records = sample();
        assert_eq!(cell(0, &records[0], Column::Kernel), "elementwise_kernel");
        assert_eq!(cell(0, &records[0], Column::Op), "aten::add");
        assert_eq!(cell(0, &records[0], Column::Seq), "4");
        assert_eq!(cell(1, &records[1], Column::Idx), "1");
        assert_eq!(cell(1, &records[1], Column::Mod), "na");
        assert_eq!(cell(1, &records[1], Column::Op), "");
        assert_eq!(cell(1, &records[1], Column::Grid), "(2,1,1)");
        assert_eq!(cell(1, &records[1], Column::Dir), "fprop");
        assert_eq!(cell(1, &records[1], Column::Sil), "250");
    }

    #[test]
    fn test_table() {
        let config = ReportConfig {
            columns: parse_columns("idx,kernel,sil").unwrap(),
            ..Default::default()
        };
        let mut out = Vec::new();
        write_records(&mut out, &sample(), &config).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Idx  Kernel                 Sil(ns)");
        assert_eq!(lines[1], "  0  elementwise_kernel         250");
        assert_eq!(lines[2], "  1  volta_sgemm_128x64_nn      250");
    }

    #[test]
    fn test_table_width_truncates_text_columns() {
        let config = ReportConfig {
            columns: parse_columns("idx,kernel").unwrap(),
            width: 13,
            ..Default::default()
        };
        let mut out = Vec::new();
        write_records(&mut out, &sample(), &config).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[2], "  1  volta_s~");
    }

    #[test]
    fn test_csv() {
        let config = ReportConfig {
            columns: parse_columns("idx,kernel_long,op").unwrap(),
            format: OutputFormat::Csv,
            ..Default::default()
        };
        let mut out = Vec::new();
        write_records(&mut out, &sample(), &config).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "idx,kernel_long,op");
        assert_eq!(
            lines[1],
            "0,void at::native::elementwise_kernel<128>(int),aten::add"
        );
        assert_eq!(lines[2], "1,volta_sgemm_128x64_nn,");
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_json_lines() {
        let config = ReportConfig {
            format: OutputFormat::Json,
            ..Default::default()
        };
        let mut out = Vec::new();
        write_records(&mut out, &sample(), &config).unwrap();

        let text = String::from_utf8(out).unwrap();
        let values: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["op"], serde_json::json!(["aten::add"]));
        assert_eq!(values[1]["op"], serde_json::json!([]));
        assert_eq!(values[1]["mod"], serde_json::json!(["na"]));
    }
}

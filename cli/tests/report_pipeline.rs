use std::io::Write;

use anyhow::Result;
use kernscope_cli::commands::{classify_trace, report::write_report};
use kernscope_cli::config::{parse_columns, OutputFormat, ReportConfig};
use kernscope_cli::input::read_trace;
use serde_json::json;

fn kernel_line(correlation_id: u64, start: u64, name: &str, markers: serde_json::Value) -> String {
    json!({
        "nameId": correlation_id,
        "correlationId": correlation_id,
        "start": start,
        "end": start + 500,
        "deviceId": 0,
        "streamId": 7,
        "gridX": 64, "gridY": 1, "gridZ": 1,
        "blockX": 256, "blockY": 1, "blockZ": 1,
        "name": name,
        "rStart": start - 100,
        "rEnd": start - 90,
        "pid": 11,
        "tid": 12,
        "objId": 0,
        "markers": markers,
    })
    .to_string()
}

fn write_trace(lines: &[String]) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile()?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    Ok(file)
}

fn sample_trace() -> Result<tempfile::NamedTempFile> {
    write_trace(&[
        kernel_line(
            1,
            10_000,
            "volta_sgemm_128x64_tn",
            json!({
                "pyprofMarkers": ["{'mod': 'torch.nn.functional', 'op': 'linear', 'args': []}"],
                "seqMarkers": ["aten::addmm, seq = 3"],
                "seqId": [3],
            }),
        ),
        String::new(),
        kernel_line(
            2,
            20_000,
            "void at::native::vectorized_elementwise_kernel<4>(int)",
            json!({ "seqMarkers": ["MulBackward0, seq = 3"], "seqId": [3] }),
        ),
        // starts before profiling
        kernel_line(3, 500, "k", json!({})),
    ])
}

#[test]
fn test_csv_report_from_file() -> Result<()> {
    let trace = sample_trace()?;
    let kernels = read_trace(Some(trace.path()), false)?;
    assert_eq!(kernels.len(), 3);

    let config = ReportConfig {
        profiling_start: 1_000,
        columns: parse_columns("idx,seq,dir,mod,op,kernel,sil")?,
        format: OutputFormat::Csv,
        width: 0,
    };

    let mut out = Vec::new();
    let printed = write_report(&mut out, &config, kernels)?;
    assert_eq!(printed, 2);

    let text = String::from_utf8(out)?;
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "idx,seq,dir,mod,op,kernel,sil");
    assert_eq!(
        lines[1],
        "0,3,fprop,torch.nn.functional,linear,volta_sgemm_128x64_tn,500"
    );
    assert_eq!(lines[2], "1,3,bprop,na,Mul,vectorized_elementwise_kernel,500");
    assert_eq!(lines.len(), 3);
    Ok(())
}

#[test]
fn test_json_report_keeps_all_fields() -> Result<()> {
    let trace = sample_trace()?;
    let config = ReportConfig {
        profiling_start: 1_000,
        format: OutputFormat::Json,
        ..Default::default()
    };

    let mut out = Vec::new();
    write_report(&mut out, &config, read_trace(Some(trace.path()), false)?)?;

    let rows: Vec<serde_json::Value> = String::from_utf8(out)?
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["correlationId"], json!(1));
    assert_eq!(rows[0]["kDuration"], json!(500));
    assert_eq!(rows[0]["rDuration"], json!(10));
    assert_eq!(rows[0]["mod"], json!(["torch.nn.functional"]));
    assert_eq!(rows[1]["dir"], json!("bprop"));
    assert_eq!(rows[1]["op"], json!(["Mul"]));
    Ok(())
}

#[test]
fn test_every_record_rejected_is_an_error() -> Result<()> {
    let trace = sample_trace()?;
    let kernels = read_trace(Some(trace.path()), false)?;

    // Past every kernel start
    let err = classify_trace(1_000_000, kernels).err().map(|e| e.to_string());
    assert_eq!(err.as_deref(), Some("All 3 kernel records were rejected"));
    Ok(())
}

#[test]
fn test_empty_trace_prints_header_only() -> Result<()> {
    let trace = write_trace(&[])?;
    let kernels = read_trace(Some(trace.path()), false)?;

    let mut out = Vec::new();
    let printed = write_report(&mut out, &ReportConfig::default(), kernels)?;
    assert_eq!(printed, 0);
    assert_eq!(String::from_utf8(out)?.lines().count(), 1);
    Ok(())
}

#[test]
fn test_invalid_line_is_an_input_error() -> Result<()> {
    let trace = write_trace(&[kernel_line(1, 10_000, "k", json!({})), "{\"nameId\": 1}".to_string()])?;
    let err = read_trace(Some(trace.path()), false).unwrap_err();
    assert!(format!("{:#}", err).contains("line 2"));
    Ok(())
}

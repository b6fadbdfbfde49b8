//! # CSV Reporting Module / CSV 报告模块
//!
//! Writes test records as CSV and reads previously written files back as
//! report rows, so an HTML report can be regenerated without rerunning.
//!
//! 将测试记录写入 CSV，并将先前写入的文件读回为报告行，
//! 从而无需重新运行即可重新生成 HTML 报告。

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use crate::core::models::{ReportRow, TestRecord};
use crate::infra::t;

/// Column order of the results file. Matches the field order of [`TestRecord`].
pub const CSV_COLUMNS: [&str; 25] = [
    "timestamp",
    "test_id",
    "test_number",
    "image_list_key",
    "image_list_name",
    "image_list_description",
    "image_urls",
    "image_count",
    "location_prompt_key",
    "location_prompt_name",
    "location_prompt_value",
    "person_prompt_key",
    "person_prompt_name",
    "person_prompt_value",
    "pipeline_config_key",
    "pipeline_config_name",
    "pipeline_config_filename",
    "success",
    "duration_seconds",
    "error_message",
    "response_status",
    "images_requested",
    "processed_images_count",
    "processed_image_urls",
    "saved_state_blob",
];

/// Writes the header and one row per record. With no records the file still
/// gets its header line.
///
/// 写入表头和每条记录一行。没有记录时文件仍包含表头行。
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_results(records: &[TestRecord], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| t!("csv.create_failed", path = path.display()).to_string())?;

    writer
        .write_record(CSV_COLUMNS)
        .with_context(|| t!("csv.write_failed", path = path.display()).to_string())?;
    for record in records {
        writer
            .serialize(record)
            .with_context(|| t!("csv.write_failed", path = path.display()).to_string())?;
    }
    writer
        .flush()
        .with_context(|| t!("csv.write_failed", path = path.display()).to_string())?;

    tracing::debug!(path = %path.display(), rows = records.len(), "wrote results csv");
    Ok(())
}

/// Loads a results file into report rows.
///
/// Columns are matched by header name; missing columns read as empty text and
/// cells that do not convert keep their original text.
///
/// 将结果文件加载为报告行。
/// 按表头名称匹配列；缺失的列读取为空文本，无法转换的单元格保留原始文本。
///
/// # Errors
/// Returns an error if the file cannot be opened or is not valid CSV.
pub fn load_results(path: &Path) -> Result<Vec<ReportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| t!("csv.open_failed", path = path.display()).to_string())?;

    let columns: HashMap<String, usize> = reader
        .headers()
        .with_context(|| t!("csv.read_failed", path = path.display()).to_string())?
        .iter()
        .enumerate()
        .map(|(index, name)| (name.trim().to_string(), index))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| t!("csv.read_failed", path = path.display()).to_string())?;
        rows.push(ReportRow::from_fields(|name| {
            columns
                .get(name)
                .and_then(|&index| record.get(index))
                .unwrap_or("")
        }));
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "loaded results csv");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{CallOutcome, CellValue, Combination, FailureKind};
    use serde_json::json;
    use std::time::Duration;

    fn combination(index: usize) -> Combination {
        Combination {
            test_id: format!("img_loc_person_pipe{index}"),
            image_list_key: "img".to_string(),
            image_list_name: "Images, quoted \"set\"".to_string(),
            image_list_description: "multi\nline".to_string(),
            image_urls: vec!["http://img/a.png".to_string(), "http://img/b.png".to_string()],
            location_prompt_key: "loc".to_string(),
            location_prompt_name: "Location".to_string(),
            location_prompt_value: String::new(),
            person_prompt_key: "person".to_string(),
            person_prompt_name: "Person".to_string(),
            person_prompt_value: "smiling".to_string(),
            pipeline_config_key: format!("pipe{index}"),
            pipeline_config_name: "Pipeline".to_string(),
            pipeline_config_filename: "pipe.json".to_string(),
        }
    }

    #[test]
    fn serialized_header_matches_column_list() {
        let outcome = CallOutcome::succeeded(json!({}), Duration::from_secs(1), 1);
        let record = TestRecord::with_timestamp(&combination(0), 1, &outcome, "t".to_string());

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&record).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();

        assert_eq!(header, CSV_COLUMNS.join(","));
    }

    #[test]
    fn empty_result_set_writes_header_only() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("empty.csv");

        write_results(&[], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), CSV_COLUMNS.join(","));
        assert!(load_results(&path).unwrap().is_empty());
    }

    #[test]
    fn written_records_reload_with_typed_fields() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("results.csv");
        let ok = CallOutcome::succeeded(
            json!({"status": "done", "images_requested": 2, "processed_images": ["http://out/1.png"]}),
            Duration::from_millis(1500),
            1,
        );
        let failed = CallOutcome::failed(
            FailureKind::HttpStatus,
            "HTTP 500: oops, \"bad\"".to_string(),
            Duration::from_millis(20),
            2,
        );
        let records = vec![
            TestRecord::with_timestamp(&combination(0), 1, &ok, "2024-01-01T10:00:00.000001".to_string()),
            TestRecord::with_timestamp(&combination(1), 2, &failed, "2024-01-01T10:00:05.000001".to_string()),
        ];

        write_results(&records, &path).unwrap();
        let rows = load_results(&path).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ReportRow::from(&records[0]));
        assert!(rows[0].success);
        assert_eq!(rows[0].duration_seconds, CellValue::Parsed(1.5));
        assert_eq!(rows[0].processed_image_urls, vec!["http://out/1.png"]);
        assert_eq!(rows[0].image_list_name, "Images, quoted \"set\"");
        assert!(!rows[1].success);
        assert_eq!(rows[1].error_message, "HTTP 500: oops, \"bad\"");
        assert_eq!(rows[1].test_number, CellValue::Parsed(2));
    }

    #[test]
    fn foreign_csv_with_missing_columns_loads_best_effort() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("foreign.csv");
        std::fs::write(&path, "test_id,success,duration_seconds\nabc,False,slow\n").unwrap();

        let rows = load_results(&path).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].test_id, "abc");
        assert!(!rows[0].success);
        assert_eq!(rows[0].duration_seconds, CellValue::Text("slow".to_string()));
        assert_eq!(rows[0].timestamp, "");
        assert!(rows[0].image_urls.is_empty());
    }
}

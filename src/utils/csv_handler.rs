//! 批量导入的 CSV 读写
//!
//! 输入列：url, expires_at, password, one_time, owner（表头必需，大小写不敏感）
//! 输出列：index, url, code, short_url, error_code, error

use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Deserialize;

use crate::errors::{Result, SnaplinkError};
use crate::services::{BulkOutcome, BulkRow, DecodedRow, RowDecodeError};

/// CSV 原始行，所有字段均可缺失
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvBulkRow {
    url: Option<String>,
    expires_at: Option<String>,
    password: Option<String>,
    one_time: Option<String>,
    owner: Option<String>,
}

impl CsvBulkRow {
    fn into_row(self) -> DecodedRow {
        let url = self.url.unwrap_or_default();
        if url.is_empty() {
            return Err(RowDecodeError {
                url,
                error: SnaplinkError::validation("Missing url"),
            });
        }
        let one_time = match self.one_time.as_deref().map(parse_bool_flag).transpose() {
            Ok(flag) => flag.unwrap_or(false),
            Err(error) => return Err(RowDecodeError { url, error }),
        };
        Ok(BulkRow {
            url,
            expires_at: self.expires_at.filter(|s| !s.is_empty()),
            password: self.password.filter(|s| !s.is_empty()),
            one_time,
            owner: self.owner.filter(|s| !s.is_empty()),
        })
    }
}

/// 宽松布尔解析：true/1/yes/y 与 false/0/no/n/空
pub fn parse_bool_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "" | "false" | "0" | "no" | "n" => Ok(false),
        other => Err(SnaplinkError::validation(format!(
            "Invalid one_time value '{}'",
            other
        ))),
    }
}

/// 读取批量行。表头缺少 `url` 列时整体失败；单行错误按行返回。
pub fn read_bulk_rows<R: Read>(reader: R) -> Result<impl Iterator<Item = DecodedRow>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: StringRecord = csv_reader
        .headers()?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    if !headers.iter().any(|h| h == "url") {
        return Err(SnaplinkError::validation(
            "CSV header must contain a 'url' column",
        ));
    }
    csv_reader.set_headers(headers.clone());

    Ok(csv_reader.into_records().map(move |record| {
        let record = record.map_err(|e| RowDecodeError {
            url: String::new(),
            error: SnaplinkError::validation(format!("Malformed CSV row: {}", e)),
        })?;
        let url = headers
            .iter()
            .position(|h| h == "url")
            .and_then(|i| record.get(i))
            .unwrap_or_default()
            .to_string();
        let raw: CsvBulkRow = record.deserialize(Some(&headers)).map_err(|e| RowDecodeError {
            url,
            error: SnaplinkError::validation(format!("Malformed CSV row: {}", e)),
        })?;
        raw.into_row()
    }))
}

/// 逐行写出批量结果
pub struct BulkCsvWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> BulkCsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: WriterBuilder::new().has_headers(true).from_writer(writer),
        }
    }

    pub fn write(&mut self, outcome: &BulkOutcome) -> Result<()> {
        self.inner.serialize(outcome)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        self.inner
            .into_inner()
            .map_err(|e| SnaplinkError::file_operation(format!("Failed to flush CSV: {}", e)))
    }
}

/// 编码一批结果，用于分块的流式响应；只有首块带表头
pub fn encode_outcome_chunk(outcomes: &[BulkOutcome], with_header: bool) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(Vec::new());
    for outcome in outcomes {
        writer.serialize(outcome)?;
    }
    writer
        .into_inner()
        .map_err(|e| SnaplinkError::file_operation(format!("Failed to flush CSV: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rows_with_per_row_errors() {
        let input = "URL,one_time,owner\n\
                     https://a.example.com,yes,alice\n\
                     ,no,\n\
                     https://c.example.com,maybe,\n";
        let rows: Vec<_> = read_bulk_rows(input.as_bytes()).unwrap().collect();
        assert_eq!(rows.len(), 3);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.url, "https://a.example.com");
        assert!(first.one_time);
        assert_eq!(first.owner.as_deref(), Some("alice"));

        assert_eq!(rows[1].as_ref().unwrap_err().error.kind(), "Validation");

        let third = rows[2].as_ref().unwrap_err();
        assert_eq!(third.url, "https://c.example.com");
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let input = "url,expires_at,password\nhttps://a.example.com\n";
        let rows: Vec<_> = read_bulk_rows(input.as_bytes()).unwrap().collect();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.url, "https://a.example.com");
        assert!(row.expires_at.is_none());
        assert!(row.password.is_none());
    }

    #[test]
    fn test_missing_url_header_rejected() {
        assert!(read_bulk_rows("target\nhttps://a.example.com\n".as_bytes()).is_err());
    }

    #[test]
    fn test_parse_bool_flag() {
        assert!(parse_bool_flag("TRUE").unwrap());
        assert!(parse_bool_flag("1").unwrap());
        assert!(!parse_bool_flag("").unwrap());
        assert!(!parse_bool_flag("no").unwrap());
        assert!(parse_bool_flag("2").is_err());
    }

    #[test]
    fn test_encode_chunk_keeps_columns_for_failures() {
        let outcomes = vec![
            BulkOutcome {
                index: 0,
                url: "https://a.example.com".into(),
                code: Some("abc1234".into()),
                short_url: Some("http://s.example/abc1234".into()),
                error_code: None,
                error: None,
            },
            BulkOutcome {
                index: 1,
                url: "bad".into(),
                code: None,
                short_url: None,
                error_code: Some("Validation".into()),
                error: Some("Invalid URL".into()),
            },
        ];
        let text = String::from_utf8(encode_outcome_chunk(&outcomes, true).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "index,url,code,short_url,error_code,error");
        assert_eq!(lines[1], "0,https://a.example.com,abc1234,http://s.example/abc1234,,");
        assert_eq!(lines[2], "1,bad,,,Validation,Invalid URL");

        // 分块拼接与一次性写出一致
        let mut chunked = encode_outcome_chunk(&outcomes[..1], true).unwrap();
        chunked.extend(encode_outcome_chunk(&outcomes[1..], false).unwrap());
        assert_eq!(chunked, text.as_bytes());

        let mut writer = BulkCsvWriter::new(Vec::new());
        for outcome in &outcomes {
            writer.write(outcome).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), text.as_bytes());
    }
}

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::models::{index_id::IndexId, price_point::PricePoint, series_table::SeriesTable};

#[derive(Deserialize, Debug)]
pub struct KlineResponse {
    #[serde(default)]
    pub rc: Option<i64>,
    pub data: Option<KlineData>,
}

#[derive(Deserialize, Debug)]
pub struct KlineData {
    pub klines: Option<Vec<String>>,
}

/// Why a body could not be turned into a [`SeriesTable`].
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response has no data block (rc={rc:?})")]
    MissingData { rc: Option<i64> },

    #[error("response data has no klines list")]
    MissingKlines,

    #[error("none of the {total} kline entries could be parsed")]
    NoUsableEntries { total: usize },
}

/// Parses one kline entry, `"<date>,<close>,..."`.
///
/// Fields past the second are ignored. Returns `None` for entries with fewer
/// than two fields, an unparseable date or a close that isn't a positive number.
pub fn parse_kline(entry: &str) -> Option<PricePoint> {
    let mut fields = entry.split(',');
    let date = fields.next()?.trim();
    let close = fields.next()?.trim();

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y%m%d"))
        .ok()?;
    let close = close.parse::<f64>().ok()?;
    PricePoint::new(date, close)
}

/// Decodes a full response body into the series for `index`.
///
/// Individual bad entries are skipped and logged. A body with no data block,
/// no klines list, or only bad entries is an error. An empty klines list is a
/// valid, empty table.
pub fn parse_body(index: &IndexId, body: &str) -> Result<SeriesTable, ResponseError> {
    let response: KlineResponse = serde_json::from_str(body)?;
    let data = response
        .data
        .ok_or(ResponseError::MissingData { rc: response.rc })?;
    let klines = data.klines.ok_or(ResponseError::MissingKlines)?;

    let total = klines.len();
    let mut points = Vec::with_capacity(total);
    for entry in &klines {
        match parse_kline(entry) {
            Some(point) => points.push(point),
            None => warn!(%index, entry = %entry, "skipping unparseable kline entry"),
        }
    }

    if total > 0 && points.is_empty() {
        return Err(ResponseError::NoUsableEntries { total });
    }
    Ok(SeriesTable::new(index.clone(), points))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> IndexId {
        IndexId::new(1, "000918")
    }

    #[test]
    fn uses_first_two_fields_only() {
        let p = parse_kline("2024-01-02,3512.40,3500.00,3520.00").unwrap();
        assert_eq!(p.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(p.close, 3512.40);
        assert!(parse_kline("20240103,1.5").is_some());
    }

    #[test]
    fn rejects_short_or_bad_entries() {
        assert!(parse_kline("2024-01-02").is_none());
        assert!(parse_kline("").is_none());
        assert!(parse_kline("yesterday,1.0").is_none());
        assert!(parse_kline("2024-01-02,n/a").is_none());
        assert!(parse_kline("2024-01-02,0").is_none());
    }

    #[test]
    fn parses_body_and_skips_bad_entries() {
        let body = r#"{"rc":0,"data":{"code":"000918","name":"300成长","klines":[
            "2024-01-03,1020.5",
            "garbage",
            "2024-01-02,1010.0"
        ]}}"#;
        let table = parse_body(&id(), body).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.first_date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
    }

    #[test]
    fn null_data_is_malformed() {
        let err = parse_body(&id(), r#"{"rc":102,"data":null}"#).unwrap_err();
        assert!(matches!(err, ResponseError::MissingData { rc: Some(102) }));
    }

    #[test]
    fn missing_klines_is_malformed() {
        let err = parse_body(&id(), r#"{"rc":0,"data":{"code":"000918"}}"#).unwrap_err();
        assert!(matches!(err, ResponseError::MissingKlines));
    }

    #[test]
    fn all_bad_entries_is_malformed() {
        let err = parse_body(&id(), r#"{"data":{"klines":["a","b,c"]}}"#).unwrap_err();
        assert!(matches!(err, ResponseError::NoUsableEntries { total: 2 }));
    }

    #[test]
    fn empty_klines_is_an_empty_table() {
        let table = parse_body(&id(), r#"{"data":{"klines":[]}}"#).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            parse_body(&id(), "<html>blocked</html>"),
            Err(ResponseError::Json(_))
        ));
    }
}

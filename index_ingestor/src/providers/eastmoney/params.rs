use crate::models::request_params::SeriesRequest;

/// Header block fields; the response only needs code and name from it.
const FIELDS1: &str = "f1,f2,f3,f4,f5,f6";

/// Per-bar fields: `f51` is the date and `f53` the close, in that order, so
/// every kline entry starts with `<date>,<close>`.
const FIELDS2: &str = "f51,f53";

/// Builds the query string for a kline request.
pub fn construct_params(request: &SeriesRequest) -> Vec<(String, String)> {
    vec![
        ("secid".to_string(), request.index.to_string()),
        ("klt".to_string(), request.period.code().to_string()),
        ("fqt".to_string(), request.adjustment.code().to_string()),
        ("beg".to_string(), request.range.start_token()),
        ("end".to_string(), request.range.end_token()),
        ("fields1".to_string(), FIELDS1.to_string()),
        ("fields2".to_string(), FIELDS2.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        index_id::IndexId,
        request_params::{Adjustment, Period, SeriesRequest},
    };

    #[test]
    fn daily_request_params() {
        let mut request = SeriesRequest::daily(IndexId::new(1, "000919"));
        request.adjustment = Adjustment::None;
        request.period = Period::Weekly;

        let params = construct_params(&request);
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("secid"), Some("1.000919"));
        assert_eq!(get("klt"), Some("102"));
        assert_eq!(get("fqt"), Some("0"));
        assert_eq!(get("beg"), Some("20240101"));
        assert_eq!(get("end"), Some("20991231"));
        assert_eq!(get("fields2"), Some("f51,f53"));
    }
}

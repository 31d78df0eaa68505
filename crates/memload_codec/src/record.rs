//! Line grammar: `devType \t devId \t lat \t lon \t app1,app2,...,appN`

use thiserror::Error;

/// A parsed, validated installed-apps line.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub dev_type: String,
    pub dev_id: String,
    pub lat: f64,
    pub lon: f64,
    pub apps: Vec<u32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected at least 5 tab-separated fields, got {0}")]
    TooFewFields(usize),
    #[error("devType field is empty")]
    EmptyDevType,
    #[error("devId field is empty")]
    EmptyDevId,
    #[error("apps token {token:?} is not a valid u32")]
    InvalidAppToken { token: String },
    #[error("lat field {0:?} is not a valid decimal")]
    InvalidLat(String),
    #[error("lon field {0:?} is not a valid decimal")]
    InvalidLon(String),
}

/// Parse one already-trimmed or untrimmed line into a `Record`.
///
/// Splits on tab, rejects short lines,
/// reject empty identifiers, parse the apps CSV before lat/lon so a bad
/// apps token is reported the same way regardless of lat/lon validity.
pub fn parse_line(line: &str) -> Result<Record, ParseError> {
    let line = line.trim();
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 5 {
        return Err(ParseError::TooFewFields(fields.len()));
    }

    let dev_type = fields[0];
    let dev_id = fields[1];
    let lat_str = fields[2];
    let lon_str = fields[3];
    let raw_apps = fields[4];

    if dev_type.is_empty() {
        return Err(ParseError::EmptyDevType);
    }
    if dev_id.is_empty() {
        return Err(ParseError::EmptyDevId);
    }

    let apps = parse_apps(raw_apps)?;

    let lat: f64 = lat_str
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidLat(lat_str.to_string()))?;
    let lon: f64 = lon_str
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidLon(lon_str.to_string()))?;

    Ok(Record {
        dev_type: dev_type.to_string(),
        dev_id: dev_id.to_string(),
        lat,
        lon,
        apps,
    })
}

fn parse_apps(raw: &str) -> Result<Vec<u32>, ParseError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<u32>()
                .map_err(|_| ParseError::InvalidAppToken {
                    token: token.to_string(),
                })
        })
        .collect()
}

/// `devType:devId`, the store key for a record.
pub fn store_key(dev_type: &str, dev_id: &str) -> String {
    format!("{dev_type}:{dev_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_spec_example_line() {
        let r = parse_line("idfa\t1rfw452y52g2gq4g\t55.55\t42.42\t1423,43,567,3,7,23").unwrap();
        assert_eq!(r.dev_type, "idfa");
        assert_eq!(r.dev_id, "1rfw452y52g2gq4g");
        assert_eq!(r.lat, 55.55);
        assert_eq!(r.lon, 42.42);
        assert_eq!(r.apps, vec![1423, 43, 567, 3, 7, 23]);
    }

    #[test]
    fn trims_leading_and_trailing_whitespace_on_the_line() {
        let r = parse_line("  idfa\tA\t1.0\t2.0\t1  \n").unwrap();
        assert_eq!(r.dev_id, "A");
        assert_eq!(r.apps, vec![1]);
    }

    #[test]
    fn trims_whitespace_inside_apps_tokens() {
        let r = parse_line("idfa\tA\t1.0\t2.0\t 1 , 2 ,3").unwrap();
        assert_eq!(r.apps, vec![1, 2, 3]);
    }

    #[test]
    fn empty_apps_field_yields_empty_vec() {
        let r = parse_line("idfa\tA\t1.0\t2.0\t").unwrap();
        assert!(r.apps.is_empty());
    }

    #[test]
    fn rejects_fewer_than_five_fields() {
        let err = parse_line("idfa\tA\t1.0\t2.0").unwrap_err();
        assert_eq!(err, ParseError::TooFewFields(4));
    }

    #[test]
    fn rejects_empty_dev_type() {
        let err = parse_line("\tA\t1.0\t2.0\t1").unwrap_err();
        assert_eq!(err, ParseError::EmptyDevType);
    }

    #[test]
    fn rejects_empty_dev_id() {
        let err = parse_line("idfa\t\t1.0\t2.0\t1").unwrap_err();
        assert_eq!(err, ParseError::EmptyDevId);
    }

    #[test]
    fn rejects_non_integer_apps_token() {
        let err = parse_line("idfa\tA\t1.0\t2.0\t1,x,3").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidAppToken {
                token: "x".to_string()
            }
        );
    }

    #[test]
    fn rejects_apps_token_that_overflows_u32() {
        let err = parse_line("idfa\tA\t1.0\t2.0\t4294967296").unwrap_err();
        assert!(matches!(err, ParseError::InvalidAppToken { .. }));
    }

    #[test]
    fn rejects_non_numeric_lat() {
        let err = parse_line("idfa\tA\tnope\t2.0\t1").unwrap_err();
        assert_eq!(err, ParseError::InvalidLat("nope".to_string()));
    }

    #[test]
    fn rejects_non_numeric_lon() {
        let err = parse_line("idfa\tA\t1.0\tnope\t1").unwrap_err();
        assert_eq!(err, ParseError::InvalidLon("nope".to_string()));
    }

    #[test]
    fn store_key_joins_type_and_id_with_colon() {
        assert_eq!(store_key("idfa", "abc"), "idfa:abc");
    }
}

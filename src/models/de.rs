//! Lenient deserializers for request bodies coming from HTML forms.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

/// Accepts `5` or `"5"`.
pub fn id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected a numeric id, got \"{}\"", s))),
    }
}

/// Accepts `5` or `"Finance"`, yielding text.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n.to_string(),
        NumberOrString::Text(s) => s,
    })
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Accepts `2024-01-15` or an ISO datetime, keeping the date part.
pub fn date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date \"{}\"", raw)))
}

/// Like [`date`], with empty strings and nulls mapping to `None`.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date \"{}\"", raw))),
    }
}

/// Query-string values parsed with `FromStr`; empty strings mean "no filter".
pub fn optional_parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(D::Error::custom),
    }
}

/// Accepts a list of ids given as numbers or numeric strings.
pub fn ids<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<NumberOrString>::deserialize(deserializer)?
        .into_iter()
        .map(|v| match v {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("expected a numeric id, got \"{}\"", s))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "id")]
        item_id: i64,
        #[serde(deserialize_with = "date")]
        issue_date: NaiveDate,
        #[serde(default, deserialize_with = "optional_date")]
        warranty: Option<NaiveDate>,
        #[serde(deserialize_with = "text")]
        department: String,
    }

    #[test]
    fn test_accepts_form_style_values() {
        let probe: Probe = serde_json::from_str(
            r#"{"item_id":"3","issue_date":"2024-01-15T00:00:00.000Z","warranty":"","department":12}"#,
        )
        .unwrap();
        assert_eq!(probe.item_id, 3);
        assert_eq!(probe.issue_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(probe.warranty, None);
        assert_eq!(probe.department, "12");
    }

    #[test]
    fn test_rejects_non_numeric_id() {
        let res: Result<Probe, _> = serde_json::from_str(
            r#"{"item_id":"abc","issue_date":"2024-01-15","department":"IT"}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_blank_query_values_are_ignored() {
        #[derive(Deserialize)]
        struct Filter {
            #[serde(default, deserialize_with = "optional_parsed")]
            category: Option<i64>,
        }
        let blank: Filter = serde_json::from_str(r#"{"category":""}"#).unwrap();
        assert_eq!(blank.category, None);
        let set: Filter = serde_json::from_str(r#"{"category":" 4 "}"#).unwrap();
        assert_eq!(set.category, Some(4));
        assert!(serde_json::from_str::<Filter>(r#"{"category":"four"}"#).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2024-02-30").is_none());
        assert_eq!(parse_date(" 2024-03-01 "), NaiveDate::from_ymd_opt(2024, 3, 1));
    }
}

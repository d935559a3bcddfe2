extern crate anyhow;
extern crate reqwest;
extern crate serde;
extern crate serde_json;

use anyhow::Context;

use crate::location;
use crate::result;

// Public demo key from https://api.bart.gov/docs/overview/index.aspx
pub const DEFAULT_API_KEY: &str = "MW9S-E7SL-26DU-VV8V";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Estimate {
    pub wait_minutes: i64,
    pub line_color: String,
}

// Envelope structs mirror http://api.bart.gov/api/etd.aspx field names.
#[derive(Serialize, Deserialize)]
struct BartEnvelope {
    root: BartRoot,
}

#[derive(Serialize, Deserialize)]
struct BartRoot {
    station: Vec<BartStation>,
}

#[derive(Serialize, Deserialize)]
struct BartStation {
    abbr: String,
    // Missing entirely when no trains are running.
    #[serde(default)]
    etd: Vec<BartLineEtd>,
}

#[derive(Serialize, Deserialize)]
struct BartLineEtd {
    destination: String,
    abbreviation: String,
    estimate: Vec<BartEtdEntry>,
}

#[derive(Serialize, Deserialize)]
struct BartEtdEntry {
    // "Leaving" or a string-encoded non-negative integer.
    minutes: String,
    #[serde(default)]
    color: String,
    #[serde(default)]
    hexcolor: String,
    #[serde(default)]
    length: String,
}

pub fn fetch_estimates(station: &str,
                       direction: location::Direction,
                       api_key: &str) -> result::BartDashResult<Vec<Estimate>> {
    return fetch_estimates_ext(station, direction, api_key, real_fetch_json_fn);
}

fn etd_url(station: &str, direction: location::Direction, api_key: &str) -> String {
    return format!(
        "https://api.bart.gov/api/etd.aspx?cmd=etd&dir={dir}&orig={orig}&key={key}&json=y",
        dir = direction.feed_code(),
        orig = station,
        key = api_key);
}

fn fetch_estimates_ext(station: &str,
                       direction: location::Direction,
                       api_key: &str,
                       fetch_json_fn: fn(&str) -> result::BartDashResult<String>)
                       -> result::BartDashResult<Vec<Estimate>> {
    let url = etd_url(station, direction, api_key);
    debug!("Fetching {}", url);
    let raw_json = fetch_json_fn(&url)?;
    return parse_estimates(&raw_json);
}

fn real_fetch_json_fn(url: &str) -> result::BartDashResult<String> {
    use std::io::Read;

    let client = reqwest::blocking::Client::new();
    let mut response = client.get(url)
        .send()
        .with_context(|| format!("while fetching url: {}", url))?;
    if !response.status().is_success() {
        return Err(result::BartDashError::FetchStatusError(
            response.status().as_u16()));
    }
    let mut response_body = String::new();
    response.read_to_string(&mut response_body)?;
    return Ok(response_body);
}

fn parse_estimates(raw_json: &str) -> result::BartDashResult<Vec<Estimate>> {
    let envelope: BartEnvelope = serde_json::from_str(raw_json)?;

    // Only the first station is consulted; an empty list is a feed failure,
    // not an empty set of arrivals.
    let station = envelope.root.station.into_iter().nth(0)
        .ok_or(result::BartDashError::EmptyFeedError)?;

    let mut estimates = vec![];
    for line in station.etd {
        for entry in line.estimate {
            estimates.push(Estimate{
                wait_minutes: parse_minutes(&entry.minutes)?,
                line_color: line_color(&entry),
            });
        }
    }

    // sort_by_key is stable, so equal waits keep feed order.
    estimates.sort_by_key(|e| e.wait_minutes);
    return Ok(estimates);
}

fn parse_minutes(raw: &str) -> result::BartDashResult<i64> {
    if raw == "Leaving" {
        return Ok(0);
    }
    let minutes = raw.parse::<i64>().map_err(|_| {
        result::make_error(&format!("Unparseable minutes field: '{}'", raw))
    })?;
    if minutes < 0 {
        return Err(result::make_error(&format!(
            "Negative minutes field: '{}'", raw)));
    }
    return Ok(minutes);
}

fn line_color(entry: &BartEtdEntry) -> String {
    if !entry.color.is_empty() {
        return entry.color.clone();
    }
    return entry.hexcolor.clone();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden_fetch_fn(_url: &str) -> result::BartDashResult<String> {
        // curl 'https://api.bart.gov/api/etd.aspx?cmd=etd&dir=s&orig=woak&key=...&json=y' > testdata/bart_etd.json
        return Ok(std::fs::read_to_string("testdata/bart_etd.json")
            .expect("reading bart_etd.json"));
    }

    fn failing_fetch_fn(_url: &str) -> result::BartDashResult<String> {
        return Err(result::BartDashError::FetchStatusError(503));
    }

    #[test]
    fn golden_envelope_normalizes_and_sorts() {
        let estimates = fetch_estimates_ext(
            "woak", location::Direction::South, "key", golden_fetch_fn)
            .expect("fetch_estimates_ext");

        let waits: Vec<i64> = estimates.iter().map(|e| e.wait_minutes).collect();
        assert_eq!(vec![0, 3, 5, 12], waits);

        // "Leaving" came from the Daly City line.
        assert_eq!("GREEN", estimates[0].line_color);
        assert_eq!("RED", estimates[1].line_color);
    }

    #[test]
    fn golden_envelope_is_non_decreasing() {
        let estimates = fetch_estimates_ext(
            "woak", location::Direction::South, "key", golden_fetch_fn)
            .expect("fetch_estimates_ext");
        for pair in estimates.windows(2) {
            assert!(pair[0].wait_minutes <= pair[1].wait_minutes);
        }
    }

    #[test]
    fn leaving_token_is_zero_minutes() {
        assert_eq!(0, parse_minutes("Leaving").expect("parse Leaving"));
        assert_eq!(7, parse_minutes("7").expect("parse 7"));
    }

    #[test]
    fn malformed_minutes_are_rejected() {
        assert!(parse_minutes("soon").is_err());
        assert!(parse_minutes("-3").is_err());
        assert!(parse_minutes("").is_err());
    }

    #[test]
    fn empty_station_list_is_a_feed_error() {
        let raw_json = r#"{"root":{"id":"1","date":"01/02/2024","time":"04:38:01 PM PST","station":[],"message":""}}"#;
        match parse_estimates(raw_json) {
            Err(result::BartDashError::EmptyFeedError) => {},
            other => panic!("expected EmptyFeedError, got {:?}", other),
        }
    }

    #[test]
    fn flattens_across_lines_stably() {
        let raw_json = r##"{"root":{"station":[{"abbr":"WOAK","etd":[
            {"destination":"A","abbreviation":"A","estimate":[
                {"minutes":"4","color":"YELLOW","hexcolor":"#ffff33","length":"10"}]},
            {"destination":"B","abbreviation":"B","estimate":[
                {"minutes":"4","color":"BLUE","hexcolor":"#0099cc","length":"8"}]}
        ]}]}}"##;
        let estimates = parse_estimates(raw_json).expect("parse_estimates");
        // Equal waits keep appearance order.
        assert_eq!("YELLOW", estimates[0].line_color);
        assert_eq!("BLUE", estimates[1].line_color);
    }

    #[test]
    fn non_success_status_fails_the_fetch() {
        let outcome = fetch_estimates_ext(
            "woak", location::Direction::South, "key", failing_fetch_fn);
        match outcome {
            Err(result::BartDashError::FetchStatusError(503)) => {},
            other => panic!("expected FetchStatusError(503), got {:?}", other),
        }
    }

    #[test]
    fn url_embeds_station_direction_and_key() {
        let url = etd_url("19th", location::Direction::North, "SOME-KEY");
        assert!(url.contains("dir=n"));
        assert!(url.contains("orig=19th"));
        assert!(url.contains("key=SOME-KEY"));
        assert!(url.contains("json=y"));
    }
}

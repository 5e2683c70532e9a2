//! Live rate source backed by the FRED observations API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use refi_core::market::{RateObservation, RateRange, RateSource, Tenor};
use refi_core::{RefiError, RefiResult};

const FRED_OBSERVATIONS_URL: &str = "https://api.stlouisfed.org/fred/series/observations";

/// Bounded request timeout; a hung fetch degrades like any other failure.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: NaiveDate,
    /// Percent as text; "." marks a missing observation.
    value: String,
}

pub struct FredRateSource {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl FredRateSource {
    pub fn new(api_key: String) -> RefiResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| RefiError::DataSource(format!("HTTP client init failed: {e}")))?;
        Ok(FredRateSource { client, api_key })
    }
}

impl RateSource for FredRateSource {
    fn fetch_series(&self, tenor: Tenor, range: &RateRange) -> RefiResult<Vec<RateObservation>> {
        log::info!("fetching {} from FRED", tenor.series_id());

        let response = self
            .client
            .get(FRED_OBSERVATIONS_URL)
            .query(&[
                ("series_id", tenor.series_id().to_string()),
                ("api_key", self.api_key.clone()),
                ("file_type", "json".to_string()),
                ("observation_start", range.start.to_string()),
                ("observation_end", range.end.to_string()),
            ])
            .send()
            .map_err(|e| RefiError::DataSource(format!("FRED request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RefiError::DataSource(format!(
                "FRED returned HTTP {}",
                response.status()
            )));
        }

        let body: ObservationsResponse = response
            .json()
            .map_err(|e| RefiError::DataSource(format!("FRED response parse failed: {e}")))?;
        parse_observations(body)
    }
}

/// FRED publishes rates as percent strings, with "." for missing weeks.
fn parse_observations(body: ObservationsResponse) -> RefiResult<Vec<RateObservation>> {
    let mut series = Vec::with_capacity(body.observations.len());
    for obs in body.observations {
        if obs.value == "." {
            continue;
        }
        let percent = Decimal::from_str(&obs.value).map_err(|e| {
            RefiError::DataSource(format!("bad rate value '{}' on {}: {e}", obs.value, obs.date))
        })?;
        series.push(RateObservation {
            date: obs.date,
            rate: percent / Decimal::ONE_HUNDRED,
        });
    }
    Ok(series)
}

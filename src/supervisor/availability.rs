// src/supervisor/availability.rs

//! Availability gate: asks the external scheduling service whether an
//! instrument may be started for a given UT date.
//!
//! Every failure mode — transport error, malformed response, missing
//! instrument, explicit "unavailable" — yields `false`. A pipeline is never
//! started on an inconclusive answer.

use std::future::Future;
use std::pin::Pin;

use chrono::{Days, NaiveDate};
use tracing::{debug, info, warn};

/// Trait abstracting the scheduling-service read.
///
/// Production code uses [`HttpScheduleService`]; tests can provide an
/// implementation returning canned (or failing) responses.
pub trait ScheduleService: Send + Sync {
    /// Fetch the raw instrument-status response for the given calendar date
    /// (`YYYY-MM-DD`).
    fn instrument_status(
        &self,
        date: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>>;
}

/// Production scheduling-service client.
pub struct HttpScheduleService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpScheduleService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl ScheduleService for HttpScheduleService {
    fn instrument_status(
        &self,
        date: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
        let url = format!("{}cmd=getInstrumentStatus&date={date}", self.base_url);

        Box::pin(async move {
            debug!(%url, "querying scheduling service");
            let body = self
                .client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            Ok(body)
        })
    }
}

/// Decide whether `instrument` may be started for `utdate` (`YYYYMMDD`).
///
/// The service is keyed by the preceding local night, so the query date is
/// `utdate - 1 day` in `YYYY-MM-DD` form.
pub async fn check_available(
    service: &dyn ScheduleService,
    instrument: &str,
    utdate: &str,
) -> bool {
    let Some(ref_date) = reference_date(utdate) else {
        warn!(%utdate, "could not derive schedule reference date; treating as not available");
        return false;
    };

    let body = match service.instrument_status(&ref_date).await {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "availability check failed; treating as not available");
            return false;
        }
    };

    match parse_availability(&body, instrument) {
        Some(true) => {
            info!(%instrument, "instrument is available");
            true
        }
        Some(false) => {
            info!(%instrument, "instrument is not available");
            false
        }
        None => {
            warn!(%instrument, "malformed availability response; treating as not available");
            false
        }
    }
}

/// `utdate - 1 day`, formatted for the scheduling service.
fn reference_date(utdate: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(utdate, "%Y%m%d").ok()?;
    let prev = date.checked_sub_days(Days::new(1))?;
    Some(prev.format("%Y-%m-%d").to_string())
}

/// Extract the per-instrument availability flag from the response body.
///
/// The service returns a JSON array whose first element maps instrument
/// names to `{"Available": 0|1}`; a bare object is also accepted.
fn parse_availability(body: &str, instrument: &str) -> Option<bool> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let entry = match &value {
        serde_json::Value::Array(items) => items.first()?,
        other => other,
    };

    let flag = entry.get(instrument)?.get("Available")?.as_i64()?;
    Some(flag != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_date_is_previous_day() {
        assert_eq!(reference_date("20240101").as_deref(), Some("2023-12-31"));
        assert_eq!(reference_date("20240301").as_deref(), Some("2024-02-29"));
        assert_eq!(reference_date("not-a-date"), None);
    }

    #[test]
    fn available_flag_one_is_true() {
        let body = r#"[{"KCWI": {"Available": 1}}]"#;
        assert_eq!(parse_availability(body, "KCWI"), Some(true));
    }

    #[test]
    fn available_flag_zero_is_false() {
        let body = r#"[{"KCWI": {"Available": 0}}]"#;
        assert_eq!(parse_availability(body, "KCWI"), Some(false));
    }

    #[test]
    fn bare_object_is_accepted() {
        let body = r#"{"KCWI": {"Available": 1}}"#;
        assert_eq!(parse_availability(body, "KCWI"), Some(true));
    }

    #[test]
    fn missing_instrument_is_inconclusive() {
        let body = r#"[{"NIRES": {"Available": 1}}]"#;
        assert_eq!(parse_availability(body, "KCWI"), None);
    }

    #[test]
    fn malformed_body_is_inconclusive() {
        assert_eq!(parse_availability("not json", "KCWI"), None);
        assert_eq!(parse_availability("[]", "KCWI"), None);
        assert_eq!(parse_availability(r#"[{"KCWI": {}}]"#, "KCWI"), None);
    }
}

//! Airtable record store
//!
//! Talks to the Airtable REST API with bearer auth. Filtering and sorting
//! happen store-side: the list query filters by the user-tag field and
//! sorts by creation time descending. Updates are chunked to Airtable's
//! 10-record batch limit.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::config::AirtableConfig;
use crate::model::{MeasurementRecord, NewRecord};
use crate::store::RecordStore;

/// Airtable batch limit for create/update calls.
const UPDATE_CHUNK_SIZE: usize = 10;

/// Column names of the production table.
mod fields {
    pub const ID: &str = "ID";
    pub const USER: &str = "User Tag";
    pub const PREDICTED: &str = "Predicted";
    pub const ACTUAL: &str = "Actual";
    pub const PUMP_ZERO: &str = "Pump Zero";
    pub const BUILD: &str = "Build Version";
    pub const CREATED: &str = "Created";
    pub const EXCLUDE: &str = "Exclude From Calculations";

    pub const ALL: [&str; 8] = [
        ID, USER, PREDICTED, ACTUAL, PUMP_ZERO, BUILD, CREATED, EXCLUDE,
    ];
}

#[derive(Debug, Clone)]
pub struct AirtableStore {
    config: AirtableConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    records: Vec<AirtableRecord>,
}

#[derive(Debug, Deserialize)]
struct AirtableRecord {
    id: String,
    fields: RecordFields,
}

/// Airtable omits unset cells entirely, so every field is optional here
/// and rows missing required cells are skipped with a warning.
#[derive(Debug, Default, Deserialize)]
struct RecordFields {
    #[serde(rename = "ID", default)]
    id: Option<u64>,
    #[serde(rename = "User Tag", default)]
    user: Option<String>,
    #[serde(rename = "Predicted", default)]
    predicted: Option<f64>,
    #[serde(rename = "Actual", default)]
    actual: Option<f64>,
    #[serde(rename = "Pump Zero", default)]
    pump_zero: Option<f64>,
    #[serde(rename = "Build Version", default)]
    build: Option<String>,
    #[serde(rename = "Created", default)]
    created: Option<DateTime<Utc>>,
    #[serde(rename = "Exclude From Calculations", default)]
    exclude_from_calculations: bool,
}

#[derive(Debug, Serialize)]
struct CreateBody {
    records: Vec<serde_json::Value>,
    typecast: bool,
}

impl AirtableStore {
    pub fn new(config: AirtableConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { config, http_client })
    }

    /// Table URL with the base id and (possibly space-containing) table
    /// name as percent-encoded path segments.
    fn table_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_base).context("Invalid Airtable API base")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Airtable API base cannot be a base URL"))?
            .push(&self.config.base_id)
            .push(&self.config.table);
        Ok(url)
    }

    fn convert(record: AirtableRecord) -> Option<MeasurementRecord> {
        let f = record.fields;
        match (f.id, f.user, f.predicted, f.actual, f.pump_zero, f.created) {
            (Some(id), Some(user), Some(predicted), Some(actual), Some(pump_zero), Some(created_at)) => {
                Some(MeasurementRecord {
                    record_id: record.id,
                    id,
                    user,
                    predicted,
                    actual,
                    pump_zero,
                    build: f.build.unwrap_or_default(),
                    created_at,
                    exclude_from_calculations: f.exclude_from_calculations,
                })
            }
            _ => {
                warn!("skipping malformed Airtable row {}", record.id);
                None
            }
        }
    }
}

/// Escape a user tag for interpolation into a filterByFormula string literal.
fn escape_formula_value(value: &str) -> String {
    value.replace('\'', "\\'")
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn fetch_records(&self, user: &str) -> Result<Vec<MeasurementRecord>> {
        let formula = format!("{{{}}} = '{}'", fields::USER, escape_formula_value(user));

        let mut query: Vec<(String, String)> = vec![
            ("view".to_string(), "Grid view".to_string()),
            ("filterByFormula".to_string(), formula),
            ("sort[0][field]".to_string(), fields::CREATED.to_string()),
            ("sort[0][direction]".to_string(), "desc".to_string()),
        ];
        for field in fields::ALL {
            query.push(("fields[]".to_string(), field.to_string()));
        }

        debug!("fetching Airtable records for {}", user);
        let response = self
            .http_client
            .get(self.table_url()?)
            .bearer_auth(&self.config.api_key)
            .query(&query)
            .send()
            .await
            .context("Failed to connect to Airtable")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Airtable list failed ({}): {}", status, body);
        }

        let list: ListResponse = response
            .json()
            .await
            .context("Failed to parse Airtable response")?;
        Ok(list.records.into_iter().filter_map(Self::convert).collect())
    }

    async fn create_record(&self, record: &NewRecord) -> Result<()> {
        let body = CreateBody {
            records: vec![json!({
                "fields": {
                    (fields::USER): record.user,
                    (fields::PREDICTED): record.predicted,
                    (fields::ACTUAL): record.actual,
                    (fields::PUMP_ZERO): record.pump_zero,
                    (fields::BUILD): record.build,
                }
            })],
            typecast: true,
        };

        let response = self
            .http_client
            .post(self.table_url()?)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to connect to Airtable")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Airtable create failed ({}): {}", status, body);
        }
        Ok(())
    }

    async fn set_excluded(&self, record_ids: &[String]) -> Result<()> {
        for chunk in record_ids.chunks(UPDATE_CHUNK_SIZE) {
            let records: Vec<serde_json::Value> = chunk
                .iter()
                .map(|id| {
                    json!({
                        "id": id,
                        "fields": { (fields::EXCLUDE): true }
                    })
                })
                .collect();

            let response = self
                .http_client
                .patch(self.table_url()?)
                .bearer_auth(&self.config.api_key)
                .json(&json!({ "records": records }))
                .send()
                .await
                .context("Failed to connect to Airtable")?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                bail!("Airtable update failed ({}): {}", status, body);
            }
        }
        Ok(())
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::Credential;
use crate::configuration::Settings;

/// One warehouse result row: positional cells, `None` for SQL NULL.
pub type Row = Vec<Option<String>>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("warehouse request timed out")]
    Timeout,
    #[error("warehouse request failed: {0}")]
    Transport(String),
    #[error("warehouse returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode warehouse response: {0}")]
    Decode(String),
    #[error("unexpected warehouse response: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QueryError::Timeout
        } else if err.is_decode() {
            QueryError::Decode(err.to_string())
        } else {
            QueryError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str, credential: &Credential) -> Result<Vec<Row>, QueryError>;
}

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a str>,
    warehouse: &'a str,
    parameters: StatementParameters,
}

#[derive(Debug, Serialize)]
struct StatementParameters {
    // 0 lifts the per-resultset row cap
    rows_per_resultset: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    data: Option<Vec<Vec<Value>>>,
    statement_handle: Option<String>,
    result_set_meta_data: Option<ResultSetMetaData>,
    result_set: Option<ResultSet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    partition_info: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    data: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Deserialize)]
struct PartitionResponse {
    data: Option<Vec<Vec<Value>>>,
}

fn to_row(cells: Vec<Value>) -> Row {
    cells
        .into_iter()
        .map(|cell| match cell {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
        .collect()
}

fn preview(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(100)
        .collect()
}

/// Snowflake SQL API (`/api/v2/statements`) executor.
pub struct SnowflakeExecutor {
    client: Client,
    base_url: String,
    database: Option<String>,
    schema: Option<String>,
    warehouse: String,
    statement_timeout: u64,
}

impl SnowflakeExecutor {
    pub fn new(settings: &Settings) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(settings.http_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            database: settings.database.clone(),
            schema: settings.schema.clone(),
            warehouse: settings.warehouse.clone(),
            statement_timeout: settings.http_timeout.as_secs(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder, credential: &Credential) -> reqwest::RequestBuilder {
        let request = request
            .bearer_auth(credential.token())
            .header(reqwest::header::ACCEPT, "application/json");

        match credential.token_type() {
            Some(token_type) => request.header("X-Snowflake-Authorization-Token-Type", token_type),
            None => request,
        }
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, QueryError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(status = status.as_u16(), "warehouse rejected request");
            return Err(QueryError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, body = %body.chars().take(500).collect::<String>(), "unparseable warehouse response");
            QueryError::Decode(e.to_string())
        })
    }

    async fn fetch_partition(
        &self,
        handle: &str,
        partition: usize,
        credential: &Credential,
    ) -> Result<Vec<Row>, QueryError> {
        let url = format!("{}/statements/{}", self.base_url, handle);
        let request = self
            .client
            .get(url)
            .query(&[("partition", partition.to_string())]);
        let response: PartitionResponse = self.send(self.authorize(request, credential)).await?;

        response
            .data
            .map(|rows| rows.into_iter().map(to_row).collect())
            .ok_or_else(|| QueryError::UnexpectedResponse(format!("partition {} carried no data", partition)))
    }
}

#[async_trait]
impl QueryExecutor for SnowflakeExecutor {
    #[instrument(skip_all, fields(sql = %preview(sql)))]
    async fn execute(&self, sql: &str, credential: &Credential) -> Result<Vec<Row>, QueryError> {
        info!("executing warehouse query");

        let payload = StatementRequest {
            statement: sql,
            timeout: self.statement_timeout,
            database: self.database.as_deref(),
            schema: self.schema.as_deref(),
            warehouse: &self.warehouse,
            parameters: StatementParameters { rows_per_resultset: 0 },
        };

        let request = self
            .client
            .post(format!("{}/statements", self.base_url))
            .query(&[("requestId", uuid::Uuid::new_v4().to_string())])
            .json(&payload);
        let response: StatementResponse = self.send(self.authorize(request, credential)).await?;

        if let Some(data) = response.data {
            let mut rows: Vec<Row> = data.into_iter().map(to_row).collect();

            let partitions = response
                .result_set_meta_data
                .map(|meta| meta.partition_info.len())
                .unwrap_or(0);

            if let (Some(handle), true) = (response.statement_handle.as_deref(), partitions > 1) {
                debug!(partitions, "fetching remaining partitions");
                for partition in 1..partitions {
                    match self.fetch_partition(handle, partition, credential).await {
                        Ok(more) => rows.extend(more),
                        Err(e) => warn!(partition, error = %e, "skipping partition"),
                    }
                }
            }

            info!(rows = rows.len(), "warehouse query complete");
            return Ok(rows);
        }

        if let Some(data) = response.result_set.and_then(|rs| rs.data) {
            info!(rows = data.len(), "warehouse query complete (resultSet format)");
            return Ok(data.into_iter().map(to_row).collect());
        }

        error!("warehouse response carried no data");
        Err(QueryError::UnexpectedResponse("no data in response".to_string()))
    }
}

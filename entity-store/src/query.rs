//! Ad hoc SQL operations against a database connection.
//!
//! These calls bypass the entity store: results go straight back to the
//! caller.

use std::sync::Arc;

use validator::Validate;

use common::errors::AppResult;
use common::models::{ExecuteQueryRequest, GenerateSqlRequest, GenerateSqlResponse, QueryResults};

use crate::api::{decode, ApiRequest, RemoteApi};

#[derive(Clone)]
pub struct QueryClient {
    api: Arc<dyn RemoteApi>,
}

impl QueryClient {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self { api }
    }

    /// Turns a natural-language question into SQL. Returns an empty string
    /// when the server produced none.
    pub async fn generate_sql(&self, database_id: &str, question: &str) -> AppResult<String> {
        let request = GenerateSqlRequest {
            question: question.trim().to_string(),
        };
        request.validate()?;
        tracing::info!(database_id, "Generating SQL");

        let response: GenerateSqlResponse = self
            .api
            .send(
                ApiRequest::post(format!("database/generate-sql/{}", database_id))
                    .json(serde_json::to_value(&request)?),
            )
            .await
            .and_then(decode)?;
        Ok(response.sql.unwrap_or_default())
    }

    /// Executes SQL against the database. Blank SQL yields no rows without
    /// contacting the server.
    pub async fn execute_query(&self, database_id: &str, sql: &str) -> AppResult<QueryResults> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Ok(QueryResults::empty());
        }
        let request = ExecuteQueryRequest {
            query: sql.to_string(),
        };
        tracing::info!(database_id, "Executing query");

        let results: QueryResults = self
            .api
            .send(
                ApiRequest::post(format!("database/query/{}", database_id))
                    .json(serde_json::to_value(&request)?),
            )
            .await
            .and_then(decode)?;
        tracing::debug!(database_id, rows = results.row_count(), "Query executed");
        Ok(results)
    }
}

//! [`SearchEngineClient`] implementation backed by the official Elasticsearch client.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::request::JsonBody;
use elasticsearch::http::Url;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesPutMappingParts,
    IndicesRefreshParts,
};
use elasticsearch::{BulkParts, Elasticsearch, SearchParts};
use serde_json::Value;

use super::{BulkOutcome, BulkRequest, EngineResponse, SearchEngineClient};
use crate::config::{ClusterConfig, ElasticsearchAuth};
use crate::error::{ClientError, ClientResult, ConfigError};
use crate::search::EngineQuery;

/// Transport client for a single Elasticsearch cluster.
pub struct ElasticsearchClient {
    client: Elasticsearch,
    url: String,
}

impl Debug for ElasticsearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchClient {
    /// Builds a client for the configured cluster.
    pub fn new(config: &ClusterConfig) -> Result<Self, ConfigError> {
        let url = config.url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            return Err(ConfigError::MissingCluster);
        }

        let parsed_url = Url::parse(&url).map_err(|e| ConfigError::InvalidUrl {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder =
            TransportBuilder::new(conn_pool).timeout(Duration::from_secs(config.timeout_secs));

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ElasticsearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchAuth::Bearer { token } => {
                    builder.auth(Credentials::Bearer(token.clone()))
                }
            };
        }

        let transport = builder.build().map_err(|e| ConfigError::InvalidUrl {
            url: url.clone(),
            message: format!("failed to build transport: {}", e),
        })?;

        Ok(Self {
            client: Elasticsearch::new(transport),
            url,
        })
    }

    /// Returns the cluster url.
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn connection_error(action: &str, e: elasticsearch::Error) -> ClientError {
    ClientError::connection(format!("{} failed: {}", action, e))
}

async fn into_engine_response(response: Response) -> EngineResponse {
    let status = response.status_code().as_u16();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    EngineResponse::new(status, body)
}

async fn response_error(action: &str, response: Response) -> ClientError {
    let status = response.status_code().as_u16();
    let body = response.text().await.unwrap_or_default();
    ClientError::response(status, format!("{} failed: {}", action, body))
}

#[async_trait]
impl SearchEngineClient for ElasticsearchClient {
    fn has_connection(&self) -> bool {
        // The single-node pool always holds its one connection
        true
    }

    async fn version(&self) -> ClientResult<String> {
        let response = self
            .client
            .info()
            .send()
            .await
            .map_err(|e| connection_error("version probe", e))?;

        if !response.status_code().is_success() {
            return Err(response_error("version probe", response).await);
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::response(200, format!("invalid info response: {}", e)))?;

        body.get("version")
            .and_then(|v| v.get("number"))
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| ClientError::response(200, "info response carries no version"))
    }

    async fn create_index(&self, name: &str, settings: &Value) -> ClientResult<EngineResponse> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(settings.clone())
            .send()
            .await
            .map_err(|e| connection_error("create index", e))?;
        Ok(into_engine_response(response).await)
    }

    async fn delete_index(&self, name: &str) -> ClientResult<EngineResponse> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| connection_error("delete index", e))?;

        let engine_response = into_engine_response(response).await;
        if engine_response.status == 404 {
            tracing::debug!(index = %name, "Index to delete does not exist");
            return Ok(EngineResponse::acknowledged());
        }
        Ok(engine_response)
    }

    async fn index_exists(&self, name: &str) -> ClientResult<bool> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| connection_error("index exists", e))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(response_error("index exists", response).await),
        }
    }

    async fn put_mapping(&self, name: &str, mapping: &Value) -> ClientResult<EngineResponse> {
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[name]))
            .body(mapping.clone())
            .send()
            .await
            .map_err(|e| connection_error("put mapping", e))?;
        Ok(into_engine_response(response).await)
    }

    async fn bulk(&self, request: &BulkRequest) -> ClientResult<BulkOutcome> {
        let body: Vec<JsonBody<Value>> =
            request.to_lines().into_iter().map(JsonBody::new).collect();

        let response = self
            .client
            .bulk(BulkParts::Index(&request.index))
            .body(body)
            .send()
            .await
            .map_err(|e| connection_error("bulk", e))?;

        if !response.status_code().is_success() {
            return Err(response_error("bulk", response).await);
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::response(200, format!("invalid bulk response: {}", e)))?;
        Ok(BulkOutcome::from_response(&body))
    }

    async fn refresh_index(&self, name: &str) -> ClientResult<()> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| connection_error("refresh", e))?;

        if !response.status_code().is_success() {
            return Err(response_error("refresh", response).await);
        }
        Ok(())
    }

    async fn search(&self, index: &str, query: &EngineQuery) -> ClientResult<Value> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(query.body.clone())
            .send()
            .await
            .map_err(|e| connection_error("search", e))?;

        if !response.status_code().is_success() {
            return Err(response_error("search", response).await);
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::response(200, format!("invalid search response: {}", e)))
    }
}

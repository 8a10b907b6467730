//! Elasticsearch-compatible HTTP client backing [`SearchIndex`].

use async_trait::async_trait;
use metrics::counter;
use notelink_index_types as wire;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::application::index::{IndexError, SearchIndex, SimilarityQuery, StoredDocument};
use crate::config::{IndexSettings, RetrySettings};
use crate::domain::links::SimilarityResult;

use super::error::InfraError;

/// Lets the service re-apply a partial update that raced another writer.
const UPDATE_RETRY_ON_CONFLICT: &str = "3";

#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    base: Url,
    index_name: String,
    credentials: Option<(String, Option<String>)>,
    retry: RetrySettings,
}

impl ElasticsearchClient {
    pub fn new(settings: &IndexSettings, retry: &RetrySettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.request_timeout)
            .danger_accept_invalid_certs(!settings.verify_certificates)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build search client: {err}"))
            })?;

        if settings.base_url.cannot_be_a_base() {
            return Err(InfraError::configuration(format!(
                "search base URL `{}` cannot carry a path",
                settings.base_url
            )));
        }

        let credentials = settings
            .username
            .clone()
            .map(|username| (username, settings.password.clone()));

        Ok(Self {
            client,
            base: settings.base_url.clone(),
            index_name: settings.index_name.clone(),
            credentials,
            retry: retry.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("notelink/", env!("CARGO_PKG_VERSION"))
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// `{base}/{index}/{segments...}`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(&self.index_name).extend(segments);
        }
        url
    }

    async fn list<S: DeserializeOwned>(
        &self,
        request: &wire::ListingRequest,
    ) -> Result<Vec<wire::Hit<S>>, IndexError> {
        let cap = request.size;
        let response: wire::SearchResponse<S> = self
            .send(Method::GET, self.url(&["_search"]), request, None)
            .await?;

        let total = response
            .hits
            .total
            .ok_or_else(|| IndexError::malformed("listing response lacks `hits.total`"))?
            .value();
        if total > cap as u64 {
            return Err(IndexError::CorpusTooLarge { total, cap });
        }
        Ok(response.hits.hits)
    }

    /// Send with bounded retries on transient failures, doubling the delay.
    async fn send<B, T>(
        &self,
        method: Method,
        url: Url,
        body: &B,
        document_id: Option<&str>,
    ) -> Result<T, IndexError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let max_attempts = self.retry.max_attempts.get();
        let mut attempt = 1;
        loop {
            match self
                .send_once(method.clone(), url.clone(), body, document_id)
                .await
            {
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    counter!("notelink_index_retries_total").increment(1);
                    warn!(
                        target = "notelink::index",
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying search service request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn send_once<B, T>(
        &self,
        method: Method,
        url: Url,
        body: &B,
        document_id: Option<&str>,
    ) -> Result<T, IndexError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.request(method, url).json(body);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|err| IndexError::unavailable(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| IndexError::unavailable(format!("failed to read body: {err}")))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            return Err(classify_status(status, &text, document_id));
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| IndexError::malformed(format!("failed to parse body: {err}")))
    }
}

fn classify_status(status: StatusCode, body: &str, document_id: Option<&str>) -> IndexError {
    let message = format!("status {status} body {body}");
    match (status, document_id) {
        (StatusCode::NOT_FOUND, Some(id)) => IndexError::NotFound { id: id.to_string() },
        (StatusCode::TOO_MANY_REQUESTS, _) => IndexError::unavailable(message),
        (status, _) if status.is_server_error() => IndexError::unavailable(message),
        _ => IndexError::service(message),
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchClient {
    async fn list_document_ids(&self, cap: usize) -> Result<Vec<String>, IndexError> {
        let hits = self
            .list::<serde_json::Value>(&wire::ListingRequest::ids(cap))
            .await?;
        Ok(hits.into_iter().map(|hit| hit.id).collect())
    }

    async fn list_documents(&self, cap: usize) -> Result<Vec<StoredDocument>, IndexError> {
        let hits = self
            .list::<serde_json::Value>(&wire::ListingRequest::documents(cap))
            .await?;
        Ok(hits
            .into_iter()
            .map(|hit| StoredDocument {
                id: hit.id,
                source: hit
                    .source
                    .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
            })
            .collect())
    }

    async fn find_similar(
        &self,
        query: SimilarityQuery<'_>,
    ) -> Result<Vec<SimilarityResult>, IndexError> {
        let request = wire::SimilarityRequest {
            size: query.max_results,
            query: wire::SimilarityQuery {
                more_like_this: wire::MoreLikeThis {
                    fields: query.fields.iter().map(|field| field.clause()).collect(),
                    like: vec![wire::LikeDocument {
                        index: self.index_name.clone(),
                        id: query.seed_id.to_string(),
                    }],
                    min_term_freq: query.min_term_freq,
                    min_doc_freq: query.min_doc_freq,
                },
            },
        };

        let response: wire::SearchResponse = self
            .send(Method::POST, self.url(&["_search"]), &request, None)
            .await?;

        response
            .hits
            .hits
            .into_iter()
            .map(|hit| match hit.score {
                Some(score) => Ok(SimilarityResult { id: hit.id, score }),
                None => Err(IndexError::malformed(format!(
                    "similar hit `{}` has no score",
                    hit.id
                ))),
            })
            .collect()
    }

    async fn update_related_links(&self, id: &str, links: &str) -> Result<(), IndexError> {
        let mut url = self.url(&["_update", id]);
        url.query_pairs_mut()
            .append_pair("retry_on_conflict", UPDATE_RETRY_ON_CONFLICT);

        let body = wire::UpdateRequest {
            doc: wire::RelatedLinksPatch {
                related_links: links.to_string(),
            },
        };
        let response: wire::UpdateResponse =
            self.send(Method::POST, url, &body, Some(id)).await?;

        debug!(
            target = "notelink::index",
            doc_id = id,
            result = response.result.as_deref().unwrap_or("unknown"),
            version = response.version,
            "Updated document"
        );
        Ok(())
    }
}

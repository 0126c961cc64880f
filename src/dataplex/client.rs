//! Get, List, Create, Update and Delete against the Dataplex REST API

use futures::stream::{self, Stream, TryStreamExt};
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;

use super::resource::DataplexResource;
use crate::dcl::config::ClientConfig;
use crate::dcl::diff::{update_mask, FieldDiff};
use crate::dcl::error::{DclError, Result};
use crate::dcl::operation::Operation;
use crate::dcl::url::add_query_params;
use crate::gcp::auth::GcpCredentials;
use crate::gcp::client::GcpClient;

/// Entry point for every Dataplex call.
#[derive(Clone)]
pub struct Client {
    gcp: GcpClient,
    config: ClientConfig,
}

/// One page of a listing plus what is needed to fetch the next one.
#[derive(Debug, Clone)]
pub struct ResourceList<R> {
    pub items: Vec<R>,
    pub next_page_token: Option<String>,
    parent: R,
    page_size: Option<i32>,
}

impl<R: DataplexResource> ResourceList<R> {
    pub fn has_next(&self) -> bool {
        self.next_page_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Replaces `items` with the next page.
    pub async fn next(&mut self, client: &Client) -> Result<()> {
        let Some(token) = self.next_page_token.take().filter(|t| !t.is_empty()) else {
            return Err(DclError::InvalidResponse("no next page".to_string()));
        };
        let page = client
            .list_page(&self.parent, Some(&token), self.page_size)
            .await?;
        self.items = page.items;
        self.next_page_token = page.next_page_token;
        Ok(())
    }
}

impl Client {
    /// Client authenticated with Application Default Credentials.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let gcp = GcpClient::new(&config).await?;
        Ok(Self { gcp, config })
    }

    pub fn with_credentials(credentials: GcpCredentials, config: ClientConfig) -> Result<Self> {
        let gcp = GcpClient::with_credentials(credentials, &config)?;
        Ok(Self { gcp, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn user_base_path(&self) -> Option<&str> {
        self.config.base_path.as_deref()
    }

    /// Runs `fut` under the configured overall deadline.
    pub(crate) async fn with_deadline<T>(
        &self,
        operation: String,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let after: Duration = self.config.timeout;
        match tokio::time::timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => Err(DclError::Timeout { operation, after }),
        }
    }

    async fn wait(&self, body: Value) -> Result<Operation> {
        Operation::from_value(body)?
            .wait(&self.gcp, &self.config.effective_base_path(), &self.config)
            .await
    }

    /// Fetches the current state of `r`. A missing resource is
    /// [`DclError::NotFound`].
    pub async fn get<R: DataplexResource>(&self, r: &R) -> Result<R> {
        let url = r.self_url(self.user_base_path())?;
        let body = self.gcp.get(&url).await?;
        let obj = body.as_object().ok_or_else(|| {
            DclError::InvalidResponse(format!("{} GET returned a non-object body", R::KIND))
        })?;

        let mut result = R::flatten(obj);
        result.adopt_identity(r);
        tracing::debug!("Retrieved raw result state: {:?}", result);
        Ok(R::canonicalize_new(result, r))
    }

    /// Fetches one page of resources under `parent`'s identity.
    pub async fn list_page<R: DataplexResource>(
        &self,
        parent: &R,
        page_token: Option<&str>,
        page_size: Option<i32>,
    ) -> Result<ResourceList<R>> {
        let mut params = Vec::new();
        if let Some(token) = page_token.filter(|t| !t.is_empty()) {
            params.push(("pageToken", token.to_string()));
        }
        if let Some(size) = page_size {
            params.push(("pageSize", size.to_string()));
        }
        let url = add_query_params(&parent.list_url(self.user_base_path())?, &params)?;
        let body = self.gcp.get(&url).await?;

        let items = match body.get(R::LIST_FIELD) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    let obj = item.as_object().ok_or_else(|| {
                        DclError::InvalidResponse(format!("{} list item is not an object", R::KIND))
                    })?;
                    let mut res = R::flatten(obj);
                    res.inherit_parent(parent);
                    Ok(res)
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(DclError::InvalidResponse(format!(
                    "{} list field {} is {}",
                    R::KIND,
                    R::LIST_FIELD,
                    other
                )))
            }
        };
        let next_page_token = body
            .get("nextPageToken")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(ResourceList {
            items,
            next_page_token,
            parent: parent.clone(),
            page_size,
        })
    }

    /// Streams every resource under `parent`, fetching pages lazily.
    pub fn list_stream<'a, R: DataplexResource>(
        &'a self,
        parent: &'a R,
        page_size: Option<i32>,
    ) -> impl Stream<Item = Result<R>> + 'a {
        stream::try_unfold(Some(None::<String>), move |state| async move {
            let Some(token) = state else {
                return Ok::<_, DclError>(None);
            };
            let page = self.list_page(parent, token.as_deref(), page_size).await?;
            let next = page.next_page_token.map(Some);
            Ok(Some((stream::iter(page.items.into_iter().map(Ok)), next)))
        })
        .try_flatten()
    }

    /// Every resource under `parent`, following pages to exhaustion.
    pub async fn list_all<R: DataplexResource>(&self, parent: &R) -> Result<Vec<R>> {
        self.list_stream(parent, None).try_collect().await
    }

    /// POSTs the expanded resource, waits for the operation, then confirms
    /// with a GET. Returns the operation's response object, if any.
    pub(crate) async fn create<R: DataplexResource>(
        &self,
        r: &R,
    ) -> Result<Option<Map<String, Value>>> {
        tracing::info!("Attempting to create {} {:?}", R::KIND, r);
        let url = r.create_url(self.user_base_path())?;
        let body = Value::Object(r.expand()?);
        let reply = self.gcp.post(&url, &body).await?;
        let op = self.wait(reply).await.map_err(|e| {
            tracing::warn!("Creation failed after waiting for operation: {}", e);
            e
        })?;
        tracing::info!("Successfully waited for operation");
        let first = op.first_response().cloned();

        if let Err(e) = self.get(r).await {
            tracing::warn!("get returned error: {}", e);
            return Err(e);
        }
        Ok(first)
    }

    /// PATCHes the update request with an `updateMask` built from `diffs`.
    pub(crate) async fn update<R: DataplexResource>(
        &self,
        r: &R,
        operation: &str,
        diffs: &[FieldDiff],
    ) -> Result<()> {
        if operation != R::UPDATE_OPERATION {
            return Err(DclError::UnknownOperation(operation.to_string()));
        }
        self.get(r).await?;

        let url = add_query_params(
            &r.self_url(self.user_base_path())?,
            &[("updateMask", update_mask(diffs))],
        )?;
        let body = Value::Object(r.update_request()?);
        tracing::info!("Created update: {}", body);

        let reply = self.gcp.patch(&url, &body).await?;
        self.wait(reply).await?;
        Ok(())
    }

    /// Deletes `r`. Succeeds when the resource is already gone.
    pub async fn delete<R: DataplexResource>(&self, r: &R) -> Result<()> {
        self.with_deadline(format!("delete {}", R::KIND), self.delete_inner(r))
            .await
    }

    async fn delete_inner<R: DataplexResource>(&self, r: &R) -> Result<()> {
        let current = match self.get(r).await {
            Ok(current) => current,
            Err(e) if e.is_not_found() => {
                tracing::info!("{} not found, returning. Original error: {}", R::KIND, e);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Get{} checking for existence. error: {}", R::KIND, e);
                return Err(e);
            }
        };

        let url = current.self_url(self.user_base_path())?;
        let reply = self.gcp.delete(&url).await?;
        self.wait(reply).await?;
        self.confirm_deleted(&current).await;
        Ok(())
    }

    /// GETs until 404. Reads can briefly still return a deleted resource;
    /// if it never disappears the delete is still treated as done.
    async fn confirm_deleted<R: DataplexResource>(&self, r: &R) {
        let attempts = self.config.retry.delete_confirm_attempts;
        for n in 0..=attempts {
            match self.get(r).await {
                Err(e) if e.is_not_found() => return,
                _ if n == attempts => break,
                _ => tokio::time::sleep(self.config.retry.backoff(n)).await,
            }
        }
        tracing::warn!(
            "{} still visible after {} confirmation reads",
            R::KIND,
            attempts + 1
        );
    }

    /// Deletes every resource under `parent` matching `filter`. Keeps going
    /// past failures and reports them together.
    pub async fn delete_all<R, F>(&self, parent: &R, filter: F) -> Result<()>
    where
        R: DataplexResource,
        F: Fn(&R) -> bool,
    {
        let resources = self.list_all(parent).await?;
        let mut errors = Vec::new();
        for res in resources.iter().filter(|r| filter(r)) {
            if let Err(e) = self.delete(res).await {
                errors.push(e.to_string());
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DclError::DeleteAll(errors.join("\n")))
        }
    }
}

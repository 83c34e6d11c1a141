//! Reqwest-backed CRUD adapter, one instance per entity collection.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::dto::WireEntity;
use super::transport::{HttpTransport, decode, map_status_error};
use crate::domain::ports::{AccessTokenSource, EntityApi};
use crate::domain::{EntityId, Error, ListFilter};

/// `GET/POST /{collection}` and `GET/PUT/DELETE /{collection}/{id}` for `E`.
pub struct HttpEntityApi<E> {
    transport: Arc<HttpTransport>,
    tokens: Arc<dyn AccessTokenSource>,
    entity: PhantomData<fn() -> E>,
}

impl<E: WireEntity> HttpEntityApi<E> {
    /// Adapter sending the token from `tokens` with every request.
    pub fn new(transport: Arc<HttpTransport>, tokens: Arc<dyn AccessTokenSource>) -> Self {
        Self {
            transport,
            tokens,
            entity: PhantomData,
        }
    }

    fn collection() -> &'static str {
        E::KIND.collection()
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), Error> {
        self.transport
            .execute(request, self.tokens.access_token())
            .await
    }

    fn decode_one(body: &[u8]) -> Result<E, Error> {
        let dto: E::Dto = decode(body, Self::collection())?;
        E::from_dto(dto).map_err(|message| {
            Error::internal(format!("invalid {} payload: {message}", Self::collection()))
        })
    }

    fn decode_many(body: &[u8]) -> Result<Vec<E>, Error> {
        let dtos: Vec<E::Dto> = decode(body, Self::collection())?;
        dtos.into_iter()
            .map(|dto| {
                E::from_dto(dto).map_err(|message| {
                    Error::internal(format!("invalid {} payload: {message}", Self::collection()))
                })
            })
            .collect()
    }
}

fn ensure_success(status: StatusCode, body: &[u8]) -> Result<(), Error> {
    if status.is_success() {
        Ok(())
    } else {
        Err(map_status_error(status, body))
    }
}

#[async_trait]
impl<E: WireEntity> EntityApi<E> for HttpEntityApi<E> {
    async fn list(&self, filter: Option<&ListFilter>) -> Result<Vec<E>, Error> {
        let mut url = self.transport.endpoint(&[Self::collection()])?;
        if let Some(filter) = filter {
            let (name, value) = filter.query_pair();
            url.query_pairs_mut().append_pair(name, value);
        }
        debug!(collection = Self::collection(), %url, "listing");
        let (status, body) = self.send(self.transport.get(url)).await?;
        ensure_success(status, &body)?;
        Self::decode_many(&body)
    }

    async fn get(&self, id: &EntityId) -> Result<Option<E>, Error> {
        let url = self.transport.endpoint(&[Self::collection(), id.as_str()])?;
        let (status, body) = self.send(self.transport.get(url)).await?;
        if status == StatusCode::NOT_FOUND {
            debug!(collection = Self::collection(), %id, "not found");
            return Ok(None);
        }
        ensure_success(status, &body)?;
        Self::decode_one(&body).map(Some)
    }

    async fn create(&self, draft: &E::Draft) -> Result<E, Error> {
        let url = self.transport.endpoint(&[Self::collection()])?;
        let (status, body) = self.send(self.transport.post(url).json(draft)).await?;
        ensure_success(status, &body)?;
        Self::decode_one(&body)
    }

    async fn update(&self, id: &EntityId, draft: &E::Draft) -> Result<E, Error> {
        let url = self.transport.endpoint(&[Self::collection(), id.as_str()])?;
        let (status, body) = self.send(self.transport.put(url).json(draft)).await?;
        ensure_success(status, &body)?;
        Self::decode_one(&body)
    }

    async fn delete(&self, id: &EntityId) -> Result<(), Error> {
        let url = self.transport.endpoint(&[Self::collection(), id.as_str()])?;
        let (status, body) = self.send(self.transport.delete(url)).await?;
        ensure_success(status, &body)
    }
}

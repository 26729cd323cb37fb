//! Common API utilities and shared types
//!
//! - `ApiJson` / `ApiQuery`: extractors whose rejections use the error envelope
//! - `DataResponse`: the `{ data, meta? }` success envelope
//! - `ClientIp`: best-effort client address for rate limiting
//! - list query parameters shared by the listing endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        ConnectInfo, FromRequest, FromRequestParts, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use uuid::Uuid;

use crate::api::middleware::ApiError;
use crate::models::{ListQuery, PageMeta, PagedResult, PostFilter, PostStatus, SortOrder};

// ============================================================================
// Extractors
// ============================================================================

/// JSON body extractor; malformed bodies, missing fields and wrong types
/// are reported as `VALIDATION_ERROR`
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::validation_error(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// Query string extractor with envelope rejections
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                ApiError::validation_error(rejection.body_text())
            })?;
        Ok(ApiQuery(value))
    }
}

/// Client address from proxy headers, falling back to the socket peer
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded: Option<IpAddr> = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse().ok());
        let real_ip = || {
            parts
                .headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|ip| ip.trim().parse().ok())
        };
        let peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        };

        Ok(ClientIp(forwarded.or_else(real_ip).or_else(peer)))
    }
}

/// Path ids that are not UUIDs cannot name anything
pub fn parse_id(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", entity)))
}

// ============================================================================
// Responses
// ============================================================================

/// Success envelope
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

pub fn data<T: Serialize>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse { data, meta: None })
}

/// List envelope; `meta` is only present when the request paginated
pub fn paged<T: Serialize>(result: PagedResult<T>) -> Json<DataResponse<Vec<T>>> {
    let meta = result.meta.page.is_some().then_some(result.meta);
    Json(DataResponse {
        data: result.items,
        meta,
    })
}

// ============================================================================
// List Query Types
// ============================================================================

/// `?page=&limit=&sort=&order=`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListParams {
    pub fn into_query(self) -> Result<ListQuery, ApiError> {
        let order = self
            .order
            .map(|o| o.parse::<SortOrder>())
            .transpose()
            .map_err(|_| ApiError::validation_error("order must be 'asc' or 'desc'"))?;
        Ok(ListQuery {
            page: self.page,
            limit: self.limit,
            sort: self.sort.filter(|s| !s.is_empty()),
            order,
        })
    }
}

/// Blog listings additionally filter by `status` and `tag`
#[derive(Debug, Default, Deserialize)]
pub struct PostListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub status: Option<String>,
    pub tag: Option<String>,
}

impl PostListParams {
    pub fn into_parts(self) -> Result<(ListQuery, PostFilter), ApiError> {
        let status = self
            .status
            .map(|s| s.parse::<PostStatus>())
            .transpose()
            .map_err(|_| ApiError::validation_error("status must be 'draft' or 'published'"))?;
        let filter = PostFilter {
            status,
            tag: self.tag.filter(|t| !t.trim().is_empty()),
        };
        let query = ListParams {
            page: self.page,
            limit: self.limit,
            sort: self.sort,
            order: self.order,
        }
        .into_query()?;
        Ok((query, filter))
    }
}

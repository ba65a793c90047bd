//! A minimal API client for querying Kubernetes discovery endpoints
//!
//! The [`Client`] wraps whatever tower service the caller has assembled for
//! talking to an apiserver (connection, TLS and auth layering are not this
//! crate's concern) and exposes the typed discovery requests that the
//! [`ResourceLister`](crate::ResourceLister) needs.
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use tower::{buffer::Buffer, util::BoxService, BoxError, Service, ServiceExt};

use crate::{
    error::ErrorResponse,
    meta::{ApiGroupList, ApiResourceList, ApiVersions},
    Error, Result,
};

/// Client for connecting with a Kubernetes cluster.
///
/// A `Client` is the opaque handle for one target cluster: it is cheap to
/// clone, is never mutated by requests, and can be shared across concurrent
/// discovery runs.
#[derive(Clone)]
pub struct Client {
    // - `Buffer` for cheap clone
    // - `BoxService` for dynamic response future type
    inner: Buffer<BoxService<Request<Vec<u8>>, Response<Bytes>, BoxError>, Request<Vec<u8>>>,
}

impl Client {
    /// Create a [`Client`] from a custom `Service` stack.
    ///
    /// The service receives GET requests whose uri is a discovery path such
    /// as `/api`, `/apis` or `/apis/apps/v1`, and must resolve them against
    /// the target cluster. Mapping the path onto a cluster url and attaching
    /// credentials belongs in the supplied stack.
    pub fn new<S>(service: S) -> Self
    where
        S: Service<Request<Vec<u8>>, Response = Response<Bytes>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
    {
        // Type erased error to avoid type parameters leaking into the struct.
        let service = service.map_err(|e| e.into());
        Self {
            inner: Buffer::new(BoxService::new(service), 1024),
        }
    }

    /// Perform a raw request against the API and return the raw response back.
    pub async fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Bytes>> {
        let mut svc = self.inner.clone();
        let res = svc
            .ready()
            .await
            .map_err(Error::Service)?
            .call(request)
            .await
            .map_err(|err| {
                // Error decorating request
                err.downcast::<Error>()
                    .map(|e| *e)
                    // Error from the transport or another middleware
                    .unwrap_or_else(Error::Service)
            })?;
        Ok(res)
    }

    /// Perform a raw request against the API and deserialize the response
    /// as JSON to some known type.
    pub async fn request<T>(&self, request: Request<Vec<u8>>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let text = self.request_text(request).await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!("{}, {:?}", text, e);
            Error::SerdeError(e)
        })
    }

    /// Perform a raw request against the API and get back the response
    /// as a string
    pub async fn request_text(&self, request: Request<Vec<u8>>) -> Result<String> {
        let res = self.send(request).await?;
        let status = res.status();
        let text = String::from_utf8(res.into_body().to_vec()).map_err(Error::FromUtf8)?;
        handle_api_errors(&text, status)?;

        Ok(text)
    }
}

/// Typed discovery requests
impl Client {
    /// Lists versions of `core` a.k.a. `""` legacy API group.
    pub async fn list_core_api_versions(&self) -> Result<ApiVersions> {
        self.request(get(PATH_CORE)?).await
    }

    /// Lists api groups that the apiserver serves.
    pub async fn list_api_groups(&self) -> Result<ApiGroupList> {
        self.request(get(PATH_GROUPS)?).await
    }

    /// Lists resources served at a group version path such as `/apis/apps/v1`
    /// or `/api/v1`.
    pub async fn list_api_group_resources(&self, path: &str) -> Result<ApiResourceList> {
        self.request(get(path)?).await
    }
}

/// Discovery path for the core group's versions
pub const PATH_CORE: &str = "/api";
/// Discovery path for the named api groups
pub const PATH_GROUPS: &str = "/apis";

fn get(path: &str) -> Result<Request<Vec<u8>>> {
    Request::builder().uri(path).body(vec![]).map_err(Error::HttpError)
}

/// Kubernetes returned error handling
///
/// Either kube returned an explicit ApiError struct,
/// or it somehow returned something we couldn't parse as one.
///
/// In either case, present an ApiError upstream.
/// The latter is probably a bug if encountered.
fn handle_api_errors(text: &str, s: StatusCode) -> Result<()> {
    if s.is_client_error() || s.is_server_error() {
        if let Ok(errdata) = serde_json::from_str::<ErrorResponse>(text) {
            tracing::debug!("Unsuccessful: {:?}", errdata);
            Err(Error::Api(errdata))
        } else {
            tracing::warn!("Unsuccessful data error parse: {}", text);
            let ae = ErrorResponse {
                status: s.to_string(),
                code: s.as_u16(),
                message: format!("{:?}", text),
                reason: "Failed to parse error data".into(),
            };
            tracing::debug!("Unsuccessful: {:?} (reconstruct)", ae);
            Err(Error::Api(ae))
        }
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::pin_mut;
    use tower_test::mock;

    #[tokio::test]
    async fn core_versions_request_hits_the_api_path() {
        let (mock_service, handle) = mock::pair::<Request<Vec<u8>>, Response<Bytes>>();
        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            let (request, send) = handle.next_request().await.expect("service not called");
            assert_eq!(request.method(), http::Method::GET);
            assert_eq!(request.uri().to_string(), "/api");
            let body = serde_json::json!({"kind": "APIVersions", "versions": ["v1"]});
            send.send_response(
                Response::builder()
                    .body(Bytes::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            );
        });

        let client = Client::new(mock_service);
        let versions = client.list_core_api_versions().await.unwrap();
        assert_eq!(versions.versions, vec!["v1".to_string()]);
        spawned.await.unwrap();
    }

    #[tokio::test]
    async fn failure_status_surfaces_as_api_error() {
        let (mock_service, handle) = mock::pair::<Request<Vec<u8>>, Response<Bytes>>();
        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            let (_, send) = handle.next_request().await.expect("service not called");
            let status = serde_json::json!({
                "kind": "Status",
                "status": "Failure",
                "message": "apis is forbidden",
                "reason": "Forbidden",
                "code": 403,
            });
            send.send_response(
                Response::builder()
                    .status(StatusCode::FORBIDDEN)
                    .body(Bytes::from(serde_json::to_vec(&status).unwrap()))
                    .unwrap(),
            );
        });

        let client = Client::new(mock_service);
        let err = client.list_api_groups().await.unwrap_err();
        match err {
            Error::Api(e) => {
                assert_eq!(e.code, 403);
                assert_eq!(e.reason, "Forbidden");
            }
            e => panic!("unexpected error: {e}"),
        }
        spawned.await.unwrap();
    }

    #[tokio::test]
    async fn unparseable_failure_body_is_reconstructed() {
        let (mock_service, handle) = mock::pair::<Request<Vec<u8>>, Response<Bytes>>();
        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            let (_, send) = handle.next_request().await.expect("service not called");
            send.send_response(
                Response::builder()
                    .status(StatusCode::SERVICE_UNAVAILABLE)
                    .body(Bytes::from_static(b"upstream connect error"))
                    .unwrap(),
            );
        });

        let client = Client::new(mock_service);
        let err = client.list_api_groups().await.unwrap_err();
        match err {
            Error::Api(e) => {
                assert_eq!(e.code, 503);
                assert_eq!(e.reason, "Failed to parse error data");
            }
            e => panic!("unexpected error: {e}"),
        }
        spawned.await.unwrap();
    }
}

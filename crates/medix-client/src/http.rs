//! HTTP client for the invoicing service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use medix_core::{Product, TransactionDraft, TransactionSnapshot};

use crate::error::{ClientError, ClientResult};
use crate::service::InvoicingService;
use crate::wire::{ProductDto, TransactionDto, TransactionWriteDto, WriteResponse};

/// reqwest-backed [`InvoicingService`].
#[derive(Debug, Clone)]
pub struct HttpInvoicingService {
    client: Client,
    base_url: String,
}

impl HttpInvoicingService {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET and decode, treating an undecodable body as `None`.
    async fn get_lenient<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Option<T>> {
        let response = self.client.get(self.url(path)).send().await?;
        let text = Self::check_status(response).await?.text().await?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(path, error = %e, "Malformed response from invoicing service, treating as empty");
                Ok(None)
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        let response = self.client.put(self.url(path)).json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(text),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(text)
            }
            _ => ClientError::Service {
                status: status.as_u16(),
                message: text,
            },
        })
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let text = Self::check_status(response).await?.text().await?;
        serde_json::from_str(&text).map_err(Into::into)
    }
}

#[async_trait]
impl InvoicingService for HttpInvoicingService {
    async fn fetch_inventory(&self) -> ClientResult<Vec<Product>> {
        let dtos: Vec<ProductDto> = self.get_lenient("api/inventory").await?.unwrap_or_default();

        let products: Vec<Product> = dtos
            .into_iter()
            .filter_map(|dto| match Product::try_from(dto) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(error = %e, "Skipping product");
                    None
                }
            })
            .collect();

        debug!(count = products.len(), "Fetched inventory");
        Ok(products)
    }

    async fn fetch_held(&self) -> ClientResult<Vec<TransactionSnapshot>> {
        let dtos: Vec<TransactionDto> = self
            .get_lenient("api/transactions?status=hold")
            .await?
            .unwrap_or_default();

        debug!(count = dtos.len(), "Fetched held transactions");
        Ok(dtos.into_iter().map(TransactionSnapshot::from).collect())
    }

    async fn fetch_transaction(&self, id: &str) -> ClientResult<TransactionSnapshot> {
        let dto: TransactionDto = self.get(&format!("api/transactions/{}", id)).await?;
        Ok(dto.into())
    }

    async fn create_transaction(&self, draft: &TransactionDraft) -> ClientResult<String> {
        let body = TransactionWriteDto::from(draft);
        let response: WriteResponse = self.post("api/transactions", &body).await?;
        debug!(id = %response.id, status = ?draft.status, "Created transaction");
        Ok(response.id)
    }

    async fn update_transaction(&self, id: &str, draft: &TransactionDraft) -> ClientResult<String> {
        let body = TransactionWriteDto::from(draft);
        let response: WriteResponse = self.put(&format!("api/transactions/{}", id), &body).await?;
        debug!(id = %response.id, status = ?draft.status, "Updated transaction");
        Ok(response.id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::{Json, Router};
    use medix_core::{Money, TransactionStatus};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> HttpInvoicingService {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        HttpInvoicingService::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap()
    }

    fn held_json() -> Value {
        json!([{
            "id": "h1",
            "status": "hold",
            "createdAt": "2026-10-01T10:00:00Z",
            "adjustment": -200,
            "items": [{
                "productId": "p1", "batchId": "b1",
                "quantity": 5, "unitPrice": 2000, "totalPrice": 9000
            }]
        }])
    }

    #[tokio::test]
    async fn test_fetch_inventory() {
        let router = Router::new().route(
            "/api/inventory",
            get(|| async {
                Json(json!([
                    {
                        "id": "p1", "name": "Paracetamol 500mg", "baseUnit": "tablet",
                        "packUnit": "strip", "conversionFactor": 10, "isControlled": false,
                        "batches": [{"id": "b1", "batchNumber": "L-1", "quantity": 100,
                                     "sellingPrice": 200, "expiryDate": "2027-03-31"}]
                    },
                    { "id": "bad", "name": "Broken", "baseUnit": "x", "conversionFactor": 0 }
                ]))
            }),
        );
        let service = serve(router).await;

        let products = service.fetch_inventory().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].pack_factor.get(), 10);
        assert_eq!(products[0].batches[0].quantity_available, 100);
    }

    #[tokio::test]
    async fn test_malformed_read_is_empty() {
        let router = Router::new()
            .route("/api/inventory", get(|| async { "not json" }))
            .route("/api/transactions", get(|| async { Json(json!({"unexpected": true})) }));
        let service = serve(router).await;

        assert!(service.fetch_inventory().await.unwrap().is_empty());
        assert!(service.fetch_held().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let router = Router::new().route(
            "/api/transactions",
            get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let service = serve(router).await;

        let err = service.fetch_held().await.unwrap_err();
        assert!(matches!(err, ClientError::Service { status: 500, .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_fetch_held_and_single() {
        let router = Router::new()
            .route("/api/transactions", get(|| async { Json(held_json()) }))
            .route(
                "/api/transactions/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "h1" {
                        Ok(Json(held_json()[0].clone()))
                    } else {
                        Err((AxumStatus::NOT_FOUND, "no such transaction"))
                    }
                }),
            );
        let service = serve(router).await;

        let held = service.fetch_held().await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].status, TransactionStatus::Hold);
        assert_eq!(held[0].adjustment, Money::from_cents(-200));
        assert_eq!(held[0].items[0].total_price, Money::from_cents(9_000));

        assert_eq!(service.fetch_transaction("h1").await.unwrap().id, "h1");
        assert!(matches!(
            service.fetch_transaction("zz").await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_and_update_send_write_dto() {
        let router = Router::new()
            .route(
                "/api/transactions",
                axum::routing::post(|Json(body): Json<TransactionWriteDto>| async move {
                    assert_eq!(body.status, TransactionStatus::Hold);
                    Json(json!({ "id": "new-1" }))
                }),
            )
            .route(
                "/api/transactions/{id}",
                axum::routing::put(
                    |Path(id): Path<String>, Json(body): Json<TransactionWriteDto>| async move {
                        if body.items.is_empty() {
                            return Err((AxumStatus::BAD_REQUEST, "no items"));
                        }
                        Ok(Json(json!({ "id": id })))
                    },
                ),
            );
        let service = serve(router).await;

        let draft = TransactionDraft {
            items: vec![medix_core::DraftItem {
                product_id: "p1".to_string(),
                batch_id: "b1".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(500),
                discount_percent: None,
                discount_amount: None,
                total_price: Money::from_cents(1_000),
            }],
            payment_method: None,
            adjustment: Money::zero(),
            net_total: Money::from_cents(1_000),
            tendered: Money::zero(),
            change: Money::zero(),
            status: TransactionStatus::Hold,
            return_of: None,
        };

        assert_eq!(service.create_transaction(&draft).await.unwrap(), "new-1");
        assert_eq!(service.update_transaction("h9", &draft).await.unwrap(), "h9");

        let empty = TransactionDraft {
            items: Vec::new(),
            ..draft
        };
        assert!(matches!(
            service.update_transaction("h9", &empty).await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let service =
            HttpInvoicingService::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let err = service.fetch_inventory().await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }
}

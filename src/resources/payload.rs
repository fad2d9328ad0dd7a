//! JSON body extractor reporting failures as [`TallyError`]
//!
//! Identifier fields are checked before the body is decoded, so a malformed
//! reference is answered with `INVALID_REFERENCE` instead of a generic
//! deserialization failure.

use super::state::parse_id;
use crate::core::error::{TallyError, TallyResult};
use crate::entities::{Customer, Invoice, Item, PaymentCapture};
use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A request body accepted by [`Payload`]
pub trait RequestBody: DeserializeOwned {
    /// JSON pointers of the identifier fields in the body
    const REFERENCES: &'static [&'static str] = &[];
}

impl RequestBody for Item {
    const REFERENCES: &'static [&'static str] = &["/id"];
}

impl RequestBody for Customer {
    const REFERENCES: &'static [&'static str] = &["/id"];
}

impl RequestBody for Invoice {
    const REFERENCES: &'static [&'static str] = &["/id", "/customer/id"];
}

// `custId` stays a string and is parsed by the balance engine
impl RequestBody for PaymentCapture {
    const REFERENCES: &'static [&'static str] = &["/id"];
}

/// Decoded JSON body
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_invoice(
///     State(state): State<AppState>,
///     Payload(invoice): Payload<Invoice>,
/// ) -> TallyResult<Json<Invoice>> {
///     // invoice.customer.id is a well-formed UUID or absent
/// }
/// ```
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: RequestBody,
{
    type Rejection = TallyError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body): Json<Value> = Json::from_request(req, state)
            .await
            .map_err(|e| TallyError::Validation(e.body_text()))?;

        for pointer in T::REFERENCES {
            if let Some(raw) = body.pointer(pointer) {
                check_reference(raw)?;
            }
        }

        serde_json::from_value(body)
            .map(Payload)
            .map_err(|e| TallyError::Validation(e.to_string()))
    }
}

/// Accept null or a UUID string
fn check_reference(raw: &Value) -> TallyResult<()> {
    match raw {
        Value::Null => Ok(()),
        Value::String(s) => parse_id(s).map(|_| ()),
        other => Err(TallyError::invalid_reference(
            other.to_string(),
            "expected a UUID string",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;
    use serde_json::json;
    use uuid::Uuid;

    async fn extract<T: RequestBody>(body: &str) -> TallyResult<T> {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        Payload::<T>::from_request(request, &()).await.map(|p| p.0)
    }

    #[test]
    fn test_check_reference() {
        assert!(check_reference(&Value::Null).is_ok());
        assert!(check_reference(&json!(Uuid::new_v4().to_string())).is_ok());
        assert!(matches!(
            check_reference(&json!("not-a-uuid")),
            Err(TallyError::InvalidReference { .. })
        ));
        assert!(matches!(
            check_reference(&json!(42)),
            Err(TallyError::InvalidReference { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_invoice_customer_is_invalid_reference() {
        let body = json!({"customer": {"id": "not-a-uuid"}, "total": 5}).to_string();
        match extract::<Invoice>(&body).await {
            Err(TallyError::InvalidReference { value, .. }) => assert_eq!(value, "not-a-uuid"),
            other => panic!("expected InvalidReference, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_valid_invoice_decodes() {
        let customer_id = Uuid::new_v4();
        let body = json!({"customer": {"id": customer_id, "name": "Acme"}, "total": 5}).to_string();
        let invoice = extract::<Invoice>(&body).await.unwrap();
        assert_eq!(invoice.customer_ref().unwrap(), customer_id);
    }

    #[tokio::test]
    async fn test_wrong_shape_is_validation_error() {
        let body = json!({"name": "Widget", "price": "cheap"}).to_string();
        assert!(matches!(
            extract::<Item>(&body).await,
            Err(TallyError::Validation(_))
        ));

        assert!(matches!(
            extract::<Customer>("{not json").await,
            Err(TallyError::Validation(_))
        ));
    }
}

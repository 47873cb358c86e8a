//! Translation of domain failures into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::ErrorResponse;

use crate::backend::domain::{
    AppointmentError, CatalogError, ClientError, DocumentError, MessagingError, PricingError,
    ProfileError,
};

/// Error body plus the status it is served with
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                details: Vec::new(),
            },
        }
    }

    fn validation(details: &[String]) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: "Validation failed".to_string(),
                details: details.to_vec(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        let message = e.to_string();

        if let Some(err) = e.downcast_ref::<AppointmentError>() {
            return match err {
                AppointmentError::Validation(details) => Self::validation(details),
                AppointmentError::Duplicate => Self::new(StatusCode::CONFLICT, message),
                AppointmentError::NotFound(_) | AppointmentError::ClientNotFound(_) => {
                    Self::new(StatusCode::NOT_FOUND, message)
                }
            };
        }
        if e.downcast_ref::<PricingError>().is_some() {
            return Self::new(StatusCode::BAD_REQUEST, message);
        }
        if let Some(err) = e.downcast_ref::<ClientError>() {
            return match err {
                ClientError::Validation(details) => Self::validation(details),
                ClientError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, message),
            };
        }
        if let Some(err) = e.downcast_ref::<ProfileError>() {
            return match err {
                ProfileError::Validation(details) => Self::validation(details),
                ProfileError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, message),
            };
        }
        if let Some(err) = e.downcast_ref::<CatalogError>() {
            return match err {
                CatalogError::Validation(details) => Self::validation(details),
                CatalogError::DuplicateCategory(_) => Self::new(StatusCode::CONFLICT, message),
                CatalogError::CategoryNotFound(_)
                | CatalogError::ServiceNotFound(_)
                | CatalogError::AreaNotFound(_)
                | CatalogError::RegionalPriceNotFound { .. } => Self::new(StatusCode::NOT_FOUND, message),
            };
        }
        if let Some(err) = e.downcast_ref::<DocumentError>() {
            let status = match err {
                DocumentError::InvalidName(_) | DocumentError::Empty => StatusCode::BAD_REQUEST,
                DocumentError::NotPdf => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                DocumentError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                DocumentError::NotFound(_) => StatusCode::NOT_FOUND,
            };
            return Self::new(status, message);
        }
        if let Some(err) = e.downcast_ref::<MessagingError>() {
            let status = match err {
                MessagingError::InvalidPhone(_) | MessagingError::EmptyMessage => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            return Self::new(status, message);
        }

        // Store errors are surfaced verbatim
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(anyhow::Error, StatusCode)> = vec![
            (AppointmentError::Duplicate.into(), StatusCode::CONFLICT),
            (AppointmentError::NotFound("a1".into()).into(), StatusCode::NOT_FOUND),
            (PricingError::MissingManualPrice.into(), StatusCode::BAD_REQUEST),
            (CatalogError::DuplicateCategory("Cabelo".into()).into(), StatusCode::CONFLICT),
            (DocumentError::NotPdf.into(), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (DocumentError::TooLarge { size: 20, max: 10 }.into(), StatusCode::PAYLOAD_TOO_LARGE),
            (MessagingError::InvalidPhone("1".into()).into(), StatusCode::BAD_REQUEST),
            (anyhow::anyhow!("database is locked"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status, expected);
        }
    }

    #[test]
    fn test_validation_details_are_listed() {
        let error = ApiError::from(anyhow::Error::from(ClientError::Validation(vec![
            "Client name is required".to_string(),
            "Client phone is required".to_string(),
        ])));
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.body.error, "Validation failed");
        assert_eq!(error.body.details.len(), 2);
    }
}

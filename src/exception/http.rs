use crate::error::RouteError;
use crate::exception::{ArgumentsHost, ExceptionFilter, HttpException};
use crate::handler::HandlerError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// A default exception filter that handles common errors
#[derive(Debug, Default)]
pub struct HttpExceptionFilter;

impl ExceptionFilter for HttpExceptionFilter {
    fn catch(&self, error: HandlerError, host: &ArgumentsHost) -> Response {
        tracing::error!("{} {} failed: {}", host.method, host.uri, error);

        let (status, message) = if let Some(http) = error.downcast_ref::<HttpException>() {
            (http.status, http.message.clone())
        } else if let Some(route_error) = error.downcast_ref::<RouteError>() {
            (StatusCode::INTERNAL_SERVER_ERROR, route_error.to_string())
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
        };

        (
            status,
            Json(json!({
                "statusCode": status.as_u16(),
                "message": message,
                "path": host.uri.path(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};

    fn host() -> ArgumentsHost {
        ArgumentsHost::new(Method::GET, Uri::from_static("/test/error"))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_http_exception_keeps_its_status() {
        let error: HandlerError = Box::new(HttpException::not_found("no such user"));
        let response = HttpExceptionFilter.catch(error, &host());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["message"], "no such user");
        assert_eq!(body["path"], "/test/error");
    }

    #[tokio::test]
    async fn test_other_errors_are_internal() {
        let error: HandlerError = "boom".into();
        let response = HttpExceptionFilter.catch(error, &host());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_panics_report_their_message() {
        let error: HandlerError = Box::new(RouteError::HandlerPanicked {
            key: "error_action".into(),
            message: "boom".into(),
        });
        let response = HttpExceptionFilter.catch(error, &host());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["message"],
            "Handler error_action panicked: boom"
        );
    }
}

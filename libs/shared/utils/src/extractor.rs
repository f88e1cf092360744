use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::tenant::{CallerRole, TenantContext};

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-role";

/// Middleware establishing the caller's tenant scope. A fronting auth gateway
/// is expected to populate the headers after session validation; requests
/// without a complete scope never reach a handler.
pub async fn tenant_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let tenant_id = required_uuid(&request, TENANT_HEADER)?;
    let user_id = required_uuid(&request, USER_HEADER)?;

    let role: CallerRole = required_header(&request, ROLE_HEADER)?
        .parse()
        .map_err(AppError::Unauthorized)?;

    request.extensions_mut().insert(TenantContext {
        tenant_id,
        user_id,
        role,
    });

    Ok(next.run(request).await)
}

fn required_header<'a>(request: &'a Request<Body>, name: &str) -> Result<&'a str, AppError> {
    request
        .headers()
        .get(name)
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", name)))?
        .to_str()
        .map_err(|_| AppError::Unauthorized(format!("Invalid {} header", name)))
}

fn required_uuid(request: &Request<Body>, name: &str) -> Result<Uuid, AppError> {
    required_header(request, name)?
        .parse()
        .map_err(|_| AppError::Unauthorized(format!("Invalid {} header", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Extension, Router};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    async fn echo_tenant(Extension(scope): Extension<TenantContext>) -> String {
        scope.tenant_id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo_tenant))
            .layer(middleware::from_fn(tenant_middleware))
    }

    #[tokio::test]
    async fn missing_scope_is_unauthorized() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn complete_scope_reaches_handler() {
        let tenant = Uuid::new_v4();
        let request = Request::builder()
            .uri("/")
            .header(TENANT_HEADER, tenant.to_string())
            .header(USER_HEADER, Uuid::new_v4().to_string())
            .header(ROLE_HEADER, "RECEPTIONIST")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let request = Request::builder()
            .uri("/")
            .header(TENANT_HEADER, Uuid::new_v4().to_string())
            .header(USER_HEADER, Uuid::new_v4().to_string())
            .header(ROLE_HEADER, "janitor")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

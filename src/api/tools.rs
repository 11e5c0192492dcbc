use actix_web::{get, post, web, HttpResponse};
use serde_json::Value;

use crate::auth::ForwardedToken;
use crate::model::global_error::{AppError, ErrorCode, ErrorResponse};
use crate::tool::{ToolDescriptor, ToolServer};

#[utoipa::path(
    get,
    path = "/tools",
    summary = "List registered tools",
    responses(
        (status = 200, description = "Registered tools", body = Vec<ToolDescriptor>),
    ),
    tag = "tools",
)]
#[get("/tools")]
pub async fn list_tools(server: web::Data<ToolServer>) -> HttpResponse {
    HttpResponse::Ok().json(server.registry.descriptors())
}

#[utoipa::path(
    post,
    path = "/tools/{name}",
    summary = "Call a tool",
    params(
        ("name" = String, Path, description = "Tool name"),
        ("X-Snowflake-Token" = Option<String>, Header, description = "Warehouse token for this call"),
    ),
    request_body(content = Object, description = "Tool arguments; an empty body means defaults"),
    responses(
        (status = 200, description = "Tool result", body = Object),
        (status = 400, description = "Undecodable arguments", body = ErrorResponse),
        (status = 401, description = "No warehouse credential", body = ErrorResponse),
        (status = 404, description = "Unknown tool or issue", body = ErrorResponse),
        (status = 500, description = "Warehouse query failed", body = ErrorResponse),
    ),
    tag = "tools",
)]
#[post("/tools/{name}")]
pub async fn call_tool(
    name: web::Path<String>,
    body: web::Bytes,
    token: Option<web::ReqData<ForwardedToken>>,
    server: web::Data<ToolServer>,
) -> Result<HttpResponse, AppError> {
    let args: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::with_detail(ErrorCode::ValidationError, e.to_string()))?
    };

    let forwarded = token.map(|token| token.into_inner());
    let result = server.call(&name, args, forwarded.as_ref()).await?;

    Ok(HttpResponse::Ok().json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TokenForwarding, middleware::TOKEN_HEADER};
    use crate::configuration::Settings;
    use crate::auth::CredentialResolver;
    use crate::service::IssueQueryService;
    use crate::testing::{ScriptedExecutor, row};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::json;
    use std::sync::Arc;

    /// A server on the HTTP transport: credentials come only from the header.
    fn http_server(executor: Arc<ScriptedExecutor>) -> web::Data<ToolServer> {
        let settings = Settings::from_lookup(|key| match key {
            "SNOWFLAKE_BASE_URL" => Some("https://warehouse.example".to_string()),
            "MCP_TRANSPORT" => Some("http".to_string()),
            "SNOWFLAKE_TOKEN" => Some("ignored".to_string()),
            _ => None,
        })
        .unwrap();
        let resolver = CredentialResolver::new(&settings).unwrap();
        web::Data::new(ToolServer::new(Arc::new(IssueQueryService::new(executor)), resolver))
    }

    #[actix_web::test]
    async fn forwards_header_token_to_tools() {
        let executor = Arc::new(ScriptedExecutor::new().on(
            "GROUP BY",
            vec![row(&[Some("P1"), Some("Open"), Some("High"), Some("1")])],
        ));
        let app = test::init_service(
            App::new()
                .wrap(TokenForwarding)
                .app_data(http_server(executor))
                .service(list_tools)
                .service(call_tool),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/tools/get_jira_project_summary")
            .insert_header((TOKEN_HEADER, "caller-token"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_issues"], json!(1));

        let req = test::TestRequest::get().uri("/tools").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(5));
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let executor = Arc::new(ScriptedExecutor::new());
        let app = test::init_service(
            App::new()
                .wrap(TokenForwarding)
                .app_data(http_server(executor.clone()))
                .service(call_tool),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/tools/list_jira_issues")
            .set_payload("{}")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], json!("Snowflake token not available"));
        assert_eq!(executor.call_count(), 0);
    }

    #[actix_web::test]
    async fn bad_json_and_unknown_tools_are_rejected() {
        let executor = Arc::new(ScriptedExecutor::new());
        let app = test::init_service(
            App::new()
                .wrap(TokenForwarding)
                .app_data(http_server(executor))
                .service(call_tool),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/tools/list_jira_issues")
            .insert_header((TOKEN_HEADER, "t"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/tools/nope")
            .insert_header((TOKEN_HEADER, "t"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], json!("ToolNotFound"));
    }
}

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenv::dotenv;
use tokio::io::BufReader;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use jira_warehouse::api::{self, ApiDoc};
use jira_warehouse::auth::{CredentialResolver, TokenForwarding};
use jira_warehouse::configuration::{Settings, Transport};
use jira_warehouse::db::SnowflakeExecutor;
use jira_warehouse::service::IssueQueryService;
use jira_warehouse::telemetry::{get_subscriber, init_subscriber};
use jira_warehouse::tool::{ToolServer, stdio};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // stdout carries protocol traffic in stdio mode
    let subscriber = get_subscriber(
        "jira_warehouse".into(),
        "info".into(),
        std::io::stderr,
    );
    init_subscriber(subscriber)?;

    let settings = Settings::from_env()?;
    info!(transport = ?settings.transport, warehouse = %settings.warehouse, "starting");

    let resolver = CredentialResolver::new(&settings)?;
    let executor = SnowflakeExecutor::new(&settings)?;
    let service = Arc::new(IssueQueryService::new(Arc::new(executor)));
    let server = ToolServer::new(service, resolver);

    if settings.transport == Transport::Stdio {
        stdio::serve(&server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
        return Ok(());
    }

    let server = Data::new(server);
    info!("listening on http://{}:{}", settings.host, settings.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-snowflake-token"),
            ])
            .max_age(3600);

        App::new()
            .wrap(TokenForwarding)
            .wrap(cors)
            .app_data(server.clone())
            .service(api::health_check)
            .service(api::list_tools)
            .service(api::call_tool)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
    })
        .bind((settings.host.as_str(), settings.port))?
        .run()
        .await?;

    Ok(())
}

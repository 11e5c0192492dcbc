//! Line-delimited JSON transport: one `{"id", "name", "arguments"}` request
//! per input line, one response object per output line.

use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::model::global_error::{AppError, ErrorCode};
use crate::service::ServiceError;
use crate::tool::ToolServer;

#[derive(Debug, Deserialize)]
struct StdioRequest {
    #[serde(default)]
    id: Option<Value>,
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn error_line(id: Option<Value>, err: AppError) -> Value {
    let response = err.to_response();
    json!({"id": id, "error": response.error, "code": response.code})
}

async fn handle_line(server: &ToolServer, line: &str) -> Value {
    let request: StdioRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "unreadable stdio request");
            return error_line(None, AppError::with_detail(ErrorCode::ValidationError, e.to_string()));
        }
    };

    if request.name == "list_tools" {
        return json!({"id": request.id, "result": server.registry.descriptors()});
    }

    match server.call(&request.name, request.arguments, None).await {
        Ok(result) => json!({"id": request.id, "result": result}),
        Err(e) => error_line(request.id, AppError::from(e)),
    }
}

/// Serves requests until `reader` reaches end of input.
pub async fn serve<R, W>(server: &ToolServer, reader: R, mut writer: W) -> Result<(), ServiceError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let io_error = |e: std::io::Error| ServiceError::Internal(format!("stdio transport failed: {}", e));
    let mut lines = reader.lines();

    info!("serving tools over stdio");
    while let Some(line) = lines.next_line().await.map_err(io_error)? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(server, &line).await;
        writer
            .write_all(format!("{}\n", response).as_bytes())
            .await
            .map_err(io_error)?;
        writer.flush().await.map_err(io_error)?;
    }

    info!("stdin closed, stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedExecutor, row};
    use crate::tool::tests::tool_server;
    use std::sync::Arc;
    use tokio::io::BufReader;

    async fn run(server: &ToolServer, input: &str) -> Vec<Value> {
        let mut output: Vec<u8> = Vec::new();
        serve(server, BufReader::new(input.as_bytes()), &mut output).await.unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn answers_each_line_in_order() {
        let executor = Arc::new(ScriptedExecutor::new().on(
            "GROUP BY",
            vec![row(&[Some("P1"), Some("Open"), Some("High"), Some("2")])],
        ));
        let server = tool_server(executor, Some("local-token"));

        let input = concat!(
            r#"{"id": 1, "name": "get_jira_project_summary"}"#,
            "\n\n",
            r#"{"id": 2, "name": "list_tools"}"#,
            "\n",
            r#"{"id": 3, "name": "nope", "arguments": {}}"#,
            "\n",
            "not json\n",
        );
        let responses = run(&server, input).await;

        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0]["id"], json!(1));
        assert_eq!(responses[0]["result"]["total_issues"], json!(2));
        assert_eq!(responses[1]["result"].as_array().map(Vec::len), Some(5));
        assert_eq!(responses[2]["code"], json!("ToolNotFound"));
        assert_eq!(responses[2]["error"], json!("unknown tool: nope"));
        assert_eq!(responses[3]["code"], json!("ValidationError"));
        assert_eq!(responses[3]["id"], Value::Null);
    }

    #[tokio::test]
    async fn missing_token_is_reported_in_payload() {
        let executor = Arc::new(ScriptedExecutor::new());
        let server = tool_server(executor.clone(), None);

        let responses = run(&server, "{\"id\": \"a\", \"name\": \"list_jira_issues\", \"arguments\": {}}\n").await;
        assert_eq!(responses[0]["error"], json!("Snowflake token not available"));
        assert_eq!(responses[0]["code"], json!("AuthenticationFailed"));
        assert_eq!(executor.call_count(), 0);
    }
}

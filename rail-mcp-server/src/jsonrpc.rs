//! MCP over JSON-RPC 2.0, one message per line on stdin/stdout.

use anyhow::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::tools::{RailMcp, ToolError};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Serves requests read from `input` until it is closed.
pub async fn serve<R, W>(server: &RailMcp, input: R, mut output: W) -> Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(input).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(request) => handle_message(server, request).await,
            Err(e) => {
                tracing::warn!("Parse error: {}", e);
                Some(error_response(Value::Null, -32700, format!("Parse error: {e}")))
            }
        };

        if let Some(response) = response {
            output.write_all(response.to_string().as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
    }

    Ok(())
}

/// Handles one JSON-RPC message. Notifications (no `id`) get no response.
pub async fn handle_message(server: &RailMcp, request: Value) -> Option<Value> {
    let id = request.get("id").cloned();
    let Some(method) = request.get("method").and_then(|v| v.as_str()) else {
        return Some(error_response(
            id.unwrap_or(Value::Null),
            -32600,
            "Invalid request: missing method".to_string(),
        ));
    };

    // notifications/initialized and friends
    let id = id?;

    let response = match method {
        "initialize" => success_response(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {
                    "name": "rail-mcp",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),

        "ping" => success_response(id, json!({})),

        "tools/list" => success_response(id, server.list_tools()),

        "tools/call" => {
            let params = request.get("params").cloned().unwrap_or(json!({}));
            let tool_name = params
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

            match server.call_tool(tool_name, arguments).await {
                Ok(result) => success_response(id, tool_result(&result, false)),
                Err(ToolError::Rail(e)) => {
                    tracing::warn!("✗ {} failed: {}", tool_name, e);
                    let payload = serde_json::to_value(e.payload()).unwrap_or(json!({
                        "message": e.to_string()
                    }));
                    success_response(id, tool_result(&payload, true))
                }
                Err(e @ ToolError::UnknownTool(_)) => error_response(id, -32602, e.to_string()),
                Err(e @ ToolError::Encode(_)) => error_response(id, -32603, e.to_string()),
            }
        }

        _ => error_response(id, -32601, format!("Method not found: {}", method)),
    };

    Some(response)
}

fn tool_result(value: &Value, is_error: bool) -> Value {
    json!({
        "content": [{
            "type": "text",
            "text": value.to_string()
        }],
        "isError": is_error
    })
}

fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn error_response(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RailClient;
    use crate::config::Language;
    use std::time::Duration;

    fn server() -> RailMcp {
        RailMcp::new(
            RailClient::new("http://127.0.0.1:9/graphql", Duration::from_millis(200)),
            Language::En,
        )
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = handle_message(
            &server(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        )
        .await
        .unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let response = handle_message(
            &server(),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_tool_failure_is_a_result_not_a_fault() {
        let response = handle_message(
            &server(),
            json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call",
                   "params": {"name": "book_ticket", "arguments": {
                       "trip_id": "", "passenger_name": "Anna", "passenger_email": "a@b.ch"}}}),
        )
        .await
        .unwrap();
        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["kind"], "validation_error");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_protocol_error() {
        let response = handle_message(
            &server(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                   "params": {"name": "calculate_bmi", "arguments": {}}}),
        )
        .await
        .unwrap();
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_serve_answers_line_by_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
            "\n\n",
            "not json\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#,
            "\n"
        );
        let mut output = Vec::new();
        serve(&server(), input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["result"]["tools"].as_array().unwrap().len(), 4);
        assert_eq!(responses[1]["error"]["code"], -32700);
        assert_eq!(responses[2]["error"]["code"], -32601);
    }
}

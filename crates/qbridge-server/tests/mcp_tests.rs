//! Integration tests for the MCP tool server.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::BufReader;

use qbridge_adapter_sim::SimulatorProvider;
use qbridge_core::{Capabilities, Coordinator, Dispatcher};
use qbridge_server::McpServer;
use qbridge_server::mcp::{METHOD_NOT_FOUND, PARSE_ERROR};

fn server() -> McpServer {
    let caps = Capabilities::none().with_local(Arc::new(SimulatorProvider::new().with_seed(3)));
    McpServer::new(Dispatcher::new(Coordinator::new(caps)))
}

async fn request(server: &McpServer, message: Value) -> Value {
    server
        .handle_line(&message.to_string())
        .await
        .expect("response")
}

fn tool_text(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn test_initialize_and_list_tools() {
    let server = server();
    let init = request(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    )
    .await;
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["serverInfo"]["name"], "qbridge");

    let list = request(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
    let names: Vec<&str> = list["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "list_backends",
            "create_bell_circuit",
            "create_custom_circuit",
            "execute_circuit"
        ]
    );
}

#[tokio::test]
async fn test_notifications_get_no_response() {
    let response = server()
        .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert!(response.is_none());
}

#[tokio::test]
async fn test_protocol_errors() {
    let server = server();
    let parse = server.handle_line("{not json").await.unwrap();
    assert_eq!(parse["error"]["code"], PARSE_ERROR);
    assert!(parse["id"].is_null());

    let unknown = request(&server, json!({"jsonrpc": "2.0", "id": 9, "method": "resources/list"})).await;
    assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);
    assert_eq!(unknown["id"], 9);
}

#[tokio::test]
async fn test_execute_tool() {
    let response = request(
        &server(),
        json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {
                "name": "execute_circuit",
                "arguments": {
                    "qasm_code": "qreg q[1];\ncreg c[1];\nx q[0];\nmeasure q[0] -> c[0];",
                    "shots": 50,
                    "backend": "aer_simulator"
                }
            }
        }),
    )
    .await;
    assert_eq!(response["result"]["isError"], false);
    let outcome = tool_text(&response);
    assert_eq!(outcome["status"], "success");
    assert_eq!(outcome["counts"], json!({"1": 50}));
}

#[tokio::test]
async fn test_bell_tool_returns_canned_diagram() {
    let response = request(
        &server(),
        json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
               "params": {"name": "create_bell_circuit", "arguments": {}}}),
    )
    .await;
    let body = tool_text(&response);
    assert_eq!(body["circuit_drawing"], qbridge_core::BELL_DIAGRAM);
}

#[tokio::test]
async fn test_escalated_tool_error() {
    let response = request(
        &server(),
        json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call",
               "params": {"name": "create_custom_circuit", "arguments": {}}}),
    )
    .await;
    assert_eq!(response["result"]["isError"], true);
    assert_eq!(
        response["result"]["content"][0]["text"],
        "Error creating custom circuit: Instructions parameter is required"
    );
}

#[tokio::test]
async fn test_serve_over_a_stream() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
        "\n\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"list_backends"}}"#,
        "\n",
    );
    let mut output = Vec::new();
    server()
        .serve(BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();

    let lines: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["result"], json!({}));
    let catalog = tool_text(&lines[1]);
    assert!(
        catalog["backends"]
            .as_array()
            .unwrap()
            .contains(&json!("aer_qasm_simulator"))
    );
}

//! MCP server handler over stdio.

use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};
use tracing::{debug, info};

use frcdocs_shared::{FrcDocsError, Result};
use frcdocs_storage::DocsBundle;

use crate::tools;

pub const SERVER_NAME: &str = "frc-docs";

/// Serves one loaded bundle. Clones share the bundle and hold no mutable state.
#[derive(Clone)]
pub struct McpServer {
    bundle: Arc<DocsBundle>,
}

impl McpServer {
    pub fn new(bundle: DocsBundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
        }
    }

    /// Serve the process's stdin and stdout until the client disconnects.
    pub async fn serve_stdio(self) -> Result<()> {
        info!(
            pages = self.bundle.metadata().total_pages,
            tokens = self.bundle.metadata().total_tokens,
            "serving over stdio"
        );

        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| FrcDocsError::Transport(format!("MCP handshake failed: {e}")))?;
        let reason = service
            .waiting()
            .await
            .map_err(|e| FrcDocsError::Transport(format!("MCP service task failed: {e}")))?;

        info!(?reason, "client disconnected, shutting down");
        Ok(())
    }

    /// Run one `tools/call`. An unknown tool is an invalid-params error;
    /// bad arguments to a known tool come back as an `isError` result.
    pub fn run_tool(
        &self,
        request: CallToolRequestParams,
    ) -> std::result::Result<CallToolResult, McpError> {
        let arguments = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        let output = tools::call(&self.bundle, &request.name, arguments).ok_or_else(|| {
            McpError::new(
                ErrorCode::INVALID_PARAMS,
                format!("unknown tool: {}", request.name),
                None,
            )
        })?;

        if output.is_error {
            debug!(tool = %request.name, error = %output.text, "tool call rejected");
        }
        Ok(output.into_result())
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                title: Some("FRC Docs".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Offline FRC documentation for WPILib, CTRE Phoenix 6, AdvantageKit, \
                 REV Robotics and Limelight. Use search_frc_docs to find pages, then \
                 read_documentation with a page ID for the full text."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = std::result::Result<ListToolsResult, McpError>> + Send + '_
    {
        std::future::ready(Ok(ListToolsResult::with_all_items(tools::definitions())))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        tools::definition(name)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        self.run_tool(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    use frcdocs_shared::{Library, Page};
    use frcdocs_storage::Bundle;
    use serde_json::json;

    fn server() -> McpServer {
        let pages = vec![
            Page::new(
                "pid_basics",
                "PIDController Basics",
                Library::WpiLib,
                "https://docs.wpilib.org/pid",
                "Use the PIDController class to close the loop.",
            ),
            Page::new(
                "rev_closed_loop",
                "Closed Loop Control",
                Library::RevRobotics,
                "https://docs.revrobotics.com/closed-loop",
                "The SPARK MAX runs its own PID loop.",
            ),
        ];
        McpServer::new(DocsBundle::from(Bundle::build(pages)))
    }

    fn params(name: &str, arguments: serde_json::Value) -> CallToolRequestParams {
        CallToolRequestParams {
            name: Cow::Owned(name.to_owned()),
            arguments: arguments.as_object().cloned(),
            task: None,
            meta: None,
        }
    }

    fn text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| match &c.raw {
                RawContent::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn call(server: &McpServer, name: &str, arguments: serde_json::Value) -> CallToolResult {
        server.run_tool(params(name, arguments)).expect("tool result")
    }

    #[test]
    fn info_reports_tools_capability() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert_eq!(info.protocol_version, ProtocolVersion::V_2024_11_05);
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn tool_lookup_by_name() {
        let server = server();
        assert!(server.get_tool(tools::SEARCH_TOOL).is_some());
        assert!(server.get_tool(tools::READ_TOOL).is_some());
        assert!(server.get_tool("delete_everything").is_none());
    }

    #[test]
    fn search_tool_formats_results() {
        let result = call(&server(), tools::SEARCH_TOOL, json!({ "query": "PIDController" }));
        let text = text(&result);
        assert!(text.starts_with("Found "));
        assert!(text.contains("1. **PIDController Basics** (WPILib)"));
        assert!(text.contains("| ID: pid_basics"));
        assert_ne!(result.is_error, Some(true));
    }

    #[test]
    fn search_tool_reports_no_results_with_library() {
        let result = call(
            &server(),
            tools::SEARCH_TOOL,
            json!({ "query": "PIDController", "library": "Limelight" }),
        );
        assert_eq!(
            text(&result),
            "No results found for \"PIDController\" in Limelight."
        );
    }

    #[test]
    fn search_tool_rejects_out_of_range_limit() {
        let result = call(&server(), tools::SEARCH_TOOL, json!({ "query": "pid", "limit": 0 }));
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("limit"));
    }

    #[test]
    fn search_tool_rejects_unknown_library() {
        let result = call(
            &server(),
            tools::SEARCH_TOOL,
            json!({ "query": "pid", "library": "FTC SDK" }),
        );
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn missing_arguments_are_a_tool_error() {
        let request = CallToolRequestParams {
            name: Cow::Borrowed(tools::READ_TOOL),
            arguments: None,
            task: None,
            meta: None,
        };
        let result = server().run_tool(request).expect("tool result");
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn read_tool_returns_page_or_not_found() {
        let server = server();
        let result = call(&server, tools::READ_TOOL, json!({ "id": "pid_basics" }));
        let page = text(&result);
        assert!(page.starts_with("# PIDController Basics\n\n**Library:** WPILib\n"));
        assert!(page.contains("**Tokens:** ~"));
        assert!(page.ends_with("Use the PIDController class to close the loop."));

        let result = call(&server, tools::READ_TOOL, json!({ "id": "nonexistent_id" }));
        assert_eq!(
            text(&result),
            "No page found with ID \"nonexistent_id\". Use search_frc_docs to find valid page IDs."
        );
    }

    #[test]
    fn unknown_tool_is_invalid_params() {
        let err = server()
            .run_tool(params("delete_everything", json!({})))
            .expect_err("unknown tool");
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn client_round_trip_over_duplex() {
        let (server_io, client_io) = tokio::io::duplex(64 * 1024);
        let handle = tokio::spawn(async move {
            let service = server().serve(server_io).await.expect("server handshake");
            service.waiting().await.expect("server task");
        });

        let client = ().serve(client_io).await.expect("client handshake");

        let listed = client.list_all_tools().await.expect("tools/list");
        let names: Vec<&str> = listed.iter().map(|t| t.name.as_ref()).collect();
        assert_eq!(names, vec![tools::SEARCH_TOOL, tools::READ_TOOL]);

        let result = client
            .call_tool(params(tools::SEARCH_TOOL, json!({ "query": "SPARK MAX" })))
            .await
            .expect("tools/call");
        assert!(text(&result).contains("**Closed Loop Control** (REV Robotics)"));

        let err = client
            .call_tool(params("delete_everything", json!({})))
            .await
            .expect_err("unknown tool");
        assert!(matches!(
            err,
            rmcp::service::ServiceError::McpError(ref e) if e.code == ErrorCode::INVALID_PARAMS
        ));

        client.cancel().await.expect("client shutdown");
        handle.await.expect("server join");
    }
}

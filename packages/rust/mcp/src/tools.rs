//! The two tools exposed to agents: `search_frc_docs` and `read_documentation`.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, JsonObject, Tool, ToolAnnotations};
use serde::Deserialize;
use serde_json::{Value, json};

use frcdocs_search::{DEFAULT_LIMIT, read, search};
use frcdocs_shared::{FrcDocsError, Library, Result};
use frcdocs_storage::DocsBundle;

pub const SEARCH_TOOL: &str = "search_frc_docs";
pub const READ_TOOL: &str = "read_documentation";

const MAX_LIMIT: u32 = 50;

/// Text payload of a tool call, possibly flagged as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    fn text(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    fn error(text: String) -> Self {
        Self {
            text,
            is_error: true,
        }
    }

    /// A single text block, with `isError` set when the call was rejected.
    pub fn into_result(self) -> CallToolResult {
        let content = vec![Content::text(self.text)];
        if self.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    library: Option<Library>,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ReadArgs {
    id: String,
}

/// Tool descriptors for `tools/list`.
pub fn definitions() -> Vec<Tool> {
    let libraries: Vec<&str> = Library::ALL.iter().map(Library::as_str).collect();
    vec![
        descriptor(
            SEARCH_TOOL,
            "Search FRC documentation across WPILib, CTRE Phoenix 6, REV Robotics, Limelight, and AdvantageKit. Returns matching pages with relevance scores and snippets.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query (e.g., 'PIDController', 'swerve drive', 'motor configuration')"
                    },
                    "library": {
                        "type": "string",
                        "enum": libraries,
                        "description": "Filter results to a specific library"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_LIMIT,
                        "description": "Maximum number of results to return (default: 10)"
                    }
                },
                "required": ["query"]
            }),
        ),
        descriptor(
            READ_TOOL,
            "Read the full content of a specific FRC documentation page by its ID. Use search_frc_docs first to find the page ID.",
            json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "The page ID (from search results)"
                    }
                },
                "required": ["id"]
            }),
        ),
    ]
}

/// Descriptor for one tool, looked up by name.
pub fn definition(name: &str) -> Option<Tool> {
    definitions().into_iter().find(|tool| tool.name == name)
}

fn descriptor(name: &'static str, description: &'static str, schema: Value) -> Tool {
    let input_schema: Arc<JsonObject> = match schema {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    };

    Tool {
        name: Cow::Borrowed(name),
        title: None,
        description: Some(Cow::Borrowed(description)),
        input_schema,
        output_schema: None,
        annotations: Some(ToolAnnotations::new().read_only(true)),
        execution: None,
        icons: None,
        meta: None,
    }
}

/// Run a tool by name. `None` means the tool does not exist.
pub fn call(bundle: &DocsBundle, name: &str, arguments: Value) -> Option<ToolOutput> {
    let output = match name {
        SEARCH_TOOL => match parse_search_args(arguments) {
            Ok(args) => run_search(bundle, &args),
            Err(e) => ToolOutput::error(e.to_string()),
        },
        READ_TOOL => match serde_json::from_value::<ReadArgs>(arguments) {
            Ok(args) => run_read(bundle, &args.id),
            Err(e) => ToolOutput::error(format!("invalid arguments: {e}")),
        },
        _ => return None,
    };
    Some(output)
}

fn parse_search_args(arguments: Value) -> Result<SearchArgs> {
    let args: SearchArgs = serde_json::from_value(arguments)
        .map_err(|e| FrcDocsError::validation(format!("invalid arguments: {e}")))?;
    if let Some(limit) = args.limit {
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(FrcDocsError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
    }
    Ok(args)
}

fn run_search(bundle: &DocsBundle, args: &SearchArgs) -> ToolOutput {
    let limit = args.limit.map_or(DEFAULT_LIMIT, |l| l as usize);
    let results = search(bundle, &args.query, args.library, limit);

    if results.is_empty() {
        let scope = args
            .library
            .map(|lib| format!(" in {lib}"))
            .unwrap_or_default();
        return ToolOutput::text(format!("No results found for \"{}\"{scope}.", args.query));
    }

    let entries: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. **{}** ({})\n   Score: {:.2} | ID: {}\n   URL: {}\n   {}",
                i + 1,
                r.title,
                r.library,
                r.score,
                r.id,
                r.url,
                r.snippet
            )
        })
        .collect();

    ToolOutput::text(format!(
        "Found {} result(s) for \"{}\":\n\n{}",
        results.len(),
        args.query,
        entries.join("\n\n")
    ))
}

fn run_read(bundle: &DocsBundle, id: &str) -> ToolOutput {
    match read(bundle, id) {
        Some(page) => ToolOutput::text(format!(
            "# {}\n\n**Library:** {}\n**URL:** {}\n**Tokens:** ~{}\n\n---\n\n{}",
            page.title, page.library, page.url, page.tokens, page.content
        )),
        None => ToolOutput::text(format!(
            "No page found with ID \"{id}\". Use {SEARCH_TOOL} to find valid page IDs."
        )),
    }
}

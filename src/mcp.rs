//! img2laser MCP (Model Context Protocol) server
//!
//! Standalone server binary that exposes engraving preparation over the
//! Model Context Protocol, so AI assistants can analyze images and write
//! engraving-ready PNGs.

use img2laser::{analyze_file, convert, ConversionOptions, Laser, Material, MaterialColor};
use serde_json::{json, Map, Value};
use std::io::{self, BufRead, Write};
use std::path::Path;

const INVALID_PARAMS: i32 = -32602;
const METHOD_NOT_FOUND: i32 = -32601;
const TOOL_FAILED: i32 = -32000;

/// MCP Request structure
#[derive(Debug, serde::Deserialize)]
struct McpRequest {
    #[serde(default)]
    #[allow(dead_code)]
    jsonrpc: String,
    #[serde(flatten)]
    kind: RequestKind,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "method")]
enum RequestKind {
    #[serde(rename = "initialize")]
    Initialize {
        id: Value,
        #[serde(default)]
        params: Value,
    },
    #[serde(rename = "tools/list", alias = "tools_list")]
    ToolsList { id: Value },
    #[serde(rename = "tools/call", alias = "tools_call")]
    ToolsCall { id: Value, params: ToolCallParams },
}

#[derive(Debug, serde::Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// MCP Response structure
#[derive(Debug, serde::Serialize)]
struct McpResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

#[derive(Debug, serde::Serialize)]
struct McpError {
    code: i32,
    message: String,
}

impl McpResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError { code, message }),
        }
    }

    fn text(id: Value, text: String) -> Self {
        Self::success(
            id,
            json!({
                "content": [
                    {
                        "type": "text",
                        "text": text
                    }
                ]
            }),
        )
    }
}

/// Selection and gamma arguments shared by both tools.
fn options_from_args(args: &Map<String, Value>) -> Result<ConversionOptions, String> {
    let mut options = ConversionOptions::default();
    if let Some(material) = args.get("material").and_then(|v| v.as_str()) {
        options.material = Material::from_key(material);
    }
    if let Some(color) = args.get("color").and_then(|v| v.as_str()) {
        options.color = color.parse::<MaterialColor>()?;
    }
    options.laser = args.get("laser").and_then(|v| v.as_str()).and_then(Laser::from_key);
    if let Some(gamma) = args.get("gamma") {
        let gamma = gamma
            .as_f64()
            .ok_or_else(|| "gamma must be a number".to_string())?;
        if !(0.1..=3.0).contains(&gamma) {
            return Err(format!("gamma must be between 0.1 and 3.0, got {}", gamma));
        }
        options.gamma = Some(gamma);
    }
    Ok(options)
}

fn selection_schema() -> Value {
    json!({
        "material": {
            "type": "string",
            "description": "Engraving material. Unknown values fall back to wood.",
            "enum": Material::ALL.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            "default": "wood"
        },
        "color": {
            "type": "string",
            "description": "Material surface tone. Dark surfaces get an inverted output.",
            "enum": ["light", "dark"],
            "default": "light"
        },
        "laser": {
            "type": "string",
            "description": "Laser source. Omit for no laser-specific tuning.",
            "enum": Laser::ALL.iter().map(|l| l.as_str()).collect::<Vec<_>>()
        },
        "gamma": {
            "type": "number",
            "description": "Gamma to use instead of the recommended one (0.1-3.0).",
            "minimum": 0.1,
            "maximum": 3.0
        }
    })
}

struct Img2LaserMcpServer;

impl Img2LaserMcpServer {
    fn handle_initialize(&self, _params: Value, id: Value) -> McpResponse {
        McpResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "serverInfo": {
                    "name": "img2laser",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {
                        "listChanged": false
                    }
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Value) -> McpResponse {
        let mut prepare_props = selection_schema();
        prepare_props["input_path"] = json!({
            "type": "string",
            "description": "Path to the input image file (PNG, JPEG, etc.)"
        });
        prepare_props["output_path"] = json!({
            "type": "string",
            "description": "Path where the engraving-ready PNG will be saved"
        });

        let mut analyze_props = selection_schema();
        analyze_props["input_path"] = json!({
            "type": "string",
            "description": "Path to the input image file (PNG, JPEG, etc.)"
        });

        McpResponse::success(
            id,
            json!({
                "tools": [
                    {
                        "name": "prepare_image_for_engraving",
                        "description": "Analyze an image, tune contrast, gamma, CLAHE, levels and sharpening for the chosen material and laser, and save an engraving-ready grayscale PNG.",
                        "inputSchema": {
                            "type": "object",
                            "properties": prepare_props,
                            "required": ["input_path", "output_path"]
                        }
                    },
                    {
                        "name": "analyze_image",
                        "description": "Classify an image (photo, cartoon, portrait or text) and report its features, the recommended processing parameters, engraving depth and before/after histograms as JSON.",
                        "inputSchema": {
                            "type": "object",
                            "properties": analyze_props,
                            "required": ["input_path"]
                        }
                    }
                ]
            }),
        )
    }

    fn handle_tools_call(&self, params: ToolCallParams, id: Value) -> McpResponse {
        let Value::Object(args) = params.arguments else {
            return McpResponse::failure(
                id,
                INVALID_PARAMS,
                "Invalid arguments: expected object".to_string(),
            );
        };

        let options = match options_from_args(&args) {
            Ok(options) => options,
            Err(message) => return McpResponse::failure(id, INVALID_PARAMS, message),
        };
        let input_path = args.get("input_path").and_then(|v| v.as_str());

        match params.name.as_str() {
            "prepare_image_for_engraving" => {
                let output_path = args.get("output_path").and_then(|v| v.as_str());
                let (Some(input), Some(output)) = (input_path, output_path) else {
                    return McpResponse::failure(
                        id,
                        INVALID_PARAMS,
                        "Missing required parameters: input_path and output_path".to_string(),
                    );
                };

                match convert(Path::new(input), Path::new(output), &options) {
                    Ok(report) => McpResponse::text(
                        id,
                        format!(
                            "Prepared {} as {} ({} image, gamma {:.2}, {} engraving). {}",
                            input,
                            output,
                            report.image_type,
                            report.params.gamma,
                            report.depth,
                            report.summary
                        ),
                    ),
                    Err(e) => McpResponse::failure(id, TOOL_FAILED, format!("Preparation failed: {:#}", e)),
                }
            }
            "analyze_image" => {
                let Some(input) = input_path else {
                    return McpResponse::failure(
                        id,
                        INVALID_PARAMS,
                        "Missing required parameter: input_path".to_string(),
                    );
                };

                let report = analyze_file(Path::new(input), &options)
                    .and_then(|report| Ok(report.to_json()?));
                match report {
                    Ok(json) => McpResponse::text(id, json),
                    Err(e) => McpResponse::failure(id, TOOL_FAILED, format!("Analysis failed: {:#}", e)),
                }
            }
            _ => McpResponse::failure(id, METHOD_NOT_FOUND, format!("Unknown tool: {}", params.name)),
        }
    }

    fn run(&self) {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut stdout_lock = stdout.lock();

        for line in stdin.lock().lines() {
            let Ok(json_str) = line else {
                break;
            };
            let req = match serde_json::from_str::<McpRequest>(&json_str) {
                Ok(req) => req,
                Err(e) => {
                    log::debug!("ignoring message: {}", e);
                    continue;
                }
            };

            let response = match req.kind {
                RequestKind::Initialize { id, params } => self.handle_initialize(params, id),
                RequestKind::ToolsList { id } => self.handle_tools_list(id),
                RequestKind::ToolsCall { id, params } => self.handle_tools_call(params, id),
            };

            if let Ok(response_json) = serde_json::to_string(&response) {
                writeln!(stdout_lock, "{}", response_json).ok();
                stdout_lock.flush().ok();
            }
        }
    }
}

fn main() {
    // Logs go to stderr; stdout carries the protocol.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let server = Img2LaserMcpServer;
    server.run();
}

use serde_json::json;

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", serde_json::to_string_pretty(&err).unwrap());
    std::process::exit(1);
}

pub fn print_json(value: &impl serde::Serialize) {
    println!("{}", serde_json::to_string_pretty(value).unwrap());
}

/// Parse a snake_case CLI value into any serde enum (the CLI accepts exactly
/// the wire spellings: "limit_bouldering", "very_light", ...)
pub fn parse_enum<T>(s: &str) -> Result<T, String>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("invalid value '{s}'"))
}

/// The open review panel lives here between invocations
pub fn panel_path() -> std::path::PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("crux")
        .join("review_panel.json")
}

pub fn write_panel_file(data: &impl serde::Serialize) -> Result<(), String> {
    let path = panel_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("Failed to create {parent:?}: {e}"))?;
    }
    let raw = serde_json::to_string_pretty(data).map_err(|e| format!("{e}"))?;
    std::fs::write(&path, raw).map_err(|e| format!("Failed to write {path:?}: {e}"))
}

pub fn read_panel_file<T: serde::de::DeserializeOwned>() -> Result<T, String> {
    let path = panel_path();
    let raw = std::fs::read_to_string(&path)
        .map_err(|_| "No review panel is open. Run `crux review open --scenario <id>`.".to_string())?;
    serde_json::from_str(&raw).map_err(|e| format!("Corrupt panel file {path:?}: {e}"))
}

/// Cheap cancel: delete the panel file, discarding all unsaved edits
pub fn remove_panel_file() -> Result<bool, String> {
    let path = panel_path();
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(format!("Failed to remove {path:?}: {e}")),
    }
}

/// Read JSON from a file path or stdin (when path is "-").
pub fn read_json_from_file(path: &str) -> Result<serde_json::Value, String> {
    let raw = if path == "-" {
        let mut buf = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)
            .map_err(|e| format!("Failed to read stdin: {e}"))?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file '{path}': {e}"))?
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON in '{path}': {e}"))
}

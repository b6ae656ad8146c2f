//! Claude Desktop configuration file

use anyhow::{Context, Result};
use school_mcp_core::config::EnvFile;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Key of this server under `mcpServers`
pub const SERVER_KEY: &str = "school-tools";

const CONFIG_FILE: &str = "claude_desktop_config.json";

/// Placeholder credentials shown in the manual instructions
const PLACEHOLDER_ENV: [(&str, &str); 4] = [
    ("CANVAS_ACCESS_TOKEN", "your_canvas_token_here"),
    ("CANVAS_DOMAIN", "canvas.your_institution.edu"),
    ("GRADESCOPE_EMAIL", "your_email@your_institution.edu"),
    ("GRADESCOPE_PASSWORD", "your_gradescope_password"),
];

/// Written when the user asks for a new env file
pub const ENV_TEMPLATE: &str = "# Canvas API credentials
CANVAS_ACCESS_TOKEN=your_canvas_token_here
CANVAS_DOMAIN=canvas.your_institution.edu

# Gradescope credentials
GRADESCOPE_EMAIL=your_email@your_institution.edu
GRADESCOPE_PASSWORD=your_gradescope_password
";

/// Where Claude Desktop keeps its config on this machine
pub fn config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    config_path_for(
        std::env::consts::OS,
        &home,
        std::env::var_os("APPDATA").map(PathBuf::from),
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
    )
}

/// Config location for `os`; `None` when a required directory is unknown
pub fn config_path_for(
    os: &str,
    home: &Path,
    appdata: Option<PathBuf>,
    xdg_config_home: Option<PathBuf>,
) -> Option<PathBuf> {
    let claude_dir = match os {
        "macos" => home.join("Library/Application Support/Claude"),
        "windows" => appdata.filter(|p| !p.as_os_str().is_empty())?.join("Claude"),
        _ => xdg_config_home
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| home.join(".config"))
            .join("Claude"),
    };
    Some(claude_dir.join(CONFIG_FILE))
}

/// Entry launching `command serve` with the env file's variables
pub fn server_entry(command: &Path, env: &EnvFile) -> Value {
    let env: Map<String, Value> = env
        .entries()
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    let mut entry = json!({
        "command": command.display().to_string(),
        "args": ["serve"],
    });
    if !env.is_empty() {
        entry["env"] = Value::Object(env);
    }
    entry
}

/// Set `mcpServers["school-tools"]`, keeping everything else
pub fn register_server(config: Value, entry: Value) -> Value {
    let mut config = match config {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let servers = config
        .entry("mcpServers")
        .or_insert_with(|| Value::Object(Map::new()));
    if !servers.is_object() {
        *servers = Value::Object(Map::new());
    }
    if let Value::Object(servers) = servers {
        servers.insert(SERVER_KEY.to_string(), entry);
    }

    Value::Object(config)
}

/// Existing config; a missing or invalid file reads as `{}`
pub async fn read_config(path: &Path) -> Value {
    let Ok(content) = tokio::fs::read_to_string(path).await else {
        return json!({});
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(value) if value.is_object() => value,
        _ => {
            tracing::warn!("Ignoring invalid Claude Desktop config at {}", path.display());
            json!({})
        }
    }
}

pub async fn write_config(path: &Path, config: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Steps for editing the config by hand
pub fn manual_instructions(command: &Path) -> String {
    let env: Map<String, Value> = PLACEHOLDER_ENV
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    let example = json!({
        "mcpServers": {
            SERVER_KEY: {
                "command": command.display().to_string(),
                "args": ["serve"],
                "env": env,
            }
        }
    });
    let snippet = serde_json::to_string_pretty(&example).unwrap_or_default();

    format!(
        "Manual Configuration Instructions:\n\
         1. Open Claude Desktop\n\
         2. Go to Settings > Developer > Edit Config\n\
         3. Add the following to your {}:\n\
         {}\n\
         4. Replace the environment variable values with your actual credentials.\n\
         5. Save the file and restart Claude Desktop",
        CONFIG_FILE, snippet
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_path_per_os() {
        let home = Path::new("/home/student");
        let roaming = PathBuf::from("C:/Users/s/AppData/Roaming");

        assert_eq!(
            config_path_for("macos", home, None, None).unwrap(),
            PathBuf::from(
                "/home/student/Library/Application Support/Claude/claude_desktop_config.json"
            )
        );
        assert_eq!(
            config_path_for("windows", home, Some(roaming), None).unwrap(),
            PathBuf::from("C:/Users/s/AppData/Roaming/Claude/claude_desktop_config.json")
        );
        assert!(config_path_for("windows", home, None, None).is_none());
        assert_eq!(
            config_path_for("linux", home, None, None).unwrap(),
            PathBuf::from("/home/student/.config/Claude/claude_desktop_config.json")
        );
        assert_eq!(
            config_path_for("linux", home, None, Some(PathBuf::from("/xdg"))).unwrap(),
            PathBuf::from("/xdg/Claude/claude_desktop_config.json")
        );
    }

    #[test]
    fn test_register_server_keeps_other_entries() {
        let config = json!({
            "theme": "dark",
            "mcpServers": {"other": {"command": "other-server"}}
        });
        let env = EnvFile::parse("CANVAS_DOMAIN=canvas.example.edu\n");
        let entry = server_entry(Path::new("/usr/local/bin/school-mcp"), &env);

        let updated = register_server(config, entry);

        assert_eq!(updated["theme"], "dark");
        assert_eq!(updated["mcpServers"]["other"]["command"], "other-server");
        let ours = &updated["mcpServers"][SERVER_KEY];
        assert_eq!(ours["command"], "/usr/local/bin/school-mcp");
        assert_eq!(ours["args"], json!(["serve"]));
        assert_eq!(ours["env"]["CANVAS_DOMAIN"], "canvas.example.edu");
    }

    #[test]
    fn test_register_server_repairs_bad_shapes() {
        let entry = server_entry(Path::new("school-mcp"), &EnvFile::default());
        assert!(entry.get("env").is_none());

        let updated = register_server(json!([1, 2]), entry.clone());
        assert_eq!(updated["mcpServers"][SERVER_KEY], entry);

        let updated = register_server(json!({"mcpServers": "broken"}), entry.clone());
        assert_eq!(updated["mcpServers"][SERVER_KEY], entry);
    }

    #[tokio::test]
    async fn test_read_write_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Claude").join(CONFIG_FILE);

        assert_eq!(read_config(&path).await, json!({}));

        write_config(&path, &json!({"mcpServers": {}})).await.unwrap();
        assert_eq!(read_config(&path).await, json!({"mcpServers": {}}));

        tokio::fs::write(&path, "{broken").await.unwrap();
        assert_eq!(read_config(&path).await, json!({}));
    }

    #[test]
    fn test_manual_instructions_contain_snippet() {
        let text = manual_instructions(Path::new("/opt/school-mcp"));
        assert!(text.contains("\"school-tools\""));
        assert!(text.contains("/opt/school-mcp"));
        assert!(text.contains("GRADESCOPE_PASSWORD"));
    }
}

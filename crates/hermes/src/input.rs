//! Reading box records from disk or stdin.

use std::io::{self, Read};
use std::path::Path;

use tracing::debug;

use hermes_core::BoxRecord;

use crate::cli::{InputArgs, InputFormat};
use crate::error::CliError;

/// Guess the encoding from the file extension; JSON unless it says YAML.
fn detect_format(path: &Path) -> InputFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            InputFormat::Yaml
        }
        _ => InputFormat::Json,
    }
}

fn read_text(path: &Path) -> Result<String, CliError> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            CliError::InputNotFound {
                path: path.display().to_string(),
            }
        } else {
            CliError::Io(e)
        }
    })
}

/// Load and decode the box record named by `args`.
pub fn read_box(args: &InputArgs) -> Result<BoxRecord, CliError> {
    let path = args.box_file.as_path();
    let format = args.input_format.unwrap_or_else(|| detect_format(path));
    let text = read_text(path)?;
    debug!(path = %path.display(), ?format, bytes = text.len(), "read box record");

    let parse_err = |format: &'static str, source: Box<dyn std::error::Error + Send + Sync>| {
        CliError::Parse {
            path: path.display().to_string(),
            format,
            source,
        }
    };
    match format {
        InputFormat::Json => serde_json::from_str(&text).map_err(|e| parse_err("JSON", e.into())),
        InputFormat::Yaml => serde_yaml::from_str(&text).map_err(|e| parse_err("YAML", e.into())),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn extension_selects_format() {
        assert_eq!(detect_format(Path::new("box.yaml")), InputFormat::Yaml);
        assert_eq!(detect_format(Path::new("box.YML")), InputFormat::Yaml);
        assert_eq!(detect_format(Path::new("box.json")), InputFormat::Json);
        assert_eq!(detect_format(Path::new("box")), InputFormat::Json);
    }

    #[test]
    fn missing_file_is_not_found() {
        let args = InputArgs {
            box_file: PathBuf::from("/nonexistent/hermes/box.json"),
            input_format: None,
        };
        assert!(matches!(read_box(&args), Err(CliError::InputNotFound { .. })));
    }
}

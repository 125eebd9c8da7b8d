//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Package format (default: "lifecycle")
    pub format: String,

    /// Directory packages are written to when no output file is given
    /// (default: ".")
    pub output_dir: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            format: "lifecycle".to_string(),
            output_dir: ".".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "format": self.format,
            "output_dir": self.output_dir,
            "package": {}
        })
    }
}

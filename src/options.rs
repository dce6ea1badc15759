//! Plugin options and the subset of the host build configuration the wrapper
//! reads.

use crate::error::{Result, ScopedAmdError};
use crate::target::Target;
use serde::{Deserialize, Serialize};

pub const PLUGIN_NAME: &str = "ScopedAmdLibraryPlugin";
pub const LIBRARY_TYPE: &str = "scoped-amd";

// ═══════════════════════════════════════════════════════════════════════════════
// PLUGIN OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedAmdOptions {
    /// External name the loader resolves to the scope object.
    pub scope_dependency_name: String,
    /// Emit `require([...], factory)` instead of `define(...)`.
    #[serde(default)]
    pub require_as_wrapper: bool,
}

impl ScopedAmdOptions {
    pub fn new(scope_dependency_name: impl Into<String>) -> Result<Self> {
        let options = Self {
            scope_dependency_name: scope_dependency_name.into(),
            require_as_wrapper: false,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn with_require_as_wrapper(mut self, require_as_wrapper: bool) -> Self {
        self.require_as_wrapper = require_as_wrapper;
        self
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let options: Self = serde_json::from_value(value).map_err(|e| {
            ScopedAmdError::invalid_configuration(
                "scopeDependencyName",
                format!(
                    "{} was called without an option argument with scopeDependencyName property ({})",
                    PLUGIN_NAME, e
                ),
            )
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scope_dependency_name.is_empty() {
            return Err(ScopedAmdError::invalid_configuration(
                "scopeDependencyName",
                "must be a non-empty string",
            ));
        }
        Ok(())
    }

    /// Validates the library options of the build against these options and
    /// returns the configured name template, if any.
    pub fn parse_library_name(&self, library: &LibraryOptions) -> Result<Option<String>> {
        match &library.name {
            None => Ok(None),
            Some(_) if self.require_as_wrapper => Err(ScopedAmdError::invalid_configuration(
                "output.library.name",
                "AMD library name must be unset when using requireAsWrapper option",
            )),
            Some(LibraryName::Plain(name)) => Ok(Some(name.clone())),
            Some(LibraryName::Structured(_)) => Err(ScopedAmdError::invalid_configuration(
                "output.library.name",
                "AMD library name must be a simple string or unset",
            )),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOST BUILD OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetOption {
    One(String),
    Many(Vec<String>),
}

impl TargetOption {
    fn first(&self) -> Option<&str> {
        match self {
            TargetOption::One(target) => Some(target),
            TargetOption::Many(targets) => targets.first().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LibraryName {
    Plain(String),
    /// Per-format names, arrays and other shapes AMD cannot express.
    Structured(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryOptions {
    #[serde(default)]
    pub name: Option<LibraryName>,
    #[serde(default, rename = "type")]
    pub library_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    /// Whether the runtime supports arrow functions.
    #[serde(default = "default_true")]
    pub arrow_functions: bool,
    /// Whether chunk bodies are emitted as an immediately invoked expression.
    #[serde(default)]
    pub iife: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            arrow_functions: true,
            iife: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    #[serde(default)]
    pub target: Option<TargetOption>,
    #[serde(default)]
    pub loader_target: Option<String>,
    #[serde(default)]
    pub externals_type: Option<String>,
    #[serde(default)]
    pub library: LibraryOptions,
    #[serde(default)]
    pub output: OutputOptions,
}

impl BuildOptions {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| ScopedAmdError::invalid_configuration("build options", e.to_string()))
    }

    pub fn for_target(target: &str) -> Self {
        Self {
            target: Some(TargetOption::One(target.to_string())),
            ..Default::default()
        }
    }

    pub fn with_externals_type(mut self, externals_type: &str) -> Self {
        self.externals_type = Some(externals_type.to_string());
        self
    }

    /// The normalized target name. Only the first entry of a target list is
    /// considered; without a target the loader target and then `web` apply.
    pub fn target_name(&self) -> String {
        if let Some(target) = self.target.as_ref().and_then(TargetOption::first) {
            return Target::normalize(target);
        }
        self.loader_target
            .clone()
            .unwrap_or_else(|| Target::Web.as_str().to_string())
    }

    pub fn resolve_target(&self) -> Result<Target> {
        self.target_name().parse()
    }

    pub fn uses_amd_externals(&self) -> bool {
        self.externals_type.as_deref() == Some("amd")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_from_json_camel_case() {
        let options = ScopedAmdOptions::from_json(json!({
            "scopeDependencyName": "myScope",
            "requireAsWrapper": true
        }))
        .unwrap();
        assert_eq!(options.scope_dependency_name, "myScope");
        assert!(options.require_as_wrapper);
    }

    #[test]
    fn test_missing_scope_dependency_name_is_rejected() {
        let err = ScopedAmdOptions::from_json(json!({})).unwrap_err();
        assert!(matches!(err, ScopedAmdError::InvalidConfiguration { .. }));
        assert!(ScopedAmdOptions::new("").is_err());
    }

    #[test]
    fn test_named_library_conflicts_with_require_wrapper() {
        let options = ScopedAmdOptions::new("scope")
            .unwrap()
            .with_require_as_wrapper(true);
        let library = LibraryOptions {
            name: Some(LibraryName::Plain("lib".to_string())),
            library_type: None,
        };
        let err = options.parse_library_name(&library).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("requireAsWrapper"));
    }

    #[test]
    fn test_structured_library_name_is_rejected() {
        let options = ScopedAmdOptions::new("scope").unwrap();
        let build = BuildOptions::from_json(json!({
            "library": { "name": { "root": "Lib", "amd": "lib" } }
        }))
        .unwrap();
        let err = options.parse_library_name(&build.library).unwrap_err();
        assert!(err.to_string().contains("simple string"));
    }

    #[test]
    fn test_target_name_resolution() {
        let build = BuildOptions::from_json(json!({ "target": ["async-node", "web"] })).unwrap();
        assert_eq!(build.resolve_target().unwrap(), Target::Server);

        let build = BuildOptions::from_json(json!({ "loaderTarget": "webworker" })).unwrap();
        assert_eq!(build.resolve_target().unwrap(), Target::WebWorker);

        assert_eq!(BuildOptions::default().resolve_target().unwrap(), Target::Web);
    }
}

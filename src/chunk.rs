//! What the host compiler hands to the wrapper for each output chunk.

use crate::error::{Result, ScopedAmdError};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

lazy_static::lazy_static! {
    static ref LEADING_NON_IDENTIFIER: Regex = Regex::new(r"^[^a-zA-Z$_]").unwrap();
    static ref NON_IDENTIFIER_RUN: Regex = Regex::new(r"[^a-zA-Z0-9$]+").unwrap();
    static ref PATH_PLACEHOLDER: Regex =
        Regex::new(r"\[(name|id|chunkhash|contenthash|fullhash|hash)(?::(\d+))?\]").unwrap();
}

/// Turns an arbitrary string into a JavaScript identifier fragment.
pub fn to_identifier(value: &str) -> String {
    let head = LEADING_NON_IDENTIFIER.replace(value, "_");
    NON_IDENTIFIER_RUN.replace_all(&head, "_").into_owned()
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXTERNALS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalRequest {
    Name(String),
    ByType {
        #[serde(default)]
        amd: Option<String>,
        #[serde(default)]
        commonjs: Option<String>,
        #[serde(default)]
        root: Option<String>,
        #[serde(default)]
        default: Option<String>,
    },
}

impl ExternalRequest {
    /// The name an AMD loader has to resolve for this external.
    pub fn import_name(&self) -> Option<&str> {
        match self {
            ExternalRequest::Name(name) => Some(name),
            ExternalRequest::ByType {
                amd,
                commonjs,
                root,
                default,
            } => amd
                .as_deref()
                .or(commonjs.as_deref())
                .or(root.as_deref())
                .or(default.as_deref()),
        }
    }
}

/// An external module of the chunk as the host module graph reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalModule {
    pub module_id: String,
    pub request: ExternalRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDependency {
    pub import_name: String,
    pub argument_identifier: String,
}

impl ExternalDependency {
    pub fn from_module(module: &ExternalModule) -> Result<Self> {
        let import_name = module.request.import_name().ok_or_else(|| {
            ScopedAmdError::invalid_configuration(
                "externals",
                format!("external module {} has no amd request", module.module_id),
            )
        })?;
        Ok(Self {
            import_name: import_name.to_string(),
            argument_identifier: format!(
                "__WEBPACK_EXTERNAL_MODULE_{}__",
                to_identifier(&module.module_id)
            ),
        })
    }

    /// The parameter synthesized when the chunk needs a scope that none of its
    /// externals provides.
    pub fn synthetic_scope(scope_dependency_name: &str) -> Self {
        Self {
            import_name: scope_dependency_name.to_string(),
            argument_identifier: format!(
                "__SCOPED_AMD_EXTERNAL_MODULE_{}__",
                to_identifier(scope_dependency_name)
            ),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHUNK INPUT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub full_hash: Option<String>,
    /// The chunk carries its own runtime bootstrap (entry chunks).
    #[serde(default)]
    pub has_runtime: bool,
    /// The chunk runtime contains chunk-loading glue that touches host
    /// globals. `None` when the host cannot tell.
    #[serde(default)]
    pub runtime_glue: Option<bool>,
    #[serde(default)]
    pub externals: Vec<ExternalModule>,
    pub source: String,
}

impl ChunkInput {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_runtime_glue(mut self, runtime_glue: bool) -> Self {
        self.runtime_glue = Some(runtime_glue);
        self
    }

    pub fn with_external(mut self, module_id: &str, request: &str) -> Self {
        self.externals.push(ExternalModule {
            module_id: module_id.to_string(),
            request: ExternalRequest::Name(request.to_string()),
        });
        self
    }

    pub fn external_dependencies(&self) -> Result<Vec<ExternalDependency>> {
        self.externals
            .iter()
            .map(ExternalDependency::from_module)
            .collect()
    }

    /// Substitutes `[name]`, `[id]` and hash placeholders in `template`. Hash
    /// placeholders accept a `:N` length cap.
    pub fn resolve_name_template(&self, template: &str) -> Result<String> {
        let mut missing = None;
        let resolved = PATH_PLACEHOLDER.replace_all(template, |caps: &Captures| {
            let value = match &caps[1] {
                "name" => self.name.as_ref().or(self.id.as_ref()),
                "id" => self.id.as_ref(),
                "chunkhash" => self.hash.as_ref(),
                "contenthash" => self.content_hash.as_ref().or(self.hash.as_ref()),
                _ => self.full_hash.as_ref(),
            };
            match value {
                Some(value) => {
                    let limit = caps
                        .get(2)
                        .and_then(|m| m.as_str().parse::<usize>().ok())
                        .unwrap_or(usize::MAX);
                    value.chars().take(limit).collect::<String>()
                }
                None => {
                    missing.get_or_insert_with(|| caps[0].to_string());
                    String::new()
                }
            }
        });

        match missing {
            Some(placeholder) => Err(ScopedAmdError::invalid_configuration(
                "output.library.name",
                format!("placeholder {} has no value for this chunk", placeholder),
            )),
            None => Ok(resolved.into_owned()),
        }
    }
}

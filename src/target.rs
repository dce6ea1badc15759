//! Build targets understood by the wrapper and the scope factories.

use crate::error::ScopedAmdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    Web,
    WebWorker,
    /// Node-like runtimes with a synchronous `require`.
    Server,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Web, Target::WebWorker, Target::Server];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Web => "web",
            Target::WebWorker => "webworker",
            Target::Server => "node",
        }
    }

    /// Normalizes a raw host target value.
    ///
    /// Any value mentioning `node` (`node`, `async-node`, `node14.17`, ...) is a
    /// server target. Other values are passed through untouched and validated
    /// by [`Target::from_str`].
    pub fn normalize(raw: &str) -> String {
        if raw.contains("node") {
            Target::Server.as_str().to_string()
        } else {
            raw.to_string()
        }
    }
}

impl FromStr for Target {
    type Err = ScopedAmdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "web" => Ok(Target::Web),
            "webworker" | "web-worker" => Ok(Target::WebWorker),
            "node" | "server" => Ok(Target::Server),
            other => Err(ScopedAmdError::UnsupportedTarget(other.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

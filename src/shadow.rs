//! Shadow bindings: local declarations at the top of the factory body that
//! redirect host globals to the injected scope object.

use crate::target::Target;

/// How a shadowed local reads from the scope argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeAccessor {
    /// The local *is* the scope (`window`, `globalThis`).
    Pointer,
    /// The local is a member of the scope. If the caller left it out, the scope
    /// itself is stored under that member and used instead.
    Namespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowBinding {
    pub local_name: &'static str,
    pub accessor: ScopeAccessor,
}

impl ShadowBinding {
    const fn pointer(local_name: &'static str) -> Self {
        Self {
            local_name,
            accessor: ScopeAccessor::Pointer,
        }
    }

    const fn namespace(local_name: &'static str) -> Self {
        Self {
            local_name,
            accessor: ScopeAccessor::Namespace,
        }
    }

    /// `scope` for pointers, `scope.<name>` for namespaces.
    pub fn scope_accessor_path(&self, scope_argument: &str) -> String {
        match self.accessor {
            ScopeAccessor::Pointer => scope_argument.to_string(),
            ScopeAccessor::Namespace => format!("{}.{}", scope_argument, self.local_name),
        }
    }

    pub fn render(&self, scope_argument: &str) -> String {
        let name = self.local_name;
        match self.accessor {
            ScopeAccessor::Pointer => format!("var {}={};", name, scope_argument),
            ScopeAccessor::Namespace => format!(
                "var {name}=({scope}.{name}={scope}.{name}||{scope});",
                name = name,
                scope = scope_argument
            ),
        }
    }
}

const WEB: &[ShadowBinding] = &[
    ShadowBinding::pointer("globalThis"),
    ShadowBinding::pointer("window"),
    ShadowBinding::namespace("document"),
];

const WEB_WORKER: &[ShadowBinding] = &[
    ShadowBinding::pointer("globalThis"),
    ShadowBinding::namespace("importScripts"),
    ShadowBinding::namespace("location"),
];

const SERVER: &[ShadowBinding] = &[ShadowBinding::namespace("require")];

/// Pointers come before namespaces so a namespace fallback never observes an
/// unshadowed pointer.
pub fn shadow_bindings(target: Target) -> &'static [ShadowBinding] {
    match target {
        Target::Web => WEB,
        Target::WebWorker => WEB_WORKER,
        Target::Server => SERVER,
    }
}

/// Renders the declarations for `target` as a single line of statements.
pub fn create_shadow_statements(scope_argument: &str, target: Target) -> String {
    shadow_bindings(target)
        .iter()
        .map(|binding| binding.render(scope_argument))
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_shadows_pointers_and_document() {
        assert_eq!(
            create_shadow_statements("scope", Target::Web),
            "var globalThis=scope;var window=scope;\
             var document=(scope.document=scope.document||scope);"
        );
    }

    #[test]
    fn test_webworker_shadows_import_scripts_and_location() {
        let statements = create_shadow_statements("s", Target::WebWorker);
        assert!(statements.starts_with("var globalThis=s;"));
        assert!(statements.contains("var importScripts=(s.importScripts=s.importScripts||s);"));
        assert!(statements.contains("var location=(s.location=s.location||s);"));
        assert!(!statements.contains("window"));
    }

    #[test]
    fn test_server_only_shadows_require() {
        let bindings = shadow_bindings(Target::Server);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].local_name, "require");
        assert_eq!(bindings[0].scope_accessor_path("__scope__"), "__scope__.require");
        assert_eq!(
            create_shadow_statements("__scope__", Target::Server),
            "var require=(__scope__.require=__scope__.require||__scope__);"
        );
    }
}

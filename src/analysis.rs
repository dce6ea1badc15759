//! Fallback detection of host-global-dependent runtime glue.
//!
//! Hosts normally report whether a chunk's runtime contains chunk-loading glue
//! (`ChunkInput::runtime_glue`). When they cannot, the compiled body is parsed
//! and checked for free references to the globals the target shadows.

use crate::shadow::shadow_bindings;
use crate::target::Target;
use oxc_allocator::Allocator;
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::collections::HashSet;

/// Returns `true` when `source` reads any of `target`'s shadowed globals
/// without declaring it. Unparsable source is treated as dependent.
pub fn references_host_globals(source: &str, target: Target) -> bool {
    references_any(source, &[target])
}

/// Like [`references_host_globals`], checked against every target's shadowed
/// globals. Used when the build target is not one the wrapper knows.
pub fn references_known_host_globals(source: &str) -> bool {
    references_any(source, &Target::ALL)
}

fn references_any(source: &str, targets: &[Target]) -> bool {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(false);
    let ret = Parser::new(&allocator, source, source_type).parse();

    if !ret.errors.is_empty() {
        log::debug!(
            "compiled body did not parse ({} errors), assuming host globals are used",
            ret.errors.len()
        );
        return true;
    }

    let mut collector = GlobalReferenceCollector::default();
    collector.visit_program(&ret.program);

    targets
        .iter()
        .flat_map(|target| shadow_bindings(*target).iter())
        .any(|binding| {
            collector.references.contains(binding.local_name)
                && !collector.bindings.contains(binding.local_name)
        })
}

#[derive(Default)]
struct GlobalReferenceCollector {
    references: HashSet<String>,
    bindings: HashSet<String>,
}

impl<'a> Visit<'a> for GlobalReferenceCollector {
    fn visit_identifier_reference(&mut self, ident: &oxc_ast::ast::IdentifierReference<'a>) {
        self.references.insert(ident.name.to_string());
    }

    fn visit_binding_identifier(&mut self, ident: &oxc_ast::ast::BindingIdentifier<'a>) {
        self.bindings.insert(ident.name.to_string());
    }
}

//! Scope factories driven by in-memory loaders and the scripted engine.

#[cfg(test)]
mod tests {
    use crate::engine::{ExecutionContext, ScriptEngine};
    use crate::error::{Result, ScopedAmdError};
    use crate::scope::{MemoryFiles, ScopeObject};
    use crate::server_scope::server_scope;
    use crate::target::Target;
    use crate::testkit::{init_logging, ScriptedEngine};
    use crate::web_scope::web_scope;
    use crate::worker_scope::worker_scope;
    use futures_lite::future;
    use serde_json::{json, Value};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    const ROOT: &str = "https://cdn.example.com/app/";

    // ═══════════════════════════════════════════════════════════════════════════════
    // Web
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_web_scope_precreates_root_script() {
        let scope = web_scope(ROOT, MemoryFiles::new(), ScriptedEngine::new());
        let document = scope.document();

        let scripts = document.get_elements_by_tag_name("script");
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].src().as_deref(), Some(ROOT));
        assert!(document
            .current_script()
            .is_some_and(|script| script.same_element(&scripts[0])));
    }

    #[test]
    fn test_appending_non_script_does_not_load() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let loader = move |_: &str| {
            counter.set(counter.get() + 1);
            future::ready(Ok::<_, ScopedAmdError>(String::new()))
        };
        let scope = web_scope(ROOT, loader, ScriptedEngine::new());
        let document = scope.document();

        let div = document.create_element("div");
        div.set_attribute("src", "x");

        assert!(document.head().append_child(&div).is_none());
        assert_eq!(calls.get(), 0);
        assert_eq!(document.get_elements_by_tag_name("div").len(), 1);
    }

    #[test]
    fn test_appending_script_loads_and_evaluates_once() {
        init_logging();
        let requested = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&requested);
        let loader = move |url: &str| {
            log.borrow_mut().push(url.to_string());
            future::ready(Ok::<_, ScopedAmdError>("chunk()".to_string()))
        };
        let engine = ScriptedEngine::new();
        engine.script("chunk()", |context| {
            let window = context.scope("window").map(ScopeObject::target);
            let document = context.scope("document").map(ScopeObject::target);
            assert_eq!(window, Some(Target::Web));
            assert_eq!(document, Some(Target::Web));
            Ok(Value::Null)
        });
        let scope = web_scope(ROOT, loader, Rc::clone(&engine));
        let document = scope.document();

        let script = document.create_element("script");
        script.set_src("x");
        let loaded = Rc::new(Cell::new(false));
        let flag = Rc::clone(&loaded);
        script.set_onload(move || flag.set(true));

        let load = document.head().append_child(&script).unwrap();
        assert_eq!(*requested.borrow(), vec!["x".to_string()]);
        assert!(!loaded.get());

        future::block_on(load).unwrap();
        assert!(loaded.get());
        assert_eq!(requested.borrow().len(), 1);
        assert_eq!(engine.executed(), vec!["chunk()".to_string()]);
    }

    #[test]
    fn test_script_loads_complete_out_of_order() {
        let loader = |url: &str| {
            let url = url.to_string();
            async move {
                let delay = if url.ends_with("slow.js") { 8 } else { 0 };
                for _ in 0..delay {
                    future::yield_now().await;
                }
                Ok::<_, ScopedAmdError>(url.trim_end_matches(".js").to_string())
            }
        };
        let finished = Rc::new(RefCell::new(Vec::new()));
        let engine = ScriptedEngine::new();
        for name in ["slow", "fast"] {
            let finished = Rc::clone(&finished);
            engine.script(name, move |_| {
                finished.borrow_mut().push(name);
                Ok(Value::Null)
            });
        }
        let scope = web_scope(ROOT, loader, engine);
        let document = scope.document();
        let head = document.head();

        let slow = document.create_element("script");
        slow.set_src("slow.js");
        let fast = document.create_element("script");
        fast.set_src("fast.js");

        let slow_load = head.append_child(&slow).unwrap();
        let fast_load = head.append_child(&fast).unwrap();
        let (slow_result, fast_result) = future::block_on(future::zip(slow_load, fast_load));

        assert!(slow_result.is_ok());
        assert!(fast_result.is_ok());
        assert_eq!(*finished.borrow(), vec!["fast", "slow"]);
    }

    #[test]
    fn test_failed_load_only_fires_its_own_onerror() {
        init_logging();
        let files = MemoryFiles::new().with_file("ok.js", "ok()");
        let engine = ScriptedEngine::new();
        engine.script("ok()", |_| Ok(Value::Null));
        let scope = web_scope(ROOT, files, engine);
        let document = scope.document();
        let head = document.head();

        let events = Rc::new(RefCell::new(Vec::new()));
        let watch = |src: &'static str| {
            let script = document.create_element("script");
            script.set_src(src);
            let on_load = Rc::clone(&events);
            script.set_onload(move || on_load.borrow_mut().push(format!("load {}", src)));
            let on_error = Rc::clone(&events);
            script.set_onerror(move |err: &ScopedAmdError| {
                on_error.borrow_mut().push(format!("error {}: {}", src, err))
            });
            script
        };
        let missing = watch("missing.js");
        let ok = watch("ok.js");

        let missing_result = future::block_on(head.append_child(&missing).unwrap());
        let ok_result = future::block_on(head.append_child(&ok).unwrap());

        assert_eq!(
            missing_result.unwrap_err(),
            ScopedAmdError::load("missing.js", "no such file")
        );
        assert!(ok_result.is_ok());
        assert_eq!(
            *events.borrow(),
            vec![
                "error missing.js: failed loading missing.js: no such file".to_string(),
                "load ok.js".to_string(),
            ]
        );
    }

    #[test]
    fn test_evaluation_failure_reaches_onerror() {
        let files = MemoryFiles::new().with_file("bad.js", "throw()");
        let engine = ScriptedEngine::new();
        engine.script("throw()", |_| Err(ScopedAmdError::Script("boom".into())));
        let scope = web_scope(ROOT, files, engine);
        let document = scope.document();

        let script = document.create_element("script");
        script.set_src("bad.js");
        let failed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&failed);
        script.set_onerror(move |err: &ScopedAmdError| {
            flag.set(matches!(err, ScopedAmdError::Script(_)))
        });

        let result = future::block_on(document.head().append_child(&script).unwrap());

        assert!(result.is_err());
        assert!(failed.get());
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // Web worker
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_worker_location_coerces_to_root() {
        let scope = worker_scope(ROOT, MemoryFiles::new(), ScriptedEngine::new()).unwrap();
        assert_eq!(scope.location().href, ROOT);
        assert_eq!(scope.location().to_string(), ROOT);
    }

    #[test]
    fn test_worker_import_scripts_evaluates_synchronously() {
        let files = MemoryFiles::new().with_file("https://cdn.example.com/app/1.js", "chunk1()");
        let engine = ScriptedEngine::new();
        engine.script("chunk1()", |context| {
            assert!(context.scope("importScripts").is_some());
            assert!(context.scope("location").is_some());
            assert!(context.scope("window").is_none());
            Ok(json!(7))
        });
        let scope = worker_scope(ROOT, files, engine).unwrap();

        assert_eq!(
            scope.import_scripts("https://cdn.example.com/app/1.js").unwrap(),
            json!(7)
        );
    }

    #[test]
    fn test_worker_rejects_root_without_separator() {
        let err = worker_scope("/srv/app", MemoryFiles::new(), ScriptedEngine::new())
            .err()
            .unwrap();
        assert_eq!(err, ScopedAmdError::InvalidRoot("/srv/app".to_string()));

        assert!(worker_scope("https://cdn.example.com", MemoryFiles::new(), ScriptedEngine::new()).is_ok());
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // Server
    // ═══════════════════════════════════════════════════════════════════════════════

    fn exporting(value: Value) -> impl Fn(&ExecutionContext<ScriptedEngine>) -> Result<Value> {
        move |context: &ExecutionContext<ScriptedEngine>| {
            context.module("module").unwrap().set_exports(value.clone());
            Ok(Value::Null)
        }
    }

    #[test]
    fn test_server_require_resolves_against_requiring_module() {
        let files = MemoryFiles::new()
            .with_file("/srv/app/b/index.js", "index()")
            .with_file("/srv/app/b/a.js", "a()");
        let engine = ScriptedEngine::new();
        engine.script("index()", |context| {
            let require = context.require("require").unwrap();
            assert_eq!(require.base(), "/srv/app/b");
            let a = require.call("./a.js")?;
            Ok(json!({ "fromA": a }))
        });
        engine.script("a()", exporting(json!({ "a": 1 })));
        let scope = server_scope("/srv/app/", files, Rc::clone(&engine)).unwrap();

        let exports = scope.require("./b/index.js").unwrap();

        assert_eq!(exports, json!({ "fromA": { "a": 1 } }));
    }

    #[test]
    fn test_server_require_caches_modules() {
        let files = MemoryFiles::new().with_file("/srv/app/a.js", "a()");
        let engine = ScriptedEngine::new();
        engine.script("a()", exporting(json!("a")));
        let scope = server_scope("/srv/app/", files, Rc::clone(&engine)).unwrap();

        assert_eq!(scope.require("./a.js").unwrap(), json!("a"));
        assert_eq!(scope.require("a.js").unwrap(), json!("a"));
        assert_eq!(engine.executed().len(), 1);
    }

    #[test]
    fn test_server_require_falls_back_to_completion_value() {
        let files = MemoryFiles::new().with_file("/srv/app/a.js", "a()");
        let engine = ScriptedEngine::new();
        engine.script("a()", |_| Ok(json!(3)));
        let scope = server_scope("/srv/app/", files, engine).unwrap();

        assert_eq!(scope.require("./a.js").unwrap(), json!(3));
    }

    #[test]
    fn test_server_require_does_not_cache_failures() {
        let files = MemoryFiles::new().with_file("/srv/app/boom.js", "boom()");
        let engine = ScriptedEngine::new();
        engine.script("boom()", |_| Err(ScopedAmdError::Script("boom".into())));
        let scope = server_scope("/srv/app/", files, Rc::clone(&engine)).unwrap();

        assert!(scope.require("./boom.js").is_err());
        assert!(scope.require("./boom.js").is_err());
        assert_eq!(engine.executed().len(), 2);
    }

    #[test]
    fn test_server_require_reports_cycles() {
        let files = MemoryFiles::new()
            .with_file("/srv/app/a.js", "a()")
            .with_file("/srv/app/b.js", "b()");
        let engine = ScriptedEngine::new();
        engine.script("a()", |context| context.require("require").unwrap().call("./b.js"));
        engine.script("b()", |context| context.require("require").unwrap().call("./a.js"));
        let scope = server_scope("/srv/app/", files, engine).unwrap();

        let err = scope.require("./a.js").unwrap_err();
        assert!(err.to_string().contains("circular require of /srv/app/a.js"));
    }

    #[test]
    fn test_server_require_rejects_invalid_paths() {
        let scope = server_scope("/srv/app/", MemoryFiles::new(), ScriptedEngine::new()).unwrap();

        assert_eq!(
            scope.require("./x/../a").unwrap_err(),
            ScopedAmdError::InvalidPath("./x/../a".to_string())
        );
    }

    #[test]
    fn test_server_rejects_root_without_separator() {
        assert_eq!(
            server_scope("/srv/app", MemoryFiles::new(), ScriptedEngine::new())
                .err()
                .unwrap(),
            ScopedAmdError::InvalidRoot("/srv/app".to_string())
        );
    }

    #[test]
    fn test_server_require_with_url_root() {
        let files = MemoryFiles::new()
            .with_file("https://cdn.example.com/app/index.js", "index()")
            .with_file("https://cdn.example.com/app/1.js", "chunk1()");
        let engine = ScriptedEngine::new();
        engine.script("index()", |context| context.require("require").unwrap().call("./1.js"));
        engine.script("chunk1()", exporting(json!(1)));
        let scope = server_scope(ROOT, files, engine).unwrap();

        assert_eq!(scope.require("index.js").unwrap(), json!(1));
    }

    #[test]
    fn test_chunk_context_binds_require_at_root() {
        let files = MemoryFiles::new().with_file("/srv/app/lib/1.js", "chunk1()");
        let engine = ScriptedEngine::new();
        engine.script("chunk1()", exporting(json!("one")));
        let scope = server_scope("/srv/app/", files, engine).unwrap();
        let context = ScopeObject::from(scope).chunk_context();

        assert_eq!(context.names().collect::<Vec<_>>(), vec!["require"]);
        assert!(context.scope("require").is_none());
        let require = context.require("require").unwrap();
        assert_eq!(require.base(), "/srv/app/");
        assert_eq!(require.call("./lib/1.js").unwrap(), json!("one"));
    }

    #[test]
    fn test_scripted_engine_rejects_unknown_source() {
        let engine = ScriptedEngine::new();
        let context = ExecutionContext::new();
        assert!(engine.execute("unknown()", &context).is_err());
    }
}

//! Web scope: just enough `document` for script-tag chunk loading.

use crate::engine::ScriptEngine;
use crate::error::{Result, ScopedAmdError};
use crate::scope::{LoadContent, ScopeObject};
use futures_lite::future::BoxedLocal;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Completion of one script load. Loads are independent: they may be polled
/// concurrently and finish in any order.
pub type ScriptLoad = BoxedLocal<Result<()>>;

type LoadCallback = Box<dyn FnOnce()>;
type ErrorCallback = Box<dyn FnOnce(&ScopedAmdError)>;

struct ElementInner {
    tag: String,
    attributes: RefCell<BTreeMap<String, String>>,
    src: RefCell<Option<String>>,
    onload: RefCell<Option<LoadCallback>>,
    onerror: RefCell<Option<ErrorCallback>>,
}

/// A fabricated DOM element. Clones share the same element.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                tag: tag.to_string(),
                attributes: RefCell::new(BTreeMap::new()),
                src: RefCell::new(None),
                onload: RefCell::new(None),
                onerror: RefCell::new(None),
            }),
        }
    }

    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    pub fn is_script(&self) -> bool {
        self.inner.tag == "script"
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.inner.attributes.borrow().get(name).cloned()
    }

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        self.inner
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.into());
    }

    pub fn src(&self) -> Option<String> {
        self.inner.src.borrow().clone()
    }

    pub fn set_src(&self, src: impl Into<String>) {
        *self.inner.src.borrow_mut() = Some(src.into());
    }

    pub fn set_onload(&self, callback: impl FnOnce() + 'static) {
        *self.inner.onload.borrow_mut() = Some(Box::new(callback));
    }

    pub fn set_onerror(&self, callback: impl FnOnce(&ScopedAmdError) + 'static) {
        *self.inner.onerror.borrow_mut() = Some(Box::new(callback));
    }

    pub fn same_element(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn fire_load(&self) {
        let callback = self.inner.onload.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn fire_error(&self, error: &ScopedAmdError) {
        let callback = self.inner.onerror.borrow_mut().take();
        if let Some(callback) = callback {
            callback(error);
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.inner.tag)
            .field("src", &self.inner.src.borrow())
            .field("attributes", &self.inner.attributes.borrow())
            .finish()
    }
}

struct WebScopeInner<E: ScriptEngine> {
    root: String,
    elements: RefCell<Vec<Element>>,
    loader: Box<dyn LoadContent>,
    engine: Rc<E>,
}

pub struct WebScope<E: ScriptEngine> {
    inner: Rc<WebScopeInner<E>>,
}

impl<E: ScriptEngine> Clone for WebScope<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Builds a web scope.
///
/// `root` becomes the `src` of a pre-created script element so runtime code
/// looking for its own script tag finds one.
pub fn web_scope<E: ScriptEngine>(
    root: &str,
    loader: impl LoadContent + 'static,
    engine: Rc<E>,
) -> WebScope<E> {
    let scope = WebScope {
        inner: Rc::new(WebScopeInner {
            root: root.to_string(),
            elements: RefCell::new(Vec::new()),
            loader: Box::new(loader),
            engine,
        }),
    };
    scope.document().create_element("script").set_src(root);
    scope
}

impl<E: ScriptEngine> WebScope<E> {
    pub fn root(&self) -> &str {
        &self.inner.root
    }

    pub fn document(&self) -> Document<E> {
        Document {
            scope: self.clone(),
        }
    }

    /// Starts loading right away; the returned future finishes the load.
    fn load_script(&self, element: Element) -> ScriptLoad {
        let scope = self.clone();
        let src = element
            .src()
            .or_else(|| element.get_attribute("src"))
            .unwrap_or_default();
        let content = if src.is_empty() {
            Err(ScopedAmdError::load(&src, "script element has no src"))
        } else {
            Ok(self.inner.loader.load(&src))
        };

        Box::pin(async move {
            let result = match content {
                Ok(content) => match content.await {
                    Ok(payload) => scope.evaluate(&payload),
                    Err(err) => Err(err),
                },
                Err(err) => Err(err),
            };
            match &result {
                Ok(()) => element.fire_load(),
                Err(err) => {
                    log::error!("failed loading script {}: {}", src, err);
                    element.fire_error(err);
                }
            }
            result
        })
    }

    fn evaluate(&self, payload: &str) -> Result<()> {
        let context = ScopeObject::Web(self.clone()).chunk_context();
        self.inner.engine.execute(payload, &context)?;
        Ok(())
    }
}

/// The `document` of a [`WebScope`].
pub struct Document<E: ScriptEngine> {
    scope: WebScope<E>,
}

impl<E: ScriptEngine> Document<E> {
    pub fn create_element(&self, tag: &str) -> Element {
        let element = Element::new(tag);
        self.scope
            .inner
            .elements
            .borrow_mut()
            .push(element.clone());
        element
    }

    pub fn get_elements_by_tag_name(&self, tag: &str) -> Vec<Element> {
        self.scope
            .inner
            .elements
            .borrow()
            .iter()
            .filter(|element| element.tag() == tag)
            .cloned()
            .collect()
    }

    /// The pre-created script element standing for the running bundle.
    pub fn current_script(&self) -> Option<Element> {
        self.scope.inner.elements.borrow().first().cloned()
    }

    pub fn head(&self) -> Head<E> {
        Head {
            scope: self.scope.clone(),
        }
    }
}

pub struct Head<E: ScriptEngine> {
    scope: WebScope<E>,
}

impl<E: ScriptEngine> Head<E> {
    /// Appending a script element starts loading its `src`; the returned load
    /// evaluates the payload and then runs `onload` or `onerror`. Other
    /// elements are accepted without side effects.
    pub fn append_child(&self, element: &Element) -> Option<ScriptLoad> {
        if element.is_script() {
            Some(self.scope.load_script(element.clone()))
        } else {
            None
        }
    }
}

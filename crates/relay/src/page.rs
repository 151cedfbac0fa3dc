//! Page context and its single-threaded host.
//!
//! `scraper::Html` is not `Send`, and the snapshot/resolve lifecycle wants
//! a single event queue per context anyway: the document, the reference
//! registry and the input port all live on one dedicated thread, and every
//! operation is a message with a oneshot reply.

use scraper::{ElementRef, Html};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use aria_snapshot::{build_snapshot, render_snapshot, resolve_target, RefRegistry};
use aria_snapshot::roles::INTERACTIVE_TAGS;
use selector_synth::synthesize;

use crate::errors::RelayError;
use crate::input::{DomInput, InputPort};

/// `ref` / `selector` pair accepted by every interactive tool.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Target {
    #[serde(rename = "ref")]
    pub ref_token: Option<String>,
    pub selector: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SnapshotReply {
    pub generation: u32,
    pub text: String,
    pub ref_count: usize,
}

/// What an action handler reports back about the element it touched.
#[derive(Clone, Debug)]
pub struct ActionReply {
    pub role: String,
    pub name: Option<String>,
    pub selector: String,
}

enum PageCommand {
    SetContent {
        html: String,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        scope: Option<String>,
        reply: oneshot::Sender<Result<SnapshotReply, RelayError>>,
    },
    Click {
        target: Target,
        reply: oneshot::Sender<Result<ActionReply, RelayError>>,
    },
    TypeText {
        target: Target,
        text: String,
        reply: oneshot::Sender<Result<ActionReply, RelayError>>,
    },
    SelectOptions {
        target: Target,
        values: Vec<String>,
        reply: oneshot::Sender<Result<ActionReply, RelayError>>,
    },
    TypedValue {
        target: Target,
        reply: oneshot::Sender<Result<Option<String>, RelayError>>,
    },
}

/// Async handle to the page thread.
#[derive(Clone)]
pub struct PageHost {
    tx: mpsc::Sender<PageCommand>,
}

impl PageHost {
    /// Spawn a page context around `initial_html`.
    pub fn spawn(initial_html: String) -> Self {
        let (tx, mut rx) = mpsc::channel::<PageCommand>(32);
        std::thread::Builder::new()
            .name("tabwire-page".to_string())
            .spawn(move || {
                let mut ctx = PageContext::new(&initial_html);
                while let Some(cmd) = rx.blocking_recv() {
                    ctx.handle(cmd);
                }
                debug!(target: "tabwire-relay", "page thread draining, host dropped");
            })
            .expect("spawn page thread");
        Self { tx }
    }

    async fn send<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, RelayError>>) -> PageCommand,
    ) -> Result<T, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RelayError::PageGone)?;
        reply_rx.await.map_err(|_| RelayError::PageGone)?
    }

    /// Replace the document, retiring every outstanding reference.
    pub async fn set_content(&self, html: String) -> Result<(), RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PageCommand::SetContent {
                html,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RelayError::PageGone)?;
        reply_rx.await.map_err(|_| RelayError::PageGone)
    }

    pub async fn snapshot(&self, scope: Option<String>) -> Result<SnapshotReply, RelayError> {
        self.send(|reply| PageCommand::Snapshot { scope, reply }).await
    }

    pub async fn click(&self, target: Target) -> Result<ActionReply, RelayError> {
        self.send(|reply| PageCommand::Click { target, reply }).await
    }

    pub async fn type_text(&self, target: Target, text: String) -> Result<ActionReply, RelayError> {
        self.send(|reply| PageCommand::TypeText {
            target,
            text,
            reply,
        })
        .await
    }

    pub async fn select_options(
        &self,
        target: Target,
        values: Vec<String>,
    ) -> Result<ActionReply, RelayError> {
        self.send(|reply| PageCommand::SelectOptions {
            target,
            values,
            reply,
        })
        .await
    }

    /// Most recent text typed into the element, for tests and debugging.
    pub async fn typed_value(&self, target: Target) -> Result<Option<String>, RelayError> {
        self.send(|reply| PageCommand::TypedValue { target, reply }).await
    }
}

struct PageContext {
    dom: Html,
    registry: RefRegistry,
    input: Box<dyn InputPort>,
}

impl PageContext {
    fn new(html: &str) -> Self {
        Self {
            dom: Html::parse_document(html),
            registry: RefRegistry::new(),
            input: Box::new(DomInput::new()),
        }
    }

    fn handle(&mut self, cmd: PageCommand) {
        match cmd {
            PageCommand::SetContent { html, reply } => {
                self.dom = Html::parse_document(&html);
                // Old node handles point into the discarded tree; retire
                // every token rather than risk an index landing on the
                // wrong element in the new one.
                self.registry.begin_generation();
                self.input = Box::new(DomInput::new());
                info!(target: "tabwire-relay", "document replaced");
                let _ = reply.send(());
            }
            PageCommand::Snapshot { scope, reply } => {
                let _ = reply.send(self.snapshot(scope.as_deref()));
            }
            PageCommand::Click { target, reply } => {
                let _ = reply.send(self.click(&target));
            }
            PageCommand::TypeText {
                target,
                text,
                reply,
            } => {
                let _ = reply.send(self.type_text(&target, &text));
            }
            PageCommand::SelectOptions {
                target,
                values,
                reply,
            } => {
                let _ = reply.send(self.select_options(&target, &values));
            }
            PageCommand::TypedValue { target, reply } => {
                let result = self
                    .resolve(&target)
                    .map(|el| el.id())
                    .map(|id| self.input.value_of(id).map(str::to_string));
                let _ = reply.send(result);
            }
        }
    }

    fn snapshot(&mut self, scope: Option<&str>) -> Result<SnapshotReply, RelayError> {
        let snapshot = build_snapshot(&self.dom, &mut self.registry, scope)?;
        let text = render_snapshot(&self.dom, &self.registry, &snapshot);
        Ok(SnapshotReply {
            generation: snapshot.generation,
            text,
            ref_count: self.registry.len(),
        })
    }

    fn resolve(&self, target: &Target) -> Result<ElementRef<'_>, RelayError> {
        resolve_target(
            &self.dom,
            &self.registry,
            target.ref_token.as_deref(),
            target.selector.as_deref(),
        )
        .map_err(RelayError::from)
    }

    fn click(&mut self, target: &Target) -> Result<ActionReply, RelayError> {
        let el = self.resolve(target)?;
        if !is_interactive(el) {
            return Err(wrong_kind("click", "an interactive element", el));
        }
        let reply = self.describe(el);
        let id = el.id();
        self.input.click(id);
        debug!(target: "tabwire-relay", selector = %reply.selector, "clicked");
        Ok(reply)
    }

    fn type_text(&mut self, target: &Target, text: &str) -> Result<ActionReply, RelayError> {
        let el = self.resolve(target)?;
        if !accepts_text(el) {
            return Err(wrong_kind("type", "a text input", el));
        }
        let reply = self.describe(el);
        let id = el.id();
        self.input.type_text(id, text);
        debug!(target: "tabwire-relay", selector = %reply.selector, "typed text");
        Ok(reply)
    }

    fn select_options(
        &mut self,
        target: &Target,
        values: &[String],
    ) -> Result<ActionReply, RelayError> {
        let el = self.resolve(target)?;
        if el.value().name() != "select" {
            return Err(wrong_kind("select", "a <select> element", el));
        }
        for value in values {
            if !has_option(el, value) {
                return Err(RelayError::BadArgs(format!(
                    "no option matching {value:?}"
                )));
            }
        }
        let reply = self.describe(el);
        let id = el.id();
        self.input.select(id, values);
        debug!(target: "tabwire-relay", selector = %reply.selector, "selected options");
        Ok(reply)
    }

    fn describe(&self, el: ElementRef<'_>) -> ActionReply {
        let role = aria_snapshot::roles::resolve_role(el);
        let name = aria_snapshot::name::accessible_name(&self.dom, el, &role);
        let selector = synthesize(&self.dom, el).selector;
        ActionReply {
            role,
            name,
            selector,
        }
    }
}

fn is_interactive(el: ElementRef<'_>) -> bool {
    let element = el.value();
    INTERACTIVE_TAGS.contains(&element.name())
        || element.attr("role").is_some()
        || element.attr("onclick").is_some()
        || element.attr("tabindex").is_some()
}

fn accepts_text(el: ElementRef<'_>) -> bool {
    let element = el.value();
    match element.name() {
        "textarea" => true,
        "input" => !matches!(
            element.attr("type").unwrap_or("text"),
            "checkbox" | "radio" | "button" | "submit" | "reset" | "image"
        ),
        _ => matches!(
            element.attr("role"),
            Some("textbox") | Some("searchbox") | Some("combobox") | Some("spinbutton")
        ),
    }
}

fn has_option(select: ElementRef<'_>, value: &str) -> bool {
    select
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "option")
        .any(|opt| {
            opt.value().attr("value") == Some(value)
                || aria_snapshot::name::normalize_ws(&opt.text().collect::<String>()) == value
        })
}

fn wrong_kind(action: &'static str, expected: &'static str, el: ElementRef<'_>) -> RelayError {
    warn!(target: "tabwire-relay", action, tag = el.value().name(), "wrong element kind");
    RelayError::WrongElementKind {
        action,
        expected,
        found: el.value().name().to_string(),
    }
}

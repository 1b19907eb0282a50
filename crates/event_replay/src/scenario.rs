//! Scripted scenarios replayed against an [`EventDispatcher`].
//!
//! A scenario declares listeners (recording closures or container-resolved
//! classes) and a list of steps. Replaying it returns the order in which
//! listeners fired and the response of every dispatch.

use async_trait::async_trait;
use event_dispatcher::{
    DispatchError, DispatcherStats, Event, EventDispatcher, ListenerTarget, Payload,
    ServiceContainer,
};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

type FiredLog = Arc<Mutex<Vec<String>>>;

fn default_methods() -> Vec<String> {
    vec!["handle".to_string()]
}

/// A complete replay script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    #[serde(default)]
    pub listeners: Vec<ListenerDef>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A listener class the scenario container can build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    /// Methods instances expose; `handle` unless given
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    /// Whether instances can be invoked directly
    #[serde(default)]
    pub invocable: bool,
    /// Value every method returns
    #[serde(default)]
    pub returns: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    /// A closure that records the call under `label` and returns `returns`
    #[default]
    Record,
    /// `label` is a class listener string, `Class` or `Class@method`
    Class,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerDef {
    pub pattern: String,
    pub label: String,
    #[serde(default)]
    pub returns: Option<Value>,
    #[serde(default)]
    pub kind: ListenerKind,
}

/// One scripted operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Dispatch {
        event: String,
        #[serde(default)]
        payload: Payload,
    },
    Until {
        event: String,
        #[serde(default)]
        payload: Payload,
    },
    Push {
        event: String,
        #[serde(default)]
        payload: Payload,
    },
    Flush {
        event: String,
    },
    Forget {
        pattern: String,
    },
    ForgetPushed,
    Defer {
        /// Only buffer these events; everything when absent
        #[serde(default)]
        events: Option<Vec<String>>,
        #[serde(default)]
        steps: Vec<Step>,
    },
}

/// What a replay observed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Listener invocations in the order they happened
    pub fired: Vec<String>,
    /// Response of each `dispatch` and `until` step, in step order
    pub responses: Vec<String>,
    pub stats: DispatcherStats,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self, DispatchError> {
        Ok(toml::from_str(content)?)
    }

    pub async fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(Self::from_toml_str(&content)?)
    }
}

/// Listener instance built by the scenario container.
struct ReplayTarget {
    class: String,
    methods: Vec<String>,
    invocable: bool,
    returns: Option<Value>,
    fired: FiredLog,
}

impl ReplayTarget {
    fn record(&self, entry: String) {
        self.fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

#[async_trait]
impl ListenerTarget for ReplayTarget {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn has_method(&self, method: &str) -> bool {
        self.methods.iter().any(|known| known == method)
    }

    async fn call(
        &self,
        method: &str,
        event: &Event,
        _payload: &Payload,
    ) -> Result<Option<Value>, DispatchError> {
        self.record(format!("{}@{}:{}", self.class, method, event.name()));
        Ok(self.returns.clone())
    }

    fn is_invocable(&self) -> bool {
        self.invocable
    }

    async fn invoke(&self, event: &Event, _payload: &Payload) -> Result<Option<Value>, DispatchError> {
        self.record(format!("{}:{}", self.class, event.name()));
        Ok(self.returns.clone())
    }
}

fn build_container(classes: &[ClassDef], fired: &FiredLog) -> ServiceContainer {
    let container = ServiceContainer::new();
    for class in classes {
        let def = class.clone();
        let fired = fired.clone();
        container.bind(&class.name, move || {
            Arc::new(ReplayTarget {
                class: def.name.clone(),
                methods: def.methods.clone(),
                invocable: def.invocable,
                returns: def.returns.clone(),
                fired: fired.clone(),
            }) as Arc<dyn ListenerTarget>
        });
    }
    container
}

/// `label:event`, followed by the payload arguments in parentheses if any
fn describe_call(label: &str, event: &Event, payload: &Payload) -> String {
    let mut entry = format!("{}:{}", label, event.name());
    if !payload.is_empty() {
        let args: Vec<String> = payload
            .iter()
            .map(|arg| match arg {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect();
        entry.push_str(&format!("({})", args.join(",")));
    }
    entry
}

fn register_listeners(events: &EventDispatcher, listeners: &[ListenerDef], fired: &FiredLog) {
    for def in listeners {
        match def.kind {
            ListenerKind::Record => {
                let fired = fired.clone();
                let label = def.label.clone();
                let returns = def.returns.clone();
                events.listen_fn(&def.pattern, move |event, payload| {
                    fired
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(describe_call(&label, event, payload));
                    returns.clone()
                });
            }
            ListenerKind::Class => events.listen(&def.pattern, def.label.as_str()),
        }
    }
}

/// Replays `scenario` on `events` and reports what happened.
///
/// Classes declared by the scenario are bound into a fresh container that is
/// installed on `events`.
pub async fn run_scenario(
    events: &EventDispatcher,
    scenario: &Scenario,
) -> Result<ReplayReport, DispatchError> {
    let fired: FiredLog = Arc::new(Mutex::new(Vec::new()));

    if !scenario.classes.is_empty() {
        events.set_container(Arc::new(build_container(&scenario.classes, &fired)));
    }
    register_listeners(events, &scenario.listeners, &fired);
    info!(
        "🎬 Replaying {} steps against {} listeners",
        scenario.steps.len(),
        scenario.listeners.len()
    );

    let mut responses = Vec::new();
    run_steps(events, &scenario.steps, &mut responses).await?;

    let fired = std::mem::take(&mut *fired.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(ReplayReport {
        fired,
        responses,
        stats: events.stats(),
    })
}

fn run_steps<'a>(
    events: &'a EventDispatcher,
    steps: &'a [Step],
    responses: &'a mut Vec<String>,
) -> BoxFuture<'a, Result<(), DispatchError>> {
    async move {
        for step in steps {
            debug!("▶️ Step {:?}", step);
            match step {
                Step::Dispatch { event, payload } => {
                    let response = events.dispatch(event.as_str(), payload.clone()).await?;
                    responses.push(response.to_string());
                }
                Step::Until { event, payload } => {
                    let response = events.until(event.as_str(), payload.clone()).await?;
                    responses.push(response.to_string());
                }
                Step::Push { event, payload } => events.push(event.as_str(), payload.clone()),
                Step::Flush { event } => events.flush(event).await?,
                Step::Forget { pattern } => events.forget(pattern),
                Step::ForgetPushed => events.forget_pushed(),
                Step::Defer {
                    events: only,
                    steps: nested,
                } => {
                    let responses = &mut *responses;
                    match only {
                        Some(names) => {
                            events
                                .defer_only(names.iter().map(String::as_str), move || {
                                    run_steps(events, nested, responses)
                                })
                                .await?
                        }
                        None => {
                            events
                                .defer(move || run_steps(events, nested, responses))
                                .await?
                        }
                    }
                }
            }
        }
        Ok(())
    }
    .boxed()
}

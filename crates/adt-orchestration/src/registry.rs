//! # Object Kind Registry
//!
//! Maps each [`ObjectKind`] to the executors that implement its lifecycle
//! verbs. The workflow shape is the same for every kind; only the capability
//! table differs. Optional verbs (`validate`, `check`, `activate`) are simply
//! not attempted for kinds that lack them.

use std::collections::HashMap;
use std::sync::Arc;

use adt_client::AdtTransport;
use adt_shared::{ObjectKind, StepName};

use crate::endpoints;
use crate::error::{OrchestrationError, OrchestrationResult};
use crate::executor::{AdtStepExecutor, StepExecutor};

/// Executor set for one object kind.
#[derive(Debug, Clone)]
pub struct ObjectKindCapabilities {
    pub kind: ObjectKind,
    pub validate: Option<Arc<dyn StepExecutor>>,
    pub create: Arc<dyn StepExecutor>,
    pub lock: Arc<dyn StepExecutor>,
    pub update: Arc<dyn StepExecutor>,
    pub check: Option<Arc<dyn StepExecutor>>,
    pub unlock: Arc<dyn StepExecutor>,
    pub activate: Option<Arc<dyn StepExecutor>>,
    pub delete: Arc<dyn StepExecutor>,
}

impl ObjectKindCapabilities {
    /// The ADT REST executors for `kind`, shaped by its endpoint entry.
    pub fn adt(kind: ObjectKind, transport: Arc<dyn AdtTransport>) -> Self {
        let endpoint = endpoints::endpoint(kind);
        let verb = |step: StepName| -> Arc<dyn StepExecutor> {
            Arc::new(AdtStepExecutor::new(step, kind, transport.clone()))
        };

        Self {
            kind,
            validate: Some(verb(StepName::Validate)),
            create: verb(StepName::Create),
            lock: verb(StepName::Lock),
            update: verb(StepName::Update),
            check: endpoint.checkable.then(|| verb(StepName::Check)),
            unlock: verb(StepName::Unlock),
            activate: endpoint.activatable.then(|| verb(StepName::Activate)),
            delete: verb(StepName::Delete),
        }
    }

    /// Executor for `step`, or `None` when the kind does not support it.
    pub fn executor(&self, step: StepName) -> Option<&Arc<dyn StepExecutor>> {
        match step {
            StepName::Validate => self.validate.as_ref(),
            StepName::Create => Some(&self.create),
            StepName::Lock => Some(&self.lock),
            StepName::Update => Some(&self.update),
            StepName::Check => self.check.as_ref(),
            StepName::Unlock => Some(&self.unlock),
            StepName::Activate => self.activate.as_ref(),
            StepName::Delete => Some(&self.delete),
        }
    }

    pub fn supports(&self, step: StepName) -> bool {
        self.executor(step).is_some()
    }

    /// Supported verbs in lifecycle order.
    pub fn supported_steps(&self) -> Vec<StepName> {
        StepName::ALL
            .into_iter()
            .filter(|step| self.supports(*step))
            .collect()
    }
}

/// Kind → capabilities table. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct ObjectKindRegistry {
    entries: HashMap<ObjectKind, Arc<ObjectKindCapabilities>>,
}

impl ObjectKindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every kind, backed by the ADT REST executors.
    pub fn with_adt_defaults(transport: Arc<dyn AdtTransport>) -> Self {
        let mut registry = Self::new();
        for kind in ObjectKind::ALL {
            registry.register(ObjectKindCapabilities::adt(kind, transport.clone()));
        }
        registry
    }

    /// Add or replace the entry for `capabilities.kind`.
    pub fn register(&mut self, capabilities: ObjectKindCapabilities) -> &mut Self {
        self.entries.insert(capabilities.kind, Arc::new(capabilities));
        self
    }

    pub fn resolve(&self, kind: ObjectKind) -> OrchestrationResult<Arc<ObjectKindCapabilities>> {
        self.entries
            .get(&kind)
            .cloned()
            .ok_or_else(|| OrchestrationError::unknown_kind(kind.tag()))
    }

    /// Resolve by tag or ADT type code.
    pub fn resolve_tag(&self, tag: &str) -> OrchestrationResult<Arc<ObjectKindCapabilities>> {
        let kind: ObjectKind = tag
            .parse()
            .map_err(|_| OrchestrationError::unknown_kind(tag))?;
        self.resolve(kind)
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> Vec<ObjectKind> {
        let mut kinds: Vec<ObjectKind> = self.entries.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

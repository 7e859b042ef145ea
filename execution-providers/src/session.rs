//! Session configuration
//!
//! Caller-owned settings that accumulate provider registrations until the
//! session is finalized. Mutation requires `&mut SessionConfig`, so all
//! configuration calls on one session are serialized by ownership; the
//! [`ExecutionProviderDispatch`] returned by [`SessionConfig::finalize`] is an
//! immutable snapshot that can be shared across threads.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{DynExecutionProvider, ExecutionProviderDispatch, RegistrationError, Result};

/// Opaque handle the engine uses to identify a session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(Uuid);

impl SessionHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct SessionConfig {
    handle: SessionHandle,
    providers: Vec<DynExecutionProvider>,
    finalized: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            handle: SessionHandle::new(),
            providers: Vec::new(),
            finalized: false,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    /// Registered providers, highest priority first
    pub fn providers(&self) -> &[DynExecutionProvider] {
        &self.providers
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Snapshot of the current dispatch order
    pub fn dispatch_order(&self) -> ExecutionProviderDispatch {
        ExecutionProviderDispatch::new(self.providers.clone())
    }

    /// Freeze the provider list. Later registrations fail with
    /// [`RegistrationError::SessionAlreadyFinalized`]. Calling it again returns
    /// the same snapshot.
    pub fn finalize(&mut self) -> ExecutionProviderDispatch {
        if !self.finalized {
            self.finalized = true;
            log::debug!(
                "Session {} finalized with {} execution providers",
                self.handle,
                self.providers.len()
            );
        }
        self.dispatch_order()
    }

    pub(crate) fn ensure_configurable(&self) -> Result<()> {
        if self.finalized {
            return Err(RegistrationError::SessionAlreadyFinalized);
        }
        Ok(())
    }

    /// Appends at the lowest priority
    pub(crate) fn push_provider(&mut self, provider: DynExecutionProvider) {
        self.providers.push(provider);
    }
}

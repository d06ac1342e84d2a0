// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The admission gate serializing physical sink writes.

use std::fmt;
use std::io;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::sync::SemaphorePermit;

// Shared by every dispatcher in the process.
static GLOBAL_GATE: Semaphore = Semaphore::const_new(1);

/// How widely sink writes are serialized against each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateScope {
    /// At most one sink write is in flight in the whole process.
    ///
    /// A sink whose write never completes stalls every other sink of every dispatcher.
    #[default]
    Global,
    /// At most one sink write is in flight per dispatcher.
    PerDispatcher,
    /// Each sink serializes its own writes only.
    PerSink,
}

/// A single-permit admission primitive.
#[derive(Clone)]
pub struct AdmissionGate(Gate);

#[derive(Clone)]
enum Gate {
    Global,
    Owned(Arc<Semaphore>),
}

impl AdmissionGate {
    /// The process-wide gate.
    pub fn global() -> AdmissionGate {
        AdmissionGate(Gate::Global)
    }

    /// A new gate, independent of every other.
    pub fn new() -> AdmissionGate {
        AdmissionGate(Gate::Owned(Arc::new(Semaphore::new(1))))
    }

    fn semaphore(&self) -> &Semaphore {
        match &self.0 {
            Gate::Global => &GLOBAL_GATE,
            Gate::Owned(semaphore) => semaphore,
        }
    }

    /// Wait until the permit is free and take it. The permit is released on drop.
    pub async fn admit(&self) -> io::Result<SemaphorePermit<'_>> {
        self.semaphore()
            .acquire()
            .await
            .map_err(|_| io::Error::other("admission gate closed"))
    }

    /// Whether both handles admit through the same permit.
    pub fn same_gate(&self, other: &AdmissionGate) -> bool {
        std::ptr::eq(self.semaphore(), other.semaphore())
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        AdmissionGate::new()
    }
}

impl fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match self.0 {
            Gate::Global => "global",
            Gate::Owned(_) => "owned",
        };
        f.debug_struct("AdmissionGate")
            .field("scope", &scope)
            .field("available", &self.semaphore().available_permits())
            .finish()
    }
}

// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use crate::db::Database;
use crate::identity::IdentityProvider;
use crate::metrics::Metrics;
use crate::storage::ObjectStorage;

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub identity: Arc<dyn IdentityProvider>,
    pub storage: Arc<dyn ObjectStorage>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        identity: Arc<dyn IdentityProvider>,
        storage: Arc<dyn ObjectStorage>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            db,
            identity,
            storage,
            metrics,
        }
    }
}

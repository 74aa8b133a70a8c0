// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Hearth.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::coordinator::StoveCoordinator;

/// Coordinators by device id, owned by the process wiring layer
#[derive(Debug, Default)]
pub struct CoordinatorRegistry {
    coordinators: RwLock<HashMap<String, Arc<StoveCoordinator>>>,
}

impl CoordinatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a coordinator, returning the one it replaced
    pub fn insert(
        &self,
        device_id: impl Into<String>,
        coordinator: Arc<StoveCoordinator>,
    ) -> Option<Arc<StoveCoordinator>> {
        self.coordinators.write().insert(device_id.into(), coordinator)
    }

    pub fn get(&self, device_id: &str) -> Option<Arc<StoveCoordinator>> {
        self.coordinators.read().get(device_id).cloned()
    }

    pub fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.coordinators.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.coordinators.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinators.read().is_empty()
    }

    /// Unregister and shut down a coordinator
    pub async fn remove(&self, device_id: &str) -> Option<Arc<StoveCoordinator>> {
        let removed = self.coordinators.write().remove(device_id);
        if let Some(coordinator) = &removed {
            coordinator.shutdown().await;
            info!(device_id, "Coordinator removed");
        }
        removed
    }

    pub async fn shutdown_all(&self) {
        let drained: Vec<_> = self.coordinators.write().drain().collect();
        for (device_id, coordinator) in drained {
            coordinator.shutdown().await;
            info!(device_id = %device_id, "Coordinator removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoordinatorConfig;
    use crate::test_support::{FakeTransport, ManualClock, RecordingNotifier};
    use chrono::Utc;

    fn coordinator(transport: Arc<FakeTransport>) -> Arc<StoveCoordinator> {
        Arc::new(
            StoveCoordinator::new(
                transport,
                CoordinatorConfig::default(),
                Arc::new(RecordingNotifier::default()),
                Arc::new(ManualClock::new(Utc::now())),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let registry = CoordinatorRegistry::new();
        let transport = Arc::new(FakeTransport::default());
        let stove = coordinator(Arc::clone(&transport));

        assert!(registry.insert("living_room", Arc::clone(&stove)).is_none());
        assert!(Arc::ptr_eq(&registry.get("living_room").unwrap(), &stove));
        assert!(registry.get("kitchen").is_none());
        assert_eq!(registry.device_ids(), vec!["living_room".to_owned()]);

        let removed = registry.remove("living_room").await.unwrap();
        assert!(Arc::ptr_eq(&removed, &stove));
        assert!(registry.is_empty());
        assert_eq!(transport.close_count(), 1);
        assert!(registry.remove("living_room").await.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_all_closes_every_transport() {
        let registry = CoordinatorRegistry::new();
        let first = Arc::new(FakeTransport::default());
        let second = Arc::new(FakeTransport::default());
        registry.insert("a", coordinator(Arc::clone(&first)));
        registry.insert("b", coordinator(Arc::clone(&second)));
        assert_eq!(registry.len(), 2);

        registry.shutdown_all().await;
        assert!(registry.is_empty());
        assert_eq!(first.close_count(), 1);
        assert_eq!(second.close_count(), 1);
    }
}

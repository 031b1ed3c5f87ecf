use std::{collections::BTreeMap, sync::Arc};

use waypoint_specialist::{HttpSpecialistClient, Specialist, SpecialistConfig, SpecialistError};

#[derive(Clone, Default)]
/// Specialist clients keyed by specialist key. Built once at startup and
/// shared read-only by every run.
pub struct SpecialistDirectory {
    clients: BTreeMap<String, Arc<dyn Specialist>>,
}

impl SpecialistDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one HTTP client per config.
    pub fn from_configs(
        configs: impl IntoIterator<Item = SpecialistConfig>,
    ) -> Result<Self, SpecialistError> {
        let mut directory = Self::new();
        for config in configs {
            directory.insert(Arc::new(HttpSpecialistClient::new(config)?));
        }
        Ok(directory)
    }

    pub fn with(mut self, specialist: Arc<dyn Specialist>) -> Self {
        self.insert(specialist);
        self
    }

    pub fn insert(&mut self, specialist: Arc<dyn Specialist>) {
        self.clients.insert(specialist.key().to_string(), specialist);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Specialist>> {
        self.clients.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.clients.keys().cloned().collect()
    }

    pub fn specialists(&self) -> impl Iterator<Item = &Arc<dyn Specialist>> {
        self.clients.values()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl std::fmt::Debug for SpecialistDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecialistDirectory")
            .field("keys", &self.keys())
            .finish()
    }
}

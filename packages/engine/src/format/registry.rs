use std::collections::HashMap;
use std::sync::Arc;

use super::{DefaultFormat, FormatError, IcpcFormat, IoiFormat, ScoringFormat};

/// Format name to strategy, filled at startup.
#[derive(Default, Clone)]
pub struct FormatRegistry {
    formats: HashMap<&'static str, Arc<dyn ScoringFormat>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `default`, `ioi` and `icpc`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for format in [
            Arc::new(DefaultFormat) as Arc<dyn ScoringFormat>,
            Arc::new(IoiFormat),
            Arc::new(IcpcFormat),
        ] {
            // Builtin names are distinct.
            let _ = registry.register(format);
        }
        registry
    }

    pub fn register(&mut self, format: Arc<dyn ScoringFormat>) -> Result<(), FormatError> {
        let name = format.name();
        if self.formats.contains_key(name) {
            return Err(FormatError::AlreadyRegistered(name));
        }
        self.formats.insert(name, format);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ScoringFormat>> {
        self.formats.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.formats.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

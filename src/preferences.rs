/// User preferences persisted as a small JSON file
///
/// Covers the handful of settings the backup document round-trips: theme,
/// whether the intro has been shown, the auto-backup flag, and the last
/// successful backup timestamp.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub intro_shown: bool,
    #[serde(default)]
    pub auto_backup_enabled: bool,
    #[serde(default)]
    pub last_backup_at: Option<String>,
}

fn default_theme() -> String {
    "Normal".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            intro_shown: false,
            auto_backup_enabled: false,
            last_backup_at: None,
        }
    }
}

/// Handle on the preferences file; cheap to clone
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn open(data_dir: &std::path::Path) -> Self {
        Self {
            path: data_dir.join("preferences.json"),
        }
    }

    /// Read the current preferences; a missing or unreadable file yields
    /// the defaults rather than an error
    pub fn load(&self) -> Preferences {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Preferences file is malformed, using defaults: {}", e);
                Preferences::default()
            }),
            Err(_) => Preferences::default(),
        }
    }

    pub fn save(&self, prefs: &Preferences) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(prefs)?;
        std::fs::write(&self.path, json)
    }

    /// Load, apply a mutation, save
    pub fn update<F>(&self, mutate: F) -> std::io::Result<Preferences>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut prefs = self.load();
        mutate(&mut prefs);
        self.save(&prefs)?;
        Ok(prefs)
    }
}

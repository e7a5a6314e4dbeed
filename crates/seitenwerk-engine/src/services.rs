// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine facade for a GUI shell: owns the queue and the persisted
// configuration, and exposes typed enqueue methods. All fields are
// cheaply cloneable so the struct can be passed into UI callbacks.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use seitenwerk_core::EngineConfig;
use seitenwerk_core::error::Result;
use seitenwerk_core::types::{
    ConversionJob, ConversionSettings, JobEvent, JobId, Operation, TargetFormat,
};
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::queue::JobQueue;

const CONFIG_FILE: &str = "config.json";

/// Shared engine services. Clone freely; all clones drive the same queue.
#[derive(Clone)]
pub struct EngineServices {
    queue: Arc<JobQueue>,
    config: Arc<Mutex<EngineConfig>>,
    data_dir: PathBuf,
}

impl EngineServices {
    /// Initialise the engine with the default data directory. Returns the
    /// services handle and the event channel the front-end listens on.
    pub fn init() -> Result<(Self, Receiver<JobEvent>)> {
        Self::init_at(default_data_dir())
    }

    /// Initialise the engine with an explicit data directory (used by
    /// tests and portable installs).
    pub fn init_at(data_dir: PathBuf) -> Result<(Self, Receiver<JobEvent>)> {
        std::fs::create_dir_all(&data_dir)?;
        let config = load_config(&data_dir).unwrap_or_default();

        let (queue, events) = JobQueue::start(Dispatcher::new);
        info!(data_dir = %data_dir.display(), "engine services initialised");

        Ok((
            Self {
                queue: Arc::new(queue),
                config: Arc::new(Mutex::new(config)),
                data_dir,
            },
            events,
        ))
    }

    // -- Enqueue --------------------------------------------------------------

    /// Queue a single-file conversion. `settings` falls back to the
    /// configured defaults.
    pub fn enqueue_convert(
        &self,
        input: PathBuf,
        output: PathBuf,
        format: TargetFormat,
        settings: Option<ConversionSettings>,
    ) -> JobId {
        self.enqueue(
            Operation::Convert {
                input,
                output,
                format,
            },
            settings,
        )
    }

    /// Queue a merge of two or more PDFs.
    pub fn enqueue_merge(
        &self,
        inputs: Vec<PathBuf>,
        output: PathBuf,
        settings: Option<ConversionSettings>,
    ) -> JobId {
        self.enqueue(Operation::Merge { inputs, output }, settings)
    }

    /// Queue a split into one-page files.
    pub fn enqueue_split(
        &self,
        input: PathBuf,
        output_dir: PathBuf,
        settings: Option<ConversionSettings>,
    ) -> JobId {
        self.enqueue(Operation::Split { input, output_dir }, settings)
    }

    /// Queue a folder batch conversion.
    pub fn enqueue_batch(
        &self,
        input_dir: PathBuf,
        output_dir: PathBuf,
        format: TargetFormat,
        settings: Option<ConversionSettings>,
    ) -> JobId {
        self.enqueue(
            Operation::Batch {
                input_dir,
                output_dir,
                format,
            },
            settings,
        )
    }

    fn enqueue(&self, operation: Operation, settings: Option<ConversionSettings>) -> JobId {
        let settings = settings.unwrap_or_else(|| self.default_settings());
        self.queue.enqueue(operation, settings)
    }

    // -- Queue control --------------------------------------------------------

    /// Stop after the current job and discard everything still queued.
    pub fn cancel(&self) {
        self.queue.cancel();
    }

    pub fn pending_count(&self) -> usize {
        self.queue.pending_count()
    }

    pub fn finished_jobs(&self) -> Vec<ConversionJob> {
        self.queue.finished_jobs()
    }

    // -- Config persistence ---------------------------------------------------

    /// Get a clone of the current config.
    pub fn config(&self) -> EngineConfig {
        self.config.lock().expect("config lock poisoned").clone()
    }

    /// Job settings seeded from the current config.
    pub fn default_settings(&self) -> ConversionSettings {
        self.config.lock().expect("config lock poisoned").settings()
    }

    /// Update and persist the config.
    pub fn save_config(&self, config: &EngineConfig) -> Result<()> {
        *self.config.lock().expect("config lock poisoned") = config.clone();
        persist_config(&self.data_dir, config)
    }

    /// Path to the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

// -- Config file persistence --------------------------------------------------

fn load_config(data_dir: &Path) -> Option<EngineConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&data).ok()
}

fn persist_config(data_dir: &Path, config: &EngineConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

/// Conventional per-user data directory, overridable via XDG variables.
fn default_data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        std::env::temp_dir()
    };
    base.join("seitenwerk")
}

#[cfg(test)]
mod tests {
    use super::*;
    use seitenwerk_core::types::CollisionPolicy;

    #[test]
    fn config_persists_across_restarts() {
        let dir = tempfile::tempdir().expect("tempdir");

        {
            let (services, _events) =
                EngineServices::init_at(dir.path().to_path_buf()).expect("init");
            let config = EngineConfig {
                default_dpi: 300,
                default_jpeg_quality: 60,
                default_collision: CollisionPolicy::AutoRename,
                write_failure_log: false,
            };
            services.save_config(&config).expect("save");
        }

        let (services, _events) = EngineServices::init_at(dir.path().to_path_buf()).expect("init");
        let config = services.config();
        assert_eq!(config.default_dpi, 300);
        assert_eq!(config.default_jpeg_quality, 60);
        assert_eq!(config.default_collision, CollisionPolicy::AutoRename);
        assert!(!config.write_failure_log);

        // Enqueued jobs inherit the persisted defaults.
        let settings = services.default_settings();
        assert_eq!(settings.render_dpi, 300);
        assert_eq!(settings.collision, CollisionPolicy::AutoRename);
    }

    #[test]
    fn corrupt_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), b"{ not json").expect("seed");

        let (services, _events) = EngineServices::init_at(dir.path().to_path_buf()).expect("init");
        assert_eq!(services.config().default_dpi, 144);
    }
}

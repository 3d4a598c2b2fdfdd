//! Test support utilities for depc-core
//!
//! Provides MockProvider and helpers for unit testing the provisioning
//! pipeline without a real Docker/Podman runtime.

use async_trait::async_trait;
use depc_provider::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records which methods were called on the mock
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Ping,
    ListImages,
    Create {
        image: String,
        name: Option<String>,
        user: Option<String>,
        env: HashMap<String, String>,
        mount_targets: Vec<String>,
        privileged: bool,
        auto_remove: bool,
    },
    Start {
        id: String,
    },
    Remove {
        id: String,
        force: bool,
    },
    StatPath {
        id: String,
        path: String,
    },
    CopyFileFrom {
        id: String,
        src: String,
    },
}

/// Configurable mock container provider for testing
pub struct MockProvider {
    pub provider_type: ProviderType,
    pub calls: Arc<Mutex<Vec<MockCall>>>,
    /// Images returned by list_images
    pub images: Arc<Mutex<Vec<ImageSummary>>>,
    /// Injected error for create calls
    pub create_error: Arc<Mutex<Option<ProviderError>>>,
    /// Injected error for start calls
    pub start_error: Arc<Mutex<Option<ProviderError>>>,
    /// Injected error for remove calls
    pub remove_error: Arc<Mutex<Option<ProviderError>>>,
    /// Injected error for copy_file_from calls
    pub copy_error: Arc<Mutex<Option<ProviderError>>>,
    /// Container-side paths that stat_path reports as present
    pub existing_paths: Arc<Mutex<HashSet<String>>>,
    /// Content written to the destination by copy_file_from, keyed by
    /// container-side source path
    pub copy_contents: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    next_container: AtomicUsize,
}

impl MockProvider {
    /// Create a new mock provider with default success results
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            calls: Arc::new(Mutex::new(Vec::new())),
            images: Arc::new(Mutex::new(Vec::new())),
            create_error: Arc::new(Mutex::new(None)),
            start_error: Arc::new(Mutex::new(None)),
            remove_error: Arc::new(Mutex::new(None)),
            copy_error: Arc::new(Mutex::new(None)),
            existing_paths: Arc::new(Mutex::new(HashSet::new())),
            copy_contents: Arc::new(Mutex::new(HashMap::new())),
            next_container: AtomicUsize::new(1),
        }
    }

    /// Record a call
    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }
}

/// Clone a ProviderError (thiserror types don't implement Clone)
pub fn clone_provider_error(e: &ProviderError) -> ProviderError {
    match e {
        ProviderError::ConnectionError(s) => ProviderError::ConnectionError(s.clone()),
        ProviderError::ContainerNotFound(s) => ProviderError::ContainerNotFound(s.clone()),
        ProviderError::ImageNotFound(s) => ProviderError::ImageNotFound(s.clone()),
        ProviderError::CreateError(s) => ProviderError::CreateError(s.clone()),
        ProviderError::RuntimeError(s) => ProviderError::RuntimeError(s.clone()),
        ProviderError::Unsupported(s) => ProviderError::Unsupported(s.clone()),
        ProviderError::Timeout => ProviderError::Timeout,
        ProviderError::IoError(_) => ProviderError::RuntimeError("IO error (cloned)".into()),
    }
}

fn take_error(slot: &Arc<Mutex<Option<ProviderError>>>) -> Option<ProviderError> {
    slot.lock().unwrap().as_ref().map(clone_provider_error)
}

#[async_trait]
impl ContainerProvider for MockProvider {
    async fn ping(&self) -> Result<()> {
        self.record(MockCall::Ping);
        Ok(())
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        self.record(MockCall::ListImages);
        Ok(self.images.lock().unwrap().clone())
    }

    async fn create(&self, config: &CreateContainerConfig) -> Result<ContainerId> {
        self.record(MockCall::Create {
            image: config.image.clone(),
            name: config.name.clone(),
            user: config.user.clone(),
            env: config.env.clone(),
            mount_targets: config.mounts.iter().map(|m| m.target.clone()).collect(),
            privileged: config.privileged,
            auto_remove: config.auto_remove,
        });
        if let Some(err) = take_error(&self.create_error) {
            return Err(err);
        }
        let n = self.next_container.fetch_add(1, Ordering::SeqCst);
        Ok(ContainerId::new(format!("mock_container_{}", n)))
    }

    async fn start(&self, id: &ContainerId) -> Result<()> {
        self.record(MockCall::Start { id: id.0.clone() });
        match take_error(&self.start_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn remove(&self, id: &ContainerId, force: bool) -> Result<()> {
        self.record(MockCall::Remove {
            id: id.0.clone(),
            force,
        });
        match take_error(&self.remove_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn stat_path(&self, id: &ContainerId, path: &str) -> Result<bool> {
        self.record(MockCall::StatPath {
            id: id.0.clone(),
            path: path.to_string(),
        });
        Ok(self.existing_paths.lock().unwrap().contains(path))
    }

    async fn copy_file_from(&self, id: &ContainerId, src: &str, dest: &Path) -> Result<()> {
        self.record(MockCall::CopyFileFrom {
            id: id.0.clone(),
            src: src.to_string(),
        });
        if let Some(err) = take_error(&self.copy_error) {
            return Err(err);
        }
        let content = self
            .copy_contents
            .lock()
            .unwrap()
            .get(src)
            .cloned()
            .unwrap_or_default();
        std::fs::write(dest, content)?;
        Ok(())
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            provider_type: self.provider_type,
            api_version: "mock".to_string(),
            os: "test".to_string(),
            arch: "test".to_string(),
        }
    }
}

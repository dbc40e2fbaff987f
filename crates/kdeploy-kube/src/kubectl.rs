//! `kubectl` backed cluster client
//!
//! Manifests are streamed to `kubectl apply -f -` / `kubectl delete -f -`.
//! The client remembers what it applied last so that an unchanged manifest
//! is not reported as deployed again.

use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

use kdeploy_core::{ClusterTarget, KubectlFlags, ManifestCollection};

use crate::client::ClusterClient;
use crate::command;
use crate::error::Result;

/// Flag making `kubectl delete` succeed for resources that are already gone
const IGNORE_NOT_FOUND: &str = "--ignore-not-found=true";

/// Cluster client shelling out to `kubectl`
///
/// What kubectl prints (`deployment.apps/web configured`, ...) is copied to
/// the output writer, which discards it unless [`KubectlCli::with_output`]
/// is used.
pub struct KubectlCli {
    program: String,
    namespace: Option<String>,
    kube_context: Option<String>,
    flags: KubectlFlags,
    previous_apply: Mutex<ManifestCollection>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for KubectlCli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubectlCli")
            .field("program", &self.program)
            .field("namespace", &self.namespace)
            .field("kube_context", &self.kube_context)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl KubectlCli {
    /// Create a client for `target` with extra `flags`
    pub fn new(target: &ClusterTarget, flags: KubectlFlags) -> Self {
        Self {
            program: target.kubectl.clone(),
            namespace: target.namespace.clone(),
            kube_context: target.kube_context.clone(),
            flags,
            previous_apply: Mutex::new(ManifestCollection::new()),
            out: Mutex::new(Box::new(std::io::sink())),
        }
    }

    /// Send kubectl's own output to `out`
    pub fn with_output(mut self, out: impl Write + Send + 'static) -> Self {
        self.out = Mutex::new(Box::new(out));
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn kube_context(&self) -> Option<&str> {
        self.kube_context.as_deref()
    }

    /// Full argument list for `command`, reading manifests from stdin
    ///
    /// `[--context C] [--namespace N] <global flags> <command> <command flags> -f -`
    pub fn args(&self, command: &str, command_flags: &[String]) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(context) = &self.kube_context {
            args.push("--context".to_string());
            args.push(context.clone());
        }
        if let Some(namespace) = &self.namespace {
            args.push("--namespace".to_string());
            args.push(namespace.clone());
        }
        args.extend(self.flags.global.iter().cloned());
        args.push(command.to_string());
        args.extend(command_flags.iter().cloned());
        args.push("-f".to_string());
        args.push("-".to_string());
        args
    }

    async fn run(
        &self,
        command: &str,
        command_flags: &[String],
        manifests: &ManifestCollection,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let args: Vec<OsString> = self
            .args(command, command_flags)
            .into_iter()
            .map(OsString::from)
            .collect();

        let output = command::run(&self.program, &args, Some(manifests.to_bytes()), cancel).await?;
        tracing::debug!(command, bytes = output.len(), "kubectl finished");

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(&output).and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "failed to write kubectl output");
        }
        Ok(())
    }

    fn previous_apply(&self) -> std::sync::MutexGuard<'_, ManifestCollection> {
        self.previous_apply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ClusterClient for KubectlCli {
    async fn apply(
        &self,
        manifests: &ManifestCollection,
        cancel: &CancellationToken,
    ) -> Result<ManifestCollection> {
        if manifests.is_empty() {
            return Ok(ManifestCollection::new());
        }

        let updated = manifests.diff(&self.previous_apply());
        if updated.is_empty() {
            tracing::debug!("no manifests changed since the last apply");
            return Ok(updated);
        }

        self.run("apply", &self.flags.apply, manifests, cancel)
            .await?;

        *self.previous_apply() = manifests.clone();
        Ok(updated)
    }

    async fn delete(&self, manifests: &ManifestCollection, cancel: &CancellationToken) -> Result<()> {
        let mut flags = vec![IGNORE_NOT_FOUND.to_string()];
        flags.extend(self.flags.delete.iter().cloned());

        self.run("delete", &flags, manifests, cancel).await?;

        // Deleted resources have to be re-applied in full next time
        *self.previous_apply() = ManifestCollection::new();
        Ok(())
    }
}

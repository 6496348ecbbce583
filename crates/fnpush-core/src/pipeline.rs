//! Pipeline orchestration
//!
//! Runs the four deployment stages in strict order, each gated on the
//! previous one: compile, package, upload, update. No stage is retried, and
//! there is no remote rollback; the only guarantee on failure is that the
//! local build artifact is removed before the run ends.

use camino::Utf8Path;

use crate::archive::package_binary;
use crate::build::CompilerInvoker;
use crate::config::DeploymentTarget;
use crate::remote::{FunctionService, ObjectStore};
use crate::{Error, Result};

/// Orchestrates one build-package-upload-update run
pub struct Pipeline<'a> {
    target: &'a DeploymentTarget,
    invoker: CompilerInvoker,
    store: &'a dyn ObjectStore,
    functions: &'a dyn FunctionService,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline for a resolved deployment target
    pub fn new(
        target: &'a DeploymentTarget,
        invoker: CompilerInvoker,
        store: &'a dyn ObjectStore,
        functions: &'a dyn FunctionService,
    ) -> Self {
        Self {
            target,
            invoker,
            store,
            functions,
        }
    }

    /// Run all stages.
    ///
    /// The local artifact is removed whether or not the stages succeed; a
    /// cleanup failure after an otherwise successful run is itself an error.
    pub async fn run(&self) -> Result<()> {
        let artifact = self.target.artifact_path();

        let outcome = self.execute(&artifact).await;
        let cleanup = remove_artifact(&artifact);

        match (outcome, cleanup) {
            (Ok(()), Ok(())) => {
                tracing::info!("Deployment complete");
                Ok(())
            }
            (Ok(()), Err(e)) => Err(e),
            (Err(e), _) => Err(e),
        }
    }

    async fn execute(&self, artifact: &Utf8Path) -> Result<()> {
        tracing::info!(
            "Building {} for {}",
            self.target.function_name,
            self.target.architecture
        );
        self.invoker.compile(&self.target.source_dir).await?;
        tracing::info!("Build succeeded");

        tracing::info!("Packaging {}", artifact);
        let archive = package_binary(artifact, self.target.architecture)?;

        let key = self.target.object_key();
        tracing::info!("Uploading s3://{}/{}", self.target.bucket, key);
        self.store
            .put_object(&self.target.bucket, &key, archive)
            .await?;

        tracing::info!("Updating function code for {}", self.target.function_name);
        let updated = self
            .functions
            .update_function_code(
                &self.target.function_name,
                &self.target.bucket,
                &key,
                self.target.architecture,
            )
            .await;

        if let Err(e) = updated {
            // The artifact is removed here as well as in run(); the removal
            // is idempotent, and its own errors must not mask the update
            // error.
            let _ = remove_artifact(artifact);
            return Err(e);
        }

        Ok(())
    }
}

/// Remove the build artifact, treating an already-absent file as success
fn remove_artifact(path: &Utf8Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Removed {}", path);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::cleanup(
            format!("Failed to remove {}: {}", path, e),
            "Remove the file manually",
        )),
    }
}

//! Compiler invocation
//!
//! Cross-compiles the function source into a self-contained Linux executable
//! the way Lambda expects: target OS fixed to linux, architecture from the
//! selector, cgo disabled, build paths stripped for reproducibility.

use camino::{Utf8Path, Utf8PathBuf};
use tokio::process::Command;

use crate::config::Architecture;
use crate::{Error, Result};

/// File name of the compiled executable inside the function directory
pub const BINARY_NAME: &str = "main";

/// Invokes the Go toolchain to produce the deployable binary
#[derive(Debug, Clone)]
pub struct CompilerInvoker {
    program: Utf8PathBuf,
    architecture: Architecture,
}

impl CompilerInvoker {
    /// Create an invoker for the given target architecture
    pub fn new(architecture: Architecture) -> Self {
        Self {
            program: Utf8PathBuf::from("go"),
            architecture,
        }
    }

    /// Override the toolchain program (used by tests)
    pub fn with_program(mut self, program: impl Into<Utf8PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Compile the function source, returning the path of the executable.
    ///
    /// A non-zero exit surfaces the compiler's combined stdout and stderr
    /// verbatim. A zero exit that produced no output binary is also fatal.
    pub async fn compile(&self, source_dir: &Utf8Path) -> Result<Utf8PathBuf> {
        let output_path = source_dir.join(BINARY_NAME);
        let args = build_args(source_dir, &output_path);

        tracing::debug!("Running {} {:?}", self.program, args);

        let output = Command::new(self.program.as_str())
            .args(&args)
            .env("GOOS", "linux")
            .env("CGO_ENABLED", "0")
            .env("GOARCH", self.architecture.goarch())
            .output()
            .await
            .map_err(|e| {
                Error::compile(
                    format!("{} failed to start: {}", self.program, e),
                    "Ensure the Go toolchain is installed and on PATH",
                )
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(Error::compiler_failed(output.status.to_string(), combined));
        }

        if !output_path.exists() {
            return Err(Error::compile(
                format!("Compiler produced no output at {}", output_path),
                "Check that the function directory contains a main.go",
            ));
        }

        Ok(output_path)
    }
}

/// Build the `go build` argument list for a function directory
fn build_args(source_dir: &Utf8Path, output_path: &Utf8Path) -> Vec<String> {
    vec![
        "build".to_string(),
        "-trimpath".to_string(),
        "-o".to_string(),
        output_path.to_string(),
        source_dir.join("main.go").to_string(),
    ]
}

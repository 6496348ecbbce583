//! Deployment target resolution
//!
//! This module parses the optional `.fnpushrc.json` settings file and merges
//! it with the explicit command-line parameters into an immutable
//! [`DeploymentTarget`]. Resolution happens once, up front; no pipeline stage
//! reads the process environment afterward.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fmt;

use crate::build::BINARY_NAME;
use crate::{Error, Result};

/// Name of the per-function settings file
pub const RC_FILE_NAME: &str = ".fnpushrc.json";

/// Target instruction-set family for the deployed function
///
/// The selector flows through compilation (`GOARCH`), packaging (the archive
/// entry name), and the function update call (the Lambda architecture
/// string). The three mappings must stay consistent or the deployed function
/// fails at invocation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Architecture {
    /// x86_64, the Lambda default
    #[default]
    X86_64,
    /// arm64 (Graviton)
    Arm64,
}

impl Architecture {
    /// Select the architecture from the arm flag
    pub fn from_arm_flag(arm: bool) -> Self {
        if arm { Self::Arm64 } else { Self::X86_64 }
    }

    /// Archive entry name the Lambda runtime looks for at invocation time
    pub fn entry_name(self) -> &'static str {
        match self {
            Self::X86_64 => "main",
            Self::Arm64 => "bootstrap",
        }
    }

    /// `GOARCH` value passed to the Go toolchain
    pub fn goarch(self) -> &'static str {
        match self {
            Self::X86_64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }

    /// Canonical architecture string accepted by the Lambda API
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-function settings loaded from `.fnpushrc.json`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RcConfig {
    /// Lambda function name
    pub name: Option<String>,
    /// S3 bucket receiving the packaged archive
    pub bucket: Option<String>,
    /// AWS region
    pub region: Option<String>,
    /// Build for arm64 (Graviton)
    pub arm: Option<bool>,
}

impl RcConfig {
    /// Load the settings file from a function directory.
    ///
    /// A missing file is not an error; a file that fails to parse is.
    pub fn load(source_dir: &Utf8Path) -> Result<Option<Self>> {
        let path = source_dir.join(RC_FILE_NAME);
        if !path.exists() {
            tracing::debug!("No rc file at {}", path);
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let rc: Self = serde_json::from_str(&content).map_err(|e| {
            Error::config(
                format!("Failed to parse {}: {}", path, e),
                "Fix or delete the settings file",
            )
        })?;

        Ok(Some(rc))
    }
}

/// Explicit command-line parameters, prior to merging
#[derive(Debug, Clone, Default)]
pub struct TargetOverrides {
    /// Lambda function name
    pub function_name: Option<String>,
    /// S3 bucket
    pub bucket: Option<String>,
    /// AWS region
    pub region: Option<String>,
    /// arm64 build; `None` when the flag was not given
    pub arm: Option<bool>,
}

/// Resolved set of parameters governing one pipeline run
#[derive(Debug, Clone)]
pub struct DeploymentTarget {
    /// Canonicalized function source directory
    pub source_dir: Utf8PathBuf,
    /// Logical Lambda function name
    pub function_name: String,
    /// S3 bucket receiving the packaged archive
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Target architecture
    pub architecture: Architecture,
}

impl DeploymentTarget {
    /// Resolve a deployment target from the explicit parameters, the optional
    /// settings file, and the region environment fallback.
    ///
    /// Precedence: explicit parameter wins over the settings file; the region
    /// additionally falls back to `AWS_DEFAULT_REGION` (passed in as
    /// `env_region`) before the settings file is consulted.
    pub fn resolve(
        source_dir: &Utf8Path,
        overrides: TargetOverrides,
        env_region: Option<String>,
    ) -> Result<Self> {
        let source_dir = source_dir.canonicalize_utf8().map_err(|_| {
            Error::config(
                format!("Function path {} does not exist", source_dir),
                "Pass --path pointing at the function source directory",
            )
        })?;

        let rc = RcConfig::load(&source_dir)?.unwrap_or_default();

        let function_name = overrides.function_name.or(rc.name).ok_or_else(|| {
            Error::config(
                "Function name required",
                format!("Pass --name or set \"name\" in {}", RC_FILE_NAME),
            )
        })?;

        // The bucket is not validated here; an empty bucket surfaces as a
        // transport error from the store.
        let bucket = overrides.bucket.or(rc.bucket).unwrap_or_default();

        let region = overrides
            .region
            .or_else(|| env_region.filter(|r| !r.is_empty()))
            .or(rc.region)
            .ok_or_else(|| {
                Error::config(
                    "AWS region required",
                    format!(
                        "Pass --region, set AWS_DEFAULT_REGION, or set \"region\" in {}",
                        RC_FILE_NAME
                    ),
                )
            })?;

        let architecture =
            Architecture::from_arm_flag(overrides.arm.or(rc.arm).unwrap_or(false));

        Ok(Self {
            source_dir,
            function_name,
            bucket,
            region,
            architecture,
        })
    }

    /// Path of the compiled executable for this run
    pub fn artifact_path(&self) -> Utf8PathBuf {
        self.source_dir.join(BINARY_NAME)
    }

    /// Deterministic object key for the uploaded archive
    pub fn object_key(&self) -> String {
        format!("{}.zip", self.function_name)
    }
}

//! Integration tests for the deployment pipeline
//!
//! Runs the full pipeline against a fake compiler script and in-memory
//! implementations of the remote service seams.

#![cfg(unix)]

use std::collections::HashMap;
use std::io::Read;
use std::sync::Mutex;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use fnpush_core::build::CompilerInvoker;
use fnpush_core::config::{Architecture, DeploymentTarget};
use fnpush_core::pipeline::Pipeline;
use fnpush_core::remote::{FunctionService, ObjectStore};
use fnpush_core::{Error, Result};

/// In-memory object store keyed by (bucket, key)
#[derive(Default)]
struct MemoryStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    puts: Mutex<usize>,
}

impl MemoryStore {
    fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    fn put_count(&self) -> usize {
        *self.puts.lock().unwrap()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        *self.puts.lock().unwrap() += 1;
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }
}

/// Object store that rejects every put
struct FailingStore;

#[async_trait]
impl ObjectStore for FailingStore {
    async fn put_object(&self, _bucket: &str, _key: &str, _body: Vec<u8>) -> Result<()> {
        Err(Error::upload("access denied", "Check AWS credentials"))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct UpdateCall {
    function_name: String,
    bucket: String,
    key: String,
    architecture: Architecture,
}

/// Function service recording every update call
#[derive(Default)]
struct RecordingService {
    calls: Mutex<Vec<UpdateCall>>,
}

impl RecordingService {
    fn calls(&self) -> Vec<UpdateCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FunctionService for RecordingService {
    async fn update_function_code(
        &self,
        function_name: &str,
        bucket: &str,
        key: &str,
        architecture: Architecture,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(UpdateCall {
            function_name: function_name.to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            architecture,
        });
        Ok(())
    }
}

/// Function service that rejects every update
struct FailingService;

#[async_trait]
impl FunctionService for FailingService {
    async fn update_function_code(
        &self,
        _function_name: &str,
        _bucket: &str,
        _key: &str,
        _architecture: Architecture,
    ) -> Result<()> {
        Err(Error::update("function not found", "Check the function name"))
    }
}

fn scratch_dir(temp: &TempDir) -> &Utf8Path {
    Utf8Path::from_path(temp.path()).expect("path should be valid UTF-8")
}

fn write_script(dir: &Utf8Path, name: &str, script: &str) -> Utf8PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Fake toolchain that writes fixed bytes to the `-o` target
fn fake_compiler(dir: &Utf8Path) -> Utf8PathBuf {
    write_script(
        dir,
        "fake-go",
        "#!/bin/sh\nwhile [ \"$1\" != \"-o\" ]; do shift; done\nprintf 'fake binary' > \"$2\"\n",
    )
}

/// Fake toolchain that fails with diagnostics on stdout and stderr
fn broken_compiler(dir: &Utf8Path) -> Utf8PathBuf {
    write_script(
        dir,
        "fake-go",
        "#!/bin/sh\necho 'undefined: handler'\necho 'build failed' 1>&2\nexit 1\n",
    )
}

fn target_in(dir: &Utf8Path, arm: bool) -> DeploymentTarget {
    DeploymentTarget {
        source_dir: dir.to_owned(),
        function_name: "fn1".to_string(),
        bucket: "b1".to_string(),
        region: "us-east-1".to_string(),
        architecture: Architecture::from_arm_flag(arm),
    }
}

#[tokio::test]
async fn test_x86_64_deploy_end_to_end() {
    let temp = TempDir::new().unwrap();
    let dir = scratch_dir(&temp);
    let fake = fake_compiler(dir);
    let target = target_in(dir, false);
    let store = MemoryStore::default();
    let service = RecordingService::default();

    let invoker = CompilerInvoker::new(target.architecture).with_program(fake);
    Pipeline::new(&target, invoker, &store, &service)
        .run()
        .await
        .unwrap();

    // Archive stored under the deterministic key
    let body = store.object("b1", "fn1.zip").expect("object should exist");

    // Single executable entry named "main" holding the compiled bytes
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(body)).unwrap();
    assert_eq!(archive.len(), 1);
    let mut entry = archive.by_index(0).unwrap();
    assert_eq!(entry.name(), "main");
    assert_eq!(entry.unix_mode().unwrap() & 0o777, 0o777);
    let mut contents = Vec::new();
    entry.read_to_end(&mut contents).unwrap();
    assert_eq!(contents, b"fake binary");

    // Update call agrees with the archive
    assert_eq!(
        service.calls(),
        vec![UpdateCall {
            function_name: "fn1".to_string(),
            bucket: "b1".to_string(),
            key: "fn1.zip".to_string(),
            architecture: Architecture::X86_64,
        }]
    );

    // Local artifact removed
    assert!(!dir.join("main").exists());
}

#[tokio::test]
async fn test_arm64_deploy_uses_bootstrap() {
    let temp = TempDir::new().unwrap();
    let dir = scratch_dir(&temp);
    let fake = fake_compiler(dir);
    let target = target_in(dir, true);
    let store = MemoryStore::default();
    let service = RecordingService::default();

    let invoker = CompilerInvoker::new(target.architecture).with_program(fake);
    Pipeline::new(&target, invoker, &store, &service)
        .run()
        .await
        .unwrap();

    let body = store.object("b1", "fn1.zip").expect("object should exist");
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(body)).unwrap();
    assert_eq!(archive.by_index(0).unwrap().name(), "bootstrap");

    let calls = service.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].architecture, Architecture::Arm64);
    assert!(!dir.join("main").exists());
}

#[tokio::test]
async fn test_compiler_failure_stops_before_upload() {
    let temp = TempDir::new().unwrap();
    let dir = scratch_dir(&temp);
    let fake = broken_compiler(dir);
    let target = target_in(dir, false);
    let store = MemoryStore::default();
    let service = RecordingService::default();

    let invoker = CompilerInvoker::new(target.architecture).with_program(fake);
    let err = Pipeline::new(&target, invoker, &store, &service)
        .run()
        .await
        .unwrap_err();

    match err {
        Error::CompilerFailed { output, .. } => {
            assert!(output.contains("undefined: handler"));
            assert!(output.contains("build failed"));
        }
        other => panic!("expected CompilerFailed, got {other:?}"),
    }

    assert_eq!(store.put_count(), 0);
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_upload_failure_stops_before_update() {
    let temp = TempDir::new().unwrap();
    let dir = scratch_dir(&temp);
    let fake = fake_compiler(dir);
    let target = target_in(dir, false);
    let service = RecordingService::default();

    let invoker = CompilerInvoker::new(target.architecture).with_program(fake);
    let err = Pipeline::new(&target, invoker, &FailingStore, &service)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upload { .. }));
    assert!(service.calls().is_empty());

    // Artifact removed on the failure path too
    assert!(!dir.join("main").exists());
}

#[tokio::test]
async fn test_update_failure_cleans_up_and_keeps_object() {
    let temp = TempDir::new().unwrap();
    let dir = scratch_dir(&temp);
    let fake = fake_compiler(dir);
    let target = target_in(dir, false);
    let store = MemoryStore::default();

    let invoker = CompilerInvoker::new(target.architecture).with_program(fake);
    let err = Pipeline::new(&target, invoker, &store, &FailingService)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Update { .. }));

    // No remote rollback: the uploaded object stays in the bucket
    assert!(store.object("b1", "fn1.zip").is_some());

    // Local artifact removed despite the double cleanup
    assert!(!dir.join("main").exists());
}

#[tokio::test]
async fn test_second_run_overwrites_object() {
    let temp = TempDir::new().unwrap();
    let dir = scratch_dir(&temp);
    let fake = fake_compiler(dir);
    let target = target_in(dir, false);
    let store = MemoryStore::default();
    let service = RecordingService::default();

    for _ in 0..2 {
        let invoker = CompilerInvoker::new(target.architecture).with_program(fake.clone());
        Pipeline::new(&target, invoker, &store, &service)
            .run()
            .await
            .unwrap();
    }

    // Two puts landed on the same key; no duplicate objects, no leftover
    // local binary
    assert_eq!(store.put_count(), 2);
    assert_eq!(store.object_count(), 1);
    assert_eq!(service.calls().len(), 2);
    assert!(!dir.join("main").exists());
}

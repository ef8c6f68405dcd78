//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::Mutex;

use algotree::application::services::AlgorithmLoader;
use algotree::domain::AlgorithmGraph;
use algotree::infrastructure::traits::CommandRunner;

pub fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/resources/algorithm.json")
}

pub fn fixture_graph() -> AlgorithmGraph {
    let json = std::fs::read_to_string(fixture_path()).expect("read fixture");
    AlgorithmLoader::parse(&json, &fixture_path()).expect("parse fixture")
}

/// Stand-in for the Graphviz binary.
///
/// Records every invocation; `-o <file>` writes a placeholder image and
/// `-Tjson0` answers with a fixed layout.
#[derive(Default)]
pub struct MockDot {
    pub calls: Mutex<Vec<Vec<String>>>,
    pub fail_with: Option<(i32, String)>,
    pub layout: String,
}

impl MockDot {
    pub fn failing(code: i32, stderr: &str) -> Self {
        Self {
            fail_with: Some((code, stderr.to_string())),
            ..Self::default()
        }
    }

    pub fn with_layout(layout: &str) -> Self {
        Self {
            layout: layout.to_string(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for MockDot {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        let mut call = vec![cmd.to_string()];
        call.extend(args.iter().map(|a| a.to_string()));
        self.calls.lock().unwrap().push(call);

        if let Some((code, stderr)) = &self.fail_with {
            return Ok(Output {
                status: ExitStatus::from_raw(code << 8),
                stdout: Vec::new(),
                stderr: stderr.as_bytes().to_vec(),
            });
        }

        if let Some(pos) = args.iter().position(|a| *a == "-o") {
            std::fs::write(args[pos + 1], b"image")?;
        }
        let stdout = if args.contains(&"-Tjson0") {
            self.layout.as_bytes().to_vec()
        } else {
            Vec::new()
        };
        Ok(Output {
            status: ExitStatus::from_raw(0),
            stdout,
            stderr: Vec::new(),
        })
    }
}

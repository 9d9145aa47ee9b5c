//! Shared test infrastructure for integration tests.

use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

pub const API_KEY: &str = "integration-key";

/// A work directory, an input list and a settings path for one binary run.
pub struct Workspace {
    pub dir: TempDir,
    pub list: PathBuf,
    pub settings: PathBuf,
}

impl Workspace {
    pub fn new(list: &str) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let list_path = dir.path().join("movies.txt");
        std::fs::write(&list_path, list).expect("write list");
        let settings = dir.path().join("settings.json");
        Self {
            dir,
            list: list_path,
            settings,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name))
            .unwrap_or_else(|err| panic!("read {name}: {err}"))
    }

    pub fn state_next_index(&self) -> u64 {
        let state: Value =
            serde_json::from_str(&self.read("radarr_flat_import.state.json")).expect("state json");
        state["next_index"].as_u64().expect("next_index")
    }

    pub fn entries(&self) -> Vec<Value> {
        self.read("radarr_flat_import.dryrun.jsonl")
            .lines()
            .map(|line| serde_json::from_str(line).expect("entry json"))
            .collect()
    }

    /// `import` with every setup value passed as a flag, so no prompt is
    /// ever needed.
    pub fn import_args(&self, server: &MockServer) -> Vec<String> {
        let mut args: Vec<String> = [
            "import",
            "--non-interactive",
            "--delay-ms",
            "0",
            "--api-key",
            API_KEY,
            "--root-folder",
            "/movies",
            "--quality-profile-id",
            "4",
            "--monitored",
            "true",
            "--search-on-add",
            "false",
        ]
        .iter()
        .map(|arg| arg.to_string())
        .collect();
        args.extend([
            "--url".to_string(),
            server.base_url(),
            "--file".to_string(),
            path_arg(&self.list),
            "--work-dir".to_string(),
            path_arg(self.dir.path()),
            "--settings".to_string(),
            path_arg(&self.settings),
        ]);
        args
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Run the binary with stdin detached, so it never sees a terminal.
pub fn run_bin(args: &[String]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_radarr-import"))
        .args(args)
        .env_remove("RADARR_API_KEY")
        .env("RUST_LOG", "debug")
        .stdin(Stdio::null())
        .output()
        .expect("spawn radarr-import")
}

/// Endpoints every import touches before the first record.
pub fn mock_setup<'a>(server: &'a MockServer, library: &[u64]) -> Vec<Mock<'a>> {
    let movies: Vec<Value> = library
        .iter()
        .map(|id| json!({"id": id + 1000, "tmdbId": id, "title": format!("movie {id}")}))
        .collect();
    vec![
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/system/status")
                .header("x-api-key", API_KEY);
            then.status(200)
                .json_body(json!({"version": "5.2.6", "osName": "ubuntu"}));
        }),
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/qualityprofile");
            then.status(200).json_body(json!([
                {"id": 1, "name": "Any"},
                {"id": 4, "name": "HD-1080p"}
            ]));
        }),
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/movie");
            then.status(200).json_body(Value::Array(movies));
        }),
    ]
}

pub fn mock_lookup<'a>(server: &'a MockServer, term: &str, results: Value) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v3/movie/lookup")
            .query_param("term", term);
        then.status(200).json_body(results);
    })
}

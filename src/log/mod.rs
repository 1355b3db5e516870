use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: PathBuf,
    pub response: PathBuf,
}

fn run_dir(root: &Path, run: Uuid) -> PathBuf {
    root.join(run.to_string())
}

/// Writes `<stage>.request.json` and `<stage>.response.json` for one exchange.
pub fn save_exchange<Req: Serialize, Resp: Serialize>(
    root: &Path,
    run: Uuid,
    stage: &str,
    req: &Req,
    resp: &Resp,
) -> anyhow::Result<SavedPaths> {
    let dir = run_dir(root, run);
    fs::create_dir_all(&dir)?;

    let request = dir.join(format!("{stage}.request.json"));
    fs::write(&request, to_string_pretty(req)?)?;

    let response = dir.join(format!("{stage}.response.json"));
    fs::write(&response, to_string_pretty(resp)?)?;

    Ok(SavedPaths { dir, request, response })
}

pub fn print_planned_paths(root: &Path, run: Uuid) {
    println!("debug: transcript directory: {}", run_dir(root, run).display());
    std::io::stdout().flush().ok();
}

pub fn print_saved_paths(stage: &str, saved: &SavedPaths) {
    eprintln!("debug[{stage}]: artifacts directory: {}", saved.dir.display());
    eprintln!("debug[{stage}]: request saved at: {}", saved.request.display());
    eprintln!("debug[{stage}]: response saved at: {}", saved.response.display());
    std::io::stderr().flush().ok();
}

pub fn print_json_debug<Req: Serialize, Resp: Serialize>(stage: &str, req: &Req, resp: &Resp) {
    let render = |v: Result<String, serde_json::Error>| v.unwrap_or_else(|e| format!("<unserializable: {e}>"));
    eprintln!("\n===== DEBUG [{stage}]: REQUEST JSON =====\n{}\n", render(to_string_pretty(req)));
    eprintln!("===== DEBUG [{stage}]: RESPONSE JSON =====\n{}\n", render(to_string_pretty(resp)));
    std::io::stderr().flush().ok();
}

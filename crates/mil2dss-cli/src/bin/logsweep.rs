//! Log-file janitor: deletes `*.log` files under the given folders.
//!
//! Independent of the feeder pipeline; shares no state with it. The walk
//! deliberately treats any directory-entry name containing a '.' as a
//! non-directory, matching the layout of the log trees it cleans.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Delete *.log files under the given folders")]
struct Args {
    /// Folder to sweep (repeatable); defaults to ./logs
    #[arg(short = 'f', long = "folder")]
    folders: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let folders = if args.folders.is_empty() {
        vec![PathBuf::from("./logs")]
    } else {
        args.folders
    };

    let mut failures = 0usize;
    for folder in &folders {
        sweep(folder, &mut failures);
    }
    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Recursively delete `*.log` files under `dir`. Names containing '.' are
/// treated as files; everything else is descended into. A missing or
/// unreadable folder is simply skipped.
fn sweep(dir: &Path, failures: &mut usize) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.contains('.') {
            if name.ends_with(".log") {
                match std::fs::remove_file(&path) {
                    Ok(()) => println!("removed {}", path.display()),
                    Err(err) => {
                        eprintln!("failed to remove {}: {err}", path.display());
                        *failures += 1;
                    }
                }
            }
        } else {
            sweep(&path, failures);
        }
    }
}

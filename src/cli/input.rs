//! Input discovery and interactive prompts
//!
//! Command-line paths may name files or directories. Directories are
//! searched (non-recursively) for accepted logger file extensions.

use crate::constants::ACCEPTED_EXTENSIONS;
use crate::{Error, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Expand command-line paths into the list of files to process
///
/// Files are kept in argument order, even when their extension is not
/// accepted; the batch reports those as failures. Files found inside a
/// directory are sorted by name.
pub fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found = find_in_directory(path)?;
            debug!("Found {} files in {}", found.len(), path.display());
            found.sort();
            files.append(&mut found);
        } else {
            files.push(path.clone());
        }
    }

    Ok(files)
}

fn find_in_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for extension in ACCEPTED_EXTENSIONS {
        // Match both lower- and upper-case extensions
        for candidate in [extension.to_string(), extension.to_ascii_uppercase()] {
            let pattern = dir.join(format!("*.{}", candidate));
            let pattern = pattern.to_string_lossy();
            let entries = glob::glob(&pattern).map_err(|e| {
                Error::configuration(format!("Invalid search pattern {}: {}", pattern, e))
            })?;

            for entry in entries {
                let path = entry.map_err(|e| {
                    Error::io(format!("Failed to read {}", e.path().display()), e.into_error())
                })?;
                if path.is_file() && !found.contains(&path) {
                    found.push(path);
                }
            }
        }
    }

    Ok(found)
}

/// Get user confirmation for an action
pub fn prompt_confirmation(message: &str, default_yes: bool) -> Result<bool> {
    let default_text = if default_yes { "Y/n" } else { "y/N" };

    loop {
        print!("{} [{}]: ", message, default_text);
        io::stdout()
            .flush()
            .map_err(|e| Error::io("Failed to flush stdout", e))?;

        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map_err(|e| Error::io("Failed to read user input", e))?;

        match parse_confirmation(&input, default_yes) {
            Some(answer) => return Ok(answer),
            None => println!("Please enter 'y' for yes or 'n' for no."),
        }
    }
}

fn parse_confirmation(input: &str, default_yes: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default_yes),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

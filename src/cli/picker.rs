//! Interactive CSV picker for `mm fit` without `-f`.
//!
//! Clap handles structured flags; this module handles the "run `mm fit` and
//! choose a dataset" flow. Candidates are `*.csv` files under the current
//! working directory.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// How deep to descend when looking for CSV files.
const SEARCH_DEPTH: usize = 3;

/// What the user typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Index(usize),
    Path(PathBuf),
    Quit,
    Invalid(String),
}

/// Interpret one line of prompt input against `count` listed files.
pub fn parse_selection(input: &str, count: usize) -> Selection {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Selection::Quit;
    }
    if let Ok(choice) = input.parse::<usize>() {
        return if (1..=count).contains(&choice) {
            Selection::Index(choice - 1)
        } else {
            Selection::Invalid(format!("Choose a number between 1 and {count}."))
        };
    }
    if input.is_empty() {
        return Selection::Invalid("Type a number or a path.".to_string());
    }
    Selection::Path(PathBuf::from(input))
}

/// Ask on stdin which CSV file to fit.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let files = discover_csv_files();
    if files.is_empty() {
        return Err(AppError::new(
            2,
            "No .csv files found here. Pass one with `mm fit -f <data.csv>`.",
        ));
    }

    println!("CSV files under the current directory:");
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, display_path(path));
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Dataset number (1-{}), a path, or q: ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let Some(line) = lines.next() else {
            return Err(AppError::new(
                2,
                "No selection made. Pass a CSV with `mm fit -f <data.csv>`.",
            ));
        };
        let line = line.map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        match parse_selection(&line, files.len()) {
            Selection::Quit => return Err(AppError::new(2, "Canceled.")),
            Selection::Index(i) => return validate_csv_path(&files[i]),
            Selection::Path(path) => match validate_csv_path(&path) {
                Ok(path) => return Ok(path),
                Err(err) => println!("{err}"),
            },
            Selection::Invalid(msg) => println!("{msg}"),
        }
    }
}

/// Check that `path` is an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("CSV file not found: {}", path.display())));
    }
    if !path.is_file() {
        return Err(AppError::new(2, format!("Not a file: {}", path.display())));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(
            2,
            format!("Expected a .csv file, got {}", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

/// `*.csv` files under the current directory, sorted by display path.
pub fn discover_csv_files() -> Vec<PathBuf> {
    find_csv_files(Path::new("."), SEARCH_DEPTH)
}

pub fn find_csv_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(root, 0, max_depth, &mut found);
    found.sort_by_key(|p| display_path(p));
    found
}

fn walk(dir: &Path, depth: usize, max_depth: usize, found: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(kind) = entry.file_type() else {
            continue;
        };
        if kind.is_dir() {
            if !is_ignored_dir(&path) {
                walk(&path, depth + 1, max_depth, found);
            }
        } else if kind.is_file() && has_csv_extension(&path) {
            found.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn is_ignored_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    name.starts_with('.') || name == "target"
}

pub fn display_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_parsing() {
        assert_eq!(parse_selection(" 2 ", 3), Selection::Index(1));
        assert_eq!(parse_selection("Q", 3), Selection::Quit);
        assert!(matches!(parse_selection("4", 3), Selection::Invalid(_)));
        assert!(matches!(parse_selection("", 3), Selection::Invalid(_)));
        assert_eq!(
            parse_selection("runs/a.csv", 3),
            Selection::Path(PathBuf::from("runs/a.csv"))
        );
    }

    #[test]
    fn finds_csv_files_sorted_and_skips_hidden_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("b/z.csv"), "1,2\n").unwrap();
        fs::write(root.join("a.CSV"), "1,2\n").unwrap();
        fs::write(root.join("notes.txt"), "x").unwrap();
        fs::write(root.join(".git/hidden.csv"), "1,2\n").unwrap();

        let found = find_csv_files(root, 2);
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.CSV", "b/z.csv"]);
    }

    #[test]
    fn validate_rejects_missing_and_non_csv() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("data.txt");
        fs::write(&txt, "1,2\n").unwrap();
        assert_eq!(validate_csv_path(&txt).unwrap_err().exit_code(), 2);
        assert!(validate_csv_path(&dir.path().join("missing.csv")).is_err());
        assert!(validate_csv_path(dir.path()).is_err());

        let csv = dir.path().join("data.csv");
        fs::write(&csv, "1,2\n").unwrap();
        assert_eq!(validate_csv_path(&csv).unwrap(), csv);
    }
}

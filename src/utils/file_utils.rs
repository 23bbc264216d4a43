use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Regular files in `dir` whose extension matches `extension` ignoring case,
/// sorted by path so batch order does not depend on the filesystem.
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, extension))
        .collect();

    files.sort();
    Ok(files)
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(extension))
}

/// `<output_dir>/<stem of input>.<extension>`
pub fn output_path_for(input: &Path, output_dir: &Path, extension: &str) -> Option<PathBuf> {
    let stem = input.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(extension);
    Some(output_dir.join(name))
}

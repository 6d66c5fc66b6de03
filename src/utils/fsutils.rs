use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Characters that are replaced when deriving a base name from a video
/// filename. Windows-reserved ones plus a couple of fullwidth lookalikes that
/// show up in downloaded lecture recordings.
const FILENAME_BLACKLIST: &[char] = &[
    '<', '>', ':', '"', '/', '\\', '|', '?', '*', '丨', '：', ' ', '-',
];

/// Maps every blacklisted character to an underscore, leaving everything else
/// untouched.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if FILENAME_BLACKLIST.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// The filename without its extension, sanitized. None if the path has no
/// filename or it is not valid unicode.
pub fn sanitized_stem(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(sanitize_filename)
}

/// Collects all regular files in the given directory, does not walk it
/// recursively. Sorted, so batch runs visit videos in a stable order.
pub fn all_files(folder: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Creates the directory if it doesn't already exist.
pub fn ensure_dir(dir: impl AsRef<Path>) -> io::Result<()> {
    let dir = dir.as_ref();
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "dir is not a dir",
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir_all(dir),
        Err(e) => Err(e),
    }
}

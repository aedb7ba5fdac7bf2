use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Fail if writing `output` would replace the `spec` file being converted.
pub fn ensure_output_not_same(output: &Path, spec: &Path) -> Result<()> {
    let output_key = comparable(output)
        .with_context(|| format!("failed to normalize output path {}", output.display()))?;
    let spec_key = comparable(spec)
        .with_context(|| format!("failed to normalize spec path {}", spec.display()))?;
    if output_key == spec_key {
        bail!(
            "refusing to overwrite source file: output {} matches spec {}",
            output.display(),
            spec.display()
        );
    }
    Ok(())
}

/// Absolute form of `path` suitable for equality checks.
///
/// Existing files are canonicalized. A file that does not exist yet is
/// resolved against its canonical directory when that exists, else its
/// `.` and `..` segments are folded lexically.
fn comparable(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().context("current_dir")?.join(path)
    };
    let folded = fold_dots(&absolute);

    for candidate in [&absolute, &folded] {
        if candidate.exists() {
            return candidate
                .canonicalize()
                .with_context(|| format!("canonicalize {}", candidate.display()));
        }
    }
    if let (Some(dir), Some(name)) = (folded.parent(), folded.file_name()) {
        if dir.is_dir() {
            let dir = dir
                .canonicalize()
                .with_context(|| format!("canonicalize {}", dir.display()))?;
            return Ok(dir.join(name));
        }
    }
    Ok(folded)
}

fn fold_dots(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use super::{ensure_output_not_same, fold_dots};

    #[test]
    fn rejects_same_file_through_different_spelling() {
        let dir = tempdir().expect("tempdir");
        let spec = dir.path().join("spec.yaml");
        fs::write(&spec, "openapi: 3.0.0\n").expect("write");
        let dotted = dir.path().join(".").join("spec.yaml");

        let err = ensure_output_not_same(&dotted, &spec).expect_err("same file");
        assert!(err.to_string().contains("refusing to overwrite"));
    }

    #[test]
    fn rejects_spec_reached_through_missing_directory() {
        let dir = tempdir().expect("tempdir");
        let spec = dir.path().join("spec.yaml");
        fs::write(&spec, "openapi: 3.0.0\n").expect("write");
        let detour = dir.path().join("missing").join("..").join("spec.yaml");

        let err = ensure_output_not_same(&detour, &spec).expect_err("same file");
        assert!(err.to_string().contains("refusing to overwrite"));
    }

    #[test]
    fn accepts_new_output_file() {
        let dir = tempdir().expect("tempdir");
        let spec = dir.path().join("spec.yaml");
        fs::write(&spec, "openapi: 3.0.0\n").expect("write");
        ensure_output_not_same(&dir.path().join("kong.yaml"), &spec).expect("different file");
        ensure_output_not_same(&dir.path().join("out").join("spec.yaml"), &spec)
            .expect("same name in another directory");
    }

    #[test]
    fn folds_dot_segments() {
        assert_eq!(
            fold_dots(Path::new("/a/./b/../c/spec.yaml")),
            Path::new("/a/c/spec.yaml")
        );
    }
}

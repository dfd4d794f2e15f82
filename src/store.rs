//! Recording and comparing snapshot files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, SnapshotError};
use crate::resolver::SnapshotContext;

pub const DEFAULT_EXTENSION: &str = "snap";
pub const UPDATE_ENV_VAR: &str = "UPDATE_SNAPSHOTS";

/// A value to snapshot. Raw bytes are stored verbatim, structured values as
/// compact JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotValue {
    Bytes(Vec<u8>),
    Structured(serde_json::Value),
}

impl SnapshotValue {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        SnapshotValue::Bytes(data.into())
    }

    /// Raw bytes of a fixed-width numeric slice (`&[u32]`, `&[f32]`, ...).
    pub fn from_pod<T: bytemuck::Pod>(data: &[T]) -> Self {
        SnapshotValue::Bytes(bytemuck::cast_slice(data).to_vec())
    }

    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(SnapshotValue::Structured(serde_json::to_value(value)?))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            SnapshotValue::Bytes(data) => Ok(data.clone()),
            SnapshotValue::Structured(value) => Ok(serde_json::to_vec(value)?),
        }
    }
}

impl From<Vec<u8>> for SnapshotValue {
    fn from(data: Vec<u8>) -> Self {
        SnapshotValue::Bytes(data)
    }
}

impl From<&[u8]> for SnapshotValue {
    fn from(data: &[u8]) -> Self {
        SnapshotValue::Bytes(data.to_vec())
    }
}

impl From<serde_json::Value> for SnapshotValue {
    fn from(value: serde_json::Value) -> Self {
        SnapshotValue::Structured(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotMode {
    /// Compare against the stored file.
    Assert,
    /// Overwrite the stored file.
    Update,
}

impl SnapshotMode {
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let update = args
            .into_iter()
            .any(|arg| matches!(arg.as_ref(), "--update" | "-u"));
        if update {
            SnapshotMode::Update
        } else {
            SnapshotMode::Assert
        }
    }

    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes") => SnapshotMode::Update,
            _ => SnapshotMode::Assert,
        }
    }

    /// Reads the process arguments and `UPDATE_SNAPSHOTS`. Not cached.
    pub fn from_invocation() -> Self {
        let args = std::env::args_os().map(|a| a.to_string_lossy().into_owned());
        if SnapshotMode::from_args(args) == SnapshotMode::Update {
            return SnapshotMode::Update;
        }
        SnapshotMode::from_env_value(std::env::var(UPDATE_ENV_VAR).ok().as_deref())
    }
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    context: SnapshotContext,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: SnapshotContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &SnapshotContext {
        &self.context
    }

    /// Same as [`SnapshotStore::assert_or_update`] with the mode taken from the
    /// current invocation.
    pub fn assert_snapshot(
        &self,
        value: &SnapshotValue,
        source_file: &Path,
        test_name: &str,
        extension: &str,
    ) -> Result<PathBuf> {
        self.assert_or_update(
            value,
            source_file,
            test_name,
            extension,
            SnapshotMode::from_invocation(),
        )
    }

    /// Writes (`Update`) or checks (`Assert`) the next snapshot file for this
    /// test. Returns the path that was used.
    pub fn assert_or_update(
        &self,
        value: &SnapshotValue,
        source_file: &Path,
        test_name: &str,
        extension: &str,
        mode: SnapshotMode,
    ) -> Result<PathBuf> {
        let actual = value.to_bytes()?;
        let path = self
            .context
            .resolve_path(source_file, test_name, extension);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        match mode {
            SnapshotMode::Update => {
                fs::write(&path, &actual)?;
                log::info!("wrote snapshot {} ({} bytes)", path.display(), actual.len());
            }
            SnapshotMode::Assert => {
                let expected = match fs::read(&path) {
                    Ok(data) => data,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        log::warn!("missing snapshot {}", path.display());
                        return Err(SnapshotError::SnapshotMissing { path });
                    }
                    Err(e) => return Err(e.into()),
                };
                if let Err(e) = compare_snapshot(&path, &expected, &actual) {
                    log::warn!("{e}");
                    return Err(e);
                }
                log::debug!("snapshot {} matches", path.display());
            }
        }
        Ok(path)
    }
}

/// Byte-exact comparison that stops at the first difference.
pub fn compare_snapshot(path: &Path, expected: &[u8], actual: &[u8]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(SnapshotError::SnapshotLengthMismatch {
            path: path.to_path_buf(),
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    if let Some(offset) = expected.iter().zip(actual).position(|(a, b)| a != b) {
        return Err(SnapshotError::SnapshotContentMismatch {
            path: path.to_path_buf(),
            offset,
            expected: expected[offset],
            actual: actual[offset],
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_from_args() {
        assert_eq!(SnapshotMode::from_args(["bin", "--update"]), SnapshotMode::Update);
        assert_eq!(SnapshotMode::from_args(["bin", "-u"]), SnapshotMode::Update);
        assert_eq!(SnapshotMode::from_args(["bin", "--updates"]), SnapshotMode::Assert);
        assert_eq!(SnapshotMode::from_args(Vec::<String>::new()), SnapshotMode::Assert);
    }

    #[test]
    fn mode_from_env_value() {
        assert_eq!(SnapshotMode::from_env_value(Some("1")), SnapshotMode::Update);
        assert_eq!(SnapshotMode::from_env_value(Some(" TRUE ")), SnapshotMode::Update);
        assert_eq!(SnapshotMode::from_env_value(Some("0")), SnapshotMode::Assert);
        assert_eq!(SnapshotMode::from_env_value(None), SnapshotMode::Assert);
    }

    #[test]
    fn pod_values_keep_native_bytes() {
        let value = SnapshotValue::from_pod(&[1u32, 0x0102_0304]);
        let mut expected = 1u32.to_ne_bytes().to_vec();
        expected.extend_from_slice(&0x0102_0304u32.to_ne_bytes());
        assert_eq!(value.to_bytes().unwrap(), expected);
    }

    #[test]
    fn structured_values_are_compact_json() {
        let value = SnapshotValue::structured(&serde_json::json!({"b": [1, 2], "a": "x"})).unwrap();
        assert_eq!(value.to_bytes().unwrap(), br#"{"a":"x","b":[1,2]}"#.to_vec());
    }

    #[test]
    fn compare_reports_first_difference() {
        let path = Path::new("x.snap");
        assert!(compare_snapshot(path, &[1, 2, 3], &[1, 2, 3]).is_ok());
        match compare_snapshot(path, &[1, 2, 3, 4], &[1, 9, 3, 8]) {
            Err(SnapshotError::SnapshotContentMismatch {
                offset,
                expected,
                actual,
                ..
            }) => {
                assert_eq!(offset, 1);
                assert_eq!(expected, 2);
                assert_eq!(actual, 9);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

use std::path::PathBuf;

/// Where schema and data files of an artifact are written.
///
/// File names are the lower-cased artifact name plus the extension, which is
/// appended verbatim (`.proto`, `.bytes`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub schema_dir: PathBuf,
    pub schema_ext: String,
    pub data_dir: PathBuf,
    pub data_ext: String,
}

impl OutputLayout {
    /// Schema file name (no directory) of `artifact`.
    pub fn schema_file_name(&self, artifact: &str) -> String {
        format!("{}{}", artifact.to_lowercase(), self.schema_ext)
    }

    /// Data file name (no directory) of `artifact`.
    pub fn data_file_name(&self, artifact: &str) -> String {
        format!("{}{}", artifact.to_lowercase(), self.data_ext)
    }

    pub fn schema_path(&self, artifact: &str) -> PathBuf {
        self.schema_dir.join(self.schema_file_name(artifact))
    }

    pub fn data_path(&self, artifact: &str) -> PathBuf {
        self.data_dir.join(self.data_file_name(artifact))
    }

    /// Whether both output files of `artifact` exist.
    pub fn outputs_exist(&self, artifact: &str) -> bool {
        self.schema_path(artifact).is_file() && self.data_path(artifact).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_paths_are_lowercased() {
        let layout = Settings::new().with_output_root("/out").output_layout();
        assert_eq!(layout.schema_path("Sample"), PathBuf::from("/out/proto/sample.proto"));
        assert_eq!(layout.data_path("ItemTable"), PathBuf::from("/out/data/itemtable.bytes"));
        assert!(!layout.outputs_exist("Sample"));
    }
}

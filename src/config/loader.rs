// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::Path;

use super::PipelineTopology;
use crate::errors::ConfigError;

/// Load a topology from a YAML file.
pub fn load_topology<P: AsRef<Path>>(path: P) -> Result<PipelineTopology, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_topology(&content)
}

pub fn parse_topology(content: &str) -> Result<PipelineTopology, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Load a topology and check its graph invariants, reporting every violation.
pub fn load_and_validate_topology<P: AsRef<Path>>(
    path: P,
) -> Result<PipelineTopology, ConfigError> {
    let topology = load_topology(path)?;
    topology.validate().map_err(ConfigError::Validation)?;
    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GraphError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_yaml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_topology() {
        let file = write_yaml(
            r#"
name: tiny
nodes:
  - id: a
    task: passthrough
  - id: b
    task: reverse_text
links:
  - [a, b]
"#,
        );

        let topology = load_and_validate_topology(file.path()).unwrap();
        assert_eq!(topology.name, "tiny");
        assert_eq!(topology.nodes.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");

        match load_topology(&missing) {
            Err(ConfigError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let file = write_yaml("name: broken\nnodes: [\n");
        assert!(matches!(
            load_topology(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_unknown_sync_policy_is_parse_error() {
        let result = parse_topology(
            "name: x\nsync_policy: eventually\nnodes:\n  - id: a\n    task: passthrough\n",
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_reports_all_errors() {
        let file = write_yaml(
            r#"
name: tangled
options:
  one_parent: true
nodes:
  - id: a
    task: passthrough
  - id: b
    task: passthrough
  - id: c
    task: passthrough
links:
  - [a, c]
  - [b, c]
  - [c, c]
"#,
        );

        match load_and_validate_topology(file.path()) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(
                    errors,
                    vec![
                        GraphError::SelfLoop("c".to_string()),
                        GraphError::MultipleParents {
                            node_id: "c".to_string(),
                            parent_count: 2,
                        },
                    ]
                );
            }
            other => panic!("Expected validation errors, got {:?}", other),
        }
    }
}

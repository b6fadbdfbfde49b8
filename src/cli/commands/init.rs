//! # Init Command Module / 初始化命令模块
//!
//! This module implements `--init`, which writes a sample suite configuration
//! to start from.
//!
//! 此模块实现了 `--init`，用于写入一个示例测试套件配置作为起点。

use anyhow::{Context, Result};
use colored::*;
use std::{fs, path::Path};

use crate::infra::{fs::ensure_dir, t};

/// Sample configuration written by `--init`.
pub const DEFAULT_CONFIG: &str = r#"{
  "base_url": "http://localhost:8080",
  "endpoint": "/api/v1/preview",
  "timeout_seconds": 120,
  "test_suite_name": "Preview API Test Suite",
  "test_settings": {
    "animation_prompt": "gentle camera pan",
    "max_retries": 2,
    "retry_delay_seconds": 5
  },
  "image_lists": {
    "single_portrait": {
      "name": "Single Portrait",
      "description": "One portrait photo",
      "urls": ["https://example.com/images/portrait.jpg"]
    },
    "family_pair": {
      "name": "Family Pair",
      "description": "Two photos of the same family",
      "urls": [
        "https://example.com/images/family_1.jpg",
        "https://example.com/images/family_2.jpg"
      ]
    }
  },
  "location_prompts": {
    "none": {
      "name": "No Location",
      "value": ""
    },
    "beach": {
      "name": "Beach",
      "description": "Sunny beach backdrop",
      "value": "on a sunny beach at golden hour"
    }
  },
  "person_prompts": {
    "none": {
      "name": "No Person Prompt",
      "value": ""
    },
    "smiling": {
      "name": "Smiling",
      "value": "everyone smiling at the camera"
    }
  },
  "pipeline_configs": {
    "default": {
      "name": "Default Pipeline",
      "description": "Balanced quality and speed",
      "filename": "default_pipeline.json"
    }
  }
}
"#;

/// Writes [`DEFAULT_CONFIG`] to `output`. An existing file is only replaced
/// after confirmation, or right away with `assume_yes`.
///
/// # Errors
/// Returns an error if the parent directory or the file cannot be written.
pub fn execute(output: &Path, assume_yes: bool) -> Result<()> {
    if output.exists() && !assume_yes {
        println!("{}", t!("init.file_exists", path = output.display()).yellow());
        let overwrite = dialoguer::Confirm::new()
            .with_prompt(t!("init.overwrite_prompt").to_string())
            .default(false)
            .interact()
            .unwrap_or(false);
        if !overwrite {
            println!("{}", t!("init.cancelled"));
            return Ok(());
        }
    }

    if let Some(parent) = output.parent() {
        ensure_dir(parent)?;
    }

    fs::write(output, DEFAULT_CONFIG)
        .with_context(|| t!("init.write_failed", path = output.display()).to_string())?;

    println!("{}", t!("init.success", path = output.display()).green());
    println!("{}", t!("init.next_steps", path = output.display()));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{config::parse_suite_config, planner::generate_combinations};

    #[test]
    fn sample_config_is_valid() {
        let config = parse_suite_config(DEFAULT_CONFIG, None).unwrap();
        assert_eq!(generate_combinations(&config).len(), 2 * 2 * 2 * 1);
        assert_eq!(config.image_lists.iter().next().map(|(key, _)| key), Some("single_portrait"));
    }

    #[test]
    fn writes_config_into_new_directory() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("suites").join("suite.json");

        execute(&path, false).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, DEFAULT_CONFIG);
    }

    #[test]
    fn assume_yes_overwrites_existing_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("suite.json");
        fs::write(&path, "{}").unwrap();

        execute(&path, true).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}

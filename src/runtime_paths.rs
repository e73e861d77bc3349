// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::{CONFIG_FILE_NAME, ConfigError, ValidatedConfig};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub seed_file: PathBuf,
}

impl RuntimePaths {
    pub fn from_root(root: &Path, config: &ValidatedConfig) -> Result<Self, ConfigError> {
        let root_path = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root.to_path_buf()
        };

        let root_canonical = root_path.canonicalize().map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to canonicalize runtime root '{}': {}",
                root_path.display(),
                e
            ))
        })?;

        let config_file = root_canonical.join(CONFIG_FILE_NAME);
        let seed = Path::new(&config.repository.seed_file);
        let seed_file = if seed.is_absolute() {
            seed.to_path_buf()
        } else {
            root_canonical.join(seed)
        };

        Ok(Self {
            root: root_canonical,
            config_file,
            seed_file,
        })
    }
}

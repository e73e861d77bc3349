// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use crate::config::{
    AdeConfig, LoggingConfig, NewElementConfig, PublishConfig, RepositoryConfig, ServerConfig,
    ValidatedConfig,
};

#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: ValidatedConfig,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ValidatedConfig {
                server: ServerConfig {
                    host: "127.0.0.1".to_string(),
                    port: 5467,
                    workers: 1,
                },
                logging: LoggingConfig {
                    level: "debug".to_string(),
                },
                ade: AdeConfig {
                    new_elements: vec![NewElementConfig {
                        type_name: "article".to_string(),
                        template: "/system/templates/article.json".to_string(),
                        folder: "/sites/default/.content/article/".to_string(),
                        name_pattern: "article_%(number).json".to_string(),
                    }],
                    ..AdeConfig::default()
                },
                publish: PublishConfig::default(),
                repository: RepositoryConfig::default(),
            },
        }
    }

    pub fn with_search_page_size(mut self, size: usize) -> Self {
        self.config.ade.search_page_size = size;
        self
    }

    pub fn with_publish(mut self, publish: PublishConfig) -> Self {
        self.config.publish = publish;
        self
    }

    pub fn build(self) -> ValidatedConfig {
        self.config
    }
}

pub fn test_config() -> ValidatedConfig {
    TestConfigBuilder::new().build()
}

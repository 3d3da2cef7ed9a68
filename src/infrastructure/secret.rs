//! Environment Secret Store
//!
//! 从环境变量读取密钥：key `jwt.signing-key` 对应变量 `<PREFIX>JWT_SIGNING_KEY`。

use async_trait::async_trait;

use crate::application::ports::{ClientError, SecretStore};

/// 基于环境变量的密钥查询
pub struct EnvSecretStore {
    prefix: String,
}

impl EnvSecretStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// key 对应的环境变量名
    pub fn variable_name(&self, key: &str) -> String {
        let normalized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", self.prefix, normalized)
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn secret(&self, key: &str) -> Result<String, ClientError> {
        let name = self.variable_name(key);
        match std::env::var(&name) {
            Ok(value) if !value.is_empty() => Ok(value),
            _ => Err(ClientError::NotFound(format!("secret `{}`", key))),
        }
    }
}

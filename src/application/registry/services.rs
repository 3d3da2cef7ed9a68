//! Named Service Registry - 按名称解析外部协作者
//!
//! 每类客户端一个注册表，名称缺省时解析为 [`DEFAULT_NAME`]。

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::ports::{
    ClientError, DistLockClient, DistObjClient, KeyValClient, PubSubClient, QueueClient,
    SecretStore, TokenService,
};

/// 缺省实例名
pub const DEFAULT_NAME: &str = "default";

/// 名称到实例的映射
pub struct NamedRegistry<T: ?Sized> {
    kind: &'static str,
    entries: HashMap<String, Arc<T>>,
}

impl<T: ?Sized> NamedRegistry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// 注册实例，同名覆盖，返回被覆盖的旧实例
    pub fn register(&mut self, name: impl Into<String>, instance: Arc<T>) -> Option<Arc<T>> {
        self.entries.insert(name.into(), instance)
    }

    /// 按名称解析，None 表示缺省实例
    pub fn get(&self, name: Option<&str>) -> Result<Arc<T>, ClientError> {
        let name = name.unwrap_or(DEFAULT_NAME);
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::NotRegistered(format!("{} `{}`", self.kind, name)))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 外部协作者集合
pub struct Services {
    pub keyval: NamedRegistry<dyn KeyValClient>,
    pub pubsub: NamedRegistry<dyn PubSubClient>,
    pub queue: NamedRegistry<dyn QueueClient>,
    pub secrets: NamedRegistry<dyn SecretStore>,
    pub tokens: NamedRegistry<dyn TokenService>,
    pub locks: NamedRegistry<dyn DistLockClient>,
    pub objects: NamedRegistry<dyn DistObjClient>,
}

impl Services {
    pub fn new() -> Self {
        Self {
            keyval: NamedRegistry::new("keyval"),
            pubsub: NamedRegistry::new("pubsub"),
            queue: NamedRegistry::new("queue"),
            secrets: NamedRegistry::new("secret store"),
            tokens: NamedRegistry::new("token service"),
            locks: NamedRegistry::new("lock"),
            objects: NamedRegistry::new("object store"),
        }
    }

    pub fn keyval(&self, name: Option<&str>) -> Result<Arc<dyn KeyValClient>, ClientError> {
        self.keyval.get(name)
    }

    pub fn pubsub(&self, name: Option<&str>) -> Result<Arc<dyn PubSubClient>, ClientError> {
        self.pubsub.get(name)
    }

    pub fn queue(&self, name: Option<&str>) -> Result<Arc<dyn QueueClient>, ClientError> {
        self.queue.get(name)
    }

    pub fn secrets(&self, name: Option<&str>) -> Result<Arc<dyn SecretStore>, ClientError> {
        self.secrets.get(name)
    }

    pub fn tokens(&self, name: Option<&str>) -> Result<Arc<dyn TokenService>, ClientError> {
        self.tokens.get(name)
    }

    pub fn locks(&self, name: Option<&str>) -> Result<Arc<dyn DistLockClient>, ClientError> {
        self.locks.get(name)
    }

    pub fn objects(&self, name: Option<&str>) -> Result<Arc<dyn DistObjClient>, ClientError> {
        self.objects.get(name)
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedSecret(&'static str);

    #[async_trait]
    impl SecretStore for FixedSecret {
        async fn secret(&self, _key: &str) -> Result<String, ClientError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_default_name_resolution() {
        let mut services = Services::new();
        services
            .secrets
            .register(DEFAULT_NAME, Arc::new(FixedSecret("main")));
        services
            .secrets
            .register("vault", Arc::new(FixedSecret("vault")));

        let default = services.secrets(None).unwrap();
        assert_eq!(default.secret("k").await.unwrap(), "main");

        let named = services.secrets(Some("vault")).unwrap();
        assert_eq!(named.secret("k").await.unwrap(), "vault");
    }

    #[test]
    fn test_unknown_name_is_not_registered() {
        let services = Services::new();
        let err = services.keyval(Some("cache")).err().unwrap();
        assert!(matches!(err, ClientError::NotRegistered(_)));
        assert_eq!(err.to_string(), "Client not registered: keyval `cache`");
    }

    #[test]
    fn test_register_returns_replaced_instance() {
        let mut registry: NamedRegistry<dyn SecretStore> = NamedRegistry::new("secret store");
        assert!(registry.register("a", Arc::new(FixedSecret("1"))).is_none());
        assert!(registry.register("a", Arc::new(FixedSecret("2"))).is_some());
        assert_eq!(registry.names(), vec!["a".to_string()]);
    }
}

//! Controllers - 示例控制器
//!
//! 每个控制器把一组路由注册到 App 上，处理函数只依赖 Context 与外部协作者接口，
//! 因此可以在任意后端上运行。

pub mod auth;
pub mod files;
pub mod keyval;
pub mod lock;
pub mod object;
pub mod pubsub;
pub mod queue;
pub mod secret;
pub mod system;

use std::time::Duration;

pub use auth::{require_token, AuthController, SUBJECT_KEY, TOKEN_KEY};
pub use files::FilesController;
pub use keyval::KeyValController;
pub use lock::LockController;
pub use object::ObjectController;
pub use pubsub::PubSubController;
pub use queue::QueueController;
pub use secret::SecretController;
pub use system::SystemController;

use crate::application::{ClientError, Controllers, Services};
use crate::config::AppConfig;

/// 业务错误码（写入信封的 `Code` 字段）
pub mod errno {
    pub const INVALID_ARGUMENT: i32 = 1001;
    pub const KEY_NOT_FOUND: i32 = 1002;
    pub const UNAUTHORIZED: i32 = 1003;
    pub const QUEUE_EMPTY: i32 = 1004;
    pub const FILE_NOT_FOUND: i32 = 1005;
    pub const LOCK_HELD: i32 = 1006;
    pub const LOCK_NOT_HELD: i32 = 1007;
    pub const OBJECT_NOT_FOUND: i32 = 1008;
    pub const VERSION_CONFLICT: i32 = 1009;
}

/// 令牌缺省有效期
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// 按固定顺序组装全部示例控制器，外部协作者取缺省实例
pub fn default_controllers(
    config: &AppConfig,
    services: &Services,
) -> Result<Controllers, ClientError> {
    let mut controllers = Controllers::new();
    controllers
        .add(SystemController::new())
        .add(KeyValController::new(services.keyval(None)?))
        .add(AuthController::new(services.tokens(None)?, DEFAULT_TOKEN_TTL))
        .add(QueueController::new(services.queue(None)?))
        .add(PubSubController::new(services.pubsub(None)?))
        .add(SecretController::new(services.secrets(None)?))
        .add(LockController::new(services.locks(None)?))
        .add(ObjectController::new(services.objects(None)?))
        .add(FilesController::new(config.app.upload_dir.clone()));
    Ok(controllers)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::RecordingApp;
    use crate::application::App;
    use crate::infrastructure::memory::in_memory_services;

    #[test]
    fn test_default_controllers_register_every_route() {
        let services = in_memory_services("PORTICO_CTRL_TEST_");
        let controllers = default_controllers(&AppConfig::default(), &services).unwrap();
        assert_eq!(controllers.len(), 9);

        let mut app = RecordingApp::named("mock");
        controllers.register_all(&mut app);
        let paths: Vec<String> = app.routes().into_iter().map(|r| r.path).collect();
        let expected_paths = [
            "/ping",
            "/kv/:key",
            "/auth/whoami",
            "/queue/:name",
            "/lock/:name",
            "/obj/:id",
            "/files/:name",
        ];
        for expected in expected_paths {
            assert!(paths.iter().any(|p| p == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_missing_service_is_reported() {
        let services = Services::new();
        assert!(matches!(
            default_controllers(&AppConfig::default(), &services),
            Err(ClientError::NotRegistered(_))
        ));
    }
}

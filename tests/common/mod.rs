//! Shared setup for integration tests
//!
//! 每个测试使用独立的临时 SQLite 数据库。

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

use zaplinker::api::AppState;
use zaplinker::api::jwt::JwtService;
use zaplinker::config::{AuthConfig, DatabaseConfig, StaticConfig};
use zaplinker::storage::{NewLink, SeaOrmStorage, StorageFactory};
use zaplinker::utils::UtmParams;

use migration::entities::link;

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestContext {
    pub storage: Arc<SeaOrmStorage>,
    pub state: AppState,
    pub jwt: Arc<JwtService>,
    _dir: TempDir,
}

pub fn test_config(database_url: String) -> StaticConfig {
    StaticConfig {
        database: DatabaseConfig {
            database_url,
            ..Default::default()
        },
        auth: AuthConfig {
            jwt_secret: TEST_SECRET.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub async fn setup() -> TestContext {
    setup_with(|_| {}).await
}

/// 允许测试调整配置（例如免费套餐上限）
pub async fn setup_with(adjust: impl FnOnce(&mut StaticConfig)) -> TestContext {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let mut config = test_config(format!("sqlite://{}?mode=rwc", db_path.display()));
    adjust(&mut config);

    let storage = StorageFactory::create(&config.database)
        .await
        .expect("Failed to create storage");
    let jwt = Arc::new(JwtService::from_config(&config.auth));
    let state = AppState::with_jwt(storage.clone(), Arc::new(config), jwt.clone());

    TestContext {
        storage,
        state,
        jwt,
        _dir: dir,
    }
}

impl TestContext {
    /// 创建用户并返回 (user_id, bearer token)
    pub async fn user(&self, email: &str) -> (String, String) {
        let user = self
            .storage
            .create_user(email, Some("Test User"))
            .await
            .expect("Failed to create user");
        let token = self.jwt.issue(&user.id).expect("Failed to issue token");
        (user.id, token)
    }

    pub async fn link(&self, user_id: &str, slug: &str) -> link::Model {
        self.link_with(user_id, slug, |_| {}).await
    }

    pub async fn link_with(
        &self,
        user_id: &str,
        slug: &str,
        adjust: impl FnOnce(&mut NewLink),
    ) -> link::Model {
        let mut new_link = NewLink {
            slug: slug.to_string(),
            user_id: user_id.to_string(),
            destination_number: "5511999998888".to_string(),
            message_template: "Hi from {{utm_source}}".to_string(),
            is_active: true,
            ghost_mode: false,
            default_utm: UtmParams::default(),
        };
        adjust(&mut new_link);

        self.storage
            .create_link(&new_link)
            .await
            .expect("Failed to create link")
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// 构建与生产环境相同路由的测试服务
#[macro_export]
macro_rules! init_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(zaplinker::api::middleware::RequestIdMiddleware)
                .configure(zaplinker::api::configure($ctx.state.clone())),
        )
        .await
    };
}

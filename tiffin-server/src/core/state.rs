use std::sync::Arc;

use shared::NotificationPayload;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::NotificationRepository;
use crate::notify::NotificationHub;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是后端的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | hub | Arc<NotificationHub> | 通知扇出注册表 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 通知扇出注册表 (进程内共享)
    pub hub: Arc<NotificationHub>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 通常使用 [`ServerState::initialize`] 代替；测试中配合
    /// [`DbService::open_in_memory`] 使用
    pub fn new(
        config: Config,
        db: Surreal<Db>,
        jwt_service: Arc<JwtService>,
        hub: Arc<NotificationHub>,
    ) -> Self {
        Self {
            config,
            db,
            jwt_service,
            hub,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/tiffin.db)
    /// 3. JWT 服务与通知注册表
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("tiffin.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        Self::new(
            config.clone(),
            db_service.db,
            Arc::new(JwtService::with_config(config.jwt.clone())),
            Arc::new(NotificationHub::new()),
        )
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 持久化并广播一条通知
    ///
    /// 先写入收件人的通知列表（超出上限时裁剪最旧的记录），再推送到所有
    /// 匹配的在线 SSE 连接。持久化失败只记日志，不影响调用方的主流程，
    /// 广播本身是 fire-and-forget。
    pub async fn publish_notification(&self, payload: NotificationPayload) {
        let repo = NotificationRepository::new(self.db.clone());
        if let Err(e) = repo
            .append(&payload, self.config.notification_history_limit)
            .await
        {
            tracing::warn!(
                notification_id = %payload.id,
                error = %e,
                "Failed to persist notification"
            );
        }

        self.hub.broadcast(&payload);
    }
}

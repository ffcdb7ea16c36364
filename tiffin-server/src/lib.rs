//! Tiffin Server - 多角色外卖平台后端
//!
//! # 架构概述
//!
//! 单进程 axum 服务，嵌入式 SurrealDB 存储，提供以下核心功能：
//!
//! - **订单生命周期** (`orders::lifecycle`): 按角色约束的状态机
//! - **聚合对账** (`orders::reconcile`): 餐厅 `total_orders` / `revenue` 缓存重算
//! - **通知扇出** (`notify`): 进程内 SSE 连接注册表与广播
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **HTTP API** (`api`): 顾客 / 商家 / 骑手 / 管理四组接口
//!
//! # 模块结构
//!
//! ```text
//! tiffin-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、角色
//! ├── db/            # 数据库层 (models + repository)
//! ├── orders/        # 状态机、计价、聚合对账
//! ├── notify/        # 通知注册表与 SSE 扇出
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、日志等工具
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod notify;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService, Role};
pub use core::{Config, Server, ServerState};
pub use notify::NotificationHub;
pub use orders::lifecycle;
pub use utils::{AppError, AppResponse, AppResult};

/// 设置运行环境 (dotenv + 日志)
///
/// 必须在加载 [`Config`] 之前调用
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional; env vars win over file values
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    utils::logger::init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
  ______ _  ____ ____ _
 /_  __/(_)/ __// __/(_)___
  / /  / // /_ / /_ / // _ \
 / /  / // __// __// // / / /
/_/  /_//_/  /_/  /_//_/ /_/
    "#
    );
}

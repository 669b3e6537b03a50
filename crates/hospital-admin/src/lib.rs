//! # 仪表盘管理模块
//!
//! 提供配置加载、日志初始化、登录状态和实时时钟等运行环境功能

pub mod auth;
pub mod clock;
pub mod config;
pub mod logging;

pub use auth::{AuthContext, AuthSession, FileSessionStore, InMemorySessionStore, SessionStore};
pub use clock::{ClockHandle, LiveClock};
pub use config::{ConfigManager, ConfigValidator, DashboardConfig};
pub use logging::init_logging;

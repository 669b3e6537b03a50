//! 登录状态
//!
//! 仪表盘只有“已登录/未登录”两种状态，对照配置中的一组账号密码校验。
//! 登录状态通过 [`SessionStore`] 持久化，启动时读取一次，登录和登出时写入。

use chrono::{DateTime, Utc};
use hospital_core::{FieldError, HospitalError, Result, ValidationErrors};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// 密码最短长度
pub const MIN_PASSWORD_LEN: usize = 6;

/// 邮箱格式检查
pub fn is_valid_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN)
        .map(|re| re.is_match(email.trim()))
        .unwrap_or(false)
}

/// 登录表单校验，与账号是否正确无关
pub fn validate_login_form(email: &str, password: &str) -> std::result::Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if email.trim().is_empty() {
        errors.missing.push("email".to_string());
    } else if !is_valid_email(email) {
        errors.invalid.push(FieldError::new("email", "invalid email format"));
    }
    if password.is_empty() {
        errors.missing.push("password".to_string());
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.invalid.push(FieldError::new(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// 一次登录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub session_id: Uuid,
    pub email: String,
    pub logged_in_at: DateTime<Utc>,
}

/// 登录状态的持久化
pub trait SessionStore: Send {
    fn load(&self) -> Result<Option<AuthSession>>;
    fn save(&mut self, session: Option<&AuthSession>) -> Result<()>;
}

/// 只保存在内存中，进程退出后丢失
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    session: Option<AuthSession>,
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<Option<AuthSession>> {
        Ok(self.session.clone())
    }

    fn save(&mut self, session: Option<&AuthSession>) -> Result<()> {
        self.session = session.cloned();
        Ok(())
    }
}

/// JSON 文件，登出时删除文件
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<AuthSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&mut self, session: Option<&AuthSession>) -> Result<()> {
        match session {
            Some(session) => {
                if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
            }
            None if self.path.exists() => std::fs::remove_file(&self.path)?,
            None => {}
        }
        Ok(())
    }
}

/// 登录上下文，显式传给导航层
pub struct AuthContext {
    email: String,
    password: String,
    store: Box<dyn SessionStore>,
    session: Option<AuthSession>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("email", &self.email)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    /// 创建上下文并读取已保存的登录状态
    pub fn new(config: &AuthConfig, store: Box<dyn SessionStore>) -> Result<Self> {
        let session = store.load()?;
        if let Some(session) = &session {
            info!("Restored session {} for {}", session.session_id, session.email);
        }
        Ok(Self {
            email: config.email.clone(),
            password: config.password.clone(),
            store,
            session,
        })
    }

    /// 按配置选择存储：设置了 `session_file` 时使用文件
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let store: Box<dyn SessionStore> = match &config.session_file {
            Some(path) => Box::new(FileSessionStore::new(path)),
            None => Box::new(InMemorySessionStore::default()),
        };
        Self::new(config, store)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    /// 登录
    ///
    /// 邮箱和密码都按原样精确比较，大小写不同视为凭据错误。
    pub fn login(&mut self, email: &str, password: &str) -> Result<&AuthSession> {
        validate_login_form(email, password).map_err(HospitalError::Validation)?;

        if email != self.email || password != self.password {
            warn!("Failed login attempt for {}", email);
            return Err(HospitalError::Authentication("invalid email or password".to_string()));
        }

        let session = AuthSession {
            session_id: Uuid::new_v4(),
            email: email.to_string(),
            logged_in_at: Utc::now(),
        };
        self.store.save(Some(&session))?;
        info!("User {} logged in (session {})", session.email, session.session_id);
        Ok(&*self.session.insert(session))
    }

    /// 登出
    pub fn logout(&mut self) -> Result<()> {
        self.store.save(None)?;
        if let Some(session) = self.session.take() {
            info!("User {} logged out (session {})", session.email, session.session_id);
        }
        Ok(())
    }
}

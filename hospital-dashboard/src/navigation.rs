//! 页面导航
//!
//! 同一时间只挂载一个页面。除登录页外的页面都需要登录，
//! 未登录时重定向到登录页。仪表盘页挂载期间持有实时时钟。

use hospital_admin::{AuthContext, ClockHandle, LiveClock};
use hospital_records::Collection;
use tracing::{debug, info};

/// 页面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Patients,
    Appointments,
    Billings,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/",
            Route::Patients => "/patients",
            Route::Appointments => "/appointments",
            Route::Billings => "/billings",
        }
    }

    /// 接受路径或页面名称
    pub fn parse(input: &str) -> Option<Self> {
        let name = input.trim().trim_start_matches('/').to_ascii_lowercase();
        match name.as_str() {
            "login" => Some(Route::Login),
            "" | "dashboard" => Some(Route::Dashboard),
            "patients" => Some(Route::Patients),
            "appointments" => Some(Route::Appointments),
            "billings" => Some(Route::Billings),
            _ => None,
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }

    /// 页面对应的记录集合
    pub fn collection(&self) -> Option<Collection> {
        match self {
            Route::Patients => Some(Collection::Patients),
            Route::Appointments => Some(Collection::Appointments),
            Route::Billings => Some(Collection::Billings),
            Route::Login | Route::Dashboard => None,
        }
    }
}

/// 导航器
#[derive(Debug)]
pub struct Navigator {
    current: Route,
    clock: LiveClock,
    mounted_clock: Option<ClockHandle>,
}

impl Navigator {
    /// 初始位于登录页
    pub fn new(clock: LiveClock) -> Self {
        Self {
            current: Route::Login,
            clock,
            mounted_clock: None,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// 仪表盘页挂载期间的时钟
    pub fn clock(&self) -> Option<&ClockHandle> {
        self.mounted_clock.as_ref()
    }

    /// 跳转到目标页面，返回实际挂载的页面
    pub fn navigate(&mut self, target: Route, auth: &AuthContext) -> Route {
        let resolved = if target.requires_auth() && !auth.is_authenticated() {
            debug!("Redirecting {} to {}", target.path(), Route::Login.path());
            Route::Login
        } else {
            target
        };

        if resolved != self.current {
            self.unmount();
            self.mount(resolved);
        }
        resolved
    }

    fn mount(&mut self, route: Route) {
        if route == Route::Dashboard {
            self.mounted_clock = Some(self.clock.acquire());
        }
        self.current = route;
        info!("Mounted {}", route.path());
    }

    fn unmount(&mut self) {
        if let Some(clock) = self.mounted_clock.take() {
            clock.release();
        }
        debug!("Unmounted {}", self.current.path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hospital_admin::config::AuthConfig;
    use hospital_admin::InMemorySessionStore;
    use std::time::Duration;

    fn auth() -> AuthContext {
        AuthContext::new(&AuthConfig::default(), Box::new(InMemorySessionStore::default())).unwrap()
    }

    fn navigator() -> Navigator {
        Navigator::new(LiveClock::new(Duration::from_millis(10)))
    }

    #[test]
    fn test_parse_routes() {
        assert_eq!(Route::parse("/billings"), Some(Route::Billings));
        assert_eq!(Route::parse("Patients"), Some(Route::Patients));
        assert_eq!(Route::parse("/"), Some(Route::Dashboard));
        assert_eq!(Route::parse("dashboard"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/staff"), None);
    }

    #[tokio::test]
    async fn test_guarded_routes_redirect_when_logged_out() {
        let auth = auth();
        let mut nav = navigator();

        for route in [Route::Dashboard, Route::Patients, Route::Appointments, Route::Billings] {
            assert_eq!(nav.navigate(route, &auth), Route::Login);
        }
        assert!(nav.clock().is_none());
    }

    #[tokio::test]
    async fn test_dashboard_holds_clock_while_mounted() {
        let mut auth = auth();
        auth.login("demo@hospital.com", "demo123").unwrap();
        let mut nav = navigator();

        assert_eq!(nav.navigate(Route::Dashboard, &auth), Route::Dashboard);
        assert!(nav.clock().is_some());
        let mut ticks = nav.clock().unwrap().subscribe();

        assert_eq!(nav.navigate(Route::Billings, &auth), Route::Billings);
        assert!(nav.clock().is_none());

        // 卸载后时钟停止，发送端关闭
        let closed = tokio::time::timeout(Duration::from_secs(2), async {
            while ticks.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok());
    }

    #[tokio::test]
    async fn test_logout_then_navigation_redirects() {
        let mut auth = auth();
        auth.login("demo@hospital.com", "demo123").unwrap();
        let mut nav = navigator();
        nav.navigate(Route::Patients, &auth);

        auth.logout().unwrap();
        assert_eq!(nav.navigate(Route::Appointments, &auth), Route::Login);
        assert_eq!(nav.current(), Route::Login);
    }
}

//! 仪表盘实时时钟
//!
//! 仪表盘视图挂载时获取，卸载时释放。句柄被丢弃时后台任务随之停止。

use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// 时钟配置
#[derive(Debug, Clone, Copy)]
pub struct LiveClock {
    tick: Duration,
}

impl LiveClock {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// 启动后台计时任务，需要在 tokio 运行时内调用
    pub fn acquire(&self) -> ClockHandle {
        let (sender, receiver) = watch::channel(Local::now());
        let tick = self.tick;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                if sender.send(Local::now()).is_err() {
                    break;
                }
            }
        });
        debug!("Clock acquired (tick {:?})", tick);

        ClockHandle {
            receiver,
            task: Some(task),
        }
    }
}

/// 运行中的时钟
#[derive(Debug)]
pub struct ClockHandle {
    receiver: watch::Receiver<DateTime<Local>>,
    task: Option<JoinHandle<()>>,
}

impl ClockHandle {
    /// 最近一次刷新的时间
    pub fn now(&self) -> DateTime<Local> {
        *self.receiver.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<DateTime<Local>> {
        self.receiver.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// 停止计时
    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Clock released");
        }
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_ticks_while_acquired() {
        let handle = LiveClock::new(Duration::from_millis(10)).acquire();
        let mut updates = handle.subscribe();
        let first = handle.now();

        timeout(Duration::from_secs(2), updates.changed())
            .await
            .expect("clock did not tick")
            .unwrap();
        assert!(handle.is_running());
        assert!(*updates.borrow() >= first);
    }

    #[tokio::test]
    async fn test_release_stops_updates() {
        let handle = LiveClock::new(Duration::from_millis(10)).acquire();
        let mut updates = handle.subscribe();
        handle.release();

        // 任务被取消后发送端随之释放，changed 返回错误
        let result = timeout(Duration::from_secs(2), async {
            loop {
                if updates.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_drop_stops_task() {
        let handle = LiveClock::new(Duration::from_millis(10)).acquire();
        let mut updates = handle.subscribe();
        drop(handle);

        let result = timeout(Duration::from_secs(2), async {
            while updates.changed().await.is_ok() {}
        })
        .await;
        assert!(result.is_ok());
    }
}

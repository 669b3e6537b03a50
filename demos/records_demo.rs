//! 记录管理演示程序
//!
//! 展示实体仓储的核心功能，包括搜索、新建、校验失败、编辑、删除确认和账单汇总

use std::time::Duration;

use hospital_admin::config::AuthConfig;
use hospital_admin::{AuthContext, InMemorySessionStore, LiveClock};
use hospital_core::RecordId;
use hospital_records::{
    Collection, CommitOutcome, Confirmation, DeleteRequest, EntityStore, IdStrategy,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    println!("🏥 医院仪表盘记录管理演示\n");
    info!("Starting records demo");

    // 1. 登录
    let mut auth = AuthContext::new(&AuthConfig::default(), Box::new(InMemorySessionStore::default()))?;
    let session = auth.login("demo@hospital.com", "demo123")?;
    println!("✅ 登录成功: {} (会话 {})", session.email, session.session_id);

    // 2. 实时时钟
    let clock = LiveClock::new(Duration::from_millis(200)).acquire();
    let mut ticks = clock.subscribe();
    ticks.changed().await?;
    println!("🕒 当前时间: {}", clock.now().format("%Y-%m-%d %H:%M:%S"));

    // 3. 搜索患者
    let mut patients = EntityStore::for_collection(Collection::Patients, IdStrategy::Sequential)?;
    info!("Loaded {} patients", patients.repository().len());
    patients.on_search("john");
    println!("\n🔍 搜索 'john':");
    for row in patients.rows() {
        let status = row.chip.map(|c| format!("{} {}", c.label, c.color)).unwrap_or_default();
        println!("   - {} {} [{}]", row.record.id, row.record.text("name").unwrap_or_default(), status);
    }
    patients.on_search("");

    // 4. 新建患者，先提交空白草稿
    let today = chrono::Local::now().date_naive();
    let id = patients.on_add(today)?.id().clone();
    if let CommitOutcome::Rejected(errors) = patients.on_save()? {
        println!("\n⚠️  空白草稿被拒绝: {}", errors);
    }

    for (field, value) in [
        ("name", "Alex Lee"),
        ("age", "40"),
        ("gender", "Male"),
        ("contact", "(555) 999-0000"),
        ("blood_group", "O-"),
        ("doctor", "Dr. Smith"),
        ("diagnosis", "Migraine"),
        ("address", "1 Harbor Rd, City"),
    ] {
        patients.on_set_field(field, value)?;
    }
    patients.on_save()?;
    println!("✅ 新建患者 {}，共 {} 名患者", id, patients.repository().len());

    // 5. 修改状态，派生颜色随之变化
    patients.on_edit(&id)?;
    let color = patients.on_set_field("status", "Critical")?.derived("status_color");
    patients.on_save()?;
    println!("✅ 患者 {} 状态改为 Critical，颜色 {}", id, color.unwrap_or_default());

    // 6. 删除确认
    let mut decline = |request: &DeleteRequest| {
        println!("❓ {} -> 取消", request.message());
        Confirmation::Cancelled
    };
    patients.on_delete(&RecordId::new("P001"), &mut decline)?;
    println!("   患者数量不变: {}", patients.repository().len());

    // 7. 账单汇总
    let billings = EntityStore::for_collection(Collection::Billings, IdStrategy::Sequential)?;
    let summary = billings.summarize("status", "amount")?;
    println!("\n💰 账单汇总:");
    for group in &summary.groups {
        println!(
            "   {} ({}): {} 张, 合计 ${:.2}",
            group.value, group.chip.color, group.count, group.total
        );
    }
    println!("   总计: ${:.2}", summary.grand_total());

    clock.release();
    auth.logout()?;
    info!("Records demo finished");
    println!("\n👋 已登出");
    Ok(())
}

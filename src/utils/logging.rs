/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::config::Config;
use crate::orchestrator::RunResult;
use crate::workflow::ItemCtx;

/// 已安装订阅器的过滤器句柄，配置加载后用来调整级别
static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// 初始化 tracing 订阅器
///
/// 在加载配置之前调用，配置文件里的设置之后通过 [`set_verbose`] 生效。
/// 重复调用是安全的（测试里会多次调用）。
///
/// # 参数
/// - `verbose`: 为 true 时默认使用 debug 级别
pub fn init(verbose: bool) {
    let (filter, handle) = reload::Layer::new(build_filter(verbose));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();

    if installed.is_ok() {
        let _ = FILTER_HANDLE.set(handle);
    }
}

/// 按最终配置调整日志级别
pub fn set_verbose(verbose: bool) {
    if let Some(handle) = FILTER_HANDLE.get() {
        let _ = handle.reload(build_filter(verbose));
    }
}

/// `RUST_LOG` 优先，否则按 `verbose` 选择默认级别
fn build_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 附件抓取模式");
    info!("📄 条目列表: {}", config.input_file.display());
    info!("🗂️ 详情缓存: {}", config.data_cache_dir.display());
    info!("📦 文件缓存: {}", config.file_cache_dir.display());
    info!("{}", "=".repeat(60));
}

/// 记录条目加载信息
pub fn log_items_loaded(total: usize) {
    info!("✓ 共 {} 个待处理的条目", total);
    info!("💡 按顺序逐个处理，已缓存的条目会直接跳过\n");
}

/// 记录条目开始处理
///
/// # 参数
/// - `ctx`: 条目上下文（序号、总数、键）
pub fn log_item_start(ctx: &ItemCtx) {
    info!("\n[条目 {}] {}", ctx.item_index, "─".repeat(30));
    info!(
        "[条目 {}] 处理第 {}/{} 个条目，键: {}",
        ctx.item_index,
        ctx.item_index,
        ctx.total,
        ctx.key_str()
    );
}

/// 打印最终统计信息
///
/// # 参数
/// - `result`: 本次运行的汇总结果
/// - `out_file`: 汇总文件路径
pub fn print_final_stats(result: &RunResult, out_file: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("完成，共 {} 个失败", result.failure_count);
    info!(
        "✅ 成功: {}/{} 个条目（缓存命中 {}，新抓取 {}）",
        result.succeeded(),
        result.total,
        result.cache_hits,
        result.fetched
    );
    info!("📎 本地文件: {} 个，文件失败: {} 个", result.file_count, result.file_failure_count);
    if result.aborted {
        info!("⏹️ 运行提前结束，已处理 {}/{}", result.processed, result.total);
    }
    info!("{}", "=".repeat(60));
    info!("\n汇总结果已写入: {}", out_file.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最多保留的字符数
///
/// # 返回
/// 超长时截断并追加 `...`
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

//! 自定义操作测试驱动（testca-harness）。
//!
//! 职责：
//! - `invoke`：按路径加载 DLL，按名称解析入口并以指定会话句柄调用，校验返回 ERROR_SUCCESS
//! - `run`：读取包定义，按 CustomAction 表执行全部 DLL 自定义操作
//! - `inspect`：仅输出包定义中各自定义操作的类型位解析，不加载任何 DLL
//!
//! 输出约定：
//! - 结果写 stdout（每行一条，便于脚本断言）；日志写 stderr
//!
//! 作者：TestCA 夹具项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use testca_core::package::PackageDefinition;
use testca_core::result::ActionResult;
use testca_harness::loader::{CustomActionLibrary, SessionHandle};
use testca_harness::runner;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

/// 命令行参数。
#[derive(Debug, Parser)]
#[command(name = "testca-harness", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 支持的子命令。
#[derive(Debug, Subcommand)]
enum Commands {
    /// 加载 DLL 并调用指定导出。
    Invoke {
        /// 动态库路径。
        #[arg(long)]
        library: PathBuf,

        /// 导出函数名。
        #[arg(long, default_value = "DoNothing")]
        entry: String,

        /// 会话句柄（十进制或 0x 十六进制）。
        #[arg(long, default_value = "0")]
        handle: SessionHandle,

        /// 调用次数（至少 1）。
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        repeat: u32,

        /// 每次调用前重新加载模块（验证加载/卸载可重复）。
        #[arg(long, default_value_t = false)]
        reload: bool,
    },
    /// 执行包定义中的 DLL 自定义操作。
    Run {
        #[arg(long, default_value = "package.json")]
        package: PathBuf,

        #[arg(long, default_value = "0")]
        handle: SessionHandle,
    },
    /// 输出包定义中自定义操作的类型位解析。
    Inspect {
        #[arg(long, default_value = "package.json")]
        package: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Invoke {
            library,
            entry,
            handle,
            repeat,
            reload,
        } => invoke(&library, &entry, handle, repeat, reload),
        Commands::Run { package, handle } => run(&package, handle),
        Commands::Inspect { package } => inspect(&package),
    }
}

fn describe(code: u32) -> String {
    match ActionResult::from_code(code) {
        Some(result) => result.to_string(),
        None => "unknown".to_string(),
    }
}

/// 加载并调用单个导出。
///
/// 异常处理：
/// - 加载/解析失败直接返回错误
/// - 任一调用返回非 0 时，全部调用完成后返回错误
fn invoke(
    library: &Path,
    entry: &str,
    handle: SessionHandle,
    repeat: u32,
    reload: bool,
) -> Result<()> {
    let mut loaded = Some(CustomActionLibrary::load(library)?);
    let mut failures = 0u32;
    for i in 0..repeat {
        if reload && i > 0 {
            drop(loaded.take());
            loaded = Some(CustomActionLibrary::load(library)?);
        }
        let lib = loaded
            .as_ref()
            .ok_or_else(|| anyhow!("library not loaded: {}", library.display()))?;
        let code = lib.invoke(entry, handle)?;
        println!("{entry} = {code} ({})", describe(code));
        if code != 0 {
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{failures} of {repeat} calls to {entry} did not return ERROR_SUCCESS");
    }
    info!("{entry} returned ERROR_SUCCESS {repeat} time(s)");
    Ok(())
}

/// 执行包定义；任一操作失败（且未设置 `Continue`）时返回错误。
fn run(package: &Path, handle: SessionHandle) -> Result<()> {
    let definition = PackageDefinition::from_file(package)?;
    let base_dir = package
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    info!("running package: {}", definition.product_name);
    let report = runner::run_package(&definition, &base_dir, handle)?;
    for outcome in &report.outcomes {
        println!(
            "{} ({}) = {} ({})",
            outcome.action,
            outcome.target,
            outcome.code,
            describe(outcome.code)
        );
    }
    if report.stopped_early {
        println!("stopped early: ERROR_NO_MORE_ITEMS");
    }
    if !report.all_succeeded() {
        bail!("one or more custom actions failed");
    }
    info!("{} custom action(s) succeeded", report.outcomes.len());
    Ok(())
}

fn inspect(package: &Path) -> Result<()> {
    let definition = PackageDefinition::from_file(package)?;
    for ca in &definition.custom_actions {
        println!(
            "{} type={} source={} target={}",
            ca.action,
            ca.action_type,
            ca.source.as_deref().unwrap_or("-"),
            ca.target.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

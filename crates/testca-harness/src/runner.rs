//! 按包定义执行 DLL 自定义操作。
//!
//! 执行语义（与安装引擎对立即执行 DLL 操作的处理一致）：
//! - 按定义顺序逐个执行；每个操作独立加载、调用、卸载其 Binary
//! - 非 DLL 操作跳过
//! - 返回 `ERROR_NO_MORE_ITEMS` 时跳过其余操作
//! - 设置了 `Continue` 位的操作即使返回失败码也不使整体失败
//!
//! 作者：TestCA 夹具项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use testca_core::package::PackageDefinition;
use testca_core::result::ActionResult;
use tracing::{debug, info, warn};

use crate::loader::{CustomActionLibrary, SessionHandle};

/// 单个自定义操作的执行结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: String,
    pub target: String,
    pub code: u32,
    /// 已知返回码的解析结果；未知返回码为 `None`。
    pub result: Option<ActionResult>,
    /// 是否设置了 `Continue` 位（忽略退出码）。
    pub ignores_exit_code: bool,
}

impl ActionOutcome {
    pub fn succeeded(&self) -> bool {
        self.ignores_exit_code
            || matches!(
                self.result,
                Some(ActionResult::Success | ActionResult::NoMoreItems)
            )
    }
}

/// 一次包执行的汇总。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub product_name: String,
    pub outcomes: Vec<ActionOutcome>,
    /// 是否因 `ERROR_NO_MORE_ITEMS` 提前结束。
    pub stopped_early: bool,
}

/// 记录一个结果后的下一步。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// 继续执行后续操作。
    Proceed,
    /// 跳过剩余操作（`ERROR_NO_MORE_ITEMS`）。
    Stop,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(ActionOutcome::succeeded)
    }

    /// 记录单个操作结果并决定是否继续。
    ///
    /// 失败码只记录不中断；是否使整体失败由 [`RunReport::all_succeeded`] 按 `Continue` 位判断。
    pub fn record(&mut self, outcome: ActionOutcome) -> NextStep {
        if !outcome.succeeded() {
            warn!("custom action {} returned {}", outcome.action, outcome.code);
        }
        let stop = outcome.result == Some(ActionResult::NoMoreItems);
        if stop {
            info!(
                "{} returned ERROR_NO_MORE_ITEMS, skipping remaining actions",
                outcome.action
            );
            self.stopped_early = true;
        }
        self.outcomes.push(outcome);
        if stop {
            NextStep::Stop
        } else {
            NextStep::Proceed
        }
    }
}

/// 执行包定义中的全部 DLL 自定义操作。
///
/// 参数：
/// - `definition`：包定义
/// - `base_dir`：包定义文件所在目录（解析 Binary 相对路径）
/// - `handle`：传给每个入口的会话句柄
///
/// 异常处理：
/// - 包定义校验失败、DLL 加载失败或入口未导出时返回错误，后续操作不再执行
pub fn run_package(
    definition: &PackageDefinition,
    base_dir: &Path,
    handle: SessionHandle,
) -> Result<RunReport> {
    definition.validate()?;

    let mut report = RunReport {
        product_name: definition.product_name.clone(),
        ..RunReport::default()
    };

    for ca in &definition.custom_actions {
        if !ca.action_type.is_dll_from_binary() {
            debug!(
                "skipping non-DLL custom action {} ({})",
                ca.action, ca.action_type
            );
            continue;
        }
        let source = ca
            .source
            .as_deref()
            .ok_or_else(|| anyhow!("custom action {} has no source", ca.action))?;
        let target = ca
            .target
            .as_deref()
            .ok_or_else(|| anyhow!("custom action {} has no target", ca.action))?;
        let binary = definition
            .binary(source)
            .ok_or_else(|| anyhow!("binary not found: {source}"))?;
        let path = binary.resolve(base_dir)?;

        info!("running {} -> {}!{}", ca.action, path.display(), target);
        let library = CustomActionLibrary::load(&path)
            .with_context(|| format!("custom action {}", ca.action))?;
        let code = library
            .invoke(target, handle)
            .with_context(|| format!("custom action {}", ca.action))?;
        drop(library);

        let outcome = ActionOutcome {
            action: ca.action.clone(),
            target: target.to_string(),
            code,
            result: ActionResult::from_code(code),
            ignores_exit_code: ca.action_type.ignores_exit_code(),
        };
        if report.record(outcome) == NextStep::Stop {
            break;
        }
    }

    Ok(report)
}

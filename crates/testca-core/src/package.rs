//! 包定义（package definition，JSON）模型。
//!
//! 该文件是安装包 `Binary` 表与 `CustomAction` 表的测试替身：
//! - `binaries`：二进制名称到磁盘路径的映射（夹具 DLL 在此登记）
//! - `custom_actions`：自定义操作行（名称/类型位/来源/目标）
//!
//! 约定：
//! - 可选字段通过 `#[serde(default)]` 提供默认值
//! - 除 [`PackageDefinition::from_file`] 外不做任何 IO
//!
//! 作者：TestCA 夹具项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::action::CustomActionType;

/// 包定义根对象。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDefinition {
    /// 产品显示名称（仅用于日志）。
    #[serde(default)]
    pub product_name: String,
    /// Binary 表。
    #[serde(default)]
    pub binaries: Vec<BinaryEntry>,
    /// CustomAction 表。
    #[serde(default)]
    pub custom_actions: Vec<CustomAction>,
}

/// Binary 表中的一行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryEntry {
    /// 二进制名称（被 `CustomAction.source` 引用）。
    pub name: String,
    /// 相对包定义文件所在目录或绝对路径。
    pub path: String,
}

/// CustomAction 表中的一行。
///
/// 对 DLL 操作：`source` 为 Binary 名称，`target` 为导出函数名。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomAction {
    /// 操作名称（唯一）。
    pub action: String,
    /// 类型位（JSON 字段名为 `type`）。
    #[serde(rename = "type")]
    pub action_type: CustomActionType,
    /// 来源：Binary 名称、文件键、目录或属性名，视类型位而定。
    #[serde(default)]
    pub source: Option<String>,
    /// 目标：DLL 导出函数名、命令行或脚本文本，视类型位而定。
    #[serde(default)]
    pub target: Option<String>,
}

/// 包定义校验错误。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackageError {
    #[error("duplicate custom action: {0}")]
    DuplicateAction(String),

    #[error(
        "custom action {action} references unknown binary {}",
        .source_name.as_deref().unwrap_or("<none>")
    )]
    UnknownBinary {
        action: String,
        source_name: Option<String>,
    },

    #[error("custom action {0} has no entry point")]
    MissingEntryPoint(String),

    #[error("binary {0} has an empty path")]
    EmptyBinaryPath(String),
}

impl PackageDefinition {
    /// 读取并解析包定义文件。
    ///
    /// 异常处理：
    /// - 文件读取失败或 JSON 解析失败返回错误（错误信息包含路径）
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read package definition: {}", path.display()))?;
        let definition: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse package definition: {}", path.display()))?;
        debug!(
            "loaded package {:?}: {} binaries, {} custom actions",
            definition.product_name,
            definition.binaries.len(),
            definition.custom_actions.len()
        );
        Ok(definition)
    }

    pub fn binary(&self, name: &str) -> Option<&BinaryEntry> {
        self.binaries.iter().find(|b| b.name == name)
    }

    /// 按定义顺序列出“Binary 表中的 DLL”自定义操作。
    pub fn dll_actions(&self) -> impl Iterator<Item = &CustomAction> {
        self.custom_actions
            .iter()
            .filter(|ca| ca.action_type.is_dll_from_binary())
    }

    /// 校验包定义的引用完整性。
    ///
    /// 规则：
    /// - 操作名称唯一
    /// - Binary 路径非空
    /// - DLL 操作的 `source` 必须指向已登记的 Binary，`target` 必须非空
    pub fn validate(&self) -> std::result::Result<(), PackageError> {
        let mut seen = HashSet::new();
        for ca in &self.custom_actions {
            if !seen.insert(ca.action.as_str()) {
                return Err(PackageError::DuplicateAction(ca.action.clone()));
            }
        }
        if let Some(b) = self.binaries.iter().find(|b| b.path.trim().is_empty()) {
            return Err(PackageError::EmptyBinaryPath(b.name.clone()));
        }
        for ca in self.dll_actions() {
            let known = ca
                .source
                .as_deref()
                .and_then(|name| self.binary(name))
                .is_some();
            if !known {
                return Err(PackageError::UnknownBinary {
                    action: ca.action.clone(),
                    source_name: ca.source.clone(),
                });
            }
            if ca.target.as_deref().map_or(true, |t| t.trim().is_empty()) {
                return Err(PackageError::MissingEntryPoint(ca.action.clone()));
            }
        }
        Ok(())
    }
}

impl BinaryEntry {
    /// 解析 Binary 路径：绝对路径直接返回，相对路径基于 `base`。
    pub fn resolve(&self, base: &Path) -> Result<PathBuf> {
        if self.path.trim().is_empty() {
            return Err(PackageError::EmptyBinaryPath(self.name.clone()).into());
        }
        let p = PathBuf::from(&self.path);
        if p.is_absolute() {
            Ok(p)
        } else {
            Ok(base.join(p))
        }
    }
}

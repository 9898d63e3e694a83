//! 自定义操作类型位（`CustomAction.Type` 列）解析。
//!
//! 位布局：
//! - `0x07`：可执行类型（按数值整体解释，不逐位拆分）
//! - `0x30`：来源位置（Binary 表 / 已安装文件 / 目录 / 属性）
//! - `0x40`、`0x80`：返回码处理（忽略退出码、异步）
//! - `0x100`、`0x200`：无 `InScript` 时为调度选项；有 `InScript` 时表示回滚/提交
//! - `0x400` 及以上：延迟执行、无模拟、64 位脚本、隐藏目标、终端服务感知、补丁卸载
//!
//! 作者：TestCA 夹具项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::fmt;

use serde::{Deserialize, Serialize};

/// `CustomAction.Type` 的原始位值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomActionType(pub u32);

/// 可执行类型（低 3 位的数值）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// 原生 DLL 导出函数。
    Dll,
    /// 可执行文件。
    Exe,
    /// 文本数据（设置属性/目录等）。
    TextData,
    /// JScript 脚本。
    JScript,
    /// VBScript 脚本。
    VBScript,
    /// 嵌套安装。
    Install,
}

/// 来源位置（`0x30` 位）。
///
/// 对脚本类操作，`Directory` 表示脚本文本直接写在 `Target` 列中。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSource {
    /// `Source` 列引用 Binary 表中的条目。
    BinaryData,
    /// `Source` 列引用已安装的文件。
    SourceFile,
    /// `Source` 列引用目录。
    Directory,
    /// `Source` 列引用属性。
    Property,
}

/// 执行阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// 立即执行（不在安装脚本中）。
    Immediate,
    /// 延迟执行（写入安装脚本）。
    Deferred,
    /// 回滚时执行。
    Rollback,
    /// 脚本成功提交后执行。
    Commit,
}

/// 立即执行操作的调度选项。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduling {
    /// 每次遇到都执行。
    Always,
    /// 同一会话中只执行首次。
    FirstSequence,
    /// 同一进程中只执行一次。
    OncePerProcess,
    /// 仅在客户端 UI 序列已执行过时于服务端重复执行。
    ClientRepeat,
}

impl CustomActionType {
    pub const KIND_MASK: u32 = 0x07;
    pub const SOURCE_MASK: u32 = 0x30;
    pub const CONTINUE: u32 = 0x40;
    pub const ASYNC: u32 = 0x80;
    pub const FIRST_SEQUENCE: u32 = 0x100;
    pub const ONCE_PER_PROCESS: u32 = 0x200;
    pub const CLIENT_REPEAT: u32 = 0x300;
    pub const ROLLBACK: u32 = 0x100;
    pub const COMMIT: u32 = 0x200;
    pub const IN_SCRIPT: u32 = 0x400;
    pub const NO_IMPERSONATE: u32 = 0x800;
    pub const SCRIPT_64BIT: u32 = 0x1000;
    pub const HIDE_TARGET: u32 = 0x2000;
    pub const TS_AWARE: u32 = 0x4000;
    pub const PATCH_UNINSTALL: u32 = 0x8000;

    /// 原始位值。
    pub fn bits(self) -> u32 {
        self.0
    }

    fn has(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    /// 可执行类型；低 3 位为 `0` 或 `4` 时返回 `None`。
    pub fn kind(self) -> Option<ActionKind> {
        match self.0 & Self::KIND_MASK {
            1 => Some(ActionKind::Dll),
            2 => Some(ActionKind::Exe),
            3 => Some(ActionKind::TextData),
            5 => Some(ActionKind::JScript),
            6 => Some(ActionKind::VBScript),
            7 => Some(ActionKind::Install),
            _ => None,
        }
    }

    pub fn source(self) -> ActionSource {
        match self.0 & Self::SOURCE_MASK {
            0x00 => ActionSource::BinaryData,
            0x10 => ActionSource::SourceFile,
            0x20 => ActionSource::Directory,
            _ => ActionSource::Property,
        }
    }

    /// 执行阶段。
    ///
    /// `InScript` 下 `0x200` 优先于 `0x100`：两者同时设置时按提交处理。
    pub fn execution(self) -> Execution {
        if !self.has(Self::IN_SCRIPT) {
            Execution::Immediate
        } else if self.has(Self::COMMIT) {
            Execution::Commit
        } else if self.has(Self::ROLLBACK) {
            Execution::Rollback
        } else {
            Execution::Deferred
        }
    }

    /// 调度选项；延迟类操作没有调度选项，返回 `None`。
    pub fn scheduling(self) -> Option<Scheduling> {
        if self.has(Self::IN_SCRIPT) {
            return None;
        }
        Some(match self.0 & Self::CLIENT_REPEAT {
            0x100 => Scheduling::FirstSequence,
            0x200 => Scheduling::OncePerProcess,
            0x300 => Scheduling::ClientRepeat,
            _ => Scheduling::Always,
        })
    }

    /// 是否忽略退出码（`Continue`）。
    pub fn ignores_exit_code(self) -> bool {
        self.has(Self::CONTINUE)
    }

    pub fn is_async(self) -> bool {
        self.has(Self::ASYNC)
    }

    pub fn no_impersonate(self) -> bool {
        self.has(Self::NO_IMPERSONATE)
    }

    /// 是否为“Binary 表中的 DLL”自定义操作（夹具的使用方式）。
    pub fn is_dll_from_binary(self) -> bool {
        self.kind() == Some(ActionKind::Dll) && self.source() == ActionSource::BinaryData
    }

    /// 列出所有已设置的语义标志名称（用于 `inspect` 输出与排障）。
    pub fn breakdown(self) -> Vec<&'static str> {
        let mut names = vec![
            match self.kind() {
                Some(ActionKind::Dll) => "Dll",
                Some(ActionKind::Exe) => "Exe",
                Some(ActionKind::TextData) => "TextData",
                Some(ActionKind::JScript) => "JScript",
                Some(ActionKind::VBScript) => "VBScript",
                Some(ActionKind::Install) => "Install",
                None => "InvalidKind",
            },
            match self.source() {
                ActionSource::BinaryData => "BinaryData",
                ActionSource::SourceFile => "SourceFile",
                ActionSource::Directory => "Directory",
                ActionSource::Property => "Property",
            },
        ];
        if self.ignores_exit_code() {
            names.push("Continue");
        }
        if self.is_async() {
            names.push("Async");
        }
        match (self.execution(), self.scheduling()) {
            (Execution::Immediate, Some(Scheduling::FirstSequence)) => names.push("FirstSequence"),
            (Execution::Immediate, Some(Scheduling::OncePerProcess)) => {
                names.push("OncePerProcess")
            }
            (Execution::Immediate, Some(Scheduling::ClientRepeat)) => names.push("ClientRepeat"),
            (Execution::Immediate, _) => {}
            (Execution::Deferred, _) => names.push("InScript"),
            (Execution::Rollback, _) => names.extend(["InScript", "Rollback"]),
            (Execution::Commit, _) => names.extend(["InScript", "Commit"]),
        }
        for (flag, name) in [
            (Self::NO_IMPERSONATE, "NoImpersonate"),
            (Self::SCRIPT_64BIT, "64BitScript"),
            (Self::HIDE_TARGET, "HideTarget"),
            (Self::TS_AWARE, "TSAware"),
            (Self::PATCH_UNINSTALL, "PatchUninstall"),
        ] {
            if self.has(flag) {
                names.push(name);
            }
        }
        names
    }
}

impl From<u32> for CustomActionType {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl fmt::Display for CustomActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.0, self.breakdown().join(", "))
    }
}

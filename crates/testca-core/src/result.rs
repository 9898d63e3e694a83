//! 自定义操作返回码。
//!
//! 作者：TestCA 夹具项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::fmt;

/// 安装引擎认可的自定义操作返回值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ActionResult {
    /// 成功（ERROR_SUCCESS）。
    Success = 0,
    /// 跳过剩余操作（ERROR_NO_MORE_ITEMS）。
    NoMoreItems = 259,
    /// 用户取消（ERROR_INSTALL_USEREXIT）。
    UserExit = 1602,
    /// 致命错误（ERROR_INSTALL_FAILURE）。
    InstallFailure = 1603,
    /// 安装挂起，稍后继续（ERROR_INSTALL_SUSPEND）。
    Suspend = 1604,
    /// 未执行（ERROR_FUNCTION_NOT_CALLED）。
    FunctionNotCalled = 1626,
}

impl ActionResult {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            259 => Some(Self::NoMoreItems),
            1602 => Some(Self::UserExit),
            1603 => Some(Self::InstallFailure),
            1604 => Some(Self::Suspend),
            1626 => Some(Self::FunctionNotCalled),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "ERROR_SUCCESS",
            Self::NoMoreItems => "ERROR_NO_MORE_ITEMS",
            Self::UserExit => "ERROR_INSTALL_USEREXIT",
            Self::InstallFailure => "ERROR_INSTALL_FAILURE",
            Self::Suspend => "ERROR_INSTALL_SUSPEND",
            Self::FunctionNotCalled => "ERROR_FUNCTION_NOT_CALLED",
        };
        f.write_str(name)
    }
}

//! TestCA：用于验证“DLL 自定义操作（custom action）”加载链路的最小原生动态库夹具。
//!
//! 导出面：
//! - `DoNothing`：按名称导出的自定义操作入口，忽略会话句柄并固定返回 `0`（ERROR_SUCCESS）
//! - `DllMain`（仅 Windows）：模块生命周期回调，任何原因码都报告“初始化成功”
//!
//! 约束：
//! - 不做任何 IO、不分配资源、不创建线程、不读写环境变量
//! - 会话句柄只作为不透明令牌透传，绝不解引用或修改
//! - 生命周期回调可能在加载器锁内被调用，必须立即返回，不能再加载其他模块
//!
//! 作者：TestCA 夹具项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

#![allow(non_snake_case)]

use std::ffi::c_void;

/// 安装会话句柄（不透明、指针宽度）。
///
/// 夹具从不解释其内容；任何值（包括空指针）都是合法输入。
pub type SessionHandle = *mut c_void;

/// 自定义操作成功返回码（ERROR_SUCCESS）。
pub const ERROR_SUCCESS: u32 = 0;

/// 自定义操作入口：什么也不做。
///
/// 参数：
/// - `_install_session`：安装引擎传入的会话句柄，不解引用、不修改
///
/// 返回值：
/// - 固定返回 [`ERROR_SUCCESS`]
///
/// 调用约定：
/// - `extern "system"`：32 位 Windows 上为 `__stdcall`，其余平台等同 C ABI，与安装引擎对自定义操作入口的要求一致
/// - `#[no_mangle]`：按名称导出，加载器可通过符号名而非序号解析
#[no_mangle]
pub extern "system" fn DoNothing(_install_session: SessionHandle) -> u32 {
    ERROR_SUCCESS
}

/// 加载器通知生命周期回调的原因码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LoaderReason {
    /// 模块从进程卸载。
    ProcessDetach = 0,
    /// 模块映射进进程。
    ProcessAttach = 1,
    /// 进程内新建线程。
    ThreadAttach = 2,
    /// 线程正常退出。
    ThreadDetach = 3,
}

impl LoaderReason {
    /// 解析原始原因码；未定义的值返回 `None`。
    pub fn from_raw(reason: u32) -> Option<Self> {
        match reason {
            0 => Some(Self::ProcessDetach),
            1 => Some(Self::ProcessAttach),
            2 => Some(Self::ThreadAttach),
            3 => Some(Self::ThreadDetach),
            _ => None,
        }
    }
}

/// 生命周期回调的平台无关实现。
///
/// 对所有原因码（包括未定义的值）都返回 `true`，不做任何工作。
pub fn on_loader_event(reason: u32) -> bool {
    match LoaderReason::from_raw(reason) {
        Some(LoaderReason::ProcessAttach | LoaderReason::ProcessDetach) => true,
        Some(LoaderReason::ThreadAttach | LoaderReason::ThreadDetach) => true,
        None => true,
    }
}

#[cfg(windows)]
mod dll_main {
    use std::ffi::c_void;

    use windows::Win32::Foundation::{BOOL, FALSE, HINSTANCE, TRUE};
    use windows::Win32::System::SystemServices::{
        DLL_PROCESS_ATTACH, DLL_PROCESS_DETACH, DLL_THREAD_ATTACH, DLL_THREAD_DETACH,
    };

    use super::{on_loader_event, LoaderReason};

    const _: () = {
        assert!(DLL_PROCESS_DETACH == LoaderReason::ProcessDetach as u32);
        assert!(DLL_PROCESS_ATTACH == LoaderReason::ProcessAttach as u32);
        assert!(DLL_THREAD_ATTACH == LoaderReason::ThreadAttach as u32);
        assert!(DLL_THREAD_DETACH == LoaderReason::ThreadDetach as u32);
    };

    /// Windows 模块生命周期入口。
    ///
    /// 在加载器锁内执行：不加载其他模块、不阻塞、不获取资源。
    #[no_mangle]
    pub extern "system" fn DllMain(
        _module: HINSTANCE,
        reason: u32,
        _reserved: *mut c_void,
    ) -> BOOL {
        if on_loader_event(reason) {
            TRUE
        } else {
            FALSE
        }
    }
}

#[cfg(windows)]
pub use dll_main::DllMain;

#[cfg(test)]
mod tests {
    use std::ptr;

    use super::*;

    #[test]
    fn do_nothing_returns_success_for_null_handle() {
        assert_eq!(DoNothing(ptr::null_mut()), ERROR_SUCCESS);
    }

    #[test]
    fn do_nothing_never_touches_the_handle() {
        let mut token = 0xA5A5_u32;
        let handle = &mut token as *mut u32 as SessionHandle;
        assert_eq!(DoNothing(handle), 0);
        assert_eq!(token, 0xA5A5);
    }

    #[test]
    fn loader_reason_round_trips_known_codes() {
        for reason in [
            LoaderReason::ProcessDetach,
            LoaderReason::ProcessAttach,
            LoaderReason::ThreadAttach,
            LoaderReason::ThreadDetach,
        ] {
            assert_eq!(LoaderReason::from_raw(reason as u32), Some(reason));
        }
        assert_eq!(LoaderReason::from_raw(4), None);
    }

    #[test]
    fn loader_event_always_succeeds() {
        for reason in [0, 1, 2, 3, 4, 0xFFFF_FFFF] {
            assert!(on_loader_event(reason), "reason {reason}");
        }
    }
}

//! 自定义操作 DLL 加载与调用。
//!
//! 实现策略：
//! - 通过平台动态加载器（Windows `LoadLibraryW` / Unix `dlopen`，经 libloading 封装）按路径加载
//! - 导出函数按名称解析，签名固定为安装引擎的自定义操作入口：`extern "system" fn(handle) -> u32`
//! - [`CustomActionLibrary`] 被释放时卸载模块
//!
//! 安全注意：
//! - 调用导出函数等同于执行任意原生代码；只应加载受信任的测试夹具
//!
//! 作者：TestCA 夹具项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::ffi::{c_void, OsString};
use std::fmt;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use libloading::{Library, Symbol};
use thiserror::Error;
use tracing::debug;

/// 自定义操作入口函数签名。
pub type EntryPoint = unsafe extern "system" fn(*mut c_void) -> u32;

/// 传给自定义操作的会话句柄（不透明、指针宽度）。
///
/// 仅在调用边界转换为无类型指针；harness 与夹具都不会解引用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionHandle(pub usize);

impl SessionHandle {
    /// 空句柄。
    pub const NULL: Self = Self(0);

    fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

impl FromStr for SessionHandle {
    type Err = ParseIntError;

    /// 接受十进制或 `0x` 前缀的十六进制。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => usize::from_str_radix(hex, 16)?,
            None => s.parse()?,
        };
        Ok(Self(value))
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// 加载/解析错误。
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("entry point {symbol} is not exported by {}: {source}", .path.display())]
    MissingEntryPoint {
        symbol: String,
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("invalid entry point name: {0:?}")]
    InvalidEntryPoint(String),
}

/// 平台上的动态库文件名（如 `TestCA.dll` / `libTestCA.so` / `libTestCA.dylib`）。
pub fn shared_library_file_name(base: &str) -> OsString {
    libloading::library_filename(base)
}

/// 已加载的自定义操作 DLL。
pub struct CustomActionLibrary {
    path: PathBuf,
    library: Library,
}

impl CustomActionLibrary {
    /// 按路径加载动态库。
    ///
    /// 异常处理：
    /// - 文件不存在、格式不符或依赖缺失时返回 [`LoaderError::Load`]
    pub fn load(path: &Path) -> Result<Self, LoaderError> {
        // SAFETY: 被加载模块的初始化代码会立即执行；调用方负责只加载受信任的夹具。
        let library = unsafe { Library::new(path) }.map_err(|source| LoaderError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded custom action library {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 按名称解析导出函数（不按序号）。
    pub fn entry_point(&self, name: &str) -> Result<Symbol<'_, EntryPoint>, LoaderError> {
        if name.is_empty() || name.contains('\0') {
            return Err(LoaderError::InvalidEntryPoint(name.to_string()));
        }
        // SAFETY: 导出函数按自定义操作入口签名使用；签名不符属于被测 DLL 的缺陷。
        unsafe { self.library.get::<EntryPoint>(name.as_bytes()) }.map_err(|source| {
            LoaderError::MissingEntryPoint {
                symbol: name.to_string(),
                path: self.path.clone(),
                source,
            }
        })
    }

    /// 解析并调用一次导出函数，返回其结果码。
    pub fn invoke(&self, name: &str, handle: SessionHandle) -> Result<u32, LoaderError> {
        let entry = self.entry_point(name)?;
        // SAFETY: 入口签名见 `entry_point`；句柄按不透明值透传。
        let code = unsafe { entry(handle.as_ptr()) };
        debug!("{name}({handle}) returned {code}");
        Ok(code)
    }
}

impl fmt::Debug for CustomActionLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomActionLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_handle_parses_decimal_and_hex() {
        assert_eq!("0".parse::<SessionHandle>(), Ok(SessionHandle::NULL));
        assert_eq!("42".parse::<SessionHandle>(), Ok(SessionHandle(42)));
        assert_eq!("0xDEAD".parse::<SessionHandle>(), Ok(SessionHandle(0xDEAD)));
        assert_eq!(" 0X10 ".parse::<SessionHandle>(), Ok(SessionHandle(16)));
        assert!("0xZZ".parse::<SessionHandle>().is_err());
        assert!("-1".parse::<SessionHandle>().is_err());
    }

    #[test]
    fn session_handle_displays_as_hex() {
        assert_eq!(SessionHandle(255).to_string(), "0xff");
    }

    #[test]
    fn library_file_name_uses_platform_convention() {
        let name = shared_library_file_name("TestCA");
        let name = name.to_string_lossy();
        assert!(name.contains("TestCA"), "{name}");
        assert!(name.ends_with(std::env::consts::DLL_SUFFIX), "{name}");
    }

    #[test]
    fn loading_missing_file_reports_path() {
        let path = Path::new("definitely-not-here").join("TestCA.missing");
        let err = CustomActionLibrary::load(&path).expect_err("missing library");
        assert!(matches!(err, LoaderError::Load { .. }));
        assert!(err.to_string().contains("TestCA.missing"), "{err}");
    }
}

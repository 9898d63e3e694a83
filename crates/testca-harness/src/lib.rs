//! TestCA 测试驱动（harness）：按路径加载自定义操作 DLL、按名称解析导出并调用。
//!
//! 模块划分：
//! - [`loader`]：平台动态加载器封装（libloading）
//! - [`runner`]：按包定义编排 DLL 自定义操作并汇总结果
//!
//! 作者：TestCA 夹具项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

pub mod loader;
pub mod runner;

//! TestCA 核心库（平台无关、不做系统修改）。
//!
//! 功能：
//! - 自定义操作类型位（`CustomAction.Type`）的解析
//! - 自定义操作返回码模型
//! - 包定义（package definition，JSON）：引用夹具 DLL 的 Binary/CustomAction 描述
//!
//! 作者：TestCA 夹具项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

pub mod action;
pub mod package;
pub mod result;

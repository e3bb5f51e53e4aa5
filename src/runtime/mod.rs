//! Application lifecycle and execution modes
//!
//! - `lifetime`: 启动准备、优雅关闭
//! - `modes`: server / cli 入口

pub mod lifetime;
pub mod modes;

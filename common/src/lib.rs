//! 数据库管理仪表盘公共模块
//!
//! 提供客户端各组件共享的基础设施：
//! - 配置加载
//! - 统一错误类型
//! - 实体记录、数据库结构、认证与查询模型
//! - 远程 API 响应封装
//! - 请求头处理（请求 ID、Bearer 认证）

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;

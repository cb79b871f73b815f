//! Utils: 文件名处理与URL校验

pub mod naming;
pub mod validator;

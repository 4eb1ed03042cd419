use std::env;

use super::FlowMode;

pub const MODE_VAR: &str = "FAASFLOW_MODE";
pub const DEBUG_VAR: &str = "FAASFLOW_DEBUG";

/// 环境变量配置快照
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// `FAASFLOW_MODE` 为 `sync` 或 `async` 时覆盖配置中的模式
    pub mode: Option<FlowMode>,
    pub debug: bool,
}

impl EnvConfig {
    /// 读取当前进程的环境变量
    pub fn from_env() -> Self {
        Self {
            mode: Self::parse_mode(Self::get_env_optional(MODE_VAR)),
            debug: Self::is_debug_mode(),
        }
    }

    /// 未知取值记录警告后忽略
    pub fn parse_mode(value: Option<String>) -> Option<FlowMode> {
        let value = value?;
        match value.parse() {
            Ok(mode) => Some(mode),
            Err(_) => {
                tracing::warn!(value = %value, "ignoring unknown {MODE_VAR}");
                None
            }
        }
    }

    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|value| !value.trim().is_empty())
    }

    pub fn is_debug_mode() -> bool {
        env::var(DEBUG_VAR).is_ok()
    }
}

//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量管理

use std::env;
use std::fmt;
use std::time::Duration;

use crate::settings::TriggerMode;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    /// 读取变量；未设置时退回 `DEFAULT`
    fn get() -> EnvResult<T> {
        match Self::get_explicit() {
            Some(result) => result,
            None => Self::DEFAULT.ok_or_else(|| EnvError {
                variable: Self::NAME.to_string(),
                message: "Required environment variable not set".to_string(),
            }),
        }
    }

    /// 只在变量被显式设置时返回结果，用于覆盖配置文件中的值
    fn get_explicit() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<&'static str> for LogLevel {
        const NAME: &'static str = "HOVERLAY_LOG_LEVEL";
        const DEFAULT: Option<&'static str> = Some("info");
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<&'static str> {
            match value.trim().to_lowercase().as_str() {
                "trace" => Ok("trace"),
                "debug" => Ok("debug"),
                "info" => Ok("info"),
                "warn" => Ok("warn"),
                "error" => Ok("error"),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 覆盖层相关环境变量
pub mod overlay {
    use super::*;

    /// 源语言
    pub struct SourceLang;
    impl EnvVar<String> for SourceLang {
        const NAME: &'static str = "HOVERLAY_SOURCE_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Source language of page text (BCP 47 primary tag)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_language(value, Self::NAME)
        }
    }

    /// 目标语言
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "HOVERLAY_TARGET_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Target language for translation (BCP 47 primary tag)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_language(value, Self::NAME)
        }
    }

    /// 触发模式
    pub struct TriggerModeVar;
    impl EnvVar<TriggerMode> for TriggerModeVar {
        const NAME: &'static str = "HOVERLAY_TRIGGER_MODE";
        const DEFAULT: Option<TriggerMode> = Some(TriggerMode::Modifier);
        const DESCRIPTION: &'static str = "Trigger mode: word-hover, sentence-hover, modifier";

        fn parse(value: &str) -> EnvResult<TriggerMode> {
            value.parse().map_err(|message| EnvError {
                variable: Self::NAME.to_string(),
                message,
            })
        }
    }

    /// 指针防抖时间
    pub struct Debounce;
    impl EnvVar<Duration> for Debounce {
        const NAME: &'static str = "HOVERLAY_DEBOUNCE_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(80));
        const DESCRIPTION: &'static str = "Pointer debounce delay in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let millis = parse_positive_usize(value, Self::NAME, 0, 5000)?;
            Ok(Duration::from_millis(millis as u64))
        }
    }

    /// 词表文件
    pub struct Glossary;
    impl EnvVar<String> for Glossary {
        const NAME: &'static str = "HOVERLAY_GLOSSARY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Path of the glossary file used by the bundled engine";

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path cannot be empty".to_string(),
                });
            }
            Ok(shellexpand::tilde(path).into_owned())
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存容量
    pub struct Capacity;
    impl EnvVar<usize> for Capacity {
        const NAME: &'static str = "HOVERLAY_CACHE_CAPACITY";
        const DEFAULT: Option<usize> = Some(500);
        const DESCRIPTION: &'static str = "Translation cache capacity (number of entries)";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 100_000)
        }
    }
}

/// 辅助函数
fn parse_language(value: &str, var_name: &str) -> EnvResult<String> {
    let lang = value.trim().to_lowercase();
    let valid = (2..=3).contains(&lang.len()) && lang.chars().all(|c| c.is_ascii_lowercase());
    if valid {
        Ok(lang)
    } else {
        Err(EnvError {
            variable: var_name.to_string(),
            message: "Language code must be 2 or 3 ASCII letters".to_string(),
        })
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let entries = [
        (core::LogLevel::NAME, core::LogLevel::DESCRIPTION, "info"),
        (overlay::SourceLang::NAME, overlay::SourceLang::DESCRIPTION, "(config)"),
        (overlay::TargetLang::NAME, overlay::TargetLang::DESCRIPTION, "(config)"),
        (overlay::TriggerModeVar::NAME, overlay::TriggerModeVar::DESCRIPTION, "modifier"),
        (overlay::Debounce::NAME, overlay::Debounce::DESCRIPTION, "80"),
        (overlay::Glossary::NAME, overlay::Glossary::DESCRIPTION, "(none)"),
        (cache::Capacity::NAME, cache::Capacity::DESCRIPTION, "500"),
    ];

    let mut docs = String::from("# Environment Variables\n\n");
    for (name, description, default) in entries {
        docs.push_str(&format!("- `{}`: {} (default: {})\n", name, description, default));
    }
    docs
}

//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{constants, language_name};
use crate::settings::{Modifier, Settings};
use crate::translation::error::{TranslationError, TranslationResult};

/// 覆盖层配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    // 触发配置
    pub debounce_ms: u64,
    pub sentence_key_chars: usize,
    pub primary_modifier: Modifier,
    pub secondary_modifier: Modifier,

    // 缓存配置
    pub cache_capacity: usize,

    // DOM 标记
    pub marker_class: String,
    pub banner_class: String,

    // 内置词表引擎
    pub glossary_path: Option<String>,

    // 初始设置（存储为空时使用），放在最后以便 TOML 先输出标量字段
    pub settings: Settings,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            debounce_ms: constants::DEFAULT_DEBOUNCE.as_millis() as u64,
            sentence_key_chars: constants::DEFAULT_SENTENCE_KEY_CHARS,
            primary_modifier: Modifier::Alt,
            secondary_modifier: Modifier::Meta,
            cache_capacity: constants::DEFAULT_CACHE_CAPACITY,
            marker_class: constants::MARKER_CLASS.to_string(),
            banner_class: constants::BANNER_CLASS.to_string(),
            glossary_path: None,
            settings: Settings::default(),
        }
    }
}

impl OverlayConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.cache_capacity == 0 {
            return Err(TranslationError::ConfigError("缓存容量不能为0".to_string()));
        }

        if self.debounce_ms > constants::MAX_DEBOUNCE_MS {
            return Err(TranslationError::ConfigError(format!(
                "防抖时间过长（最大 {} 毫秒）",
                constants::MAX_DEBOUNCE_MS
            )));
        }

        if self.sentence_key_chars == 0 {
            return Err(TranslationError::ConfigError("句子键长度不能为0".to_string()));
        }

        if self.primary_modifier == self.secondary_modifier {
            return Err(TranslationError::ConfigError("两个修饰键必须不同".to_string()));
        }

        for class in [&self.marker_class, &self.banner_class] {
            if class.is_empty() || class.contains(char::is_whitespace) {
                return Err(TranslationError::ConfigError(format!("无效的类名: '{}'", class)));
            }
        }

        for lang in [&self.settings.source_lang, &self.settings.target_lang] {
            if lang.trim().is_empty() {
                return Err(TranslationError::ConfigError("语言代码不能为空".to_string()));
            }
            if language_name(lang).is_none() {
                tracing::warn!("语言代码 '{}' 不在支持列表中", lang);
            }
        }

        Ok(())
    }

    /// 应用环境变量覆盖（只覆盖显式设置的变量，非法值记录警告后忽略）
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{cache, overlay, EnvResult, EnvVar};

        fn explicit<T>(value: Option<EnvResult<T>>) -> Option<T> {
            match value? {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("忽略环境变量: {}", e);
                    None
                }
            }
        }

        if let Some(source_lang) = explicit(overlay::SourceLang::get_explicit()) {
            self.settings.source_lang = source_lang;
        }

        if let Some(target_lang) = explicit(overlay::TargetLang::get_explicit()) {
            self.settings.target_lang = target_lang;
        }

        if let Some(mode) = explicit(overlay::TriggerModeVar::get_explicit()) {
            self.settings.trigger_mode = mode;
        }

        if let Some(debounce) = explicit(overlay::Debounce::get_explicit()) {
            self.debounce_ms = debounce.as_millis() as u64;
        }

        if let Some(glossary) = explicit(overlay::Glossary::get_explicit()) {
            tracing::info!("环境变量覆盖词表路径: {}", glossary);
            self.glossary_path = Some(glossary);
        }

        if let Some(capacity) = explicit(cache::Capacity::get_explicit()) {
            self.cache_capacity = capacity;
        }
    }

    /// 转换为Duration类型
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: OverlayConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器：.env → 配置文件 → 环境变量覆盖 → 验证
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定文件创建，同样应用环境变量覆盖
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn into_config(self) -> OverlayConfig {
        self.config
    }

    /// 从搜索路径加载配置
    fn load_config() -> TranslationResult<OverlayConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(OverlayConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<OverlayConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".toml") {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = OverlayConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TriggerMode;

    #[test]
    fn test_default_config_is_valid() {
        let config = OverlayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.debounce(), Duration::from_millis(80));
        assert_eq!(config.cache_capacity, 500);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = OverlayConfig::default();
        config.cache_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = OverlayConfig::default();
        config.secondary_modifier = Modifier::Alt;
        assert!(config.validate().is_err());

        let mut config = OverlayConfig::default();
        config.marker_class = "two words".to_string();
        assert!(config.validate().is_err());

        let mut config = OverlayConfig::default();
        config.debounce_ms = 60_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: OverlayConfig = toml::from_str(
            r#"
            debounce_ms = 120

            [settings]
            sourceLang = "fr"
            targetLang = "en"
            triggerMode = "word-hover"
            "#,
        )
        .unwrap();

        assert_eq!(config.debounce_ms, 120);
        assert_eq!(config.settings.trigger_mode, TriggerMode::WordHover);
        assert_eq!(config.marker_class, constants::MARKER_CLASS);
    }

    #[test]
    fn test_example_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hoverlay.toml");
        let path = path.to_str().unwrap();

        ConfigManager::generate_example_config(path).unwrap();
        let loaded = ConfigManager::load_from_file(path).unwrap();
        assert_eq!(loaded, OverlayConfig::default());
    }
}

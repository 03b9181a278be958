//! 内置词表翻译引擎
//!
//! 从 TOML / JSON 词表文件读取按语言对分组的条目：
//!
//! ```toml
//! [pairs.es-en]
//! "Hola" = "Hello"
//! "mundo" = "world"
//! ```
//!
//! 整句命中时直接返回译文；否则逐词替换，保留分隔符，一个词都不认识时报错。

use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use futures::FutureExt;
use serde::Deserialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::settings::LanguagePair;
use crate::translation::engine::{
    Availability, EngineError, EngineFuture, TranslationEngine, Translator,
};
use crate::translation::error::{TranslationError, TranslationResult};

#[derive(Debug, Default, Deserialize)]
struct GlossaryFile {
    #[serde(default)]
    pairs: HashMap<String, HashMap<String, String>>,
}

/// 词表引擎
pub struct GlossaryEngine {
    pairs: HashMap<String, Rc<HashMap<String, String>>>,
    activated: Cell<bool>,
}

impl GlossaryEngine {
    /// 从已解析的条目创建
    pub fn new(pairs: HashMap<String, HashMap<String, String>>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(pair, entries)| (pair.to_ascii_lowercase(), Rc::new(entries)))
                .collect(),
            activated: Cell::new(true),
        }
    }

    /// 解析 TOML 词表
    pub fn from_toml_str(content: &str) -> TranslationResult<Self> {
        let file: GlossaryFile = toml::from_str(content)?;
        Ok(Self::new(file.pairs))
    }

    /// 解析 JSON 词表
    pub fn from_json_str(content: &str) -> TranslationResult<Self> {
        let file: GlossaryFile = serde_json::from_str(content)?;
        Ok(Self::new(file.pairs))
    }

    /// 按扩展名读取词表文件
    pub fn from_path(path: impl AsRef<Path>) -> TranslationResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslationError::IoError(format!("读取词表失败 {}: {}", path.display(), e))
        })?;

        let engine = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            _ => Self::from_toml_str(&content)?,
        };
        tracing::info!("已加载词表 {}（{} 个语言对）", path.display(), engine.pairs.len());
        Ok(engine)
    }

    /// 创建前需要用户激活
    pub fn requiring_activation(self) -> Self {
        self.activated.set(false);
        self
    }

    /// 记录一次用户激活
    pub fn activate(&self) {
        self.activated.set(true);
    }

    fn entries_for(&self, pair: &LanguagePair) -> Option<Rc<HashMap<String, String>>> {
        self.pairs.get(&pair.to_string().to_ascii_lowercase()).cloned()
    }
}

impl TranslationEngine for GlossaryEngine {
    fn create(&self, pair: &LanguagePair) -> EngineFuture<Rc<dyn Translator>> {
        let entries = self.entries_for(pair);
        let activated = self.activated.get();
        let pair = pair.clone();

        async move {
            if !activated {
                return Err(EngineError::ActivationRequired);
            }
            match entries {
                Some(entries) => Ok(Rc::new(GlossaryTranslator { entries }) as Rc<dyn Translator>),
                None => Err(EngineError::Failed(format!(
                    "language pair {} is not in the glossary",
                    pair
                ))),
            }
        }
        .boxed_local()
    }

    fn availability(&self, pair: &LanguagePair) -> EngineFuture<Availability> {
        let availability = match self.entries_for(pair) {
            Some(_) if self.activated.get() => Availability::Available,
            Some(_) => Availability::Downloadable,
            None => Availability::Unsupported,
        };
        async move { Ok(availability) }.boxed_local()
    }

    fn user_activated(&self) {
        self.activate();
    }
}

/// 绑定到一个语言对的词表会话
pub struct GlossaryTranslator {
    entries: Rc<HashMap<String, String>>,
}

impl GlossaryTranslator {
    fn lookup(&self, token: &str) -> Option<String> {
        if let Some(hit) = self.entries.get(token) {
            return Some(hit.clone());
        }
        let lowered = token.to_lowercase();
        let hit = self.entries.get(&lowered)?;
        if token.chars().next().is_some_and(char::is_uppercase) {
            Some(capitalize(hit))
        } else {
            Some(hit.clone())
        }
    }

    fn translate_text(&self, text: &str) -> Result<String, EngineError> {
        if let Some(whole) = self.lookup(text) {
            return Ok(whole);
        }

        let mut out = String::with_capacity(text.len());
        let mut translated_any = false;
        for token in text.split_word_bounds() {
            match self.lookup(token) {
                Some(hit) if token.chars().any(char::is_alphanumeric) => {
                    translated_any = true;
                    out.push_str(&hit);
                }
                _ => out.push_str(token),
            }
        }

        if translated_any {
            Ok(out)
        } else {
            Err(EngineError::Failed(format!("no glossary entry for '{}'", text)))
        }
    }
}

impl Translator for GlossaryTranslator {
    fn translate(&self, text: &str) -> EngineFuture<String> {
        let result = self.translate_text(text);
        async move { result }.boxed_local()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

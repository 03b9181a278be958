//! 触发控制器集成测试
//!
//! 覆盖过期结果丢弃、修饰键粒度、防抖、语言对切换和提示重试

use std::time::Duration;

use hoverlay::settings::{
    LanguagePair, Modifier, Modifiers, Settings, SettingsHub, SettingsStore, TriggerMode,
};
use hoverlay::translation::{EngineError, NoticeKind, NoticeSink};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{in_local_set, settle, Harness};

const PAGE: &str = "<p>Hola mundo amigo. Adios <b>gente</b>.</p>";

fn word_hover() -> Settings {
    Settings::new("es", "en", TriggerMode::WordHover)
}

#[tokio::test]
async fn test_stale_translation_is_discarded() {
    in_local_set(async {
        let h = Harness::new(PAGE, word_hover());
        h.engine.hold(true);

        let first = h.spawn_hover("Hola");
        settle().await;
        let second = h.spawn_hover("mundo");
        settle().await;
        assert_eq!(h.engine.pending(), 2);

        // 先完成的是已经过期的请求
        assert_eq!(h.engine.release_next().as_deref(), Some("Hola"));
        first.await.unwrap();
        assert!(!h.controller.is_active());
        assert_eq!(h.page.markers(), 0);

        assert_eq!(h.engine.release_next().as_deref(), Some("mundo"));
        second.await.unwrap();
        assert_eq!(h.controller.active_text().as_deref(), Some("MUNDO"));
        assert_eq!(h.page.markers(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_single_active_replacement() {
    in_local_set(async {
        let h = Harness::new(PAGE, word_hover());
        let original = h.page.body_html();

        h.hover("mundo").await;
        assert_eq!(h.controller.active_text().as_deref(), Some("MUNDO"));

        h.hover("gente").await;
        assert_eq!(h.controller.active_text().as_deref(), Some("GENTE"));
        assert_eq!(h.page.markers(), 1);
        assert!(h.page.body_text().contains("mundo"));

        h.controller.pointer_left();
        assert!(!h.controller.is_active());
        assert_eq!(h.page.body_html(), original);
    })
    .await;
}

#[tokio::test]
async fn test_pointer_over_translation_keeps_it() {
    in_local_set(async {
        let h = Harness::new(PAGE, word_hover());
        h.hover("mundo").await;
        assert_eq!(h.engine.requests(), ["mundo"]);

        h.hover("MUNDO").await;
        assert_eq!(h.engine.requests(), ["mundo"]);
        assert_eq!(h.controller.active_text().as_deref(), Some("MUNDO"));

        // 回到已翻译过的单词走缓存
        h.hover("Hola").await;
        h.hover("mundo").await;
        assert_eq!(h.engine.requests(), ["mundo", "Hola"]);
        assert_eq!(h.controller.context().cache_stats().cache_hits, 1);
    })
    .await;
}

#[tokio::test]
async fn test_modifier_chooses_granularity() {
    in_local_set(async {
        let h = Harness::new(PAGE, Settings::default());
        let original = h.page.body_html();

        h.hover("mundo").await;
        assert!(h.controller.granularity().is_none());
        assert!(!h.controller.is_active());
        assert!(h.engine.requests().is_empty());

        // 不跟踪的修饰键不触发
        h.controller.key_down(Modifier::Control).await;
        assert!(!h.controller.is_active());

        h.controller.key_down(Modifier::Alt).await;
        assert_eq!(h.controller.active_text().as_deref(), Some("MUNDO"));

        // 两个修饰键同时按下切换到句子
        h.controller.key_down(Modifier::Meta).await;
        assert_eq!(h.controller.active_text().as_deref(), Some("HOLA MUNDO AMIGO."));
        assert_eq!(h.page.markers(), 1);

        h.controller.key_up(Modifier::Meta);
        assert!(!h.controller.is_active());
        assert!(h.controller.current_key().is_none());
        assert_eq!(h.page.body_html(), original);

        h.controller.key_up(Modifier::Alt);
        assert_eq!(h.controller.modifiers(), Modifiers::none().with(Modifier::Control));
    })
    .await;
}

#[tokio::test]
async fn test_secondary_modifier_alone_is_word() {
    in_local_set(async {
        let h = Harness::new(PAGE, Settings::default());
        h.hover("gente").await;

        h.controller.key_down(Modifier::Meta).await;
        assert_eq!(h.controller.active_text().as_deref(), Some("GENTE"));
    })
    .await;
}

#[tokio::test]
async fn test_key_up_in_hover_mode_keeps_translation() {
    in_local_set(async {
        let h = Harness::new(PAGE, word_hover());
        h.hover("mundo").await;

        h.controller.key_up(Modifier::Alt);
        assert!(h.controller.is_active());
    })
    .await;
}

#[tokio::test]
async fn test_focus_lost_clears_everything() {
    in_local_set(async {
        let h = Harness::new(PAGE, Settings::default());
        h.hover("mundo").await;
        h.controller.key_down(Modifier::Alt).await;
        assert!(h.controller.is_active());

        h.controller.focus_lost();
        assert!(!h.controller.is_active());
        assert_eq!(h.controller.modifiers(), Modifiers::none());

        h.hover("gente").await;
        assert!(!h.controller.is_active());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_debounce_fires_last_motion_only() {
    in_local_set(async {
        let h = Harness::new(PAGE, word_hover());
        let (hola_x, hola_y) = h.page.point_of("Hola");
        let (mundo_x, mundo_y) = h.page.point_of("mundo");

        h.controller.pointer_moved(hola_x, hola_y, Modifiers::none());
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.controller.pointer_moved(mundo_x, mundo_y, Modifiers::none());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(h.engine.requests().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(h.engine.requests(), ["mundo"]);
        assert_eq!(h.controller.active_text().as_deref(), Some("MUNDO"));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_pointer_left_cancels_pending_motion() {
    in_local_set(async {
        let h = Harness::new(PAGE, word_hover());
        let (x, y) = h.page.point_of("mundo");

        h.controller.pointer_moved(x, y, Modifiers::none());
        h.controller.pointer_left();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(h.engine.requests().is_empty());
        assert!(!h.controller.is_active());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_pointer_event_reports_modifiers() {
    in_local_set(async {
        let h = Harness::new(PAGE, Settings::default());
        let (x, y) = h.page.point_of("mundo");

        h.controller
            .pointer_moved(x, y, Modifiers::none().with(Modifier::Alt).with(Modifier::Meta));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(h.controller.active_text().as_deref(), Some("HOLA MUNDO AMIGO."));
    })
    .await;
}

#[tokio::test]
async fn test_language_change_via_settings_hub() {
    in_local_set(async {
        let hub = SettingsHub::load_or_default(Some(word_hover()));
        let h = Harness::new(PAGE, hub.get());
        let follower = {
            let controller = h.controller.clone();
            let receiver = hub.subscribe();
            tokio::task::spawn_local(async move { controller.follow_settings(receiver).await })
        };

        h.hover("mundo").await;
        assert_eq!(h.controller.active_text().as_deref(), Some("MUNDO"));

        // 只改触发模式不还原，也不清缓存
        hub.set(Settings::new("es", "en", TriggerMode::Modifier));
        settle().await;
        assert!(h.controller.is_active());
        assert_eq!(h.controller.context().cache_len(), 1);

        hub.set(Settings::new("es", "fr", TriggerMode::WordHover));
        settle().await;
        assert!(!h.controller.is_active());
        assert_eq!(h.controller.context().cache_len(), 0);
        assert_eq!(h.controller.context().settings().target_lang, "fr");

        h.hover("mundo").await;
        assert_eq!(h.controller.active_text().as_deref(), Some("odnum"));
        assert_eq!(
            h.engine.creations(),
            [LanguagePair::new("es", "en"), LanguagePair::new("es", "fr")]
        );

        drop(hub);
        follower.await.unwrap();
    })
    .await;
}

#[tokio::test]
async fn test_pair_change_during_translation_drops_result() {
    in_local_set(async {
        let h = Harness::new(PAGE, word_hover());
        h.engine.hold(true);

        let task = h.spawn_hover("mundo");
        settle().await;
        assert_eq!(h.engine.pending(), 1);

        h.controller
            .apply_settings(Settings::new("es", "fr", TriggerMode::WordHover));
        h.engine.release_next();
        task.await.unwrap();

        assert!(!h.controller.is_active());
        assert_eq!(h.controller.context().cache_len(), 0);

        h.engine.hold(false);
        h.hover("mundo").await;
        assert_eq!(h.controller.active_text().as_deref(), Some("odnum"));
        assert_eq!(h.controller.context().cache_len(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_activation_notice_then_click() {
    in_local_set(async {
        let h = Harness::new(PAGE, word_hover());
        h.engine.fail_next_creation(EngineError::ActivationRequired);

        h.hover("mundo").await;
        assert!(!h.controller.is_active());
        assert_eq!(
            h.notices.current().unwrap().kind,
            NoticeKind::ActivationRequired
        );

        assert!(h.controller.notice_clicked().await);
        assert_eq!(h.engine.activations(), 1);
        assert!(h.notices.current().is_none());

        h.hover("mundo").await;
        assert_eq!(h.controller.active_text().as_deref(), Some("MUNDO"));
        assert_eq!(h.engine.creations().len(), 2);
    })
    .await;
}

#[tokio::test]
async fn test_unavailable_engine_is_not_retried() {
    in_local_set(async {
        let h = Harness::new(PAGE, word_hover());
        h.engine
            .fail_next_creation(EngineError::Unavailable("no translator".to_string()));

        h.hover("mundo").await;
        h.hover("gente").await;
        h.hover("mundo").await;

        assert_eq!(h.engine.creations().len(), 1);
        assert!(h.engine.requests().is_empty());
        assert_eq!(h.notices.current().unwrap().kind, NoticeKind::Unavailable);
        assert_eq!(h.notices.history().len(), 1);

        // 换语言对之后重新尝试
        h.controller
            .apply_settings(Settings::new("es", "fr", TriggerMode::WordHover));
        h.hover("mundo").await;
        assert_eq!(h.engine.creations().len(), 2);
        assert!(h.controller.is_active());
    })
    .await;
}

#[tokio::test]
async fn test_transient_creation_error_retries_on_next_trigger() {
    in_local_set(async {
        let h = Harness::new(PAGE, word_hover());
        h.engine
            .fail_next_creation(EngineError::Failed("model load failed".to_string()));

        h.hover("mundo").await;
        assert!(!h.controller.is_active());
        assert_eq!(
            h.notices.current().unwrap().message,
            "Translator error: model load failed"
        );

        // 同一个单词再次触发也会重新创建
        h.hover("mundo").await;
        assert_eq!(h.engine.creations().len(), 2);
        assert_eq!(h.controller.active_text().as_deref(), Some("MUNDO"));
        assert!(h.notices.current().is_none());
    })
    .await;
}

#[tokio::test]
async fn test_translation_failure_leaves_page_untouched() {
    in_local_set(async {
        let h = Harness::new(PAGE, word_hover());
        let original = h.page.body_html();
        h.engine.hold(true);

        let task = h.spawn_hover("mundo");
        settle().await;
        assert_eq!(h.engine.fail_next("boom").as_deref(), Some("mundo"));
        task.await.unwrap();

        assert!(!h.controller.is_active());
        assert!(h.controller.current_key().is_none());
        assert_eq!(h.page.body_html(), original);
        assert_eq!(h.notices.current().unwrap().kind, NoticeKind::EngineError);
        assert_eq!(h.controller.context().cache_len(), 0);
    })
    .await;
}

#[tokio::test]
async fn test_sentence_hover_round_trip() {
    in_local_set(async {
        let h = Harness::new(PAGE, Settings::new("es", "en", TriggerMode::SentenceHover));
        let original = h.page.body_html();

        h.hover("gente").await;
        assert_eq!(h.controller.active_text().as_deref(), Some("ADIOS GENTE."));
        assert_eq!(h.page.body_text(), "Hola mundo amigo. ADIOS GENTE.");

        h.hover("amigo").await;
        assert_eq!(h.controller.active_text().as_deref(), Some("HOLA MUNDO AMIGO."));
        assert_eq!(h.page.markers(), 1);
        assert_eq!(h.page.body_text(), "HOLA MUNDO AMIGO. Adios gente.");

        h.controller.teardown();
        assert!(!h.controller.is_active());
        assert_eq!(h.page.body_html(), original);
        assert_eq!(h.controller.context().cache_len(), 0);
    })
    .await;
}

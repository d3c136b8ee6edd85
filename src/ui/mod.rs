use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{
    self, Align, Color32, FontData, FontDefinitions, FontFamily, Frame, Layout, Margin, RichText,
    Rounding, Stroke, Vec2, epaint::Shadow,
};
use log::warn;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::{Mutex, mpsc};

use crate::config::PanelConfig;
use crate::engine::PanelEngine;
use crate::engine::state::{AppState, UserAction};
use crate::env;
use crate::logview::{LogBuffer, LogLevel};
use crate::service::ServiceController;
use crate::updater::VersionOrdering;

mod i18n;
use self::i18n::{I18n, Language};

const SYSINFO_REFRESH: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ThemePalette {
    bg: Color32,
    panel: Color32,
    surface: Color32,
    surface_elev: Color32,
    sunken_surface: Color32,
    border: Color32,
    border_strong: Color32,
    text_primary: Color32,
    text_muted: Color32,
    text_faint: Color32,
    accent: Color32,
    accent_soft: Color32,
    accent_glow: Color32,
    info: Color32,
    warning: Color32,
    danger: Color32,
}

impl ThemePalette {
    const fn dark() -> Self {
        Self {
            bg: Color32::from_rgb(11, 14, 19),
            panel: Color32::from_rgb(17, 22, 29),
            surface: Color32::from_rgb(24, 31, 39),
            surface_elev: Color32::from_rgb(29, 37, 47),
            sunken_surface: Color32::from_rgb(14, 18, 24),
            border: Color32::from_rgb(45, 57, 72),
            border_strong: Color32::from_rgb(63, 79, 97),
            text_primary: Color32::from_rgb(228, 235, 244),
            text_muted: Color32::from_rgb(167, 182, 197),
            text_faint: Color32::from_rgb(129, 143, 158),
            accent: Color32::from_rgb(92, 219, 195),
            accent_soft: Color32::from_rgb(63, 140, 125),
            accent_glow: Color32::from_rgb(151, 239, 217),
            info: Color32::from_rgb(122, 186, 255),
            warning: Color32::from_rgb(246, 195, 111),
            danger: Color32::from_rgb(239, 117, 117),
        }
    }

    const fn light() -> Self {
        Self {
            bg: Color32::from_rgb(240, 245, 252),
            panel: Color32::from_rgb(226, 234, 243),
            surface: Color32::from_rgb(245, 249, 255),
            surface_elev: Color32::from_rgb(255, 255, 255),
            sunken_surface: Color32::from_rgb(217, 225, 236),
            border: Color32::from_rgb(195, 205, 221),
            border_strong: Color32::from_rgb(172, 186, 206),
            text_primary: Color32::from_rgb(28, 38, 52),
            text_muted: Color32::from_rgb(80, 99, 121),
            text_faint: Color32::from_rgb(116, 135, 155),
            accent: Color32::from_rgb(27, 170, 152),
            accent_soft: Color32::from_rgb(152, 223, 212),
            accent_glow: Color32::from_rgb(16, 190, 173),
            info: Color32::from_rgb(64, 120, 212),
            warning: Color32::from_rgb(235, 164, 70),
            danger: Color32::from_rgb(219, 83, 83),
        }
    }
}

impl Theme {
    const fn palette(self) -> ThemePalette {
        match self {
            Theme::Dark => ThemePalette::dark(),
            Theme::Light => ThemePalette::light(),
        }
    }

    fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("light") {
            Theme::Light
        } else {
            Theme::Dark
        }
    }

    fn config_value(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

fn tint(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_premultiplied(color.r(), color.g(), color.b(), alpha)
}

fn parse_locale_token(token: &str) -> Option<Language> {
    let normalized = token
        .split(|c| matches!(c, '.' | '@'))
        .next()
        .unwrap_or(token)
        .replace('-', "_")
        .to_ascii_lowercase();
    let language_code = normalized.split('_').next().unwrap_or(&normalized);

    match language_code {
        "zh" | "zho" | "chi" => Some(Language::Chinese),
        "en" | "eng" => Some(Language::English),
        _ => None,
    }
}

fn detect_system_language() -> Language {
    for var in ["LC_ALL", "LANGUAGE", "LANG"] {
        if let Ok(value) = std::env::var(var) {
            for token in value.split(':') {
                if let Some(language) = parse_locale_token(token) {
                    return language;
                }
            }
        }
    }

    Language::English
}

const CJK_FONT_ID: &str = "cjk";

/// Well-known CJK-capable fonts shipped with each platform.
fn cjk_font_candidates() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &[
            "C:\\Windows\\Fonts\\msyh.ttc",
            "C:\\Windows\\Fonts\\msyh.ttf",
            "C:\\Windows\\Fonts\\simhei.ttf",
            "C:\\Windows\\Fonts\\simsun.ttc",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/STHeiti Light.ttc",
            "/System/Library/Fonts/Hiragino Sans GB.ttc",
        ]
    } else {
        &[
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
            "/usr/share/fonts/truetype/arphic/uming.ttc",
        ]
    }
}

fn load_cjk_font() -> Option<FontData> {
    for path in cjk_font_candidates() {
        if let Ok(bytes) = std::fs::read(path) {
            return Some(FontData::from_owned(bytes));
        }
    }
    warn!("ui: no CJK-capable font found; Chinese text may render as boxes");
    None
}

fn setup_custom_fonts(ctx: &egui::Context, language: Language) {
    let mut fonts = FontDefinitions::default();

    if let Some(font) = load_cjk_font() {
        fonts.font_data.insert(CJK_FONT_ID.to_owned(), font);
        for family in [FontFamily::Proportional, FontFamily::Monospace] {
            let names = fonts.families.entry(family).or_default();
            if language == Language::Chinese {
                names.insert(0, CJK_FONT_ID.to_owned());
            } else {
                names.push(CJK_FONT_ID.to_owned());
            }
        }
    }

    ctx.set_fonts(fonts);
}

fn badge_frame(color: Color32) -> Frame {
    Frame::none()
        .fill(tint(color, 32))
        .stroke(Stroke::new(1.0, color))
        .rounding(Rounding::same(999.0))
        .inner_margin(Margin::symmetric(10.0, 4.0))
}

fn primary_badge_frame(colors: &ThemePalette) -> Frame {
    Frame::none()
        .fill(colors.accent_soft)
        .stroke(Stroke::new(1.0, colors.accent))
        .rounding(Rounding::same(999.0))
        .inner_margin(Margin::symmetric(10.0, 4.0))
}

fn section_frame(colors: &ThemePalette) -> Frame {
    Frame::none()
        .fill(colors.surface)
        .stroke(Stroke::new(1.0, colors.border))
        .rounding(Rounding::same(14.0))
        .inner_margin(Margin::same(14.0))
}

fn terminal_frame(colors: &ThemePalette) -> Frame {
    Frame::none()
        .fill(colors.sunken_surface)
        .stroke(Stroke::new(1.0, colors.border_strong))
        .rounding(Rounding::same(12.0))
        .inner_margin(Margin::symmetric(12.0, 10.0))
        .shadow(Shadow {
            offset: Vec2::new(0.0, 2.0),
            blur: 10.0,
            spread: 0.0,
            color: Color32::from_black_alpha(70),
        })
}

fn primary_cta_button(
    label: impl Into<egui::WidgetText>,
    colors: &ThemePalette,
    min_width: f32,
) -> egui::Button<'static> {
    egui::Button::new(label)
        .fill(colors.accent_soft)
        .stroke(Stroke::new(1.0, colors.accent))
        .min_size(Vec2::new(min_width, 34.0))
}

fn secondary_button(
    label: impl Into<egui::WidgetText>,
    colors: &ThemePalette,
    min_width: f32,
) -> egui::Button<'static> {
    egui::Button::new(label)
        .fill(colors.surface_elev)
        .stroke(Stroke::new(1.0, colors.border_strong))
        .min_size(Vec2::new(min_width, 32.0))
}

fn danger_button(
    label: impl Into<egui::WidgetText>,
    colors: &ThemePalette,
    min_width: f32,
) -> egui::Button<'static> {
    egui::Button::new(label)
        .fill(tint(colors.danger, 40))
        .stroke(Stroke::new(1.0, colors.danger))
        .min_size(Vec2::new(min_width, 32.0))
}

fn build_runtime() -> Arc<Runtime> {
    match Runtime::new() {
        Ok(rt) => Arc::new(rt),
        Err(err) => {
            warn!(
                "ui: failed to create multithreaded runtime ({}); trying single-threaded runtime",
                err
            );
            match Builder::new_current_thread().enable_all().build() {
                Ok(rt) => Arc::new(rt),
                Err(fallback_err) => {
                    log::error!(
                        "ui: failed to create any Tokio runtime ({}); terminating panel",
                        fallback_err
                    );
                    std::process::exit(1);
                }
            }
        }
    }
}

fn apply_theme(ctx: &egui::Context, colors: &ThemePalette) {
    let is_dark = colors == &ThemePalette::dark();
    let mut visuals = if is_dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    visuals.panel_fill = colors.bg;
    visuals.window_fill = visuals.panel_fill;
    visuals.override_text_color = Some(colors.text_primary);
    visuals.hyperlink_color = colors.accent_glow;
    visuals.widgets.noninteractive.rounding = Rounding::same(10.0);
    visuals.widgets.inactive.rounding = Rounding::same(10.0);
    visuals.widgets.hovered.rounding = Rounding::same(10.0);
    visuals.widgets.active.rounding = Rounding::same(10.0);
    visuals.widgets.noninteractive.bg_fill = colors.surface;
    visuals.widgets.inactive.bg_fill = colors.surface;
    visuals.widgets.hovered.bg_fill = colors.accent_glow;
    visuals.widgets.active.bg_fill = colors.accent_soft;
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, colors.border);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, colors.border);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.5, colors.accent_glow);
    visuals.widgets.active.bg_stroke = Stroke::new(1.5, colors.accent);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, colors.text_muted);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, colors.text_muted);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, colors.text_primary);
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, colors.text_primary);
    visuals.selection.bg_fill = colors.accent;
    visuals.selection.stroke = Stroke::new(1.0, colors.accent_glow);
    visuals.faint_bg_color = colors.sunken_surface;
    visuals.extreme_bg_color = tint(colors.sunken_surface, 255);
    visuals.code_bg_color = colors.sunken_surface;
    visuals.window_rounding = Rounding::same(14.0);
    let shadow_color = if is_dark {
        Color32::from_black_alpha(100)
    } else {
        Color32::from_black_alpha(45)
    };
    visuals.window_shadow = Shadow {
        offset: Vec2::new(0.0, 6.0),
        blur: 18.0,
        spread: 0.0,
        color: shadow_color,
    };
    visuals.popup_shadow = visuals.window_shadow;

    if is_dark {
        visuals.widgets.inactive.bg_fill = colors.surface_elev;
        visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, colors.border_strong);

        visuals.widgets.hovered.bg_fill = colors.accent_soft;
        visuals.widgets.hovered.bg_stroke = Stroke::new(1.3, colors.accent);

        visuals.widgets.active.bg_fill = colors.accent;
        visuals.widgets.active.bg_stroke = Stroke::new(1.5, colors.accent_glow);
    }

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = Vec2::new(12.0, 12.0);
    style.spacing.button_padding = Vec2::new(16.0, 10.0);
    ctx.set_style(style);
}

/// Draft edited inside the settings modal; committed on Save only.
struct SettingsDraft {
    web_url: String,
    update_base_url: String,
    payload_key: String,
    service_command: String,
    service_args: String,
    version_ordering: VersionOrdering,
    font_size: f32,
    auto_save_logs: bool,
}

impl SettingsDraft {
    fn from_config(config: &PanelConfig) -> Self {
        Self {
            web_url: config.web_url.clone(),
            update_base_url: config.update_base_url.clone(),
            payload_key: config.payload_key.clone(),
            service_command: config.service_command.clone(),
            service_args: config.service_args.join(" "),
            version_ordering: config.version_ordering,
            font_size: config.font_size,
            auto_save_logs: config.auto_save_logs,
        }
    }

    fn apply_to(&self, config: &mut PanelConfig) {
        config.web_url = self.web_url.trim().to_owned();
        config.update_base_url = self.update_base_url.trim().to_owned();
        config.payload_key = self.payload_key.clone();
        config.service_command = self.service_command.trim().to_owned();
        config.service_args = self
            .service_args
            .split_whitespace()
            .map(str::to_owned)
            .collect();
        config.version_ordering = self.version_ordering;
        config.font_size = self.font_size.clamp(8.0, 24.0);
        config.auto_save_logs = self.auto_save_logs;
    }
}

pub struct PanelApp {
    runtime: Arc<Runtime>,
    engine: Arc<Mutex<PanelEngine>>,
    service: ServiceController,
    updates_rx: mpsc::UnboundedReceiver<AppState>,
    updates_tx: mpsc::UnboundedSender<AppState>,
    log_rx: mpsc::UnboundedReceiver<(LogLevel, String)>,
    log_tx: mpsc::UnboundedSender<(LogLevel, String)>,
    state: AppState,
    config: PanelConfig,
    log: LogBuffer,
    log_filter: Option<LogLevel>,
    log_search: String,
    panel_version: &'static str,
    language: Language,
    fonts_language: Language,
    theme: Theme,
    show_settings: bool,
    settings_draft: Option<SettingsDraft>,
    memory_mb: Option<u64>,
    last_sysinfo: Instant,
}

impl PanelApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let runtime = build_runtime();
        let config = PanelConfig::load();
        let language = detect_system_language();
        setup_custom_fonts(&cc.egui_ctx, language);
        let engine = PanelEngine::new(config.clone());
        let service = engine.service();
        let engine = Arc::new(Mutex::new(engine));
        let (tx, rx) = mpsc::unbounded_channel();
        let (log_tx, log_rx) = mpsc::unbounded_channel();

        let bootstrap_engine = engine.clone();
        let bootstrap_tx = tx.clone();
        let bootstrap_log = log_tx.clone();
        runtime.spawn(async move {
            let mut locked = bootstrap_engine.lock().await;
            locked.bootstrap(&bootstrap_tx, &bootstrap_log).await;
        });

        let theme = Theme::from_config(&config.theme);
        let log = LogBuffer::new(env::log_file(), config.auto_save_logs);

        Self {
            runtime,
            engine,
            service,
            updates_rx: rx,
            updates_tx: tx,
            log_rx,
            log_tx,
            state: AppState::Initialising,
            config,
            log,
            log_filter: None,
            log_search: String::new(),
            panel_version: env!("CARGO_PKG_VERSION"),
            language,
            fonts_language: language,
            theme,
            show_settings: false,
            settings_draft: None,
            memory_mb: None,
            last_sysinfo: Instant::now() - SYSINFO_REFRESH,
        }
    }

    fn colors(&self) -> ThemePalette {
        self.theme.palette()
    }

    fn i18n(&self) -> I18n {
        I18n::new(self.language)
    }

    fn refresh_fonts_if_needed(&mut self, ctx: &egui::Context) {
        if self.fonts_language != self.language {
            setup_custom_fonts(ctx, self.language);
            self.fonts_language = self.language;
        }
    }

    fn trigger_action(&self, action: UserAction) {
        let engine = self.engine.clone();
        let tx = self.updates_tx.clone();
        let log_tx = self.log_tx.clone();
        let rt = self.runtime.clone();
        rt.spawn(async move {
            let mut locked = engine.lock().await;
            locked.handle_action(action, &tx, &log_tx).await;
        });
    }

    fn sync_state(&mut self) {
        while let Ok(state) = self.updates_rx.try_recv() {
            self.state = state;
        }
    }

    fn sync_log(&mut self) {
        while let Ok((level, line)) = self.log_rx.try_recv() {
            self.log.push(level, line);
        }
    }

    fn refresh_sysinfo(&mut self) {
        if self.last_sysinfo.elapsed() < SYSINFO_REFRESH {
            return;
        }
        self.last_sysinfo = Instant::now();
        self.memory_mb = self.service.memory_usage_mb();
    }

    fn save_settings(&mut self) {
        let Some(draft) = self.settings_draft.take() else {
            return;
        };
        draft.apply_to(&mut self.config);
        self.config.theme = self.theme.config_value().to_owned();
        self.log.set_persist(self.config.auto_save_logs);

        let i18n = self.i18n();
        match self.config.save() {
            Ok(()) => self.log.push(LogLevel::Success, i18n.settings_saved()),
            Err(err) => self
                .log
                .push(LogLevel::Error, i18n.settings_save_failed(&err)),
        }

        let engine = self.engine.clone();
        let config = self.config.clone();
        self.runtime.spawn(async move {
            let mut locked = engine.lock().await;
            locked.apply_config(config);
        });
        self.show_settings = false;
    }

    fn export_logs(&mut self) {
        let dialog = rfd::FileDialog::new()
            .set_file_name("panel_logs.txt")
            .add_filter("Text files", &["txt"]);
        let Some(path) = dialog.save_file() else {
            return;
        };
        let i18n = self.i18n();
        match self.log.export(&path) {
            Ok(()) => {
                let message = i18n.logs_exported(&path.display().to_string());
                self.log.push(LogLevel::Success, message);
            }
            Err(err) => self.log.push(LogLevel::Error, err),
        }
    }

    fn open_path(&mut self, path: &std::path::Path) {
        if let Err(err) = open::that(path) {
            let message = self.i18n().open_failed(&err.to_string());
            self.log.push(LogLevel::Error, message);
        }
    }

    fn render_status(&mut self, ui: &mut egui::Ui, colors: &ThemePalette, i18n: I18n) {
        section_frame(colors).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(i18n.status_label()).color(colors.text_muted));
                ui.add_space(6.0);
                let service_running = self.service.is_running();
                let badge = if service_running {
                    (i18n.status_running(), colors.info)
                } else {
                    match &self.state {
                        AppState::Ready { .. } => (i18n.status_ready(), colors.accent),
                        AppState::Error(_) => (i18n.status_attention(), colors.danger),
                        _ => (i18n.status_working(), colors.text_faint),
                    }
                };
                if self.state.is_ready() && !service_running {
                    primary_badge_frame(colors).show(ui, |ui| {
                        ui.label(RichText::new(badge.0).color(colors.text_primary).strong());
                    });
                } else {
                    badge_frame(badge.1).show(ui, |ui| {
                        ui.label(RichText::new(badge.0).color(badge.1).strong());
                    });
                }
            });
            ui.add_space(8.0);

            match &self.state {
                AppState::Initialising => {
                    ui.horizontal(|ui| {
                        ui.add(egui::Spinner::new());
                        ui.label(i18n.initialising());
                    });
                }
                AppState::CheckingForUpdates => {
                    ui.horizontal(|ui| {
                        ui.add(egui::Spinner::new());
                        ui.label(i18n.checking());
                    });
                }
                AppState::DownloadingUpdate => {
                    ui.horizontal(|ui| {
                        ui.add(egui::Spinner::new());
                        ui.label(i18n.downloading());
                    });
                }
                AppState::PreparingWorkspace => {
                    ui.horizontal(|ui| {
                        ui.add(egui::Spinner::new());
                        ui.label(i18n.preparing());
                    });
                }
                AppState::Ready { version } => {
                    ui.label(RichText::new(i18n.ready(version)).strong());
                }
                AppState::Error(message) => {
                    ui.colored_label(colors.danger, i18n.error(message));
                }
            }

            ui.add_space(10.0);
            ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                let busy = matches!(
                    self.state,
                    AppState::Initialising
                        | AppState::CheckingForUpdates
                        | AppState::DownloadingUpdate
                        | AppState::PreparingWorkspace
                );
                let check_btn = secondary_button(i18n.check_updates_button(), colors, 150.0);
                if ui.add_enabled(!busy, check_btn).clicked() {
                    self.trigger_action(UserAction::CheckForUpdates);
                }
            });
        });
    }

    fn render_service(&mut self, ui: &mut egui::Ui, colors: &ThemePalette, i18n: I18n) {
        section_frame(colors).show(ui, |ui| {
            ui.heading(i18n.service_heading());
            ui.add_space(6.0);

            let running = self.service.is_running();
            ui.horizontal_wrapped(|ui| {
                let start_label = RichText::new(i18n.start_button())
                    .color(if running {
                        colors.text_muted
                    } else {
                        colors.text_primary
                    })
                    .strong();
                let start_btn = primary_cta_button(start_label, colors, 140.0);
                if ui.add_enabled(!running, start_btn).clicked() {
                    self.trigger_action(UserAction::StartService);
                }

                let stop_btn = danger_button(i18n.stop_button(), colors, 140.0);
                if ui.add_enabled(running, stop_btn).clicked() {
                    self.trigger_action(UserAction::StopService);
                }

                let restart_btn = secondary_button(i18n.restart_button(), colors, 140.0);
                if ui.add_enabled(running, restart_btn).clicked() {
                    self.trigger_action(UserAction::RestartService);
                }
            });

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if let Some(pid) = self.service.pid() {
                    badge_frame(colors.info).show(ui, |ui| {
                        ui.label(
                            RichText::new(i18n.service_pid(pid))
                                .color(colors.info)
                                .small(),
                        );
                    });
                    if let Some(mb) = self.memory_mb {
                        badge_frame(colors.border_strong).show(ui, |ui| {
                            ui.label(
                                RichText::new(i18n.service_memory(mb))
                                    .color(colors.text_muted)
                                    .small(),
                            );
                        });
                    }
                } else {
                    ui.label(RichText::new(i18n.service_stopped()).color(colors.text_faint));
                }
            });
        });
    }

    fn render_tools(&mut self, ui: &mut egui::Ui, colors: &ThemePalette, i18n: I18n) {
        section_frame(colors).show(ui, |ui| {
            ui.heading(i18n.tools_heading());
            ui.add_space(6.0);

            ui.horizontal_wrapped(|ui| {
                let web_btn = secondary_button(i18n.open_web_button(), colors, 150.0);
                if ui.add(web_btn).clicked() {
                    ui.output_mut(|o| {
                        o.open_url = Some(egui::output::OpenUrl {
                            url: self.config.web_url.clone(),
                            new_tab: true,
                        });
                    });
                }

                let output_btn = secondary_button(i18n.open_output_button(), colors, 160.0);
                if ui.add(output_btn).clicked() {
                    let dir = env::output_dir();
                    self.open_path(&dir);
                }

                let clear_btn = danger_button(i18n.clear_images_button(), colors, 160.0);
                if ui.add(clear_btn).clicked() {
                    let count = env::clear_output_images();
                    let message = i18n.cleared_images(count);
                    self.log.push(LogLevel::Success, message);
                }
            });

            ui.add_space(4.0);
            ui.horizontal_wrapped(|ui| {
                let export_btn = secondary_button(i18n.export_logs_button(), colors, 130.0);
                if ui.add(export_btn).clicked() {
                    self.export_logs();
                }

                let clear_logs_btn = secondary_button(i18n.clear_logs_button(), colors, 130.0);
                if ui
                    .add_enabled(!self.log.is_empty(), clear_logs_btn)
                    .clicked()
                {
                    self.log.clear();
                }

                let settings_btn = secondary_button(i18n.settings_button(), colors, 110.0);
                if ui.add(settings_btn).clicked() {
                    self.settings_draft = Some(SettingsDraft::from_config(&self.config));
                    self.show_settings = true;
                }
            });
        });
    }

    fn render_logs(&mut self, ui: &mut egui::Ui, colors: &ThemePalette, i18n: I18n) {
        section_frame(colors).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.heading(i18n.logs_heading());
                ui.label(
                    RichText::new(format!("{}", self.log.len()))
                        .color(colors.text_faint)
                        .small(),
                );

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut self.log_search)
                            .hint_text(i18n.log_search_hint())
                            .desired_width(180.0),
                    );
                    let selected = self
                        .log_filter
                        .map(|level| i18n.log_level_label(level))
                        .unwrap_or_else(|| i18n.log_filter_all());
                    egui::ComboBox::from_id_source("log_filter")
                        .selected_text(selected)
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut self.log_filter, None, i18n.log_filter_all());
                            for level in [
                                LogLevel::Info,
                                LogLevel::Success,
                                LogLevel::Warning,
                                LogLevel::Error,
                            ] {
                                ui.selectable_value(
                                    &mut self.log_filter,
                                    Some(level),
                                    i18n.log_level_label(level),
                                );
                            }
                        });
                    ui.label(RichText::new(i18n.log_filter_label()).color(colors.text_muted));
                });
            });
            ui.separator();

            terminal_frame(colors).show(ui, |ui| {
                ui.set_min_height(220.0);
                let entries = self.log.filtered(self.log_filter, &self.log_search);
                if entries.is_empty() {
                    ui.label(RichText::new(i18n.logs_empty()).color(colors.text_faint));
                    return;
                }
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .max_height(360.0)
                    .show(ui, |ui| {
                        for entry in entries {
                            let color = match entry.level {
                                LogLevel::Info => colors.text_muted,
                                LogLevel::Success => colors.accent,
                                LogLevel::Warning => colors.warning,
                                LogLevel::Error => colors.danger,
                            };
                            ui.label(
                                RichText::new(entry.render())
                                    .color(color)
                                    .monospace()
                                    .size(self.config.font_size),
                            );
                        }
                    });
            });
        });
    }

    fn render_settings_modal(&mut self, ctx: &egui::Context, colors: &ThemePalette, i18n: I18n) {
        if !self.show_settings {
            return;
        }
        let mut save_requested = false;
        let mut cancel_requested = false;

        if let Some(draft) = self.settings_draft.as_mut() {
            egui::Window::new(i18n.settings_title())
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
                .default_width(420.0)
                .show(ctx, |ui| {
                    egui::Grid::new("settings_grid")
                        .num_columns(2)
                        .spacing(Vec2::new(10.0, 8.0))
                        .show(ui, |ui| {
                            ui.label(i18n.settings_web_url());
                            ui.text_edit_singleline(&mut draft.web_url);
                            ui.end_row();

                            ui.label(i18n.settings_update_url());
                            ui.text_edit_singleline(&mut draft.update_base_url);
                            ui.end_row();

                            ui.label(i18n.settings_payload_key());
                            ui.add(
                                egui::TextEdit::singleline(&mut draft.payload_key).password(true),
                            );
                            ui.end_row();

                            ui.label(i18n.settings_service_command());
                            ui.text_edit_singleline(&mut draft.service_command);
                            ui.end_row();

                            ui.label(i18n.settings_service_args());
                            ui.text_edit_singleline(&mut draft.service_args);
                            ui.end_row();

                            ui.label(i18n.settings_ordering());
                            egui::ComboBox::from_id_source("version_ordering")
                                .selected_text(i18n.ordering_label(draft.version_ordering))
                                .show_ui(ui, |ui| {
                                    for ordering in
                                        [VersionOrdering::Lexical, VersionOrdering::Numeric]
                                    {
                                        ui.selectable_value(
                                            &mut draft.version_ordering,
                                            ordering,
                                            i18n.ordering_label(ordering),
                                        );
                                    }
                                });
                            ui.end_row();

                            ui.label(i18n.settings_font_size());
                            ui.add(
                                egui::DragValue::new(&mut draft.font_size)
                                    .clamp_range(8.0..=24.0)
                                    .speed(0.5),
                            );
                            ui.end_row();

                            ui.label(i18n.settings_auto_save());
                            ui.checkbox(&mut draft.auto_save_logs, "");
                            ui.end_row();
                        });

                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        let save_btn = primary_cta_button(
                            RichText::new(i18n.settings_save())
                                .color(colors.text_primary)
                                .strong(),
                            colors,
                            90.0,
                        );
                        if ui.add(save_btn).clicked() {
                            save_requested = true;
                        }
                        let cancel_btn = secondary_button(i18n.settings_cancel(), colors, 90.0);
                        if ui.add(cancel_btn).clicked() {
                            cancel_requested = true;
                        }
                    });
                });
        } else {
            self.show_settings = false;
        }

        if save_requested {
            self.save_settings();
        } else if cancel_requested {
            self.settings_draft = None;
            self.show_settings = false;
        }
    }
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &eframe::egui::Context, _frame: &mut eframe::Frame) {
        self.sync_state();
        self.sync_log();
        self.refresh_sysinfo();
        self.refresh_fonts_if_needed(ctx);
        let colors = self.colors();
        apply_theme(ctx, &colors);
        let i18n = self.i18n();

        egui::TopBottomPanel::top("top_bar")
            .frame(
                Frame::none()
                    .fill(colors.panel)
                    .stroke(Stroke::new(1.0, colors.border))
                    .inner_margin(Margin::symmetric(16.0, 12.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.heading(RichText::new(i18n.heading()).color(colors.accent));
                        ui.label(RichText::new(i18n.tagline()).color(colors.text_muted));
                    });
                    ui.allocate_ui_with_layout(
                        ui.available_size_before_wrap(),
                        Layout::right_to_left(Align::Center),
                        |ui| {
                            let control_height = 34.0;
                            let previous_theme = self.theme;
                            ui.scope(|ui| {
                                ui.set_height(control_height);
                                egui::ComboBox::from_id_source("theme_combo")
                                    .selected_text(i18n.theme_label(self.theme))
                                    .show_ui(ui, |ui| {
                                        ui.selectable_value(
                                            &mut self.theme,
                                            Theme::Dark,
                                            i18n.theme_label(Theme::Dark),
                                        );
                                        ui.selectable_value(
                                            &mut self.theme,
                                            Theme::Light,
                                            i18n.theme_label(Theme::Light),
                                        );
                                    });
                            });
                            if previous_theme != self.theme {
                                self.config.theme = self.theme.config_value().to_owned();
                                if let Err(err) = self.config.save() {
                                    warn!("ui: failed to persist theme choice: {err}");
                                }
                            }
                            ui.add_space(10.0);
                            ui.scope(|ui| {
                                ui.set_height(control_height);
                                egui::ComboBox::from_id_source("language_combo")
                                    .selected_text(self.language.display_name())
                                    .show_ui(ui, |ui| {
                                        ui.selectable_value(
                                            &mut self.language,
                                            Language::English,
                                            Language::English.display_name(),
                                        );
                                        ui.selectable_value(
                                            &mut self.language,
                                            Language::Chinese,
                                            Language::Chinese.display_name(),
                                        );
                                    });
                            });
                        },
                    );
                });
            });

        egui::TopBottomPanel::bottom("bottom_bar")
            .frame(
                Frame::none()
                    .fill(colors.panel)
                    .stroke(Stroke::new(1.0, colors.border))
                    .inner_margin(Margin::symmetric(16.0, 10.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(chrono::Local::now().format("%H:%M:%S").to_string())
                            .color(colors.text_muted)
                            .monospace(),
                    );
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        badge_frame(colors.border_strong).show(ui, |ui| {
                            ui.label(
                                RichText::new(i18n.panel_version(self.panel_version))
                                    .color(colors.text_primary)
                                    .small(),
                            );
                        });
                        if let Some(pid) = self.service.pid() {
                            ui.add_space(6.0);
                            badge_frame(colors.info).show(ui, |ui| {
                                ui.label(
                                    RichText::new(i18n.service_pid(pid))
                                        .color(colors.info)
                                        .small(),
                                );
                            });
                        }
                    });
                });
            });

        egui::CentralPanel::default()
            .frame(
                Frame::none()
                    .fill(colors.bg)
                    .inner_margin(Margin::symmetric(14.0, 12.0)),
            )
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_status(ui, &colors, i18n);
                    ui.add_space(12.0);
                    self.render_service(ui, &colors, i18n);
                    ui.add_space(12.0);
                    self.render_tools(ui, &colors, i18n);
                    ui.add_space(12.0);
                    self.render_logs(ui, &colors, i18n);
                });
            });

        self.render_settings_modal(ctx, &colors, i18n);

        // Keep the clock and service status fresh.
        ctx.request_repaint_after(Duration::from_secs(1));
    }
}

use crate::logview::LogLevel;
use crate::updater::VersionOrdering;

use super::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    pub const fn display_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Chinese => "中文",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct I18n {
    language: Language,
}

impl I18n {
    #[must_use]
    pub const fn new(language: Language) -> Self {
        Self { language }
    }

    fn pick<'a>(self, english: &'a str, chinese: &'a str) -> &'a str {
        match self.language {
            Language::English => english,
            Language::Chinese => chinese,
        }
    }

    pub fn theme_label(self, theme: Theme) -> &'static str {
        match (theme, self.language) {
            (Theme::Dark, Language::English) => "Dark",
            (Theme::Dark, Language::Chinese) => "深色",
            (Theme::Light, Language::English) => "Light",
            (Theme::Light, Language::Chinese) => "浅色",
        }
    }

    pub fn ordering_label(self, ordering: VersionOrdering) -> &'static str {
        match (ordering, self.language) {
            (VersionOrdering::Lexical, Language::English) => "Lexical",
            (VersionOrdering::Lexical, Language::Chinese) => "字典序",
            (VersionOrdering::Numeric, Language::English) => "Numeric",
            (VersionOrdering::Numeric, Language::Chinese) => "数字序",
        }
    }

    pub fn log_level_label(self, level: LogLevel) -> &'static str {
        match (level, self.language) {
            (LogLevel::Info, Language::English) => "Info",
            (LogLevel::Info, Language::Chinese) => "信息",
            (LogLevel::Success, Language::English) => "Success",
            (LogLevel::Success, Language::Chinese) => "成功",
            (LogLevel::Warning, Language::English) => "Warning",
            (LogLevel::Warning, Language::Chinese) => "警告",
            (LogLevel::Error, Language::English) => "Error",
            (LogLevel::Error, Language::Chinese) => "错误",
        }
    }

    pub fn heading(self) -> &'static str {
        self.pick("Hueying AI Panel", "绘影AI面板")
    }

    pub fn tagline(self) -> &'static str {
        self.pick(
            "Control panel for the local AI service",
            "本地AI服务控制面板",
        )
    }

    pub fn panel_version(self, version: &str) -> String {
        match self.language {
            Language::English => format!("Panel v{version}"),
            Language::Chinese => format!("面板 v{version}"),
        }
    }

    pub fn status_label(self) -> &'static str {
        self.pick("Status", "状态")
    }

    pub fn status_ready(self) -> &'static str {
        self.pick("Ready", "就绪")
    }

    pub fn status_running(self) -> &'static str {
        self.pick("Service running", "服务运行中")
    }

    pub fn status_attention(self) -> &'static str {
        self.pick("Attention", "注意")
    }

    pub fn status_working(self) -> &'static str {
        self.pick("Working", "处理中")
    }

    pub fn initialising(self) -> &'static str {
        self.pick("Starting up...", "正在启动...")
    }

    pub fn checking(self) -> &'static str {
        self.pick("Checking for workflow updates...", "正在检查工作流更新...")
    }

    pub fn downloading(self) -> &'static str {
        self.pick("Downloading workflow update...", "正在下载工作流更新...")
    }

    pub fn preparing(self) -> &'static str {
        self.pick("Preparing workspace...", "正在准备工作目录...")
    }

    pub fn ready(self, version: &str) -> String {
        match self.language {
            Language::English => format!("Workflows ready (version {version})"),
            Language::Chinese => format!("工作流已就绪（版本 {version}）"),
        }
    }

    pub fn error(self, message: &str) -> String {
        match self.language {
            Language::English => format!("Error: {message}"),
            Language::Chinese => format!("错误：{message}"),
        }
    }

    pub fn service_heading(self) -> &'static str {
        self.pick("Service", "服务")
    }

    pub fn start_button(self) -> &'static str {
        self.pick("Start service", "启动服务")
    }

    pub fn stop_button(self) -> &'static str {
        self.pick("Stop service", "停止服务")
    }

    pub fn restart_button(self) -> &'static str {
        self.pick("Restart service", "重启服务")
    }

    pub fn check_updates_button(self) -> &'static str {
        self.pick("Check for updates", "检查更新")
    }

    pub fn service_pid(self, pid: u32) -> String {
        match self.language {
            Language::English => format!("PID {pid}"),
            Language::Chinese => format!("进程 {pid}"),
        }
    }

    pub fn service_memory(self, mb: u64) -> String {
        match self.language {
            Language::English => format!("{mb} MB"),
            Language::Chinese => format!("{mb} MB"),
        }
    }

    pub fn service_stopped(self) -> &'static str {
        self.pick("Service stopped", "服务已停止")
    }

    pub fn tools_heading(self) -> &'static str {
        self.pick("Tools", "工具")
    }

    pub fn open_web_button(self) -> &'static str {
        self.pick("Open web UI", "打开网页界面")
    }

    pub fn open_output_button(self) -> &'static str {
        self.pick("Open output folder", "打开输出文件夹")
    }

    pub fn clear_images_button(self) -> &'static str {
        self.pick("Clear output images", "清理输出图片")
    }

    pub fn cleared_images(self, count: usize) -> String {
        match self.language {
            Language::English => format!("Removed {count} generated image(s)"),
            Language::Chinese => format!("已删除 {count} 张生成图片"),
        }
    }

    pub fn export_logs_button(self) -> &'static str {
        self.pick("Export logs", "导出日志")
    }

    pub fn clear_logs_button(self) -> &'static str {
        self.pick("Clear logs", "清空日志")
    }

    pub fn logs_exported(self, path: &str) -> String {
        match self.language {
            Language::English => format!("Logs exported to {path}"),
            Language::Chinese => format!("日志已导出到 {path}"),
        }
    }

    pub fn settings_button(self) -> &'static str {
        self.pick("Settings", "设置")
    }

    pub fn logs_heading(self) -> &'static str {
        self.pick("Logs", "日志")
    }

    pub fn log_filter_label(self) -> &'static str {
        self.pick("Level", "级别")
    }

    pub fn log_filter_all(self) -> &'static str {
        self.pick("All", "全部")
    }

    pub fn log_search_hint(self) -> &'static str {
        self.pick("Filter messages...", "筛选日志...")
    }

    pub fn logs_empty(self) -> &'static str {
        self.pick("No log entries yet.", "暂无日志。")
    }

    pub fn settings_title(self) -> &'static str {
        self.pick("Panel settings", "面板设置")
    }

    pub fn settings_web_url(self) -> &'static str {
        self.pick("Web UI address", "网页界面地址")
    }

    pub fn settings_update_url(self) -> &'static str {
        self.pick("Update server", "更新服务器")
    }

    pub fn settings_payload_key(self) -> &'static str {
        self.pick("Payload key", "负载密钥")
    }

    pub fn settings_ordering(self) -> &'static str {
        self.pick("Version comparison", "版本比较方式")
    }

    pub fn settings_service_command(self) -> &'static str {
        self.pick("Service command", "服务命令")
    }

    pub fn settings_service_args(self) -> &'static str {
        self.pick("Service arguments", "服务参数")
    }

    pub fn settings_font_size(self) -> &'static str {
        self.pick("Log font size", "日志字号")
    }

    pub fn settings_auto_save(self) -> &'static str {
        self.pick("Save logs to file", "自动保存日志")
    }

    pub fn settings_save(self) -> &'static str {
        self.pick("Save", "保存")
    }

    pub fn settings_cancel(self) -> &'static str {
        self.pick("Cancel", "取消")
    }

    pub fn settings_saved(self) -> &'static str {
        self.pick("Settings saved", "设置已保存")
    }

    pub fn settings_save_failed(self, err: &str) -> String {
        match self.language {
            Language::English => format!("Failed to save settings: {err}"),
            Language::Chinese => format!("保存设置失败：{err}"),
        }
    }

    pub fn open_failed(self, err: &str) -> String {
        match self.language {
            Language::English => format!("Failed to open: {err}"),
            Language::Chinese => format!("打开失败：{err}"),
        }
    }
}

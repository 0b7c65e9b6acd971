use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 程序配置
///
/// 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 账号 ---
    pub username: Option<String>,
    pub password: Option<String>,
    pub login_url: String,
    // --- 浏览器 ---
    /// 是否无头模式
    pub headless: bool,
    /// 浏览器可执行文件路径，不设置时由 chromiumoxide 自动查找
    pub executable_path: Option<PathBuf>,
    /// 设置后连接到已启动的浏览器调试端口，而不是新启动浏览器
    pub browser_debug_port: Option<u16>,
    /// 等待详情页内容的超时（秒）
    pub page_timeout_secs: u64,
    /// 单个文件下载超时（秒）
    pub download_timeout_secs: u64,
    // --- 路径 ---
    /// 条目列表 JSON
    pub input_file: PathBuf,
    /// 每个条目一个 JSON 的缓存目录
    pub data_cache_dir: PathBuf,
    /// 下载文件的缓存目录
    pub file_cache_dir: PathBuf,
    /// 汇总输出文件
    pub out_file: PathBuf,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            login_url: "https://login.yahoo.com/config/login?done=https://groups.yahoo.com/neo"
                .to_string(),
            headless: true,
            executable_path: None,
            browser_debug_port: None,
            page_timeout_secs: 30,
            download_timeout_secs: 300,
            input_file: PathBuf::from("out/Messages.json"),
            data_cache_dir: PathBuf::from("out/cache/attachments"),
            file_cache_dir: PathBuf::from("out/files"),
            out_file: PathBuf::from("out/MessagesWithAttachments.json"),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 默认配置文件路径，可用 `CONFIG_FILE` 覆盖
    pub const DEFAULT_CONFIG_FILE: &'static str = "config/config.toml";

    /// 加载配置：配置文件存在时读取，再叠加环境变量
    pub fn load() -> Result<Self> {
        let path = std::env::var("CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(Self::DEFAULT_CONFIG_FILE));

        let base = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        Ok(base.with_env())
    }

    /// 从 TOML 文件读取，缺失字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 只用默认值和环境变量
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env(self) -> Self {
        Self {
            username: env_string("SCRAPER_USERNAME").or(self.username),
            password: env_string("SCRAPER_PASSWORD").or(self.password),
            login_url: env_string("LOGIN_URL").unwrap_or(self.login_url),
            headless: env_parse("HEADLESS").unwrap_or(self.headless),
            executable_path: env_string("CHROME_EXECUTABLE")
                .map(PathBuf::from)
                .or(self.executable_path),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(self.browser_debug_port),
            page_timeout_secs: env_parse("PAGE_TIMEOUT_SECS").unwrap_or(self.page_timeout_secs),
            download_timeout_secs: env_parse("DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or(self.download_timeout_secs),
            input_file: env_string("INPUT_FILE").map(PathBuf::from).unwrap_or(self.input_file),
            data_cache_dir: env_string("DATA_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(self.data_cache_dir),
            file_cache_dir: env_string("FILE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(self.file_cache_dir),
            out_file: env_string("OUT_FILE").map(PathBuf::from).unwrap_or(self.out_file),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    /// 账号密码都配置了才返回
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

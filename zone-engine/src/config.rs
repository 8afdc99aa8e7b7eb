use std::time::Duration;

use fleet_client::ClientConfig;

use crate::assignment::AssignmentPolicy;
use crate::session::DEFAULT_COMMIT_DEBOUNCE_MS;

/// 引擎配置 - zone console 的所有配置项
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | FLEET_API_URL | http://localhost:3333/v1 | Fleet API 地址 |
/// | FLEET_API_TOKEN | - | Bearer token |
/// | REQUEST_TIMEOUT_SECS | 30 | 请求超时(秒) |
/// | COMMIT_DEBOUNCE_MS | 1000 | 编辑提交防抖(毫秒) |
/// | POSITION_POLL_MS | 3000 | 司机位置轮询间隔(毫秒) |
/// | SELECT_CREATED_ZONE | true | 新建区域后自动选中 |
/// | ASSIGNMENT_POLICY | mirror | mirror \| exclusive |
/// | VIEW_STATE_PATH | - | 视图状态 JSON 文件 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志输出 |
/// | LOG_DIR | - | 日志文件目录 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// FLEET_API_URL=https://api.example.com/v1 COMMIT_DEBOUNCE_MS=500 cargo run --bin zone-console
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Quiet period before edits are committed
    pub commit_debounce_ms: u64,
    pub position_poll_ms: u64,
    /// Select a freshly created zone once the server acknowledges it
    pub select_created_zone: bool,
    pub assignment_policy: AssignmentPolicy,
    pub view_state_path: Option<String>,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// development | staging | production
    pub environment: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3333/v1".into(),
            api_token: None,
            request_timeout_secs: 30,
            commit_debounce_ms: DEFAULT_COMMIT_DEBOUNCE_MS,
            position_poll_ms: 3000,
            select_created_zone: true,
            assignment_policy: AssignmentPolicy::Mirror,
            view_state_path: None,
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
            environment: "development".into(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl EngineConfig {
    /// 从环境变量加载配置
    ///
    /// 未设置或无法解析的变量使用默认值
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env_opt("FLEET_API_URL").unwrap_or(defaults.api_url),
            api_token: env_opt("FLEET_API_TOKEN"),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            commit_debounce_ms: env_parse("COMMIT_DEBOUNCE_MS")
                .unwrap_or(defaults.commit_debounce_ms),
            position_poll_ms: env_parse("POSITION_POLL_MS").unwrap_or(defaults.position_poll_ms),
            select_created_zone: env_parse("SELECT_CREATED_ZONE")
                .unwrap_or(defaults.select_created_zone),
            assignment_policy: env_parse("ASSIGNMENT_POLICY")
                .unwrap_or(defaults.assignment_policy),
            view_state_path: env_opt("VIEW_STATE_PATH"),
            log_level: env_opt("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: env_parse("LOG_JSON").unwrap_or(defaults.log_json),
            log_dir: env_opt("LOG_DIR"),
            environment: env_opt("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_commit_debounce(mut self, debounce: Duration) -> Self {
        self.commit_debounce_ms = debounce.as_millis() as u64;
        self
    }

    pub fn with_assignment_policy(mut self, policy: AssignmentPolicy) -> Self {
        self.assignment_policy = policy;
        self
    }

    pub fn with_select_created_zone(mut self, select: bool) -> Self {
        self.select_created_zone = select;
        self
    }

    pub fn commit_debounce(&self) -> Duration {
        Duration::from_millis(self.commit_debounce_ms)
    }

    pub fn position_poll_interval(&self) -> Duration {
        Duration::from_millis(self.position_poll_ms.max(1))
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Client settings for the REST backend
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.api_url).with_timeout(self.request_timeout_secs);
        match &self.api_token {
            Some(token) => config.with_token(token),
            None => config,
        }
    }
}

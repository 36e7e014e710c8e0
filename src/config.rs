use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://api.track.toggl.com/api/v8";
pub const DEFAULT_APP_NAME: &str = "toggl-entries";

/// 設定ファイルの内容。全ての項目を省略できる。
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_token: Option<String>,
    api_url: Option<String>,
    app_name: Option<String>,
}

/// Toggl APIと通信するための設定。
#[derive(Clone)]
pub struct Config {
    pub api_token: String,
    pub api_url: String,
    pub app_name: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("app_name", &self.app_name)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// 設定を読み込む。
    ///
    /// デフォルト値、設定ファイル、環境変数の順に読み込み、後のものを優先する。
    /// 設定ファイルは`path`が指定されていない場合は`<config_dir>/toggl-entries/config.json`を利用する。
    /// APIトークンがどこにも設定されていない場合はエラーを返す。
    ///
    /// # Arguments
    ///
    /// * `path` - 設定ファイルのパス
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => read_config_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => read_config_file(&path)?,
                _ => ConfigFile::default(),
            },
        };

        Self::resolve(file, |key| env::var(key).ok())
    }

    fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_token = env("TOGGL_API_TOKEN")
            .or(file.api_token)
            .context("TOGGL_API_TOKEN must be set")?;
        let api_url = env("TOGGL_API_URL")
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let app_name = env("TOGGL_APP_NAME")
            .or(file.app_name)
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        Ok(Self {
            api_token,
            api_url,
            app_name,
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("toggl-entries").join("config.json"))
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

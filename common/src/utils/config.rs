use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    Memory,
    S3,
}

fn default_storage_kind() -> StorageKind {
    StorageKind::Local
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    pub upstage_api_key: String,
    #[serde(default = "default_ocr_base_url")]
    pub ocr_base_url: String,
    #[serde(default)]
    pub tavily_api_key: String,
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
    pub http_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
    #[serde(default = "default_case_db_path")]
    pub case_db_path: String,
    #[serde(default = "default_embedding_archive_path")]
    pub embedding_archive_path: String,
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,
    #[serde(default = "default_storage_kind")]
    pub storage: StorageKind,
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub aws_access_key_id: String,
    #[serde(default)]
    pub aws_secret_access_key: String,
    #[serde(default = "default_aws_region")]
    pub aws_region: String,
    #[serde(default = "default_llm_max_attempts")]
    pub llm_max_attempts: usize,
    #[serde(default = "default_summary_max_attempts")]
    pub summary_max_attempts: usize,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_ocr_base_url() -> String {
    "https://api.upstage.ai/v1/document-digitization".to_string()
}

fn default_search_base_url() -> String {
    "https://api.tavily.com/search".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_uploads_dir() -> String {
    "./data/uploads".to_string()
}

fn default_case_db_path() -> String {
    "./datasets/case_db.json".to_string()
}

fn default_embedding_archive_path() -> String {
    "./datasets/precomputed_embeddings.json".to_string()
}

fn default_prompts_dir() -> String {
    "./prompts".to_string()
}

fn default_aws_region() -> String {
    "ap-northeast-2".to_string()
}

fn default_llm_max_attempts() -> usize {
    100
}

fn default_summary_max_attempts() -> usize {
    3
}

impl AppConfig {
    pub fn summary_prompt_path(&self) -> PathBuf {
        PathBuf::from(&self.prompts_dir).join("summarize_pdf.yaml")
    }

    pub fn highlight_prompt_path(&self) -> PathBuf {
        PathBuf::from(&self.prompts_dir).join("highlight_prompt.txt")
    }

    pub fn format_prompt_path(&self) -> PathBuf {
        PathBuf::from(&self.prompts_dir).join("format_output.txt")
    }

    pub fn simulation_prompt_path(&self) -> PathBuf {
        PathBuf::from(&self.prompts_dir).join("simulate_dispute.txt")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            upstage_api_key: String::new(),
            ocr_base_url: default_ocr_base_url(),
            tavily_api_key: String::new(),
            search_base_url: default_search_base_url(),
            http_port: 0,
            data_dir: default_data_dir(),
            uploads_dir: default_uploads_dir(),
            case_db_path: default_case_db_path(),
            embedding_archive_path: default_embedding_archive_path(),
            prompts_dir: default_prompts_dir(),
            storage: default_storage_kind(),
            bucket_name: String::new(),
            aws_access_key_id: String::new(),
            aws_secret_access_key: String::new(),
            aws_region: default_aws_region(),
            llm_max_attempts: default_llm_max_attempts(),
            summary_max_attempts: default_summary_max_attempts(),
        }
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

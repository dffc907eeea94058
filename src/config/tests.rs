#[cfg(test)]
mod tests {
    use crate::config::{CacheConfig, Config, LLMConfig, LLMProvider, ResearchConfig};
    use crate::generator::persona::ReportStyle;
    use crate::i18n::TargetLanguage;
    use crate::types::ResearchDepth;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.output_path, PathBuf::from("./research.reports"));
        assert_eq!(config.target_language, TargetLanguage::English);
        assert!(!config.check_connection);
        assert!(!config.verbose);
    }

    #[test]
    fn test_llm_provider_default() {
        let provider = LLMProvider::default();
        assert_eq!(provider, LLMProvider::OpenAI);
    }

    #[test]
    fn test_llm_provider_from_str() {
        assert_eq!(
            "openai".parse::<LLMProvider>().unwrap(),
            LLMProvider::OpenAI
        );
        assert_eq!(
            "DeepSeek".parse::<LLMProvider>().unwrap(),
            LLMProvider::DeepSeek
        );
        assert_eq!(
            "anthropic".parse::<LLMProvider>().unwrap(),
            LLMProvider::Anthropic
        );
        assert_eq!(
            "ollama".parse::<LLMProvider>().unwrap(),
            LLMProvider::Ollama
        );

        assert!("invalid".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_llm_provider_display_round_trip() {
        for provider in [
            LLMProvider::OpenAI,
            LLMProvider::Moonshot,
            LLMProvider::DeepSeek,
            LLMProvider::OpenRouter,
            LLMProvider::Anthropic,
            LLMProvider::Ollama,
        ] {
            assert_eq!(
                provider.to_string().parse::<LLMProvider>().unwrap(),
                provider
            );
        }
    }

    #[test]
    fn test_llm_config_default() {
        let config = LLMConfig::default();

        assert!(!config.api_base_url.is_empty());
        assert_eq!(config.model_efficient, "gpt-4o-mini");
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.max_parallels, 3);
    }

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();

        assert!(config.enabled);
        assert_eq!(config.cache_dir, PathBuf::from(".triad/cache"));
        assert_eq!(config.expire_hours, 168);
    }

    #[test]
    fn test_research_config_default() {
        let config = ResearchConfig::default();

        assert_eq!(config.depth, ResearchDepth::Standard);
        assert!(config.persona.is_none());
        assert!(config.style.is_none());
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 100);
    }

    #[test]
    fn test_config_from_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("triad.toml");
        fs::write(
            &path,
            r#"
target_language = "zh"

[llm]
provider = "deepseek"
model_efficient = "deepseek-chat"

[research]
depth = "comprehensive"
style = "business"
chunk_size = 800
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.target_language, TargetLanguage::Chinese);
        assert_eq!(config.llm.provider, LLMProvider::DeepSeek);
        assert_eq!(config.llm.model_efficient, "deepseek-chat");
        assert_eq!(config.llm.retry_attempts, 3);
        assert_eq!(config.research.depth, ResearchDepth::Comprehensive);
        assert_eq!(config.research.style, Some(ReportStyle::Business));
        assert_eq!(config.research.chunk_size, 800);
        assert_eq!(config.research.chunk_overlap, 100);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_config_from_missing_file() {
        let result = Config::from_file(&PathBuf::from("/nonexistent/triad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[llm\nprovider = ").unwrap();

        assert!(Config::from_file(&path).is_err());
    }
}

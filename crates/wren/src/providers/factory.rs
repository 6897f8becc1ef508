use strum_macros::EnumIter;

use super::base::Provider;
use super::configs::ProviderConfig;
use super::errors::ProviderError;
use super::openai::OpenAiProvider;

#[derive(EnumIter, Debug)]
pub enum ProviderType {
    OpenAi,
}

pub fn get_provider(config: ProviderConfig) -> Result<Box<dyn Provider>, ProviderError> {
    match config {
        ProviderConfig::OpenAi(openai_config) => Ok(Box::new(OpenAiProvider::new(openai_config)?)),
    }
}

//! Content generator adapters.

mod openai;

pub use openai::OpenAiGenerator;

use std::sync::Arc;

use crate::{
    application::generator::{ContentGenerator, DisabledGenerator},
    config::{GeneratorMode, GeneratorSettings},
    infra::error::InfraError,
};

pub fn build_generator(settings: &GeneratorSettings) -> Result<Arc<dyn ContentGenerator>, InfraError> {
    match settings.mode {
        GeneratorMode::Disabled => Ok(Arc::new(DisabledGenerator)),
        GeneratorMode::OpenAi => Ok(Arc::new(OpenAiGenerator::new(
            settings.base_url.as_str(),
            settings.model.clone(),
            settings.api_key.clone(),
            settings.timeout,
        )?)),
    }
}

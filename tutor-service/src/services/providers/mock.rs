//! Mock provider implementation for testing.

use super::{Content, ProviderError, TextProvider};
use crate::models::{Part, Role};
use async_trait::async_trait;

/// Mock text provider for testing. Replies deterministically based on the
/// latest user turn so integration tests can assert on history shape.
pub struct MockTextProvider {
    enabled: bool,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        _system_instructions: &str,
        contents: &[Content],
    ) -> Result<String, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        let last_user_text = contents
            .iter()
            .rev()
            .find(|c| c.role == Role::User)
            .and_then(|c| {
                c.parts.iter().find_map(|p| match p {
                    Part::Text { text } => Some(text.clone()),
                    _ => None,
                })
            });

        let has_image = contents.iter().rev().find(|c| c.role == Role::User).map_or(
            false,
            |c| {
                c.parts
                    .iter()
                    .any(|p| matches!(p, Part::InlineData { .. }))
            },
        );

        Ok(match (last_user_text, has_image) {
            (Some(text), true) => format!("Mock response for image with: {}", text),
            (Some(text), false) => format!("Mock response for: {}", text),
            (None, true) => "Mock response for image".to_string(),
            (None, false) => "Mock response".to_string(),
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}

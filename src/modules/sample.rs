//! Built-in `sample` module

use super::{ModuleContext, ModuleError, SequenceModule};
use crate::sequence::{Message, Mode, Sequence, DEFAULT_DURATION_SECS};
use async_trait::async_trait;

pub const NAME: &str = "sample";

/// Shows "Hello world" and nothing else
pub struct SampleModule;

#[async_trait]
impl SequenceModule for SampleModule {
    fn name(&self) -> &str {
        NAME
    }

    async fn sign_sequence(
        &mut self,
        _ctx: &mut ModuleContext<'_>,
    ) -> Result<Option<Sequence>, ModuleError> {
        let messages = vec![Message::new("Hello world").with_mode(Mode::Hold)];
        Sequence::new(DEFAULT_DURATION_SECS, messages)
            .map(Some)
            .map_err(|e| ModuleError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;

    #[tokio::test]
    async fn test_sample_sequence() {
        let (_handle, _sequences, mut messages) = queue::channel();
        let mut ctx = ModuleContext::new(&mut messages);

        let mut module = SampleModule;
        let seq = module.sign_sequence(&mut ctx).await.unwrap().unwrap();

        assert_eq!(seq.duration, 60);
        assert_eq!(seq.texts(), vec!["Hello world"]);
        assert_eq!(seq.messages[0].mode, Some(Mode::Hold));
        assert!(module.is_active(&ctx.now));
    }
}

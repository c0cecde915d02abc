use gateway_core::EncodingError;
use gateway_embed::EmbedError;
use gateway_vocab::VocabError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Vocab(#[from] VocabError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error("embedding provider returned {got} dims, expected {expected}")]
    UnexpectedEmbeddingDimension { expected: i32, got: i32 },
}

impl From<EncodeError> for EncodingError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Vocab(gateway_vocab::VocabError::TemplateNotFound { slot, .. }) => {
                EncodingError::MissingTemplate { slot: format!("{slot:?}") }
            }
            EncodeError::Vocab(e) => EncodingError::UnknownVocabularyValue { slot: "unknown".to_string(), value: e.to_string() },
            EncodeError::Embed(e) => EncodingError::ProviderUnavailable { reason: e.to_string() },
            EncodeError::UnexpectedEmbeddingDimension { expected, got } => {
                EncodingError::InputTooLarge { len: got as usize, max: expected as usize }
            }
        }
    }
}

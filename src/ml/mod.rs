pub mod sentence_encoder;

pub use sentence_encoder::{Embedder, SentenceEncoder, EMBEDDING_DIM};

#![forbid(unsafe_code)]

pub mod repository;
pub mod sampling;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, QuestionBankGateway, QuestionBankRepository, Storage, StorageError,
};

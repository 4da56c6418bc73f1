pub mod article;

pub use article::{ArticleRecord, ArticlesResponse};

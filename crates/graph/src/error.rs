use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("duplicate entity id: {0}")]
    DuplicateId(u64),

    #[error("malformed numeric field {field:?} in fragment: {text:?}")]
    MalformedNumber { field: &'static str, text: String },
}

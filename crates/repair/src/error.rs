use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepairError>;

#[derive(Error, Debug)]
pub enum RepairError {
    #[error(transparent)]
    Graph(#[from] lanefix_graph::GraphError),

    #[error(transparent)]
    Savefile(#[from] lanefix_savefile::SavefileError),
}

pub mod conversation;

pub use conversation::{
    DeleteResponse, MessageDto, MessagesResponse, MetadataResponse, ProblemSolverBody,
    ProblemSolverResponse, ResponseMode,
};

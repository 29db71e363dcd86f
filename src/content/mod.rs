//! Game-scoped content: reviews, questions and their answer threads.
//! Reviews and questions list newest-first; answers read oldest-first,
//! as a conversation.

pub mod answers;
pub mod questions;
pub mod reviews;

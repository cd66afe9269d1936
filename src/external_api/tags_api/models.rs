pub mod tag;
pub mod tags_response;
